use serde_yaml_ng::Mapping;

use crate::agent::AgentId;
use crate::diagnostics::R001;
use crate::errors::{Result, SkillportError};
use crate::frontmatter::{self, FrontmatterFormat};
use crate::models::{
    ActivationMode, CodexExtensions, ComponentSpec, ComponentType, SafetyLevel, SandboxMode,
};
use crate::report::ConversionWarning;

use super::{put, DialectRenderer, RenderOptions, Rendered, Session, Support};

/// Renderer for Codex CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodexRenderer;

/// Sandbox mode that states a safety level.
#[must_use]
pub fn sandbox_for(level: SafetyLevel) -> SandboxMode {
    match level {
        SafetyLevel::Safe => SandboxMode::ReadOnly,
        SafetyLevel::Sensitive => SandboxMode::WorkspaceWrite,
        SafetyLevel::Dangerous => SandboxMode::DangerFullAccess,
    }
}

fn sandbox_safety(mode: SandboxMode) -> SafetyLevel {
    match mode {
        SandboxMode::ReadOnly => SafetyLevel::Safe,
        SandboxMode::WorkspaceWrite => SafetyLevel::Sensitive,
        SandboxMode::DangerFullAccess => SafetyLevel::Dangerous,
    }
}

/// Frontmatter syntax: TOML only when the source was a TOML Codex prompt.
fn format_for(spec: &ComponentSpec) -> FrontmatterFormat {
    if spec.source() == Some(AgentId::Codex)
        && spec.metadata.original_format == Some(FrontmatterFormat::Toml)
    {
        FrontmatterFormat::Toml
    } else {
        FrontmatterFormat::Yaml
    }
}

fn put_extensions(f: &mut Mapping, ext: &CodexExtensions) {
    if let Some(mode) = ext.sandbox_mode {
        put(f, "sandbox_mode", mode.as_str());
    }
    if let Some(policy) = ext.approval_policy {
        put(f, "approval_policy", policy.as_str());
    }
    if let Some(effort) = &ext.reasoning_effort {
        put(f, "model_reasoning_effort", effort.as_str());
    }
}

impl CodexRenderer {
    fn prompt(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        let ext = spec.metadata.extensions.codex().cloned().unwrap_or_default();
        let is_skill = s.target_type == ComponentType::Skill;
        s.check(&Support {
            modes: if is_skill {
                &[ActivationMode::Suggested]
            } else {
                &[ActivationMode::Manual]
            },
            model: true,
            argument_hint: !is_skill,
            safety: ext.sandbox_mode.map(sandbox_safety),
            ..Support::NONE
        });
        let mut f = Mapping::new();
        if is_skill {
            put(&mut f, "name", spec.id.as_str());
            let description = s.required_description();
            put(&mut f, "description", description);
        } else {
            if let Some(description) = s.authored_description() {
                put(&mut f, "description", description);
            }
            if let Some(hint) = &spec.invocation.argument_hint {
                put(&mut f, "argument-hint", hint.as_str());
            }
        }
        if let Some(model) = &spec.execution.preferred_model {
            put(&mut f, "model", model.as_str());
        }
        put_extensions(&mut f, &ext);
        s.document(format_for(spec), f)
    }

    fn memory(s: &mut Session<'_>) -> Result<String> {
        s.check(&Support {
            modes: &[ActivationMode::Auto],
            ..Support::NONE
        });
        s.document(FrontmatterFormat::Yaml, Mapping::new())
    }

    fn config(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        let mut ext = spec.metadata.extensions.codex().cloned().unwrap_or_default();
        if ext.sandbox_mode.is_none() {
            let mode = sandbox_for(spec.activation.safety_level);
            s.report.warn(
                ConversionWarning::new(
                    R001,
                    format!("sandbox_mode '{}' derived from the safety level", mode.as_str()),
                )
                .with_field("sandbox_mode"),
            );
            ext.sandbox_mode = Some(mode);
        }
        s.check(&Support {
            modes: &[ActivationMode::Auto],
            model: true,
            safety: ext.sandbox_mode.map(sandbox_safety),
            ..Support::NONE
        });
        let mut f = Mapping::new();
        if let Some(model) = &spec.execution.preferred_model {
            put(&mut f, "model", model.as_str());
        }
        put_extensions(&mut f, &ext);
        if !s.body.is_empty() {
            let residual = frontmatter::parse_toml_document(&s.body).map_err(|e| {
                SkillportError::render(format!("config body is not a TOML table: {e}"))
            })?;
            for (key, value) in residual {
                if !f.contains_key(&key) {
                    f.insert(key, value);
                }
            }
        }
        s.toml_document(f)
    }
}

impl DialectRenderer for CodexRenderer {
    fn agent(&self) -> AgentId {
        AgentId::Codex
    }

    fn base_score(&self) -> u8 {
        98
    }

    fn target_type(&self, component_type: ComponentType) -> ComponentType {
        match component_type {
            ComponentType::Skill | ComponentType::Agent => ComponentType::Skill,
            ComponentType::Command | ComponentType::Workflow => ComponentType::Command,
            ComponentType::Config => ComponentType::Config,
            ComponentType::Rule | ComponentType::Memory | ComponentType::Hook => {
                ComponentType::Memory
            }
        }
    }

    fn target_directory(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Skill => format!(".codex/skills/{}", spec.id),
            ComponentType::Command => ".codex/prompts".to_string(),
            ComponentType::Config => ".codex".to_string(),
            _ => ".".to_string(),
        }
    }

    fn target_filename(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Skill => "SKILL.md".to_string(),
            ComponentType::Command => format!("{}.md", spec.id),
            ComponentType::Config => "config.toml".to_string(),
            _ => "AGENTS.md".to_string(),
        }
    }

    fn render(&self, spec: &ComponentSpec, options: &RenderOptions) -> Result<Rendered> {
        let mut s = Session::start(self, spec, options)?;
        let content = match s.target_type {
            ComponentType::Skill | ComponentType::Command => Self::prompt(&mut s)?,
            ComponentType::Config => Self::config(&mut s)?,
            _ => Self::memory(&mut s)?,
        };
        s.finish(
            content,
            self.target_directory(spec),
            self.target_filename(spec),
            Vec::new(),
        )
    }
}
