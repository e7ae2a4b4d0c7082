use serde_yaml_ng::Mapping;

use crate::agent::AgentId;
use crate::errors::Result;
use crate::frontmatter::FrontmatterFormat;
use crate::models::{ActivationMode, ComponentSpec, ComponentType, ExecutionContext};

use super::{put, DialectRenderer, RenderOptions, Rendered, Session, Support};

/// Renderer for Gemini CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiRenderer;

impl GeminiRenderer {
    fn command(s: &mut Session<'_>) -> Result<String> {
        s.check(&Support {
            modes: &[ActivationMode::Manual],
            ..Support::NONE
        });
        let mut f = Mapping::new();
        if let Some(description) = s.authored_description() {
            put(&mut f, "description", description);
        }
        put(&mut f, "prompt", s.body.as_str());
        s.toml_document(f)
    }

    fn agent(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[ActivationMode::Suggested],
            contexts: &[ExecutionContext::Isolated],
            tools: true,
            model: true,
            ..Support::NONE
        });
        let mut f = Mapping::new();
        put(&mut f, "name", spec.id.as_str());
        let description = s.required_description();
        put(&mut f, "description", description);
        if let Some(tools) = &spec.execution.allowed_tools {
            put(&mut f, "tools", tools.clone());
        }
        if let Some(model) = &spec.execution.preferred_model {
            put(&mut f, "model", model.as_str());
        }
        if let Some(ext) = spec.metadata.extensions.gemini() {
            if let Some(temperature) = ext.temperature {
                put(&mut f, "temperature", temperature);
            }
            if let Some(max_turns) = ext.max_turns {
                put(&mut f, "max_turns", max_turns);
            }
        }
        s.document(FrontmatterFormat::Yaml, f)
    }

    fn memory(s: &mut Session<'_>) -> Result<String> {
        s.check(&Support {
            modes: &[ActivationMode::Auto],
            ..Support::NONE
        });
        if s.spec.component_type() == ComponentType::Config && !s.body.is_empty() {
            s.body = format!("```toml\n{}\n```", s.body);
        }
        s.document(FrontmatterFormat::Yaml, Mapping::new())
    }
}

impl DialectRenderer for GeminiRenderer {
    fn agent(&self) -> AgentId {
        AgentId::Gemini
    }

    fn base_score(&self) -> u8 {
        98
    }

    fn target_type(&self, component_type: ComponentType) -> ComponentType {
        match component_type {
            ComponentType::Skill | ComponentType::Command | ComponentType::Workflow => {
                ComponentType::Command
            }
            ComponentType::Agent => ComponentType::Agent,
            ComponentType::Rule
            | ComponentType::Memory
            | ComponentType::Hook
            | ComponentType::Config => ComponentType::Memory,
        }
    }

    fn target_directory(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Command => ".gemini/commands".to_string(),
            ComponentType::Agent => ".gemini/agents".to_string(),
            _ => ".".to_string(),
        }
    }

    fn target_filename(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Command => format!("{}.toml", spec.id),
            ComponentType::Agent => format!("{}.md", spec.id),
            _ => "GEMINI.md".to_string(),
        }
    }

    fn render(&self, spec: &ComponentSpec, options: &RenderOptions) -> Result<Rendered> {
        let mut s = Session::start(self, spec, options)?;
        let content = match s.target_type {
            ComponentType::Command => Self::command(&mut s)?,
            ComponentType::Agent => Self::agent(&mut s)?,
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
