use serde_yaml_ng::Mapping;

use crate::agent::AgentId;
use crate::errors::Result;
use crate::frontmatter::{self, Document, FieldsExt, FrontmatterFormat};
use crate::models::{
    ActivationMode, AgentExtensions, ApprovalPolicy, CodexExtensions, ComponentType, SafetyLevel,
    SandboxMode,
};

use super::{
    file_name, has_dir, normalize_path, pre_validate, split_for, Draft, DialectParser,
    ParseOptions, Parsed,
};

const KNOWN_FIELDS: &[&str] = &[
    "name",
    "description",
    "argument-hint",
    "model",
    "sandbox_mode",
    "approval_policy",
    "approval_mode",
    "model_reasoning_effort",
    "metadata",
];

/// Keys lifted out of `config.toml` into the IR; the rest stay in the body.
const CONFIG_KEYS: &[&str] = &[
    "model",
    "sandbox_mode",
    "approval_policy",
    "model_reasoning_effort",
];

const MARKER_FIELDS: &[&str] = &[
    "sandbox_mode",
    "approval_policy",
    "approval_mode",
    "model_reasoning_effort",
];

/// Parser for Codex CLI prompts, skills, `AGENTS.md`, and `config.toml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodexParser;

fn type_from_path(path: &str) -> Option<ComponentType> {
    let name = file_name(path);
    if name.eq_ignore_ascii_case("SKILL.md") || has_dir(path, "skills") {
        Some(ComponentType::Skill)
    } else if has_dir(path, "prompts") {
        Some(ComponentType::Command)
    } else if name.eq_ignore_ascii_case("AGENTS.md") || name.eq_ignore_ascii_case("AGENTS.override.md") {
        Some(ComponentType::Memory)
    } else if name.eq_ignore_ascii_case("config.toml") {
        Some(ComponentType::Config)
    } else {
        None
    }
}

/// Whether a whole document parses as a Codex config table.
fn looks_like_config(content: &str) -> bool {
    frontmatter::parse_toml_document(content)
        .is_ok_and(|t| CONFIG_KEYS.iter().chain(MARKER_FIELDS).any(|k| t.has(k)))
}

/// Legacy `approval_mode` values and their `approval_policy` equivalents.
#[must_use]
pub fn legacy_approval(mode: &str) -> Option<ApprovalPolicy> {
    match mode {
        "suggest" => Some(ApprovalPolicy::Untrusted),
        "auto-edit" => Some(ApprovalPolicy::OnRequest),
        "full-auto" => Some(ApprovalPolicy::Never),
        _ => None,
    }
}

fn sandbox_safety(mode: SandboxMode) -> SafetyLevel {
    match mode {
        SandboxMode::ReadOnly => SafetyLevel::Safe,
        SandboxMode::WorkspaceWrite => SafetyLevel::Sensitive,
        SandboxMode::DangerFullAccess => SafetyLevel::Dangerous,
    }
}

impl CodexParser {
    fn extensions(draft: &mut Draft, fields: &Mapping) -> CodexExtensions {
        let sandbox_mode = fields.str_field("sandbox_mode").and_then(|raw| {
            let parsed = SandboxMode::parse(raw);
            if parsed.is_none() {
                draft.warn_enum("sandbox_mode", raw, "workspace-write");
            }
            parsed
        });
        let approval_policy = match (fields.str_field("approval_policy"), fields.str_field("approval_mode")) {
            (Some(raw), _) => {
                let parsed = ApprovalPolicy::parse(raw);
                if parsed.is_none() {
                    draft.warn_enum("approval_policy", raw, "on-request");
                }
                parsed
            }
            (None, Some(legacy)) => {
                let parsed = legacy_approval(legacy);
                draft.warn(
                    crate::diagnostics::P005,
                    format!("legacy approval_mode '{legacy}' read as approval_policy"),
                    "approval_mode",
                );
                parsed
            }
            (None, None) => None,
        };
        draft.explicit_safety = sandbox_mode.map(sandbox_safety);
        CodexExtensions {
            sandbox_mode,
            approval_policy,
            reasoning_effort: fields.str_field("model_reasoning_effort").map(str::to_string),
        }
    }

    fn parse_config(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let table = frontmatter::parse_toml_document(content)?;
        let mut residual = Mapping::new();
        for (key, value) in &table {
            if !key.as_str().is_some_and(|k| CONFIG_KEYS.contains(&k)) {
                residual.insert(key.clone(), value.clone());
            }
        }
        let body = if residual.is_empty() {
            String::new()
        } else {
            frontmatter::to_toml_string(&residual)?.trim().to_string()
        };
        let doc = Document {
            format: Some(FrontmatterFormat::Toml),
            fields: Mapping::new(),
            body,
        };
        let mut draft = Draft::new(AgentId::Codex, ComponentType::Config, &doc, options, &[]);
        draft.warnings.retain(|w| w.code != crate::diagnostics::P006);
        draft.spec.id = "config".to_string();
        draft.spec.intent = super::intent_from("Codex CLI configuration.", "");
        draft.spec.activation.mode = ActivationMode::Auto;
        draft.spec.invocation.user_invocable = false;
        draft.spec.execution.preferred_model = table.str_field("model").map(str::to_string);
        let ext = Self::extensions(&mut draft, &table);
        draft.spec.metadata.extensions = AgentExtensions::Codex(ext);
        Ok(draft.finish())
    }
}

impl DialectParser for CodexParser {
    fn agent(&self) -> AgentId {
        AgentId::Codex
    }

    fn can_parse(&self, content: &str, filename: Option<&str>) -> bool {
        if let Some(path) = filename.map(normalize_path) {
            let name = file_name(&path);
            return has_dir(&path, ".codex")
                || name.eq_ignore_ascii_case("AGENTS.md")
                || name.eq_ignore_ascii_case("AGENTS.override.md");
        }
        match frontmatter::split(content) {
            Ok(doc) if doc.format == Some(FrontmatterFormat::Toml) => true,
            Ok(doc) if doc.has_frontmatter() => MARKER_FIELDS.iter().any(|k| doc.fields.has(k)),
            _ => looks_like_config(content),
        }
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let path = options.source_file.as_deref().map(normalize_path);
        let path_type = path.as_deref().and_then(type_from_path);
        if path_type == Some(ComponentType::Config)
            || (path_type.is_none() && !content.trim_start().starts_with("---") && looks_like_config(content))
        {
            let pre = pre_validate(content, AgentId::Codex, ComponentType::Config, options)?;
            let mut parsed = self.parse_config(content, options)?;
            parsed.warnings.extend(pre);
            return Ok(parsed);
        }

        let doc = split_for(AgentId::Codex, content)?;
        let component_type = path_type.unwrap_or(if !doc.has_frontmatter() {
            ComponentType::Memory
        } else if doc.fields.has("name") {
            ComponentType::Skill
        } else {
            ComponentType::Command
        });
        let pre = pre_validate(content, AgentId::Codex, component_type, options)?;
        let f = &doc.fields;
        let mut draft = Draft::new(AgentId::Codex, component_type, &doc, options, KNOWN_FIELDS);
        draft.warnings.extend(pre);

        draft.spec.execution.preferred_model = f.str_field("model").map(str::to_string);
        draft.spec.invocation.argument_hint = f.str_field("argument-hint").map(str::to_string);
        let id = draft.spec.id.clone();
        match component_type {
            ComponentType::Command => {
                draft.spec.activation.mode = ActivationMode::Manual;
                draft.spec.invocation.slash_command = Some(format!("/{id}"));
            }
            ComponentType::Skill => {
                draft.spec.activation.mode = ActivationMode::Suggested;
                draft.spec.invocation.slash_command = Some(format!("/{id}"));
            }
            _ => {
                draft.spec.activation.mode = ActivationMode::Auto;
                draft.spec.invocation.user_invocable = false;
            }
        }

        let ext = Self::extensions(&mut draft, f);
        if ext != CodexExtensions::default() {
            draft.spec.metadata.extensions = AgentExtensions::Codex(ext);
        }
        Ok(draft.finish())
    }
}
