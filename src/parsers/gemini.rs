use serde_yaml_ng::Mapping;

use crate::agent::AgentId;
use crate::errors::{Result, SkillportError};
use crate::frontmatter::{self, Document, FieldsExt, FrontmatterFormat};
use crate::models::{ActivationMode, AgentExtensions, ComponentType, ExecutionContext, GeminiExtensions};

use super::{
    file_name, has_dir, name_ends_with, normalize_path, pre_validate, split_for, DialectParser,
    Draft, ParseOptions, Parsed,
};

const COMMAND_FIELDS: &[&str] = &["description", "prompt"];

const AGENT_FIELDS: &[&str] = &[
    "name",
    "description",
    "tools",
    "model",
    "temperature",
    "max_turns",
    "kind",
];

/// Parser for Gemini CLI TOML commands, sub-agents, and `GEMINI.md`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiParser;

fn type_from_path(path: &str) -> Option<ComponentType> {
    if name_ends_with(path, ".toml") {
        Some(ComponentType::Command)
    } else if has_dir(path, "agents") {
        Some(ComponentType::Agent)
    } else if file_name(path).eq_ignore_ascii_case("GEMINI.md") {
        Some(ComponentType::Memory)
    } else {
        None
    }
}

/// Whether a whole document is a TOML command with a `prompt` key.
fn looks_like_command(content: &str) -> bool {
    !content.trim_start().starts_with("---")
        && frontmatter::parse_toml_document(content).is_ok_and(|t| t.has("prompt"))
}

impl GeminiParser {
    fn parse_command(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let table = frontmatter::parse_toml_document(content)?;
        let prompt = table
            .str_field("prompt")
            .ok_or_else(|| SkillportError::parse("Gemini CLI: command is missing `prompt`"))?;
        let mut fields = Mapping::new();
        if let Some(description) = table.str_field("description") {
            fields.put_str("description", description);
        }
        for (key, value) in &table {
            if key.as_str().is_some_and(|k| !COMMAND_FIELDS.contains(&k)) {
                fields.insert(key.clone(), value.clone());
            }
        }
        let doc = Document {
            format: Some(FrontmatterFormat::Toml),
            fields,
            body: prompt.trim().to_string(),
        };
        let mut draft = Draft::new(AgentId::Gemini, ComponentType::Command, &doc, options, COMMAND_FIELDS);
        draft.spec.activation.mode = ActivationMode::Manual;
        draft.spec.invocation.slash_command = Some(format!("/{}", draft.spec.id));
        Ok(draft.finish())
    }
}

impl DialectParser for GeminiParser {
    fn agent(&self) -> AgentId {
        AgentId::Gemini
    }

    fn can_parse(&self, content: &str, filename: Option<&str>) -> bool {
        if let Some(path) = filename.map(normalize_path) {
            return has_dir(&path, ".gemini") || file_name(&path).eq_ignore_ascii_case("GEMINI.md");
        }
        if looks_like_command(content) {
            return true;
        }
        match frontmatter::split(content) {
            Ok(doc) => {
                doc.fields.has("temperature")
                    || doc.fields.has("max_turns")
                    || doc.body.contains("{{args}}")
            }
            Err(_) => false,
        }
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let path = options.source_file.as_deref().map(normalize_path);
        let path_type = path.as_deref().and_then(type_from_path);
        if path_type == Some(ComponentType::Command)
            || (path_type.is_none() && looks_like_command(content))
        {
            let pre = pre_validate(content, AgentId::Gemini, ComponentType::Command, options)?;
            let mut parsed = self.parse_command(content, options)?;
            parsed.warnings.extend(pre);
            return Ok(parsed);
        }

        let doc = split_for(AgentId::Gemini, content)?;
        let component_type = path_type.unwrap_or(if doc.has_frontmatter() {
            ComponentType::Agent
        } else {
            ComponentType::Memory
        });
        let pre = pre_validate(content, AgentId::Gemini, component_type, options)?;
        let f = &doc.fields;
        let mut draft = Draft::new(AgentId::Gemini, component_type, &doc, options, AGENT_FIELDS);
        draft.warnings.extend(pre);

        if component_type == ComponentType::Memory {
            draft.spec.activation.mode = ActivationMode::Auto;
            draft.spec.invocation.user_invocable = false;
            return Ok(draft.finish());
        }

        draft.spec.activation.mode = ActivationMode::Suggested;
        draft.spec.invocation.user_invocable = false;
        draft.spec.execution.context = ExecutionContext::Isolated;
        draft.spec.execution.allowed_tools = f.list_field("tools");
        draft.spec.execution.preferred_model = f.str_field("model").map(str::to_string);
        let ext = GeminiExtensions {
            temperature: f.f64_field("temperature"),
            max_turns: f.u64_field("max_turns").and_then(|n| u32::try_from(n).ok()),
        };
        if ext != GeminiExtensions::default() {
            draft.spec.metadata.extensions = AgentExtensions::Gemini(ext);
        }
        Ok(draft.finish())
    }
}
