use crate::agent::AgentId;
use crate::errors::Result;
use crate::frontmatter::{Document, FieldsExt};
use crate::hooks;
use crate::models::{ActivationMode, AgentExtensions, ComponentType, CursorExtensions};

use super::{
    file_name, has_dir, name_ends_with, normalize_path, pre_validate, split_for, Draft,
    DialectParser, ParseOptions, Parsed,
};

const KNOWN_FIELDS: &[&str] = &["description", "globs", "alwaysApply"];

/// Parser for Cursor `.mdc` rules, commands, `hooks.json`, and `.cursorrules`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CursorParser;

fn type_from_path(path: &str) -> Option<ComponentType> {
    let name = file_name(path);
    if name_ends_with(path, ".mdc") || (has_dir(path, ".cursor") && has_dir(path, "rules")) {
        Some(ComponentType::Rule)
    } else if has_dir(path, "commands") {
        Some(ComponentType::Command)
    } else if name.eq_ignore_ascii_case("hooks.json") {
        Some(ComponentType::Hook)
    } else if name.eq_ignore_ascii_case(".cursorrules") {
        Some(ComponentType::Memory)
    } else {
        None
    }
}

fn is_cursor_hooks(content: &str) -> bool {
    hooks::looks_like_hooks(content) && content.contains("\"version\"")
}

impl CursorParser {
    fn parse_hooks(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let bindings = hooks::parse_cursor(content)?;
        let (triggers, body) = hooks::to_ir(&bindings);
        let doc = Document {
            format: None,
            fields: serde_yaml_ng::Mapping::new(),
            body,
        };
        let mut draft = Draft::new(AgentId::Cursor, ComponentType::Hook, &doc, options, &[]);
        let events: Vec<&str> = bindings.iter().map(|b| b.event.as_str()).collect();
        draft.spec.intent = super::intent_from(&format!("Runs on {}.", events.join(", ")), "");
        draft.spec.activation.mode = ActivationMode::Hooked;
        draft.spec.activation.triggers = triggers;
        draft.spec.invocation.user_invocable = false;
        Ok(draft.finish())
    }
}

impl DialectParser for CursorParser {
    fn agent(&self) -> AgentId {
        AgentId::Cursor
    }

    fn can_parse(&self, content: &str, filename: Option<&str>) -> bool {
        if let Some(path) = filename.map(normalize_path) {
            return has_dir(&path, ".cursor")
                || name_ends_with(&path, ".mdc")
                || file_name(&path).eq_ignore_ascii_case(".cursorrules");
        }
        if is_cursor_hooks(content) {
            return true;
        }
        match crate::frontmatter::split(content) {
            Ok(doc) => {
                doc.fields.has("alwaysApply")
                    || (doc.fields.has("globs") && !doc.fields.has("trigger"))
            }
            Err(_) => false,
        }
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let path = options.source_file.as_deref().map(normalize_path);
        let path_type = path.as_deref().and_then(type_from_path);
        if path_type == Some(ComponentType::Hook) || (path_type.is_none() && is_cursor_hooks(content)) {
            let pre = pre_validate(content, AgentId::Cursor, ComponentType::Hook, options)?;
            let mut parsed = self.parse_hooks(content, options)?;
            parsed.warnings.extend(pre);
            return Ok(parsed);
        }

        let doc = split_for(AgentId::Cursor, content)?;
        let component_type = path_type.unwrap_or(if doc.has_frontmatter() {
            ComponentType::Rule
        } else {
            ComponentType::Memory
        });
        let pre = pre_validate(content, AgentId::Cursor, component_type, options)?;
        let f = &doc.fields;
        let mut draft = Draft::new(AgentId::Cursor, component_type, &doc, options, KNOWN_FIELDS);
        draft.warnings.extend(pre);

        let always_apply = f.bool_field("alwaysApply");
        let id = draft.spec.id.clone();
        match component_type {
            ComponentType::Command => {
                draft.spec.activation.mode = ActivationMode::Manual;
                draft.spec.invocation.slash_command = Some(format!("/{id}"));
            }
            ComponentType::Memory => {
                draft.spec.activation.mode = ActivationMode::Auto;
                draft.spec.invocation.user_invocable = false;
            }
            _ => {
                let globs = f.list_field("globs").unwrap_or_default();
                let mode = if always_apply == Some(true) {
                    ActivationMode::Auto
                } else if !globs.is_empty() {
                    ActivationMode::Contextual
                } else if !draft.spec.intent.purpose.is_empty() {
                    ActivationMode::Suggested
                } else {
                    ActivationMode::Manual
                };
                draft.spec.activation.mode = mode;
                // Manual rules are attached with an @-mention.
                draft.spec.invocation.user_invocable = mode == ActivationMode::Manual;
                draft.add_globs(globs);
            }
        }

        if always_apply.is_some() {
            draft.spec.metadata.extensions =
                AgentExtensions::Cursor(CursorExtensions { always_apply });
        }
        Ok(draft.finish())
    }
}
