use crate::agent::AgentId;
use crate::errors::Result;
use crate::frontmatter::{Document, FieldsExt};
use crate::models::{ActivationMode, AgentExtensions, ComponentType, CopilotExtensions};

use super::{
    file_name, has_dir, name_ends_with, normalize_path, pre_validate, split_for, DialectParser,
    Draft, ParseOptions, Parsed,
};

const KNOWN_FIELDS: &[&str] = &[
    "name",
    "description",
    "applyTo",
    "mode",
    "agent",
    "tools",
    "model",
    "argument-hint",
];

/// Chat modes a prompt file may run in.
pub const CHAT_MODES: &[&str] = &["ask", "edit", "agent"];

/// `applyTo` patterns that mean "every file".
const APPLY_ALL: &[&str] = &["**", "**/*", "*"];

/// Parser for Copilot instructions, prompt files, custom agents, and skills.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopilotParser;

fn type_from_path(path: &str) -> Option<ComponentType> {
    let name = file_name(path);
    if name_ends_with(path, ".instructions.md") {
        Some(ComponentType::Rule)
    } else if name_ends_with(path, ".prompt.md") {
        Some(ComponentType::Command)
    } else if name_ends_with(path, ".agent.md") || name_ends_with(path, ".chatmode.md") {
        Some(ComponentType::Agent)
    } else if name.eq_ignore_ascii_case("copilot-instructions.md") {
        Some(ComponentType::Memory)
    } else if name.eq_ignore_ascii_case("SKILL.md") || has_dir(path, "skills") {
        Some(ComponentType::Skill)
    } else {
        None
    }
}

fn type_from_shape(doc: &Document) -> ComponentType {
    let f = &doc.fields;
    if !doc.has_frontmatter() {
        ComponentType::Memory
    } else if f.has("applyTo") {
        ComponentType::Rule
    } else if f.has("mode") || f.has("agent") {
        ComponentType::Command
    } else if f.has("tools") {
        ComponentType::Agent
    } else {
        ComponentType::Rule
    }
}

/// Whether an `applyTo` value covers every file.
#[must_use]
pub fn applies_to_all(globs: &[String]) -> bool {
    globs.len() == 1 && APPLY_ALL.contains(&globs[0].as_str())
}

impl DialectParser for CopilotParser {
    fn agent(&self) -> AgentId {
        AgentId::Copilot
    }

    fn can_parse(&self, content: &str, filename: Option<&str>) -> bool {
        if let Some(path) = filename.map(normalize_path) {
            return (has_dir(&path, ".github") && type_from_path(&path).is_some())
                || name_ends_with(&path, ".instructions.md")
                || name_ends_with(&path, ".prompt.md")
                || name_ends_with(&path, ".agent.md")
                || name_ends_with(&path, ".chatmode.md");
        }
        match crate::frontmatter::split(content) {
            Ok(doc) => {
                doc.fields.has("applyTo")
                    || doc
                        .fields
                        .str_field("mode")
                        .is_some_and(|m| CHAT_MODES.contains(&m))
                    || doc.body.contains("${input:")
            }
            Err(_) => false,
        }
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let path = options.source_file.as_deref().map(normalize_path);
        let doc = split_for(AgentId::Copilot, content)?;
        let component_type = path
            .as_deref()
            .and_then(type_from_path)
            .unwrap_or_else(|| type_from_shape(&doc));
        let pre = pre_validate(content, AgentId::Copilot, component_type, options)?;
        let f = &doc.fields;
        let mut draft = Draft::new(AgentId::Copilot, component_type, &doc, options, KNOWN_FIELDS);
        draft.warnings.extend(pre);
        let id = draft.spec.id.clone();

        draft.spec.execution.preferred_model = f.str_field("model").map(str::to_string);
        draft.spec.invocation.argument_hint = f.str_field("argument-hint").map(str::to_string);
        if matches!(component_type, ComponentType::Command | ComponentType::Agent) {
            draft.spec.execution.allowed_tools = f.list_field("tools");
        }

        match component_type {
            ComponentType::Command | ComponentType::Agent => {
                draft.spec.activation.mode = ActivationMode::Manual;
                draft.spec.invocation.slash_command = Some(format!("/{id}"));
                let mode = f.str_field("agent").or_else(|| f.str_field("mode"));
                if let Some(mode) = mode.filter(|_| component_type == ComponentType::Command) {
                    if !CHAT_MODES.contains(&mode) {
                        draft.warn_enum("mode", mode, "agent");
                    }
                    draft.spec.metadata.extensions = AgentExtensions::Copilot(CopilotExtensions {
                        mode: Some(mode.to_string()),
                    });
                }
            }
            ComponentType::Skill => {
                draft.spec.activation.mode = ActivationMode::Suggested;
                draft.spec.invocation.slash_command = Some(format!("/{id}"));
            }
            ComponentType::Memory => {
                draft.spec.activation.mode = ActivationMode::Auto;
                draft.spec.invocation.user_invocable = false;
            }
            _ => {
                let globs = f.list_field("applyTo").unwrap_or_default();
                let mode = if applies_to_all(&globs) {
                    ActivationMode::Auto
                } else if globs.is_empty() {
                    ActivationMode::Manual
                } else {
                    ActivationMode::Contextual
                };
                draft.spec.activation.mode = mode;
                draft.spec.invocation.user_invocable = mode == ActivationMode::Manual;
                if mode == ActivationMode::Contextual {
                    draft.add_globs(globs);
                }
            }
        }
        Ok(draft.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str, path: Option<&str>) -> Parsed {
        let mut options = ParseOptions::for_agent(AgentId::Copilot);
        options.source_file = path.map(str::to_string);
        CopilotParser.parse(content, &options).unwrap()
    }

    #[test]
    fn instructions_with_globs() {
        let parsed = parse(
            "---\napplyTo: \"**/*.ts,**/*.tsx\"\ndescription: TS rules\n---\nUse strict types.",
            Some(".github/instructions/typescript.instructions.md"),
        );
        let spec = &parsed.spec;
        assert_eq!(spec.id, "typescript");
        assert_eq!(spec.component_type(), ComponentType::Rule);
        assert_eq!(spec.activation.mode, ActivationMode::Contextual);
        assert_eq!(spec.activation.globs(), vec!["**/*.ts", "**/*.tsx"]);
    }

    #[test]
    fn apply_to_everything_is_auto() {
        let parsed = parse("---\napplyTo: \"**\"\n---\nBe concise.", Some("general.instructions.md"));
        assert_eq!(parsed.spec.activation.mode, ActivationMode::Auto);
        assert!(parsed.spec.activation.triggers.is_empty());
    }

    #[test]
    fn prompt_file_with_mode_and_tools() {
        let parsed = parse(
            "---\nmode: agent\ndescription: Generate a React form\ntools: ['codebase', 'search']\nmodel: GPT-4o\n---\nForm for ${input:formName}.",
            Some(".github/prompts/react-form.prompt.md"),
        );
        let spec = &parsed.spec;
        assert_eq!(spec.component_type(), ComponentType::Command);
        assert_eq!(spec.id, "react-form");
        assert_eq!(spec.execution.allowed_tools.as_ref().unwrap().len(), 2);
        assert_eq!(spec.execution.preferred_model.as_deref(), Some("GPT-4o"));
        assert_eq!(
            spec.metadata.extensions.copilot().unwrap().mode.as_deref(),
            Some("agent")
        );
    }

    #[test]
    fn custom_agent_file() {
        let parsed = parse(
            "---\ndescription: Plans features\ntools: ['search']\n---\nYou plan.",
            Some(".github/agents/planner.agent.md"),
        );
        assert_eq!(parsed.spec.component_type(), ComponentType::Agent);
        assert_eq!(parsed.spec.id, "planner");
    }

    #[test]
    fn repository_instructions_are_memory() {
        let parsed = parse("Use conventional commits.", Some(".github/copilot-instructions.md"));
        assert_eq!(parsed.spec.component_type(), ComponentType::Memory);
        assert_eq!(parsed.spec.activation.mode, ActivationMode::Auto);
    }

    #[test]
    fn can_parse_markers() {
        assert!(CopilotParser.can_parse("", Some(".github/prompts/a.prompt.md")));
        assert!(CopilotParser.can_parse("", Some("x.instructions.md")));
        assert!(!CopilotParser.can_parse("", Some(".github/workflows/ci.yml")));
        assert!(CopilotParser.can_parse("---\napplyTo: '**'\n---\nx", None));
        assert!(CopilotParser.can_parse("---\nmode: ask\n---\nx", None));
        assert!(!CopilotParser.can_parse("---\nmode: fast\n---\nx", None));
    }
}
