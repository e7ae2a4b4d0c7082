use crate::agent::AgentId;
use crate::diagnostics::P005;
use crate::errors::Result;
use crate::frontmatter::{Document, FieldsExt};
use crate::models::{
    ActivationMode, AgentExtensions, ComponentType, WindsurfExtensions, WindsurfTrigger,
};

use super::{
    file_name, has_dir, normalize_path, pre_validate, split_for, DialectParser, Draft,
    ParseOptions, Parsed,
};

const KNOWN_FIELDS: &[&str] = &[
    "name",
    "description",
    "trigger",
    "globs",
    "auto_execution_mode",
];

/// Highest `auto_execution_mode` Windsurf accepts.
pub const MAX_AUTO_EXECUTION_MODE: u64 = 3;

/// Parser for Windsurf rules, workflows, skills, and `.windsurfrules`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindsurfParser;

fn type_from_path(path: &str) -> Option<ComponentType> {
    let name = file_name(path);
    if name.eq_ignore_ascii_case("SKILL.md") || has_dir(path, "skills") {
        Some(ComponentType::Skill)
    } else if has_dir(path, "workflows") {
        Some(ComponentType::Workflow)
    } else if has_dir(path, "rules") {
        Some(ComponentType::Rule)
    } else if name.eq_ignore_ascii_case(".windsurfrules") || name.eq_ignore_ascii_case("global_rules.md") {
        Some(ComponentType::Memory)
    } else {
        None
    }
}

fn type_from_shape(doc: &Document) -> ComponentType {
    let f = &doc.fields;
    if !doc.has_frontmatter() {
        ComponentType::Memory
    } else if f.has("trigger") {
        ComponentType::Rule
    } else if f.has("auto_execution_mode") {
        ComponentType::Workflow
    } else if f.has("name") {
        ComponentType::Skill
    } else {
        ComponentType::Rule
    }
}

/// Pre-1.10 trigger spellings.
#[must_use]
pub fn legacy_trigger(raw: &str) -> Option<WindsurfTrigger> {
    match raw {
        "always" => Some(WindsurfTrigger::AlwaysOn),
        "model" | "agent_requested" => Some(WindsurfTrigger::ModelDecision),
        "globs" => Some(WindsurfTrigger::Glob),
        _ => None,
    }
}

/// Activation mode for a workflow's `auto_execution_mode`.
#[must_use]
pub fn workflow_mode(auto_execution_mode: u8) -> ActivationMode {
    match auto_execution_mode {
        3 => ActivationMode::Auto,
        2 => ActivationMode::Suggested,
        _ => ActivationMode::Manual,
    }
}

impl DialectParser for WindsurfParser {
    fn agent(&self) -> AgentId {
        AgentId::Windsurf
    }

    fn can_parse(&self, content: &str, filename: Option<&str>) -> bool {
        if let Some(path) = filename.map(normalize_path) {
            let name = file_name(&path);
            return has_dir(&path, ".windsurf")
                || name.eq_ignore_ascii_case(".windsurfrules")
                || name.eq_ignore_ascii_case("global_rules.md");
        }
        match crate::frontmatter::split(content) {
            Ok(doc) => doc.fields.has("trigger") || doc.fields.has("auto_execution_mode"),
            Err(_) => false,
        }
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let path = options.source_file.as_deref().map(normalize_path);
        let doc = split_for(AgentId::Windsurf, content)?;
        let component_type = path
            .as_deref()
            .and_then(type_from_path)
            .unwrap_or_else(|| type_from_shape(&doc));
        let pre = pre_validate(content, AgentId::Windsurf, component_type, options)?;
        let f = &doc.fields;
        let mut draft = Draft::new(AgentId::Windsurf, component_type, &doc, options, KNOWN_FIELDS);
        draft.warnings.extend(pre);
        let id = draft.spec.id.clone();
        let mut ext = WindsurfExtensions::default();

        match component_type {
            ComponentType::Workflow => {
                let raw = f.u64_field("auto_execution_mode");
                let level = match raw {
                    Some(n) if n <= MAX_AUTO_EXECUTION_MODE => u8::try_from(n).ok(),
                    Some(n) => {
                        draft.warn_enum("auto_execution_mode", &n.to_string(), "manual");
                        None
                    }
                    None => None,
                };
                ext.auto_execution_mode = level;
                draft.spec.activation.mode = level.map_or(ActivationMode::Manual, workflow_mode);
                if draft.spec.activation.mode == ActivationMode::Manual && level.is_some() {
                    draft.spec.activation.requires_confirmation = Some(true);
                }
                draft.spec.invocation.slash_command = Some(format!("/{id}"));
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
                let globs = f.list_field("globs").unwrap_or_default();
                let trigger = match f.str_field("trigger") {
                    None => None,
                    Some(raw) => match WindsurfTrigger::parse(raw) {
                        Some(t) => Some(t),
                        None => match legacy_trigger(raw) {
                            Some(t) => {
                                draft.warn(
                                    P005,
                                    format!("legacy trigger '{raw}' read as '{}'", t.as_str()),
                                    "trigger",
                                );
                                Some(t)
                            }
                            None => {
                                draft.warn_enum("trigger", raw, "manual");
                                None
                            }
                        },
                    },
                };
                let mode = match trigger {
                    Some(WindsurfTrigger::AlwaysOn) => ActivationMode::Auto,
                    Some(WindsurfTrigger::ModelDecision) => ActivationMode::Suggested,
                    Some(WindsurfTrigger::Glob) => ActivationMode::Contextual,
                    Some(WindsurfTrigger::Manual) => ActivationMode::Manual,
                    None if !globs.is_empty() => ActivationMode::Contextual,
                    None => ActivationMode::Manual,
                };
                ext.trigger = trigger;
                draft.spec.activation.mode = mode;
                draft.spec.invocation.user_invocable = mode == ActivationMode::Manual;
                draft.add_globs(globs);
            }
        }

        if ext != WindsurfExtensions::default() {
            draft.spec.metadata.extensions = AgentExtensions::Windsurf(ext);
        }
        Ok(draft.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str, path: Option<&str>) -> Parsed {
        let mut options = ParseOptions::for_agent(AgentId::Windsurf);
        options.source_file = path.map(str::to_string);
        WindsurfParser.parse(content, &options).unwrap()
    }

    #[test]
    fn trigger_values_map_to_modes() {
        for (trigger, mode) in [
            ("always_on", ActivationMode::Auto),
            ("model_decision", ActivationMode::Suggested),
            ("glob", ActivationMode::Contextual),
            ("manual", ActivationMode::Manual),
        ] {
            let parsed = parse(&format!("---\ntrigger: {trigger}\n---\nBody"), None);
            assert_eq!(parsed.spec.activation.mode, mode, "{trigger}");
            assert_eq!(parsed.spec.component_type(), ComponentType::Rule);
        }
    }

    #[test]
    fn glob_rule_keeps_patterns() {
        let parsed = parse(
            "---\ntrigger: glob\nglobs: \"**/*.py\"\ndescription: Python style\n---\nUse black.",
            Some(".windsurf/rules/python.md"),
        );
        assert_eq!(parsed.spec.activation.globs(), vec!["**/*.py"]);
        assert_eq!(
            parsed.spec.metadata.extensions.windsurf().unwrap().trigger,
            Some(WindsurfTrigger::Glob)
        );
    }

    #[test]
    fn legacy_trigger_accepted_with_warning() {
        let parsed = parse("---\ntrigger: always\n---\nBody", None);
        assert_eq!(parsed.spec.activation.mode, ActivationMode::Auto);
        assert!(parsed.warnings.iter().any(|w| w.code == P005));
    }

    #[test]
    fn workflow_auto_execution_modes() {
        let manual = parse(
            "---\ndescription: Release\nauto_execution_mode: 1\n---\n1. Tag",
            Some(".windsurf/workflows/release.md"),
        );
        assert_eq!(manual.spec.component_type(), ComponentType::Workflow);
        assert_eq!(manual.spec.activation.mode, ActivationMode::Manual);
        assert_eq!(manual.spec.activation.requires_confirmation, Some(true));
        assert_eq!(manual.spec.invocation.slash_command.as_deref(), Some("/release"));

        let auto = parse("---\ndescription: x\nauto_execution_mode: 3\n---\nSteps", None);
        assert_eq!(auto.spec.component_type(), ComponentType::Workflow);
        assert_eq!(auto.spec.activation.mode, ActivationMode::Auto);
    }

    #[test]
    fn out_of_range_execution_mode_warns() {
        let parsed = parse("---\ndescription: x\nauto_execution_mode: 9\n---\nSteps", None);
        assert_eq!(parsed.spec.activation.mode, ActivationMode::Manual);
        assert!(parsed.warnings.iter().any(|w| w.code == P005));
    }

    #[test]
    fn skill_from_path() {
        let parsed = parse(
            "---\nname: db-migrate\ndescription: Run migrations\n---\nSteps.",
            Some(".windsurf/skills/db-migrate/SKILL.md"),
        );
        assert_eq!(parsed.spec.component_type(), ComponentType::Skill);
        assert_eq!(parsed.spec.activation.mode, ActivationMode::Suggested);
    }

    #[test]
    fn windsurfrules_is_memory() {
        let parsed = parse("Prefer small PRs.", Some(".windsurfrules"));
        assert_eq!(parsed.spec.component_type(), ComponentType::Memory);
    }

    #[test]
    fn can_parse_markers() {
        assert!(WindsurfParser.can_parse("", Some(".windsurf/rules/a.md")));
        assert!(WindsurfParser.can_parse("---\ntrigger: manual\n---\nx", None));
        assert!(WindsurfParser.can_parse("---\nauto_execution_mode: 2\n---\nx", None));
        assert!(!WindsurfParser.can_parse("---\nname: x\n---\nx", None));
    }
}
