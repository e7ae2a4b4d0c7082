use crate::agent::AgentId;
use crate::errors::Result;
use crate::frontmatter::{Document, FieldsExt};
use crate::hooks::{self, HookKind};
use crate::models::{
    ActivationMode, AgentExtensions, ClaudeExtensions, ComponentType, ExecutionContext,
    PermissionMode, SafetyLevel,
};

use super::{
    file_name, has_dir, normalize_path, pre_validate, split_for, Draft, DialectParser,
    ParseOptions, Parsed,
};

const KNOWN_FIELDS: &[&str] = &[
    "name",
    "description",
    "allowed-tools",
    "tools",
    "model",
    "argument-hint",
    "disable-model-invocation",
    "user-invocable",
    "context",
    "agent",
    "color",
    "permissionMode",
    "paths",
    "license",
    "metadata",
    "compatibility",
    "version",
];

/// Frontmatter keys only Claude Code uses.
const MARKER_FIELDS: &[&str] = &[
    "allowed-tools",
    "argument-hint",
    "disable-model-invocation",
    "user-invocable",
    "context",
    "permissionMode",
    "paths",
];

/// Parser for Claude Code skills, commands, sub-agents, rules, memory, and hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClaudeParser;

fn type_from_path(path: &str) -> Option<ComponentType> {
    let name = file_name(path);
    if name.eq_ignore_ascii_case("SKILL.md") || has_dir(path, "skills") {
        Some(ComponentType::Skill)
    } else if has_dir(path, "commands") {
        Some(ComponentType::Command)
    } else if has_dir(path, "agents") {
        Some(ComponentType::Agent)
    } else if has_dir(path, "rules") {
        Some(ComponentType::Rule)
    } else if name.eq_ignore_ascii_case("CLAUDE.md") || name.eq_ignore_ascii_case("CLAUDE.local.md") {
        Some(ComponentType::Memory)
    } else if name.to_ascii_lowercase().ends_with(".json") {
        Some(ComponentType::Hook)
    } else {
        None
    }
}

fn type_from_shape(doc: &Document) -> ComponentType {
    let f = &doc.fields;
    if !doc.has_frontmatter() {
        ComponentType::Memory
    } else if f.has("paths") {
        ComponentType::Rule
    } else if f.has("tools") || f.has("color") || f.has("permissionMode") {
        ComponentType::Agent
    } else if f.has("name") {
        ComponentType::Skill
    } else {
        ComponentType::Command
    }
}

impl ClaudeParser {
    fn parse_hooks(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let bindings = hooks::parse_claude(content)?;
        let (triggers, body) = hooks::to_ir(&bindings);
        let events: Vec<&str> = bindings.iter().map(|b| b.event.as_str()).collect();
        let doc = Document {
            format: None,
            fields: serde_yaml_ng::Mapping::new(),
            body,
        };
        let mut draft = Draft::new(
            AgentId::Claude,
            ComponentType::Hook,
            &doc,
            options,
            KNOWN_FIELDS,
        );
        let description = format!("Runs on {}.", events.join(", "));
        draft.spec.intent = super::intent_from(&description, "");
        draft.spec.activation.mode = ActivationMode::Hooked;
        draft.spec.activation.triggers = triggers;
        draft.spec.invocation.user_invocable = false;
        draft.spec.metadata.extensions = AgentExtensions::Claude(ClaudeExtensions {
            hook_kind: bindings.first().map(|b| b.kind).filter(|k| *k != HookKind::Command),
            hook_timeout: bindings.iter().find_map(|b| b.timeout),
            ..ClaudeExtensions::default()
        });
        Ok(draft.finish())
    }
}

impl DialectParser for ClaudeParser {
    fn agent(&self) -> AgentId {
        AgentId::Claude
    }

    fn can_parse(&self, content: &str, filename: Option<&str>) -> bool {
        if let Some(path) = filename.map(normalize_path) {
            let name = file_name(&path);
            return has_dir(&path, ".claude")
                || name.eq_ignore_ascii_case("CLAUDE.md")
                || name.eq_ignore_ascii_case("CLAUDE.local.md");
        }
        if hooks::looks_like_hooks(content) {
            return !content.contains("\"version\"");
        }
        match crate::frontmatter::split(content) {
            Ok(doc) if doc.format == Some(crate::frontmatter::FrontmatterFormat::Yaml) => {
                MARKER_FIELDS.iter().any(|k| doc.fields.has(k))
                    || (doc.fields.has("name") && doc.fields.has("description"))
            }
            _ => false,
        }
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<Parsed> {
        let path = options.source_file.as_deref().map(normalize_path);
        let path_type = path.as_deref().and_then(type_from_path);
        if path_type == Some(ComponentType::Hook)
            || (path_type.is_none() && hooks::looks_like_hooks(content))
        {
            let pre = pre_validate(content, AgentId::Claude, ComponentType::Hook, options)?;
            let mut parsed = self.parse_hooks(content, options)?;
            parsed.warnings.extend(pre);
            return Ok(parsed);
        }

        let doc = split_for(AgentId::Claude, content)?;
        let component_type = path_type.unwrap_or_else(|| type_from_shape(&doc));
        let pre = pre_validate(content, AgentId::Claude, component_type, options)?;
        let f = &doc.fields;
        let mut draft = Draft::new(AgentId::Claude, component_type, &doc, options, KNOWN_FIELDS);
        draft.warnings.extend(pre);

        let tools_key = if component_type == ComponentType::Agent {
            "tools"
        } else {
            "allowed-tools"
        };
        draft.spec.execution.allowed_tools = f.list_field(tools_key);
        draft.spec.execution.preferred_model = f.str_field("model").map(str::to_string);
        draft.spec.execution.sub_agent = f.str_field("agent").map(str::to_string);
        draft.spec.invocation.argument_hint = f.str_field("argument-hint").map(str::to_string);

        match f.str_field("context") {
            None => {}
            Some("fork") => draft.spec.execution.context = ExecutionContext::Fork,
            Some(other) => draft.warn_enum("context", other, "main"),
        }

        let disable_model = f.bool_field("disable-model-invocation");
        let id = draft.spec.id.clone();
        let activation = &mut draft.spec.activation;
        let invocation = &mut draft.spec.invocation;
        match component_type {
            ComponentType::Skill => {
                activation.mode = if disable_model == Some(true) {
                    ActivationMode::Manual
                } else {
                    ActivationMode::Suggested
                };
                invocation.user_invocable = f.bool_field("user-invocable").unwrap_or(true);
            }
            ComponentType::Command | ComponentType::Workflow => {
                activation.mode = ActivationMode::Manual;
                invocation.user_invocable = true;
            }
            ComponentType::Agent => {
                activation.mode = ActivationMode::Suggested;
                invocation.user_invocable = false;
                draft.spec.execution.context = ExecutionContext::Isolated;
            }
            ComponentType::Rule => {
                invocation.user_invocable = false;
                let globs = f.list_field("paths").unwrap_or_default();
                activation.mode = if globs.is_empty() {
                    ActivationMode::Auto
                } else {
                    ActivationMode::Contextual
                };
                draft.add_globs(globs);
            }
            ComponentType::Memory | ComponentType::Config => {
                activation.mode = ActivationMode::Auto;
                invocation.user_invocable = false;
            }
            ComponentType::Hook => {
                activation.mode = ActivationMode::Hooked;
                invocation.user_invocable = false;
            }
        }
        if draft.spec.invocation.user_invocable {
            draft.spec.invocation.slash_command = Some(format!("/{id}"));
        }

        let permission_mode = match f.str_field("permissionMode") {
            None => None,
            Some(raw) => {
                let parsed = PermissionMode::parse(raw);
                if parsed.is_none() {
                    draft.warn_enum("permissionMode", raw, "default");
                }
                parsed
            }
        };
        draft.explicit_safety = match permission_mode {
            Some(PermissionMode::BypassPermissions) => Some(SafetyLevel::Dangerous),
            Some(PermissionMode::AcceptEdits) => Some(SafetyLevel::Sensitive),
            Some(PermissionMode::Plan) => Some(SafetyLevel::Safe),
            Some(PermissionMode::Default) | None => None,
        };

        let ext = ClaudeExtensions {
            color: f.str_field("color").map(str::to_string),
            permission_mode,
            disable_model_invocation: disable_model,
            ..ClaudeExtensions::default()
        };
        if ext != ClaudeExtensions::default() {
            draft.spec.metadata.extensions = AgentExtensions::Claude(ext);
        }

        Ok(draft.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{P001, P002, P005};
    use crate::models::Trigger;

    fn parse(content: &str, path: Option<&str>) -> Parsed {
        let mut options = ParseOptions::for_agent(AgentId::Claude);
        options.source_file = path.map(str::to_string);
        ClaudeParser.parse(content, &options).unwrap()
    }

    #[test]
    fn skill_with_fork_context() {
        let parsed = parse(
            "---\nname: test-skill\ndescription: A test skill\ncontext: fork\n---\n\nBody.",
            None,
        );
        let spec = &parsed.spec;
        assert_eq!(spec.id, "test-skill");
        assert_eq!(spec.component_type(), ComponentType::Skill);
        assert_eq!(spec.execution.context, ExecutionContext::Fork);
        assert_eq!(spec.activation.mode, ActivationMode::Suggested);
        assert_eq!(spec.body, "Body.");
        assert_eq!(spec.intent.summary, "A test skill");
        assert!(parsed.warnings.iter().any(|w| w.code == P001));
    }

    #[test]
    fn skill_tools_and_disabled_model_invocation() {
        let parsed = parse(
            "---\nname: deploy\ndescription: Deploy the app. Use when releasing.\nallowed-tools: Bash, Read\ndisable-model-invocation: true\n---\nRun the deploy script.",
            Some(".claude/skills/deploy/SKILL.md"),
        );
        let spec = &parsed.spec;
        assert_eq!(spec.activation.mode, ActivationMode::Manual);
        assert_eq!(
            spec.execution.allowed_tools.as_deref(),
            Some(&["Bash".to_string(), "Read".to_string()][..])
        );
        assert!(spec.capabilities.needs_shell);
        assert_eq!(spec.intent.when_to_use.as_deref(), Some("Use when releasing."));
        assert!(parsed.warnings.iter().any(|w| w.code == P002));
        assert_eq!(spec.activation.safety_level, SafetyLevel::Sensitive);
    }

    #[test]
    fn command_from_path() {
        let parsed = parse(
            "---\ndescription: Fix an issue\nargument-hint: [issue-number]\n---\nFix issue #$ARGUMENTS.",
            Some(".claude/commands/fix-issue.md"),
        );
        let spec = &parsed.spec;
        assert_eq!(spec.component_type(), ComponentType::Command);
        assert_eq!(spec.id, "fix-issue");
        assert_eq!(spec.invocation.slash_command.as_deref(), Some("/fix-issue"));
        assert_eq!(spec.invocation.argument_hint.as_deref(), Some("[issue-number]"));
        assert_eq!(spec.activation.mode, ActivationMode::Manual);
    }

    #[test]
    fn agent_is_isolated_with_permission_mode() {
        let parsed = parse(
            "---\nname: reviewer\ndescription: Reviews code\ntools: Read, Grep\nmodel: sonnet\ncolor: blue\npermissionMode: bypassPermissions\n---\nYou review code.",
            None,
        );
        let spec = &parsed.spec;
        assert_eq!(spec.component_type(), ComponentType::Agent);
        assert_eq!(spec.execution.context, ExecutionContext::Isolated);
        assert_eq!(spec.execution.preferred_model.as_deref(), Some("sonnet"));
        assert_eq!(spec.activation.safety_level, SafetyLevel::Dangerous);
        let ext = spec.metadata.extensions.claude().unwrap();
        assert_eq!(ext.color.as_deref(), Some("blue"));
        assert!(!spec.invocation.user_invocable);
    }

    #[test]
    fn rule_paths_become_globs() {
        let parsed = parse(
            "---\npaths:\n  - \"src/**/*.ts\"\n---\nUse strict mode.",
            Some(".claude/rules/typescript.md"),
        );
        let spec = &parsed.spec;
        assert_eq!(spec.component_type(), ComponentType::Rule);
        assert_eq!(spec.activation.mode, ActivationMode::Contextual);
        assert_eq!(spec.activation.globs(), vec!["src/**/*.ts"]);
    }

    #[test]
    fn memory_without_frontmatter() {
        let parsed = parse("# Project\n\nUse pnpm.", Some("CLAUDE.md"));
        assert_eq!(parsed.spec.component_type(), ComponentType::Memory);
        assert_eq!(parsed.spec.activation.mode, ActivationMode::Auto);
        assert_eq!(parsed.spec.intent.summary, "Project");
    }

    #[test]
    fn hooks_json_parsed() {
        let parsed = parse(
            r#"{"hooks":{"PreToolUse":[{"matcher":"Bash","hooks":[{"type":"command","command":"./audit.sh","timeout":20}]}]}}"#,
            Some(".claude/hooks.json"),
        );
        let spec = &parsed.spec;
        assert_eq!(spec.component_type(), ComponentType::Hook);
        assert_eq!(spec.activation.mode, ActivationMode::Hooked);
        assert_eq!(spec.body, "./audit.sh");
        assert_eq!(
            spec.activation.triggers,
            vec![Trigger::Event {
                event: "PreToolUse".into(),
                matcher: Some("Bash".into())
            }]
        );
        assert_eq!(spec.metadata.extensions.claude().unwrap().hook_timeout, Some(20.0));
    }

    #[test]
    fn unknown_context_defaults_with_warning() {
        let parsed = parse("---\nname: x\ndescription: y\ncontext: thread\n---\nBody", None);
        assert_eq!(parsed.spec.execution.context, ExecutionContext::Main);
        assert!(parsed.warnings.iter().any(|w| w.code == P005));
    }

    #[test]
    fn empty_content_is_error() {
        let options = ParseOptions::for_agent(AgentId::Claude);
        assert!(ClaudeParser.parse("", &options).is_err());
        assert!(ClaudeParser.parse("   \n", &options).is_err());
        assert!(ClaudeParser.parse("---\nname: [x\n---\nBody", &options).is_err());
    }

    #[test]
    fn can_parse_by_path_and_content() {
        assert!(ClaudeParser.can_parse("", Some(".claude/commands/x.md")));
        assert!(!ClaudeParser.can_parse("", Some(".cursor/rules/x.mdc")));
        assert!(ClaudeParser.can_parse("---\nname: a\ndescription: b\n---\n", None));
        assert!(ClaudeParser.can_parse("---\nallowed-tools: Bash\n---\n", None));
        assert!(!ClaudeParser.can_parse("---\ntrigger: always_on\n---\n", None));
        assert!(!ClaudeParser.can_parse("---\ndescription = \"x\"\n---\n", None));
    }
}
