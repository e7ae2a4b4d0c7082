use serde_yaml_ng::Mapping;

use crate::agent::AgentId;
use crate::errors::{Result, SkillportError};
use crate::frontmatter::FrontmatterFormat;
use crate::hooks;
use crate::models::{
    ActivationMode, ComponentSpec, ComponentType, ExecutionContext, PermissionMode, SafetyLevel,
};

use super::{put, DialectRenderer, RenderOptions, Rendered, Session, Support};

/// Renderer for Claude Code.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClaudeRenderer;

fn permission_safety(mode: PermissionMode) -> Option<SafetyLevel> {
    match mode {
        PermissionMode::Plan => Some(SafetyLevel::Safe),
        PermissionMode::AcceptEdits => Some(SafetyLevel::Sensitive),
        PermissionMode::BypassPermissions => Some(SafetyLevel::Dangerous),
        PermissionMode::Default => None,
    }
}

impl ClaudeRenderer {
    fn skill(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[ActivationMode::Suggested, ActivationMode::Manual],
            contexts: &[ExecutionContext::Fork],
            tools: true,
            model: true,
            sub_agent: true,
            argument_hint: true,
            ..Support::NONE
        });
        let mut f = Mapping::new();
        put(&mut f, "name", spec.id.as_str());
        let description = s.required_description();
        put(&mut f, "description", description);
        Self::execution_fields(spec, &mut f, "allowed-tools");
        if spec.activation.mode == ActivationMode::Manual {
            put(&mut f, "disable-model-invocation", true);
        }
        if !spec.invocation.user_invocable {
            put(&mut f, "user-invocable", false);
        }
        s.document(FrontmatterFormat::Yaml, f)
    }

    fn command(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[ActivationMode::Manual],
            contexts: &[ExecutionContext::Fork],
            tools: true,
            model: true,
            sub_agent: true,
            argument_hint: true,
            ..Support::NONE
        });
        let mut f = Mapping::new();
        if let Some(description) = s.authored_description() {
            put(&mut f, "description", description);
        }
        Self::execution_fields(spec, &mut f, "allowed-tools");
        s.document(FrontmatterFormat::Yaml, f)
    }

    fn agent(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        let ext = spec.metadata.extensions.claude();
        let permission_mode = ext.and_then(|e| e.permission_mode);
        s.check(&Support {
            modes: &[ActivationMode::Suggested],
            contexts: &[ExecutionContext::Isolated],
            tools: true,
            model: true,
            safety: permission_mode.and_then(permission_safety),
            ..Support::NONE
        });
        let mut f = Mapping::new();
        put(&mut f, "name", spec.id.as_str());
        let description = s.required_description();
        put(&mut f, "description", description);
        if let Some(tools) = &spec.execution.allowed_tools {
            put(&mut f, "tools", tools.join(", "));
        }
        if let Some(model) = &spec.execution.preferred_model {
            put(&mut f, "model", model.as_str());
        }
        if let Some(color) = ext.and_then(|e| e.color.as_deref()) {
            put(&mut f, "color", color);
        }
        if let Some(mode) = permission_mode {
            put(&mut f, "permissionMode", mode.as_str());
        }
        s.document(FrontmatterFormat::Yaml, f)
    }

    fn rule(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[ActivationMode::Auto, ActivationMode::Contextual],
            ..Support::NONE
        });
        let mut f = Mapping::new();
        if let Some(description) = s.authored_description() {
            put(&mut f, "description", description);
        }
        let globs: Vec<String> = spec
            .activation
            .globs()
            .into_iter()
            .map(str::to_string)
            .collect();
        if spec.activation.mode == ActivationMode::Contextual && !globs.is_empty() {
            put(&mut f, "paths", globs);
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

    fn hooks(s: &mut Session<'_>) -> Result<String> {
        s.check(&Support {
            modes: &[ActivationMode::Hooked],
            ..Support::NONE
        });
        let ext = s.spec.metadata.extensions.claude();
        let kind = ext.and_then(|e| e.hook_kind).unwrap_or_default();
        let timeout = ext.and_then(|e| e.hook_timeout);
        let bindings = hooks::from_ir(&s.spec.activation.triggers, &s.body, kind, timeout);
        if bindings.is_empty() {
            return Err(SkillportError::render("hook has no event triggers"));
        }
        hooks::render_claude(&bindings)
    }

    /// Fields shared by skills and commands.
    fn execution_fields(spec: &ComponentSpec, f: &mut Mapping, tools_key: &str) {
        if let Some(hint) = &spec.invocation.argument_hint {
            put(f, "argument-hint", hint.as_str());
        }
        if let Some(tools) = &spec.execution.allowed_tools {
            put(f, tools_key, tools.join(", "));
        }
        if let Some(model) = &spec.execution.preferred_model {
            put(f, "model", model.as_str());
        }
        if spec.execution.context == ExecutionContext::Fork {
            put(f, "context", "fork");
        }
        if let Some(agent) = &spec.execution.sub_agent {
            put(f, "agent", agent.as_str());
        }
    }
}

impl DialectRenderer for ClaudeRenderer {
    fn agent(&self) -> AgentId {
        AgentId::Claude
    }

    fn base_score(&self) -> u8 {
        100
    }

    fn target_type(&self, component_type: ComponentType) -> ComponentType {
        match component_type {
            ComponentType::Workflow => ComponentType::Command,
            ComponentType::Config => ComponentType::Memory,
            other => other,
        }
    }

    fn target_directory(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Skill => format!(".claude/skills/{}", spec.id),
            ComponentType::Command => ".claude/commands".to_string(),
            ComponentType::Agent => ".claude/agents".to_string(),
            ComponentType::Rule => ".claude/rules".to_string(),
            ComponentType::Hook => ".claude".to_string(),
            _ => ".".to_string(),
        }
    }

    fn target_filename(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Skill => "SKILL.md".to_string(),
            ComponentType::Hook => "hooks.json".to_string(),
            ComponentType::Memory => "CLAUDE.md".to_string(),
            _ => format!("{}.md", spec.id),
        }
    }

    fn render(&self, spec: &ComponentSpec, options: &RenderOptions) -> Result<Rendered> {
        let mut s = Session::start(self, spec, options)?;
        let content = match s.target_type {
            ComponentType::Skill => Self::skill(&mut s)?,
            ComponentType::Command => Self::command(&mut s)?,
            ComponentType::Agent => Self::agent(&mut s)?,
            ComponentType::Rule => Self::rule(&mut s)?,
            ComponentType::Hook => Self::hooks(&mut s)?,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderers::test_support::*;
    use crate::report::LossSeverity;

    fn render(spec: &ComponentSpec) -> Rendered {
        ClaudeRenderer.render(spec, &RenderOptions::default()).unwrap()
    }

    #[test]
    fn skill_round_trip_is_lossless() {
        let spec = parse(AgentId::Claude, CLAUDE_SKILL, ".claude/skills/code-review/SKILL.md");
        let out = render(&spec);
        assert_eq!(out.path(), ".claude/skills/code-review/SKILL.md");
        assert!(out.content.starts_with("---\nname: code-review\n"));
        assert!(out.content.contains("allowed-tools: Read, Grep"));
        assert!(out.content.contains("Review $ARGUMENTS carefully."));
        assert!(out.report.losses.is_empty(), "{:?}", out.report.losses);
        assert_eq!(out.report.fidelity_score, 100);
    }

    #[test]
    fn fork_context_is_native() {
        let spec = parse(AgentId::Claude, CLAUDE_FORK_SKILL, ".claude/skills/test-skill/SKILL.md");
        let out = render(&spec);
        assert!(out.content.contains("context: fork"));
        assert!(out.report.losses.is_empty());
    }

    #[test]
    fn gemini_placeholders_become_claude_syntax() {
        let spec = parse(
            AgentId::Gemini,
            "description = \"Plan\"\nprompt = \"Plan {{args}}. Status: !{git status}\"\n",
            ".gemini/commands/plan.toml",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".claude/commands/plan.md");
        assert!(out.content.contains("Plan $ARGUMENTS. Status: !`git status`"));
        assert!(out.content.contains("description: Plan"));
    }

    #[test]
    fn gemini_agent_keeps_tools_and_loses_temperature() {
        let spec = parse(
            AgentId::Gemini,
            "---\nname: auditor\ndescription: Audits code\ntools:\n  - read_file\ntemperature: 0.2\n---\nAudit.",
            ".gemini/agents/auditor.md",
        );
        let out = render(&spec);
        assert_eq!(out.directory, ".claude/agents");
        assert!(out.content.contains("tools: read_file"));
        assert_eq!(out.report.losses.len(), 1);
        assert_eq!(out.report.losses[0].category, "extensions");
        assert_eq!(out.report.losses[0].severity, LossSeverity::Info);
    }

    #[test]
    fn cursor_hooks_render_as_claude_fragment() {
        let spec = parse(
            AgentId::Cursor,
            r#"{"version":1,"hooks":{"beforeShellExecution":[{"command":"./guard.sh"}]}}"#,
            ".cursor/hooks.json",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".claude/hooks.json");
        let value: serde_json::Value = serde_json::from_str(&out.content).unwrap();
        assert_eq!(value["hooks"]["PreToolUse"][0]["matcher"], "Bash");
        assert_eq!(value["hooks"]["PreToolUse"][0]["hooks"][0]["command"], "./guard.sh");
    }

    #[test]
    fn windsurf_workflow_projects_to_command() {
        let spec = parse(
            AgentId::Windsurf,
            "---\ndescription: Release\n---\n1. Tag the release",
            ".windsurf/workflows/release.md",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".claude/commands/release.md");
        let projection = &out.report.losses[0];
        assert_eq!(projection.category, "component-type");
        assert_eq!(projection.severity, LossSeverity::Info);
    }

    #[test]
    fn cursor_glob_rule_becomes_paths() {
        let spec = parse(
            AgentId::Cursor,
            "---\ndescription: TS rules\nglobs: src/**/*.ts\nalwaysApply: false\n---\nUse strict mode.",
            ".cursor/rules/ts.mdc",
        );
        let out = render(&spec);
        assert!(out.content.contains("paths:\n- src/**/*.ts"));
        assert!(out.report.losses.is_empty());
    }

    #[test]
    fn codex_config_becomes_fenced_memory() {
        let spec = parse(
            AgentId::Codex,
            "model = \"o3\"\n\n[shell_environment_policy]\ninherit = \"core\"\n",
            ".codex/config.toml",
        );
        let out = render(&spec);
        assert_eq!(out.filename, "CLAUDE.md");
        assert!(out.content.starts_with("```toml\n"));
        assert!(out
            .report
            .losses
            .iter()
            .any(|l| l.category == "component-type" && l.severity == LossSeverity::Warning));
    }
}
