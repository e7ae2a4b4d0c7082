use serde_yaml_ng::Mapping;

use crate::agent::AgentId;
use crate::errors::Result;
use crate::frontmatter::FrontmatterFormat;
use crate::models::{ActivationMode, ComponentSpec, ComponentType, WindsurfTrigger};
use crate::report::LossSeverity;
use crate::validator::WINDSURF_CHAR_LIMIT;

use super::{put, DialectRenderer, RenderOptions, Rendered, Session, Support};

/// Renderer for Windsurf.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindsurfRenderer;

fn trigger_for(mode: ActivationMode) -> WindsurfTrigger {
    match mode {
        ActivationMode::Auto => WindsurfTrigger::AlwaysOn,
        ActivationMode::Suggested => WindsurfTrigger::ModelDecision,
        ActivationMode::Contextual => WindsurfTrigger::Glob,
        ActivationMode::Manual | ActivationMode::Hooked => WindsurfTrigger::Manual,
    }
}

/// `auto_execution_mode` for a workflow, if one should be written.
fn auto_execution_mode(spec: &ComponentSpec) -> Option<u8> {
    if let Some(level) = spec
        .metadata
        .extensions
        .windsurf()
        .and_then(|e| e.auto_execution_mode)
    {
        return Some(level);
    }
    match spec.activation.mode {
        ActivationMode::Auto => Some(3),
        ActivationMode::Suggested => Some(2),
        _ if spec.activation.requires_confirmation == Some(true) => Some(1),
        _ => None,
    }
}

impl WindsurfRenderer {
    fn rule(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[
                ActivationMode::Auto,
                ActivationMode::Suggested,
                ActivationMode::Contextual,
                ActivationMode::Manual,
            ],
            ..Support::NONE
        });
        let trigger = trigger_for(spec.activation.mode);
        let mut f = Mapping::new();
        put(&mut f, "trigger", trigger.as_str());
        let globs = spec.activation.globs();
        if trigger == WindsurfTrigger::Glob && !globs.is_empty() {
            put(&mut f, "globs", globs.join(","));
        }
        let description = if trigger == WindsurfTrigger::ModelDecision {
            Some(s.required_description())
        } else {
            s.authored_description()
        };
        if let Some(description) = description {
            put(&mut f, "description", description);
        }
        s.document(FrontmatterFormat::Yaml, f)
    }

    fn workflow(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[
                ActivationMode::Manual,
                ActivationMode::Suggested,
                ActivationMode::Auto,
            ],
            confirmation: true,
            ..Support::NONE
        });
        let mut f = Mapping::new();
        if let Some(description) = s.authored_description() {
            put(&mut f, "description", description);
        }
        if let Some(level) = auto_execution_mode(spec) {
            put(&mut f, "auto_execution_mode", u64::from(level));
        }
        s.document(FrontmatterFormat::Yaml, f)
    }

    fn skill(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[ActivationMode::Suggested, ActivationMode::Manual],
            ..Support::NONE
        });
        let mut f = Mapping::new();
        put(&mut f, "name", spec.id.as_str());
        let description = s.required_description();
        put(&mut f, "description", description);
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

impl DialectRenderer for WindsurfRenderer {
    fn agent(&self) -> AgentId {
        AgentId::Windsurf
    }

    fn base_score(&self) -> u8 {
        100
    }

    fn target_type(&self, component_type: ComponentType) -> ComponentType {
        match component_type {
            ComponentType::Rule | ComponentType::Hook => ComponentType::Rule,
            ComponentType::Command | ComponentType::Workflow => ComponentType::Workflow,
            ComponentType::Skill | ComponentType::Agent => ComponentType::Skill,
            ComponentType::Memory | ComponentType::Config => ComponentType::Memory,
        }
    }

    fn target_directory(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Rule => ".windsurf/rules".to_string(),
            ComponentType::Workflow => ".windsurf/workflows".to_string(),
            ComponentType::Skill => format!(".windsurf/skills/{}", spec.id),
            _ => ".".to_string(),
        }
    }

    fn target_filename(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Skill => "SKILL.md".to_string(),
            ComponentType::Memory => ".windsurfrules".to_string(),
            _ => format!("{}.md", spec.id),
        }
    }

    fn render(&self, spec: &ComponentSpec, options: &RenderOptions) -> Result<Rendered> {
        let mut s = Session::start(self, spec, options)?;
        let content = match s.target_type {
            ComponentType::Rule => Self::rule(&mut s)?,
            ComponentType::Workflow => Self::workflow(&mut s)?,
            ComponentType::Skill => Self::skill(&mut s)?,
            _ => Self::memory(&mut s)?,
        };
        let chars = content.chars().count();
        if chars > WINDSURF_CHAR_LIMIT {
            s.loss_with(
                "body",
                LossSeverity::Warning,
                "body",
                format!("{chars} characters exceeds Windsurf's {WINDSURF_CHAR_LIMIT}-character limit; the excess is ignored"),
                "Split the content into several files",
            );
        }
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

    fn render(spec: &ComponentSpec) -> Rendered {
        WindsurfRenderer.render(spec, &RenderOptions::default()).unwrap()
    }

    #[test]
    fn fork_skill_loses_only_its_context() {
        let spec = parse(AgentId::Claude, CLAUDE_FORK_SKILL, ".claude/skills/test-skill/SKILL.md");
        let out = render(&spec);
        assert_eq!(out.path(), ".windsurf/skills/test-skill/SKILL.md");
        assert_eq!(out.report.losses.len(), 1);
        let loss = &out.report.losses[0];
        assert_eq!(loss.category, "execution");
        assert_eq!(loss.severity, LossSeverity::Warning);
        assert_eq!(out.report.fidelity_score, 92);
    }

    #[test]
    fn comments_follow_frontmatter() {
        let spec = parse(AgentId::Claude, CLAUDE_FORK_SKILL, ".claude/skills/test-skill/SKILL.md");
        let options = RenderOptions {
            include_comments: true,
            ..RenderOptions::default()
        };
        let out = WindsurfRenderer.render(&spec, &options).unwrap();
        assert!(out.content.starts_with("---\nname: test-skill\n"));
        assert!(out
            .content
            .contains("---\n\n<!-- Converted from Claude Code (claude) by skillport -->\n\nBody.\n"));
    }

    #[test]
    fn cursor_glob_rule_uses_glob_trigger() {
        let spec = parse(
            AgentId::Cursor,
            "---\nglobs: src/**/*.ts, src/**/*.tsx\nalwaysApply: false\n---\nPrefer interfaces.",
            ".cursor/rules/ts.mdc",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".windsurf/rules/ts.md");
        assert!(out.content.contains("trigger: glob"));
        assert!(out.content.contains("globs: src/**/*.ts,src/**/*.tsx"));
        assert!(out.report.losses.is_empty());
    }

    #[test]
    fn claude_command_becomes_workflow() {
        let spec = parse(
            AgentId::Claude,
            "---\ndescription: Run the release checklist\n---\n1. Bump the version",
            ".claude/commands/release.md",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".windsurf/workflows/release.md");
        assert!(!out.content.contains("auto_execution_mode"));
        assert_eq!(out.report.losses.len(), 1);
        assert_eq!(out.report.losses[0].severity, LossSeverity::Info);
    }

    #[test]
    fn workflow_keeps_execution_mode() {
        let spec = parse(
            AgentId::Windsurf,
            "---\ndescription: Lint\nauto_execution_mode: 3\n---\nRun the linter.",
            ".windsurf/workflows/lint.md",
        );
        let out = render(&spec);
        assert!(out.content.contains("auto_execution_mode: 3"));
        assert!(out.report.losses.is_empty());
    }

    #[test]
    fn hook_projection_is_critical() {
        let spec = parse(
            AgentId::Claude,
            r#"{"hooks":{"Stop":[{"hooks":[{"type":"command","command":"./notify.sh"}]}]}}"#,
            ".claude/hooks.json",
        );
        let out = render(&spec);
        assert!(out.content.contains("trigger: manual"));
        assert_eq!(out.report.count(LossSeverity::Critical), 1);
    }

    #[test]
    fn oversized_output_is_flagged() {
        let body = "Keep functions small.\n".repeat(700);
        let spec = parse(AgentId::Claude, &body, "CLAUDE.md");
        let out = render(&spec);
        assert!(out
            .report
            .losses
            .iter()
            .any(|l| l.category == "body" && l.severity == LossSeverity::Warning));
    }
}
