use serde_yaml_ng::Mapping;

use crate::agent::AgentId;
use crate::diagnostics::R003;
use crate::errors::{Result, SkillportError};
use crate::frontmatter::FrontmatterFormat;
use crate::hooks;
use crate::models::{ActivationMode, ComponentSpec, ComponentType};
use crate::report::{ConversionWarning, LossSeverity};

use super::{join_path, put, DialectRenderer, ExtraFile, RenderOptions, Rendered, Session, Support};

/// Renderer for Cursor.
#[derive(Debug, Default, Clone, Copy)]
pub struct CursorRenderer;

const RULE_SUPPORT: Support = Support {
    modes: &[
        ActivationMode::Auto,
        ActivationMode::Contextual,
        ActivationMode::Suggested,
        ActivationMode::Manual,
    ],
    ..Support::NONE
};

impl CursorRenderer {
    fn rule(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&RULE_SUPPORT);
        let mode = spec.activation.mode;
        let mut f = Mapping::new();
        match mode {
            ActivationMode::Suggested => {
                let description = s.required_description();
                put(&mut f, "description", description);
            }
            ActivationMode::Manual => {
                if s.authored_description().is_some() {
                    s.loss_with(
                        "intent",
                        LossSeverity::Info,
                        "intent.purpose",
                        "a description would let Cursor apply the rule on its own; it was left out",
                        "Mention the rule with @ to attach it",
                    );
                }
            }
            _ => {
                if let Some(description) = s.authored_description() {
                    put(&mut f, "description", description);
                }
            }
        }
        let globs = spec.activation.globs();
        if mode == ActivationMode::Contextual && !globs.is_empty() {
            put(&mut f, "globs", globs.join(","));
        }
        put(&mut f, "alwaysApply", mode == ActivationMode::Auto);
        s.document(FrontmatterFormat::Yaml, f)
    }

    fn command(s: &mut Session<'_>) -> Result<String> {
        s.check(&Support {
            modes: &[ActivationMode::Manual],
            ..Support::NONE
        });
        if let Some(description) = s.authored_description() {
            s.loss_with(
                "intent",
                LossSeverity::Info,
                "intent.purpose",
                format!("Cursor commands have no description field; '{description}' dropped"),
                "Open the command body with a one-line summary",
            );
        }
        s.document(FrontmatterFormat::Yaml, Mapping::new())
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
        let (content, unmapped) = hooks::render_cursor(&bindings)?;
        for binding in unmapped {
            let event = match &binding.matcher {
                Some(matcher) => format!("{} ({matcher})", binding.event),
                None => binding.event.clone(),
            };
            s.loss_with(
                "hooks",
                LossSeverity::Critical,
                "activation.triggers",
                format!("Cursor has no hook for {event}; the binding was dropped"),
                "Enforce the check another way, such as a pre-commit hook",
            );
        }
        if let Some(seconds) = timeout {
            s.loss_with(
                "hooks",
                LossSeverity::Info,
                "metadata.extensions.hook_timeout",
                format!("Cursor hooks have no timeout; {seconds}s limit dropped"),
                "Bound the script's run time inside the script",
            );
        }
        Ok(content)
    }

    /// A user-invocable skill: an agent-requested rule plus a command.
    fn skill(&self, spec: &ComponentSpec, options: &RenderOptions) -> Result<Rendered> {
        let mut s = Session::new(self, spec, options, ComponentType::Rule)?;
        s.report.warn(
            ConversionWarning::new(
                R003,
                format!(
                    "skill split into a rule and the command {}",
                    join_path(".cursor/commands", &format!("{}.md", spec.id))
                ),
            )
            .with_field("component_type"),
        );
        let content = Self::rule(&mut s)?;
        let command = s.document(FrontmatterFormat::Yaml, Mapping::new())?;
        let extra = ExtraFile {
            directory: ".cursor/commands".to_string(),
            filename: format!("{}.md", spec.id),
            content: command,
        };
        s.finish(
            content,
            ".cursor/rules".to_string(),
            format!("{}.mdc", spec.id),
            vec![extra],
        )
    }
}

impl DialectRenderer for CursorRenderer {
    fn agent(&self) -> AgentId {
        AgentId::Cursor
    }

    fn base_score(&self) -> u8 {
        98
    }

    fn target_type(&self, component_type: ComponentType) -> ComponentType {
        match component_type {
            ComponentType::Skill | ComponentType::Agent | ComponentType::Rule => ComponentType::Rule,
            ComponentType::Command | ComponentType::Workflow => ComponentType::Command,
            ComponentType::Hook => ComponentType::Hook,
            ComponentType::Memory | ComponentType::Config => ComponentType::Memory,
        }
    }

    fn target_directory(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Rule => ".cursor/rules".to_string(),
            ComponentType::Command => ".cursor/commands".to_string(),
            ComponentType::Hook => ".cursor".to_string(),
            _ => ".".to_string(),
        }
    }

    fn target_filename(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Rule => format!("{}.mdc", spec.id),
            ComponentType::Command => format!("{}.md", spec.id),
            ComponentType::Hook => "hooks.json".to_string(),
            _ => "AGENTS.md".to_string(),
        }
    }

    fn render(&self, spec: &ComponentSpec, options: &RenderOptions) -> Result<Rendered> {
        if spec.component_type() == ComponentType::Skill && spec.invocation.user_invocable {
            return self.skill(spec, options);
        }
        let mut s = Session::start(self, spec, options)?;
        let content = match s.target_type {
            ComponentType::Rule => Self::rule(&mut s)?,
            ComponentType::Command => Self::command(&mut s)?,
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

    fn render(spec: &ComponentSpec) -> Rendered {
        CursorRenderer.render(spec, &RenderOptions::default()).unwrap()
    }

    #[test]
    fn glob_rule_round_trip() {
        let spec = parse(
            AgentId::Cursor,
            "---\ndescription: TS rules\nglobs: src/**/*.ts\nalwaysApply: false\n---\nUse strict mode.",
            ".cursor/rules/ts.mdc",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".cursor/rules/ts.mdc");
        assert!(out.content.contains("globs: src/**/*.ts"));
        assert!(out.content.contains("alwaysApply: false"));
        assert!(out.report.losses.is_empty(), "{:?}", out.report.losses);
        assert_eq!(out.report.fidelity_score, 98);
    }

    #[test]
    fn invocable_skill_emits_rule_and_command() {
        let spec = parse(AgentId::Claude, CLAUDE_SKILL, ".claude/skills/code-review/SKILL.md");
        let out = render(&spec);
        assert_eq!(out.path(), ".cursor/rules/code-review.mdc");
        assert!(out.content.contains("description: Reviews code for bugs."));
        assert_eq!(out.extra_files.len(), 1);
        assert_eq!(out.extra_files[0].directory, ".cursor/commands");
        assert_eq!(out.extra_files[0].filename, "code-review.md");
        assert!(out.report.warnings.iter().any(|w| w.code == R003));
        assert!(out.report.losses.iter().all(|l| l.category != "component-type"));
        assert!(out
            .report
            .losses
            .iter()
            .any(|l| l.severity == LossSeverity::Critical && l.source_field == "execution.allowed_tools"));
    }

    #[test]
    fn claude_command_loses_description() {
        let spec = parse(
            AgentId::Claude,
            "---\ndescription: Write tests\n---\nAdd tests for $ARGUMENTS.",
            ".claude/commands/write-tests.md",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".cursor/commands/write-tests.md");
        assert!(!out.content.starts_with("---"));
        assert!(out.report.losses.iter().any(|l| l.category == "intent"));
    }

    #[test]
    fn claude_hooks_map_to_cursor_events() {
        let spec = parse(
            AgentId::Claude,
            r#"{"hooks":{"PreToolUse":[{"matcher":"Bash","hooks":[{"type":"command","command":"./guard.sh"}]}]}}"#,
            ".claude/hooks.json",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".cursor/hooks.json");
        let value: serde_json::Value = serde_json::from_str(&out.content).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["hooks"]["beforeShellExecution"][0]["command"], "./guard.sh");
        assert!(out.report.losses.iter().all(|l| l.severity != LossSeverity::Critical));
    }

    #[test]
    fn unmapped_hook_event_is_critical() {
        let spec = parse(
            AgentId::Claude,
            r#"{"hooks":{"SessionStart":[{"hooks":[{"type":"command","command":"./setup.sh"}]}]}}"#,
            ".claude/hooks.json",
        );
        let out = render(&spec);
        assert_eq!(out.report.count(LossSeverity::Critical), 1);
        assert!(!out.report.suggestions.is_empty());
    }

    #[test]
    fn windsurf_always_on_rule() {
        let spec = parse(
            AgentId::Windsurf,
            "---\ntrigger: always_on\n---\nAnswer briefly.",
            ".windsurf/rules/brief.md",
        );
        let out = render(&spec);
        assert!(out.content.contains("alwaysApply: true"));
        assert!(out.report.losses.is_empty());
    }
}
