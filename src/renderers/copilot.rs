use serde_yaml_ng::Mapping;

use crate::agent::AgentId;
use crate::errors::Result;
use crate::frontmatter::FrontmatterFormat;
use crate::models::{ActivationMode, ComponentSpec, ComponentType};

use super::{put, DialectRenderer, RenderOptions, Rendered, Session, Support};

/// Renderer for GitHub Copilot.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopilotRenderer;

impl CopilotRenderer {
    fn instructions(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[
                ActivationMode::Auto,
                ActivationMode::Contextual,
                ActivationMode::Manual,
            ],
            ..Support::NONE
        });
        let mut f = Mapping::new();
        let globs = spec.activation.globs();
        match spec.activation.mode {
            ActivationMode::Auto => put(&mut f, "applyTo", "**"),
            ActivationMode::Contextual if !globs.is_empty() => {
                put(&mut f, "applyTo", globs.join(","));
            }
            _ => {}
        }
        if let Some(description) = s.authored_description() {
            put(&mut f, "description", description);
        }
        s.document(FrontmatterFormat::Yaml, f)
    }

    fn prompt(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[ActivationMode::Manual],
            tools: true,
            model: true,
            argument_hint: true,
            ..Support::NONE
        });
        let mut f = Mapping::new();
        if let Some(description) = s.authored_description() {
            put(&mut f, "description", description);
        }
        if let Some(mode) = spec
            .metadata
            .extensions
            .copilot()
            .and_then(|e| e.mode.as_deref())
        {
            put(&mut f, "agent", mode);
        }
        Self::execution_fields(spec, &mut f);
        if let Some(hint) = &spec.invocation.argument_hint {
            put(&mut f, "argument-hint", hint.as_str());
        }
        s.document(FrontmatterFormat::Yaml, f)
    }

    fn agent(s: &mut Session<'_>) -> Result<String> {
        let spec = s.spec;
        s.check(&Support {
            modes: &[ActivationMode::Manual, ActivationMode::Suggested],
            tools: true,
            model: true,
            ..Support::NONE
        });
        let mut f = Mapping::new();
        let description = s.required_description();
        put(&mut f, "description", description);
        Self::execution_fields(spec, &mut f);
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

    fn execution_fields(spec: &ComponentSpec, f: &mut Mapping) {
        if let Some(tools) = &spec.execution.allowed_tools {
            put(f, "tools", tools.clone());
        }
        if let Some(model) = &spec.execution.preferred_model {
            put(f, "model", model.as_str());
        }
    }
}

impl DialectRenderer for CopilotRenderer {
    fn agent(&self) -> AgentId {
        AgentId::Copilot
    }

    fn base_score(&self) -> u8 {
        98
    }

    fn target_type(&self, component_type: ComponentType) -> ComponentType {
        match component_type {
            ComponentType::Rule | ComponentType::Hook => ComponentType::Rule,
            ComponentType::Command | ComponentType::Workflow => ComponentType::Command,
            ComponentType::Memory | ComponentType::Config => ComponentType::Memory,
            other => other,
        }
    }

    fn target_directory(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Rule => ".github/instructions".to_string(),
            ComponentType::Command => ".github/prompts".to_string(),
            ComponentType::Agent => ".github/agents".to_string(),
            ComponentType::Skill => format!(".github/skills/{}", spec.id),
            _ => ".github".to_string(),
        }
    }

    fn target_filename(&self, spec: &ComponentSpec) -> String {
        match self.target_type(spec.component_type()) {
            ComponentType::Rule => format!("{}.instructions.md", spec.id),
            ComponentType::Command => format!("{}.prompt.md", spec.id),
            ComponentType::Agent => format!("{}.agent.md", spec.id),
            ComponentType::Skill => "SKILL.md".to_string(),
            _ => "copilot-instructions.md".to_string(),
        }
    }

    fn render(&self, spec: &ComponentSpec, options: &RenderOptions) -> Result<Rendered> {
        let mut s = Session::start(self, spec, options)?;
        let content = match s.target_type {
            ComponentType::Rule => Self::instructions(&mut s)?,
            ComponentType::Command => Self::prompt(&mut s)?,
            ComponentType::Agent => Self::agent(&mut s)?,
            ComponentType::Skill => Self::skill(&mut s)?,
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
        CopilotRenderer.render(spec, &RenderOptions::default()).unwrap()
    }

    #[test]
    fn prompt_file_round_trip() {
        let spec = parse(
            AgentId::Copilot,
            "---\nmode: agent\ndescription: Generate a React form\ntools: ['codebase', 'search']\nmodel: GPT-4o\n---\nForm for ${input:formName}.",
            ".github/prompts/react-form.prompt.md",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".github/prompts/react-form.prompt.md");
        assert!(out.content.contains("agent: agent"));
        assert!(out.content.contains("tools:\n- codebase\n- search"));
        assert!(out.content.contains("Form for ${input:formName}."));
        assert!(out.report.losses.is_empty(), "{:?}", out.report.losses);
        assert_eq!(out.report.fidelity_score, 98);
    }

    #[test]
    fn claude_command_arguments_become_input() {
        let spec = parse(
            AgentId::Claude,
            "---\ndescription: Fix an issue\nallowed-tools: Read, Edit\n---\nFix issue $ARGUMENTS.",
            ".claude/commands/fix-issue.md",
        );
        let out = render(&spec);
        assert!(out.content.contains("Fix issue ${input:args}."));
        assert!(out.content.contains("tools:\n- Read\n- Edit"));
        assert_eq!(out.report.count(LossSeverity::Critical), 0);
    }

    #[test]
    fn cursor_glob_rule_becomes_apply_to() {
        let spec = parse(
            AgentId::Cursor,
            "---\nglobs: src/**/*.ts, src/**/*.tsx\nalwaysApply: false\n---\nPrefer interfaces.",
            ".cursor/rules/ts.mdc",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".github/instructions/ts.instructions.md");
        assert!(out.content.contains("applyTo: src/**/*.ts,src/**/*.tsx"));
        assert!(out.report.losses.is_empty());
    }

    #[test]
    fn memory_lands_in_github_dir() {
        let spec = parse(AgentId::Claude, "Use conventional commits.", "CLAUDE.md");
        let out = render(&spec);
        assert_eq!(out.path(), ".github/copilot-instructions.md");
        assert_eq!(out.content, "Use conventional commits.\n");
    }

    #[test]
    fn claude_agent_loses_isolation() {
        let spec = parse(
            AgentId::Claude,
            "---\nname: reviewer\ndescription: Reviews diffs\ntools: Read, Grep\n---\nYou review diffs.",
            ".claude/agents/reviewer.md",
        );
        let out = render(&spec);
        assert_eq!(out.path(), ".github/agents/reviewer.agent.md");
        assert!(out
            .report
            .losses
            .iter()
            .any(|l| l.source_field == "execution.context" && l.severity == LossSeverity::Warning));
    }
}
