//! Dialect renderers: [`ComponentSpec`] into agent-specific files.
//!
//! Each renderer decides which target component type a spec lands on, builds
//! the file text, and records every IR feature it could not express as a
//! [`ConversionLoss`]. The shared [`Session`] holds the steps all dialects
//! have in common: author overrides, placeholder rewriting, type projection,
//! the standard loss checks, provenance comments, and post-render
//! validation.

use serde::Serialize;
use serde_yaml_ng::{Mapping, Value};

use crate::agent::AgentId;
use crate::diagnostics::{R001, R002, R004};
use crate::errors::{Result, SkillportError};
use crate::frontmatter::{self, FrontmatterFormat};
use crate::inference;
use crate::models::{
    ActivationMode, AgentExtensions, ComponentSpec, ComponentType, ExecutionContext, SafetyLevel,
    Trigger,
};
use crate::placeholders::{self, PlaceholderKind};
use crate::report::{ConversionLoss, ConversionReport, ConversionWarning, LossSeverity, ReportBuilder};
use crate::validator::{self, ValidateOptions};

mod claude;
mod codex;
mod copilot;
mod cursor;
mod gemini;
mod windsurf;

pub use claude::ClaudeRenderer;
pub use codex::CodexRenderer;
pub use copilot::CopilotRenderer;
pub use cursor::CursorRenderer;
pub use gemini::GeminiRenderer;
pub use windsurf::WindsurfRenderer;

/// Options for a render call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Add a provenance comment naming the source agent.
    pub include_comments: bool,
    /// Validate the rendered text against the target dialect.
    pub validate_output: bool,
}

/// A secondary file produced alongside the main output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraFile {
    pub directory: String,
    pub filename: String,
    pub content: String,
}

/// Output of one render call.
#[derive(Debug, Clone, Serialize)]
pub struct Rendered {
    pub content: String,
    pub filename: String,
    /// Directory relative to the project root; `.` for the root itself.
    pub directory: String,
    pub report: ConversionReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_files: Vec<ExtraFile>,
}

impl Rendered {
    /// Project-relative path of the main output.
    #[must_use]
    pub fn path(&self) -> String {
        join_path(&self.directory, &self.filename)
    }
}

/// Renders one agent's dialect.
pub trait DialectRenderer: Send + Sync {
    /// The agent this renderer writes.
    fn agent(&self) -> AgentId;

    /// Starting fidelity score, reflecting how expressive the dialect is.
    fn base_score(&self) -> u8;

    /// The closest native type for a source component type.
    fn target_type(&self, component_type: ComponentType) -> ComponentType;

    /// Directory the rendered file belongs in, relative to the project root.
    fn target_directory(&self, spec: &ComponentSpec) -> String;

    /// File name of the rendered file.
    fn target_filename(&self, spec: &ComponentSpec) -> String;

    /// Render `spec` into this dialect.
    ///
    /// # Errors
    ///
    /// Returns [`SkillportError::Render`] for malformed IR, such as an empty
    /// id or a hook without event triggers. Losses never cause an error.
    fn render(&self, spec: &ComponentSpec, options: &RenderOptions) -> Result<Rendered>;
}

pub(crate) fn join_path(directory: &str, filename: &str) -> String {
    if directory.is_empty() || directory == "." {
        filename.to_string()
    } else {
        format!("{directory}/{filename}")
    }
}

/// What a target component type can express.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Support {
    pub modes: &'static [ActivationMode],
    /// Contexts besides `main`, which every target honors.
    pub contexts: &'static [ExecutionContext],
    pub tools: bool,
    pub model: bool,
    pub sub_agent: bool,
    pub argument_hint: bool,
    pub confirmation: bool,
    /// Safety level the rendered file states explicitly.
    pub safety: Option<SafetyLevel>,
}

impl Support {
    pub const NONE: Support = Support {
        modes: &[],
        contexts: &[],
        tools: false,
        model: false,
        sub_agent: false,
        argument_hint: false,
        confirmation: false,
        safety: None,
    };
}

/// Insert a scalar or list value into a field map.
pub(crate) fn put(fields: &mut Mapping, key: &str, value: impl Into<Value>) {
    fields.insert(Value::String(key.to_string()), value.into());
}

/// Provenance line naming the source agent.
#[must_use]
pub fn provenance(spec: &ComponentSpec) -> String {
    match spec.source() {
        Some(agent) => format!(
            "Converted from {} ({}) by skillport",
            agent.display_name(),
            agent.as_str()
        ),
        None => "Converted by skillport".to_string(),
    }
}

fn projection_severity(from: ComponentType, to: ComponentType) -> LossSeverity {
    use ComponentType as T;
    match (from, to) {
        (T::Hook, _) => LossSeverity::Critical,
        (T::Workflow, T::Command) | (T::Command, T::Workflow) => LossSeverity::Info,
        (T::Skill, T::Command | T::Rule) => LossSeverity::Info,
        _ => LossSeverity::Warning,
    }
}

fn mode_loss_severity(mode: ActivationMode) -> LossSeverity {
    match mode {
        ActivationMode::Contextual | ActivationMode::Auto | ActivationMode::Hooked => {
            LossSeverity::Warning
        }
        ActivationMode::Manual | ActivationMode::Suggested => LossSeverity::Info,
    }
}

/// Render state shared by every dialect.
pub(crate) struct Session<'a> {
    pub spec: &'a ComponentSpec,
    pub agent: AgentId,
    pub target_type: ComponentType,
    pub report: ReportBuilder,
    /// Body after override or placeholder rewriting.
    pub body: String,
    options: &'a RenderOptions,
    overrides: Mapping,
}

impl<'a> Session<'a> {
    /// Start a session, recording a loss if the type had to be projected.
    pub fn start(
        renderer: &dyn DialectRenderer,
        spec: &'a ComponentSpec,
        options: &'a RenderOptions,
    ) -> Result<Self> {
        let target_type = renderer.target_type(spec.component_type());
        let mut session = Self::new(renderer, spec, options, target_type)?;
        let from = spec.component_type();
        if from != target_type {
            let severity = projection_severity(from, target_type);
            let agent = session.agent.display_name();
            session.report.loss(
                ConversionLoss::new(
                    "component-type",
                    severity,
                    "component_type",
                    format!("{agent} has no {from} files; rendered as a {target_type}"),
                )
                .with_recommendation(format!(
                    "Check that the {target_type} behaves like the original {from}"
                )),
            );
        }
        Ok(session)
    }

    /// Start a session for an explicit target type without a projection loss.
    pub fn new(
        renderer: &dyn DialectRenderer,
        spec: &'a ComponentSpec,
        options: &'a RenderOptions,
        target_type: ComponentType,
    ) -> Result<Self> {
        if spec.id.trim().is_empty() {
            return Err(SkillportError::render("component id is empty"));
        }
        let agent = renderer.agent();
        let mut report = ReportBuilder::new(spec, agent, renderer.base_score());
        let (body, overrides) = match spec.agent_overrides.get(&agent) {
            Some(entry) => {
                report.warn(
                    ConversionWarning::new(
                        R002,
                        format!("author override for {} applied", agent.as_str()),
                    )
                    .with_field("overrides"),
                );
                let body = match &entry.body {
                    Some(body) => body.trim().to_string(),
                    None => rewrite_body(spec, agent, &mut report),
                };
                (body, entry.frontmatter.clone())
            }
            None => (rewrite_body(spec, agent, &mut report), Mapping::new()),
        };
        Ok(Self {
            spec,
            agent,
            target_type,
            report,
            body,
            options,
            overrides,
        })
    }

    fn loss(&mut self, category: &str, severity: LossSeverity, field: &str, description: String) {
        self.report
            .loss(ConversionLoss::new(category, severity, field, description));
    }

    /// Record a loss with a recommendation.
    pub fn loss_with(
        &mut self,
        category: &str,
        severity: LossSeverity,
        field: &str,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) {
        self.report.loss(
            ConversionLoss::new(category, severity, field, description)
                .with_recommendation(recommendation),
        );
    }

    /// Run the standard loss checks against what the target type supports.
    pub fn check(&mut self, support: &Support) {
        let spec = self.spec;
        let name = self.agent.display_name();
        let target = self.target_type;

        let hook_projected =
            spec.component_type() == ComponentType::Hook && target != ComponentType::Hook;
        let mode = spec.activation.mode;
        if !hook_projected {
            if support.modes.contains(&mode) {
                self.report.preserved("activation.mode");
            } else {
                let globs = spec.activation.globs();
                let description = if mode == ActivationMode::Contextual && !globs.is_empty() {
                    format!(
                        "{name} {target}s cannot be scoped to files ({}); activation changes",
                        globs.join(", ")
                    )
                } else {
                    format!("{name} {target}s have no {} activation", mode.as_str())
                };
                self.loss_with(
                    "activation",
                    mode_loss_severity(mode),
                    "activation.mode",
                    description,
                    "Describe when to use the component in its description",
                );
            }
        }
        let keywords: Vec<&str> = spec
            .activation
            .triggers
            .iter()
            .filter_map(|t| match t {
                Trigger::Keyword { word } => Some(word.as_str()),
                _ => None,
            })
            .collect();
        if !keywords.is_empty() {
            self.loss(
                "activation",
                LossSeverity::Info,
                "activation.triggers",
                format!("keyword triggers dropped: {}", keywords.join(", ")),
            );
        }
        if spec.activation.requires_confirmation == Some(true) && !support.confirmation {
            self.loss(
                "activation",
                LossSeverity::Info,
                "activation.requires_confirmation",
                format!("{name} cannot require confirmation before running"),
            );
        }

        let context = spec.execution.context;
        if context != ExecutionContext::Main {
            if support.contexts.contains(&context) {
                self.report.preserved("execution.context");
            } else {
                self.loss_with(
                    "execution",
                    LossSeverity::Warning,
                    "execution.context",
                    format!(
                        "{name} has no {} execution context; the instructions run in the main conversation",
                        context.as_str()
                    ),
                    "Keep the instructions self-contained so they tolerate shared context",
                );
            }
        }

        if let Some(tools) = &spec.execution.allowed_tools {
            if support.tools {
                self.report.preserved("execution.allowed_tools");
            } else {
                let listed = if tools.is_empty() {
                    "no tools".to_string()
                } else {
                    tools.join(", ")
                };
                self.loss_with(
                    "execution",
                    LossSeverity::Critical,
                    "execution.allowed_tools",
                    format!("{name} cannot restrict tools; the allow-list ({listed}) is not enforced"),
                    "Restrict tools through the agent's own permission settings",
                );
            }
        }
        if let Some(model) = &spec.execution.preferred_model {
            if support.model {
                self.report.preserved("execution.preferred_model");
            } else {
                self.loss(
                    "execution",
                    LossSeverity::Info,
                    "execution.preferred_model",
                    format!("preferred model '{model}' dropped"),
                );
            }
        }
        if let Some(agent) = &spec.execution.sub_agent {
            if !support.sub_agent {
                self.loss_with(
                    "execution",
                    LossSeverity::Warning,
                    "execution.sub_agent",
                    format!("{name} cannot delegate to sub-agent '{agent}'"),
                    "Inline the sub-agent's instructions",
                );
            }
        }
        if spec.invocation.argument_hint.is_some() && !support.argument_hint {
            self.loss(
                "invocation",
                LossSeverity::Info,
                "invocation.argument_hint",
                "argument hint dropped".to_string(),
            );
        }

        self.extension_losses();

        let level = spec.activation.safety_level;
        let effective = support
            .safety
            .unwrap_or_else(|| inference::infer_safety(&spec.body));
        if effective == level {
            self.report.preserved("activation.safety_level");
        } else {
            self.loss_with(
                "safety",
                LossSeverity::Warning,
                "activation.safety_level",
                format!(
                    "{name} cannot state a {} safety level; it reads as {}",
                    level.as_str(),
                    effective.as_str()
                ),
                "State the required caution in the body",
            );
        }
    }

    /// Source-agent extension fields with no slot in the target.
    fn extension_losses(&mut self) {
        let spec = self.spec;
        let target = self.agent;
        let mut dropped: Vec<(&str, LossSeverity)> = Vec::new();
        match &spec.metadata.extensions {
            AgentExtensions::Claude(ext) if target != AgentId::Claude => {
                if ext.color.is_some() {
                    dropped.push(("color", LossSeverity::Info));
                }
            }
            AgentExtensions::Codex(ext) if target != AgentId::Codex => {
                if ext.approval_policy.is_some() {
                    dropped.push(("approval_policy", LossSeverity::Warning));
                }
                if ext.reasoning_effort.is_some() {
                    dropped.push(("model_reasoning_effort", LossSeverity::Info));
                }
            }
            AgentExtensions::Copilot(ext) if target != AgentId::Copilot => {
                if ext.mode.is_some() {
                    dropped.push(("mode", LossSeverity::Info));
                }
            }
            AgentExtensions::Gemini(ext) if target != AgentId::Gemini => {
                if ext.temperature.is_some() {
                    dropped.push(("temperature", LossSeverity::Info));
                }
                if ext.max_turns.is_some() {
                    dropped.push(("max_turns", LossSeverity::Info));
                }
            }
            _ => {}
        }
        let source = spec.source().map_or("source", AgentId::display_name);
        for (field, severity) in dropped {
            self.loss(
                "extensions",
                severity,
                &format!("metadata.extensions.{field}"),
                format!(
                    "{source} field '{field}' has no {} equivalent",
                    target.display_name()
                ),
            );
        }
    }

    /// The authored description, if any.
    pub fn authored_description(&self) -> Option<String> {
        let purpose = self.spec.intent.purpose.trim();
        (!purpose.is_empty()).then(|| purpose.to_string())
    }

    /// A description for targets that require one, synthesized if needed.
    pub fn required_description(&mut self) -> String {
        if let Some(description) = self.authored_description() {
            return description;
        }
        let spec = self.spec;
        let summary = spec.intent.summary.trim();
        let synthesized = if summary.is_empty() {
            inference::first_heading_or_line(&spec.body)
                .map(inference::summarize)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| spec.id.replace('-', " "))
        } else {
            summary.to_string()
        };
        self.report.warn(
            ConversionWarning::new(R001, format!("description synthesized as '{synthesized}'"))
                .with_field("description"),
        );
        synthesized
    }

    /// Body with a provenance comment when requested.
    fn commented_body(&self) -> String {
        if self.options.include_comments {
            format!("<!-- {} -->\n\n{}", provenance(self.spec), self.body)
        } else {
            self.body.clone()
        }
    }

    /// Build a markdown document, applying author frontmatter overrides.
    pub fn document(&self, format: FrontmatterFormat, mut fields: Mapping) -> Result<String> {
        for (key, value) in &self.overrides {
            fields.insert(key.clone(), value.clone());
        }
        frontmatter::build(format, &fields, &self.commented_body())
    }

    /// Build a whole-file TOML document, applying author overrides.
    pub fn toml_document(&self, mut fields: Mapping) -> Result<String> {
        for (key, value) in &self.overrides {
            fields.insert(key.clone(), value.clone());
        }
        let text = frontmatter::to_toml_string(&fields)?;
        if self.options.include_comments {
            Ok(format!("# {}\n{text}", provenance(self.spec)))
        } else {
            Ok(text)
        }
    }

    /// Validate if requested and produce the final result.
    pub fn finish(
        mut self,
        content: String,
        directory: String,
        filename: String,
        extra_files: Vec<ExtraFile>,
    ) -> Result<Rendered> {
        if self.options.validate_output {
            let result = validator::validate(
                &content,
                self.agent,
                self.target_type,
                &ValidateOptions::default(),
            );
            for issue in &result.issues {
                self.report.warn(ConversionWarning::new(
                    R004,
                    format!("rendered output failed validation: {issue}"),
                ));
            }
        }
        if self
            .report
            .losses()
            .iter()
            .any(|l| l.severity == LossSeverity::Critical)
        {
            self.report
                .suggest("Review the critical losses before relying on the converted file");
        }
        let report = self.report.finish(filename.clone());
        Ok(Rendered {
            content,
            filename,
            directory,
            report,
            extra_files,
        })
    }
}

/// Rewrite placeholders for the target and record what degraded.
fn rewrite_body(spec: &ComponentSpec, agent: AgentId, report: &mut ReportBuilder) -> String {
    let rewrite = placeholders::rewrite(&spec.body, spec.source(), agent);
    for sub in &rewrite.substitutions {
        let label = sub.kind.label();
        if sub.degraded {
            let severity = match sub.kind {
                PlaceholderKind::Shell => LossSeverity::Warning,
                _ => LossSeverity::Info,
            };
            report.loss(ConversionLoss::new(
                "body",
                severity,
                "body",
                format!(
                    "{} {label}(s) have no {} equivalent and were rewritten as text",
                    sub.count,
                    agent.display_name()
                ),
            ));
        } else {
            report.preserved(format!("body {label}"));
        }
    }
    rewrite.body.trim().to_string()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::models::AgentOverride;

    #[test]
    fn empty_id_is_render_error() {
        let spec = ComponentSpec::new(" ", ComponentType::Skill);
        let err = WindsurfRenderer
            .render(&spec, &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, SkillportError::Render { .. }));
    }

    #[test]
    fn override_replaces_body_and_warns() {
        let mut spec = parse(AgentId::Claude, CLAUDE_FORK_SKILL, ".claude/skills/test-skill/SKILL.md");
        let mut frontmatter = Mapping::new();
        put(&mut frontmatter, "description", "Windsurf wording");
        spec.agent_overrides.insert(
            AgentId::Windsurf,
            AgentOverride {
                body: Some("Windsurf body.".into()),
                frontmatter,
            },
        );
        let out = WindsurfRenderer.render(&spec, &RenderOptions::default()).unwrap();
        assert!(out.content.contains("Windsurf body."));
        assert!(out.content.contains("description: Windsurf wording"));
        assert!(out.report.warnings.iter().any(|w| w.code == R002));
    }

    #[test]
    fn provenance_names_source() {
        let spec = parse(AgentId::Claude, CLAUDE_FORK_SKILL, ".claude/skills/test-skill/SKILL.md");
        assert_eq!(provenance(&spec), "Converted from Claude Code (claude) by skillport");
        let bare = ComponentSpec::new("x", ComponentType::Rule);
        assert_eq!(provenance(&bare), "Converted by skillport");
    }

    #[test]
    fn degraded_shell_injection_is_warning_loss() {
        let spec = parse(
            AgentId::Claude,
            "---\ndescription: Status\n---\nStatus: !`git status`",
            ".claude/commands/status.md",
        );
        let out = CursorRenderer.render(&spec, &RenderOptions::default()).unwrap();
        let body_losses: Vec<_> = out
            .report
            .losses
            .iter()
            .filter(|l| l.category == "body")
            .collect();
        assert_eq!(body_losses.len(), 1);
        assert_eq!(body_losses[0].severity, LossSeverity::Warning);
        assert!(out.content.contains("`git status`"));
    }

    #[test]
    fn join_path_handles_root() {
        assert_eq!(join_path(".", "CLAUDE.md"), "CLAUDE.md");
        assert_eq!(join_path(".claude/commands", "x.md"), ".claude/commands/x.md");
    }
}
