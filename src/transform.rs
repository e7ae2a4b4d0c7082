//! The conversion pipeline: detect, parse, render, then optionally pin the
//! output to an older dialect version.

use serde::Serialize;
use tracing::{debug, warn};

use crate::agent::AgentId;
use crate::diagnostics::V003;
use crate::errors::{Result, SkillportError};
use crate::models::ComponentSpec;
use crate::parsers::{ParseOptions, Parsed};
use crate::registry::Registry;
use crate::renderers::{join_path, ExtraFile, RenderOptions, Rendered};
use crate::report::{ConversionReport, ConversionWarning};
use crate::version::{self, catalog};

/// Parse `content` with the registry's parser for `options.agent`, detecting
/// the agent when it is not given.
///
/// # Errors
///
/// Returns [`SkillportError::UndetectedAgent`] or [`SkillportError::NoParser`]
/// when no parser applies, and any error from the parser itself.
pub fn parse(registry: &Registry, content: &str, options: &ParseOptions) -> Result<Parsed> {
    let agent = match options.agent {
        Some(agent) => agent,
        None => registry
            .detect_agent(content, options.source_file.as_deref())
            .ok_or(SkillportError::UndetectedAgent)?,
    };
    let parser = registry.parser(agent).ok_or(SkillportError::NoParser(agent))?;
    let options = ParseOptions {
        agent: Some(agent),
        ..options.clone()
    };
    parser.parse(content, &options)
}

/// Render `spec` with the registry's renderer for `target`.
///
/// # Errors
///
/// Returns [`SkillportError::NoRenderer`] when `target` has no renderer.
pub fn render(
    registry: &Registry,
    spec: &ComponentSpec,
    target: AgentId,
    options: &RenderOptions,
) -> Result<Rendered> {
    registry
        .renderer(target)
        .ok_or(SkillportError::NoRenderer(target))?
        .render(spec, options)
}

/// Options for [`transform`].
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Detected from the content and file name when `None`.
    pub source_agent: Option<AgentId>,
    pub target_agent: AgentId,
    pub source_file: Option<String>,
    pub include_comments: bool,
    /// Adapt the output to this version of the target dialect.
    pub target_version: Option<String>,
    pub validate_output: bool,
}

impl TransformOptions {
    #[must_use]
    pub fn to(target_agent: AgentId) -> Self {
        Self {
            source_agent: None,
            target_agent,
            source_file: None,
            include_comments: false,
            target_version: None,
            validate_output: false,
        }
    }

    #[must_use]
    pub fn from(mut self, source_agent: AgentId) -> Self {
        self.source_agent = Some(source_agent);
        self
    }

    #[must_use]
    pub fn with_source_file(mut self, path: impl Into<String>) -> Self {
        self.source_file = Some(path.into());
        self
    }
}

/// Result of [`transform`].
#[derive(Debug, Clone, Serialize)]
pub struct Transformed {
    pub source_agent: AgentId,
    pub output: String,
    pub filename: String,
    pub directory: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_files: Vec<ExtraFile>,
    pub spec: ComponentSpec,
    pub report: ConversionReport,
    /// Parser, renderer, and version adapter warnings, in that order.
    pub warnings: Vec<ConversionWarning>,
    pub fidelity_score: u8,
}

impl Transformed {
    /// Project-relative path of the main output.
    #[must_use]
    pub fn path(&self) -> String {
        join_path(&self.directory, &self.filename)
    }
}

/// Convert `content` into the target agent's dialect.
///
/// # Errors
///
/// Returns [`SkillportError::UndetectedAgent`] when no parser claims the
/// content, [`SkillportError::NoParser`] or [`SkillportError::NoRenderer`]
/// when `registry` lacks one, and any parse or render error. A version pin
/// naming an unknown version is [`SkillportError::UnknownVersion`]; a broken
/// transform surfaces as [`SkillportError::Render`].
pub fn transform(registry: &Registry, content: &str, options: &TransformOptions) -> Result<Transformed> {
    let source_agent = match options.source_agent {
        Some(agent) => agent,
        None => registry
            .detect_agent(content, options.source_file.as_deref())
            .ok_or(SkillportError::UndetectedAgent)?,
    };
    let parser = registry
        .parser(source_agent)
        .ok_or(SkillportError::NoParser(source_agent))?;
    let renderer = registry
        .renderer(options.target_agent)
        .ok_or(SkillportError::NoRenderer(options.target_agent))?;
    debug!(source = %source_agent, target = %options.target_agent, "transform");

    let parse_options = ParseOptions {
        agent: Some(source_agent),
        source_file: options.source_file.clone(),
        validate_on_parse: false,
    };
    let parsed = parser.parse(content, &parse_options)?;
    debug!(id = %parsed.spec.id, component_type = ?parsed.spec.component_type(), "parsed");

    let render_options = RenderOptions {
        include_comments: options.include_comments,
        validate_output: options.validate_output,
    };
    let rendered = renderer.render(&parsed.spec, &render_options)?;
    debug!(
        path = %rendered.path(),
        score = rendered.report.fidelity_score,
        losses = rendered.report.losses.len(),
        "rendered"
    );

    let mut warnings = parsed.warnings;
    warnings.extend(rendered.report.warnings.iter().cloned());

    let mut output = rendered.content;
    if let Some(pin) = &options.target_version {
        let (pinned, adapter_warnings) = pin_version(options.target_agent, &output, pin)?;
        output = pinned;
        warnings.extend(adapter_warnings);
    }

    Ok(Transformed {
        source_agent,
        output,
        filename: rendered.filename,
        directory: rendered.directory,
        extra_files: rendered.extra_files,
        spec: parsed.spec,
        fidelity_score: rendered.report.fidelity_score,
        report: rendered.report,
        warnings,
    })
}

/// Adapt rendered output, written for the current version, down to `pin`.
fn pin_version(
    agent: AgentId,
    output: &str,
    pin: &str,
) -> Result<(String, Vec<ConversionWarning>)> {
    let cat = catalog(agent);
    let entry = cat.find(pin).ok_or_else(|| SkillportError::UnknownVersion {
        agent,
        version: pin.to_string(),
    })?;
    let mut warnings = Vec::new();
    if !entry.is_supported {
        warnings.push(ConversionWarning::new(
            V003,
            format!("{} {} is no longer supported", agent.display_name(), entry.name),
        ));
    }
    let current = cat.current().name;
    let adapted = version::adapt_version(agent, output, current, entry.name).map_err(|e| match e {
        SkillportError::MissingTransform(name) => {
            warn!(transform = %name, "version pin failed");
            SkillportError::render(format!("cannot adapt to {pin}: transform '{name}' is missing"))
        }
        other => other,
    })?;
    warnings.extend(adapted.warnings);
    Ok((adapted.content, warnings))
}
