//! Dialect parsers: agent-specific files into [`ComponentSpec`].
//!
//! One parser per convertible agent. Parsers share the [`Draft`] helper,
//! which handles the steps every dialect has in common: identifier
//! derivation, intent, author overrides, unknown-field warnings, and the
//! advisory inference pass.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_yaml_ng::{Mapping, Value};

use crate::agent::AgentId;
use crate::diagnostics::{P001, P002, P003, P004, P005, P006};
use crate::errors::{Result, SkillportError};
use crate::frontmatter::{Document, FieldsExt};
use crate::inference;
use crate::models::{
    AgentOverride, ComponentSpec, ComponentType, ExecutionContext, Intent, SafetyLevel,
    SourceAgent, Trigger,
};
use crate::report::ConversionWarning;
use crate::validator::{self, ValidateOptions};
use crate::version::{self, VersionDetection};

mod claude;
mod codex;
mod copilot;
mod cursor;
mod gemini;
mod windsurf;

pub use claude::ClaudeParser;
pub use codex::{legacy_approval, CodexParser};
pub use copilot::{CopilotParser, CHAT_MODES};
pub use cursor::CursorParser;
pub use gemini::GeminiParser;
pub use windsurf::{legacy_trigger, WindsurfParser};

/// Frontmatter key holding per-agent author overrides.
pub const OVERRIDES_KEY: &str = "overrides";

/// Options for a parse call.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Source agent; detected from the content when `None`.
    pub agent: Option<AgentId>,
    /// Path of the source file, used to resolve the component type and id.
    pub source_file: Option<String>,
    /// Run the validator over the raw content first.
    pub validate_on_parse: bool,
}

impl ParseOptions {
    #[must_use]
    pub fn for_agent(agent: AgentId) -> Self {
        Self {
            agent: Some(agent),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source_file(mut self, path: impl Into<String>) -> Self {
        self.source_file = Some(path.into());
        self
    }
}

/// A successfully parsed component.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub spec: ComponentSpec,
    pub warnings: Vec<ConversionWarning>,
}

/// Parses one agent's dialect.
pub trait DialectParser: Send + Sync {
    /// The agent this parser reads.
    fn agent(&self) -> AgentId;

    /// Whether `content` (and optionally its file name) looks like this dialect.
    fn can_parse(&self, content: &str, filename: Option<&str>) -> bool;

    /// Parse `content` into the IR.
    ///
    /// # Errors
    ///
    /// Returns [`SkillportError::Parse`] for empty content or malformed
    /// frontmatter. No partial spec is ever returned.
    fn parse(&self, content: &str, options: &ParseOptions) -> Result<Parsed>;

    /// Detect which version of the dialect `content` is written for.
    fn detect_version(&self, content: &str, path: Option<&str>) -> VersionDetection {
        version::detect_version(self.agent(), content, path)
    }
}

// ── Path helpers ────────────────────────────────────────────────────────

/// Forward-slash form of a path.
pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Last path segment.
pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether the path has a directory segment named `dir`.
pub(crate) fn has_dir(path: &str, dir: &str) -> bool {
    path.split('/').rev().skip(1).any(|seg| seg == dir)
}

/// Whether the file name ends with `suffix`, ignoring ASCII case.
pub(crate) fn name_ends_with(path: &str, suffix: &str) -> bool {
    file_name(path)
        .to_ascii_lowercase()
        .ends_with(&suffix.to_ascii_lowercase())
}

const COMPOUND_SUFFIXES: &[&str] = &[
    ".instructions.md",
    ".prompt.md",
    ".agent.md",
    ".chatmode.md",
    ".md",
    ".mdc",
    ".toml",
    ".json",
];

/// Identifier implied by a file path.
///
/// `SKILL.md` takes its directory name; other files take their stem with
/// compound extensions such as `.prompt.md` removed.
#[must_use]
pub fn id_from_path(path: &str) -> Option<String> {
    let path = normalize_path(path);
    let name = file_name(&path);
    let stem = if name.eq_ignore_ascii_case("SKILL.md") {
        path.rsplit('/').nth(1)?
    } else {
        let lower = name.to_ascii_lowercase();
        COMPOUND_SUFFIXES
            .iter()
            .find(|s| lower.ends_with(*s))
            .map_or(name, |s| &name[..name.len() - s.len()])
    };
    let id = inference::slugify(stem);
    (!id.is_empty()).then_some(id)
}

// ── Shared parse state ──────────────────────────────────────────────────

/// A spec under construction plus the warnings raised so far.
pub(crate) struct Draft {
    pub spec: ComponentSpec,
    pub warnings: Vec<ConversionWarning>,
    /// Safety level set by an explicit agent field; skips inference.
    pub explicit_safety: Option<SafetyLevel>,
}

impl Draft {
    /// Start a draft from a split document.
    ///
    /// Fields listed in `known` (plus the overrides key) are consumed by the
    /// caller; anything else raises a `P004` warning.
    pub fn new(
        agent: AgentId,
        component_type: ComponentType,
        doc: &Document,
        options: &ParseOptions,
        known: &[&str],
    ) -> Self {
        let mut warnings = Vec::new();
        let description = doc.fields.str_field("description").unwrap_or_default().trim();
        let id = derive_id(
            doc.fields.str_field("name"),
            options.source_file.as_deref(),
            description,
            &doc.body,
            &mut warnings,
        );

        let mut spec = ComponentSpec::new(id, component_type);
        spec.source_agent = Some(SourceAgent {
            agent,
            detected_at: Utc::now(),
        });
        spec.intent = intent_from(description, &doc.body);
        spec.body = doc.body.clone();
        spec.metadata.source_file = options.source_file.clone();
        spec.metadata.original_format = doc.format;
        spec.agent_overrides = parse_overrides(&doc.fields, &mut warnings);

        for key in doc.fields.keys().filter_map(Value::as_str) {
            if key != OVERRIDES_KEY && !known.contains(&key) {
                warnings.push(
                    ConversionWarning::new(P004, format!("unrecognized field '{key}' ignored"))
                        .with_field(key),
                );
            }
        }

        Self {
            spec,
            warnings,
            explicit_safety: None,
        }
    }

    pub fn warn(&mut self, code: &str, message: impl Into<String>, field: &str) {
        self.warnings
            .push(ConversionWarning::new(code, message).with_field(field));
    }

    /// Warn that `value` is not one of the allowed values for `field`.
    pub fn warn_enum(&mut self, field: &str, value: &str, fallback: &str) {
        self.warn(
            P005,
            format!("unrecognized {field} '{value}', using '{fallback}'"),
            field,
        );
    }

    /// Glob patterns become glob triggers.
    pub fn add_globs(&mut self, globs: Vec<String>) {
        self.spec
            .activation
            .triggers
            .extend(globs.into_iter().map(|pattern| Trigger::Glob { pattern }));
    }

    /// Run inference and raise portability warnings.
    pub fn finish(mut self) -> Parsed {
        let spec = &mut self.spec;
        spec.capabilities =
            inference::infer_capabilities(&spec.body, spec.execution.allowed_tools.as_deref());
        spec.category = inference::infer_categories(&format!(
            "{}\n{}",
            spec.intent.description(),
            spec.body
        ));
        spec.activation.safety_level = self
            .explicit_safety
            .unwrap_or_else(|| inference::infer_safety(&spec.body));

        match spec.execution.context {
            ExecutionContext::Main => {}
            context => self.warnings.push(
                ConversionWarning::new(
                    P001,
                    format!(
                        "{} execution context is only honored by some agents",
                        context.as_str()
                    ),
                )
                .with_field("execution.context"),
            ),
        }
        if spec.execution.allowed_tools.is_some() {
            self.warnings.push(
                ConversionWarning::new(P002, "tool allow-list is only enforced by some agents")
                    .with_field("execution.allowed_tools"),
            );
        }
        if let Some(agent) = &spec.execution.sub_agent {
            self.warnings.push(
                ConversionWarning::new(P003, format!("delegation to sub-agent '{agent}' is not portable"))
                    .with_field("execution.sub_agent"),
            );
        }

        Parsed {
            spec: self.spec,
            warnings: self.warnings,
        }
    }
}

fn derive_id(
    name: Option<&str>,
    source_file: Option<&str>,
    description: &str,
    body: &str,
    warnings: &mut Vec<ConversionWarning>,
) -> String {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        let id = inference::slugify(name);
        if !id.is_empty() {
            return id;
        }
    }
    let (id, origin) = if let Some(id) = source_file.and_then(id_from_path) {
        (id, "file name")
    } else if !description.is_empty() {
        (inference::slugify(description), "description")
    } else {
        (
            inference::first_heading_or_line(body)
                .map(inference::slugify)
                .unwrap_or_default(),
            "body",
        )
    };
    let id = if id.is_empty() {
        "component".to_string()
    } else {
        id
    };
    warnings.push(
        ConversionWarning::new(P006, format!("id '{id}' derived from the {origin}")).with_field("id"),
    );
    id
}

/// Intent from a description, falling back to the body's first heading.
pub(crate) fn intent_from(description: &str, body: &str) -> Intent {
    if description.is_empty() {
        let summary = inference::first_heading_or_line(body)
            .map(inference::summarize)
            .unwrap_or_default();
        return Intent {
            summary,
            ..Intent::default()
        };
    }
    Intent {
        summary: inference::summarize(description),
        purpose: description.to_string(),
        when_to_use: inference::when_to_use(description),
        examples: Vec::new(),
    }
}

fn parse_overrides(
    fields: &Mapping,
    warnings: &mut Vec<ConversionWarning>,
) -> BTreeMap<AgentId, AgentOverride> {
    let mut overrides = BTreeMap::new();
    let Some(value) = fields.get(OVERRIDES_KEY) else {
        return overrides;
    };
    let Value::Mapping(map) = value else {
        warnings.push(
            ConversionWarning::new(P004, "'overrides' must be a mapping of agent names")
                .with_field(OVERRIDES_KEY),
        );
        return overrides;
    };
    for (key, entry) in map {
        let name = key.as_str().unwrap_or_default();
        let (Ok(agent), Value::Mapping(entry)) = (name.parse::<AgentId>(), entry) else {
            warnings.push(
                ConversionWarning::new(P004, format!("override for '{name}' ignored"))
                    .with_field(OVERRIDES_KEY),
            );
            continue;
        };
        let mut frontmatter = entry.clone();
        let body = frontmatter
            .shift_remove("body")
            .and_then(|b| b.as_str().map(str::to_string));
        overrides.insert(agent, AgentOverride { body, frontmatter });
    }
    overrides
}

/// Split content, or fail with a parse error naming the agent.
pub(crate) fn split_for(agent: AgentId, content: &str) -> Result<Document> {
    crate::frontmatter::split(content).map_err(|e| match e {
        SkillportError::Parse { message } => {
            SkillportError::parse(format!("{}: {message}", agent.display_name()))
        }
        other => other,
    })
}

/// Validate the raw content before parsing when the caller asked for it.
///
/// Validation errors abort the parse; warnings are carried forward.
pub(crate) fn pre_validate(
    content: &str,
    agent: AgentId,
    component_type: ComponentType,
    options: &ParseOptions,
) -> Result<Vec<ConversionWarning>> {
    if !options.validate_on_parse {
        return Ok(Vec::new());
    }
    let result = validator::validate(content, agent, component_type, &ValidateOptions::default());
    if let Some(first) = result.issues.first() {
        return Err(SkillportError::parse(format!("validation failed: {first}")));
    }
    Ok(result
        .warnings
        .iter()
        .map(|d| {
            let warning = ConversionWarning::new(d.code, d.message.clone());
            match d.field {
                Some(field) => warning.with_field(field),
                None => warning,
            }
        })
        .collect())
}
