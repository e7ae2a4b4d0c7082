//! Rewrites a document between two versions of one agent's dialect.

use serde::Serialize;
use serde_yaml_ng::{Mapping, Value};
use tracing::{debug, warn};

use crate::agent::AgentId;
use crate::diagnostics::{V001, V002};
use crate::errors::{Result, SkillportError};
use crate::frontmatter::{self, FieldsExt, FrontmatterFormat};
use crate::models::{ApprovalPolicy, WindsurfTrigger};
use crate::parsers::{legacy_approval, legacy_trigger};
use crate::report::ConversionWarning;

use super::catalog::{self, VersionEntry};

/// What a downgrade may do with fields the older version lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdaptPolicy {
    /// Delete the fields and warn once per field.
    #[default]
    Lenient,
    /// Refuse the downgrade.
    Strict,
}

/// Direction of a version change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upgrade,
    Downgrade,
}

/// Result of [`adapt_version`].
#[derive(Debug, Clone, Serialize)]
pub struct VersionAdaptation {
    pub content: String,
    pub transformations: Vec<String>,
    pub warnings: Vec<ConversionWarning>,
    pub has_breaking_changes: bool,
}

/// A pure rewrite over frontmatter and body; returns what it changed.
pub type TransformFn = fn(&mut Mapping, &mut String, Direction) -> Option<String>;

/// Registered transforms, by catalog name.
pub const TRANSFORMS: &[(&str, TransformFn)] = &[
    ("claude-hidden-to-user-invocable", claude_hidden_to_user_invocable),
    ("codex-approval-mode-to-policy", codex_approval_mode_to_policy),
    ("windsurf-trigger-rename", windsurf_trigger_rename),
    ("copilot-mode-to-agent", copilot_mode_to_agent),
];

fn lookup(name: &str) -> Option<TransformFn> {
    TRANSFORMS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

/// Replace `from` with `to` in place, keeping the field's position.
fn rename_field(fields: &mut Mapping, from: &str, to: &str, value: Value) {
    let mut renamed = Mapping::new();
    for (key, old) in std::mem::take(fields) {
        if key.as_str() == Some(from) {
            renamed.insert(Value::String(to.to_string()), value.clone());
        } else if key.as_str() != Some(to) {
            renamed.insert(key, old);
        }
    }
    *fields = renamed;
}

fn claude_hidden_to_user_invocable(
    fields: &mut Mapping,
    _body: &mut String,
    direction: Direction,
) -> Option<String> {
    match direction {
        Direction::Upgrade => {
            let hidden = fields.bool_field("hidden")?;
            rename_field(fields, "hidden", "user-invocable", Value::Bool(!hidden));
            Some(format!("hidden: {hidden} → user-invocable: {}", !hidden))
        }
        Direction::Downgrade => {
            let invocable = fields.bool_field("user-invocable")?;
            rename_field(fields, "user-invocable", "hidden", Value::Bool(!invocable));
            Some(format!("user-invocable: {invocable} → hidden: {}", !invocable))
        }
    }
}

fn modern_approval_to_legacy(policy: ApprovalPolicy) -> &'static str {
    match policy {
        ApprovalPolicy::Untrusted => "suggest",
        ApprovalPolicy::OnFailure | ApprovalPolicy::OnRequest => "auto-edit",
        ApprovalPolicy::Never => "full-auto",
    }
}

fn codex_approval_mode_to_policy(
    fields: &mut Mapping,
    _body: &mut String,
    direction: Direction,
) -> Option<String> {
    match direction {
        Direction::Upgrade => {
            let raw = fields.str_field("approval_mode")?.to_string();
            let mapped = legacy_approval(&raw).map_or(raw.clone(), |p| p.as_str().to_string());
            rename_field(fields, "approval_mode", "approval_policy", Value::String(mapped.clone()));
            Some(format!("approval_mode '{raw}' → approval_policy '{mapped}'"))
        }
        Direction::Downgrade => {
            let raw = fields.str_field("approval_policy")?.to_string();
            let mapped = ApprovalPolicy::parse(&raw)
                .map_or(raw.clone(), |p| modern_approval_to_legacy(p).to_string());
            rename_field(fields, "approval_policy", "approval_mode", Value::String(mapped.clone()));
            Some(format!("approval_policy '{raw}' → approval_mode '{mapped}'"))
        }
    }
}

fn legacy_trigger_name(trigger: WindsurfTrigger) -> &'static str {
    match trigger {
        WindsurfTrigger::AlwaysOn => "always",
        WindsurfTrigger::ModelDecision => "model",
        WindsurfTrigger::Glob => "globs",
        WindsurfTrigger::Manual => "manual",
    }
}

fn windsurf_trigger_rename(
    fields: &mut Mapping,
    _body: &mut String,
    direction: Direction,
) -> Option<String> {
    let raw = fields.str_field("trigger")?.to_string();
    let mapped = match direction {
        Direction::Upgrade => legacy_trigger(&raw)?.as_str(),
        Direction::Downgrade => legacy_trigger_name(WindsurfTrigger::parse(&raw)?),
    };
    if mapped == raw {
        return None;
    }
    fields.put_str("trigger", mapped);
    Some(format!("trigger '{raw}' → '{mapped}'"))
}

fn copilot_mode_to_agent(
    fields: &mut Mapping,
    _body: &mut String,
    direction: Direction,
) -> Option<String> {
    let (from, to) = match direction {
        Direction::Upgrade => ("mode", "agent"),
        Direction::Downgrade => ("agent", "mode"),
    };
    let value = fields.get(from)?.clone();
    rename_field(fields, from, to, value);
    Some(format!("`{from}` renamed to `{to}`"))
}

/// Shape of the document being adapted.
enum Shape {
    Markdown(Option<FrontmatterFormat>),
    /// A whole-file TOML table such as `config.toml`.
    TomlFile,
}

fn split_document(content: &str) -> Result<(Shape, Mapping, String)> {
    let doc = frontmatter::split(content)?;
    if doc.has_frontmatter() {
        return Ok((Shape::Markdown(doc.format), doc.fields, doc.body));
    }
    match frontmatter::parse_toml_document(content) {
        Ok(table) if !table.is_empty() => Ok((Shape::TomlFile, table, String::new())),
        _ => Ok((Shape::Markdown(None), doc.fields, doc.body)),
    }
}

fn rebuild(shape: &Shape, fields: &Mapping, body: &str) -> Result<String> {
    match shape {
        Shape::TomlFile => frontmatter::to_toml_string(fields),
        Shape::Markdown(format) => {
            frontmatter::build(format.unwrap_or(FrontmatterFormat::Yaml), fields, body)
        }
    }
}

fn resolve(agent: AgentId, version: &str) -> Result<usize> {
    catalog::catalog(agent)
        .index_of(version)
        .ok_or_else(|| SkillportError::UnknownVersion {
            agent,
            version: version.to_string(),
        })
}

/// Versions crossed going from `from` to `to`, in application order.
fn crossed(versions: &'static [VersionEntry], from: usize, to: usize) -> Vec<&'static VersionEntry> {
    if to > from {
        versions[from + 1..=to].iter().collect()
    } else {
        versions[to + 1..=from].iter().rev().collect()
    }
}

/// Adapt `content` from version `from` to version `to` of `agent`'s dialect.
///
/// # Errors
///
/// Returns [`SkillportError::UnknownVersion`] for a version missing from the
/// catalog, [`SkillportError::MissingTransform`] when a breaking change names
/// an unregistered transform, and a parse error for malformed content.
pub fn adapt_version(agent: AgentId, content: &str, from: &str, to: &str) -> Result<VersionAdaptation> {
    adapt_version_with(agent, content, from, to, AdaptPolicy::Lenient)
}

/// [`adapt_version`] with an explicit downgrade policy.
///
/// # Errors
///
/// As [`adapt_version`]; additionally [`SkillportError::LossyDowngrade`]
/// under [`AdaptPolicy::Strict`] when fields would be deleted.
pub fn adapt_version_with(
    agent: AgentId,
    content: &str,
    from: &str,
    to: &str,
    policy: AdaptPolicy,
) -> Result<VersionAdaptation> {
    let cat = catalog::catalog(agent);
    let from_idx = resolve(agent, from)?;
    let to_idx = resolve(agent, to)?;
    if from_idx == to_idx {
        return Ok(VersionAdaptation {
            content: content.to_string(),
            transformations: Vec::new(),
            warnings: Vec::new(),
            has_breaking_changes: false,
        });
    }

    let direction = if to_idx > from_idx {
        Direction::Upgrade
    } else {
        Direction::Downgrade
    };
    debug!(agent = %agent, from, to, ?direction, "adapting version");
    let (shape, mut fields, mut body) = split_document(content)?;
    let steps = crossed(cat.versions, from_idx, to_idx);
    let mut transformations = Vec::new();
    let mut warnings = Vec::new();
    let mut has_breaking_changes = false;

    for version in &steps {
        for change in version.breaking_changes {
            has_breaking_changes = true;
            match change.transform.filter(|_| change.auto_migratable) {
                Some(name) => {
                    let Some(apply) = lookup(name) else {
                        warn!(transform = name, "transform missing from registry");
                        return Err(SkillportError::MissingTransform(name.to_string()));
                    };
                    if let Some(description) = apply(&mut fields, &mut body, direction) {
                        transformations.push(description);
                    }
                }
                None => warnings.push(ConversionWarning::new(
                    V001,
                    format!("{} ({}): {}", change.description, version.name, change.migration),
                )),
            }
        }
    }

    if direction == Direction::Downgrade {
        let doomed: Vec<String> = steps
            .iter()
            .flat_map(|v| v.introduced.iter())
            .flat_map(|feature| feature.fields.iter())
            .filter(|field| fields.has(field))
            .map(|field| (*field).to_string())
            .collect();
        if !doomed.is_empty() && policy == AdaptPolicy::Strict {
            return Err(SkillportError::LossyDowngrade {
                to: to.to_string(),
                fields: doomed,
            });
        }
        for field in doomed {
            warn!(agent = %agent, field = %field, to, "field deleted on downgrade");
            fields.remove(field.as_str());
            warnings.push(
                ConversionWarning::new(V002, format!("`{field}` does not exist in {to}; deleted"))
                    .with_field(field),
            );
        }
    }

    Ok(VersionAdaptation {
        content: rebuild(&shape, &fields, body.trim())?,
        transformations,
        warnings,
        has_breaking_changes,
    })
}
