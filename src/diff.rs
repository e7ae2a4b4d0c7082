//! Semantic comparison of two components.
//!
//! Fields are compared by meaning rather than by text: tool lists ignore
//! order and bodies that differ only in whitespace count as nearly equal.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use similar::TextDiff;

use crate::models::ComponentSpec;

/// Similarity reported for bodies equal up to whitespace.
pub const WHITESPACE_SIMILARITY: f64 = 0.95;

/// Ceiling for bodies that share every word but differ in order or case.
pub const REORDERED_SIMILARITY: f64 = 0.9;

/// How much a difference matters, least first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSeverity {
    Identical,
    Minor,
    Moderate,
    Significant,
    Breaking,
}

impl DiffSeverity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiffSeverity::Identical => "identical",
            DiffSeverity::Minor => "minor",
            DiffSeverity::Moderate => "moderate",
            DiffSeverity::Significant => "significant",
            DiffSeverity::Breaking => "breaking",
        }
    }
}

/// One field that differs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub field: &'static str,
    pub before: String,
    pub after: String,
    pub severity: DiffSeverity,
}

/// Result of [`diff_specs`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticDiff {
    pub field_diffs: Vec<FieldDiff>,
    pub overall_severity: DiffSeverity,
    /// 0.0 to 1.0.
    pub body_similarity: f64,
}

impl SemanticDiff {
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.overall_severity == DiffSeverity::Identical
    }
}

fn tokens(s: &str) -> HashSet<String> {
    s.split_whitespace().map(str::to_lowercase).collect()
}

/// Jaccard similarity of the lowercase whitespace tokens. Two empty texts
/// are identical.
fn jaccard(a: &str, b: &str) -> f64 {
    let (a, b) = (tokens(a), tokens(b));
    let union = a.union(&b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity of two bodies in `[0, 1]`. Only equal bodies score 1.0.
#[must_use]
pub fn body_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        1.0
    } else if normalize_whitespace(a) == normalize_whitespace(b) {
        WHITESPACE_SIMILARITY
    } else {
        jaccard(a, b).min(REORDERED_SIMILARITY)
    }
}

fn tool_set(spec: &ComponentSpec) -> Option<BTreeSet<&str>> {
    spec.execution
        .allowed_tools
        .as_ref()
        .map(|tools| tools.iter().map(String::as_str).collect())
}

fn describe_tools(tools: Option<&BTreeSet<&str>>) -> String {
    match tools {
        None => "(unrestricted)".to_string(),
        Some(set) => set.iter().copied().collect::<Vec<_>>().join(", "),
    }
}

/// Compare two specs field by field.
#[must_use]
pub fn diff_specs(a: &ComponentSpec, b: &ComponentSpec) -> SemanticDiff {
    let mut field_diffs = Vec::new();
    let mut compare = |field: &'static str, before: String, after: String, severity: DiffSeverity| {
        if before != after {
            field_diffs.push(FieldDiff {
                field,
                before,
                after,
                severity,
            });
        }
    };

    compare("id", a.id.clone(), b.id.clone(), DiffSeverity::Moderate);
    compare(
        "component_type",
        a.component_type().as_str().to_string(),
        b.component_type().as_str().to_string(),
        DiffSeverity::Breaking,
    );
    compare(
        "intent.summary",
        a.intent.summary.clone(),
        b.intent.summary.clone(),
        DiffSeverity::Minor,
    );
    compare(
        "activation.mode",
        a.activation.mode.as_str().to_string(),
        b.activation.mode.as_str().to_string(),
        DiffSeverity::Significant,
    );
    compare(
        "activation.safety_level",
        a.activation.safety_level.as_str().to_string(),
        b.activation.safety_level.as_str().to_string(),
        DiffSeverity::Significant,
    );
    compare(
        "execution.context",
        a.execution.context.as_str().to_string(),
        b.execution.context.as_str().to_string(),
        DiffSeverity::Significant,
    );
    let (tools_a, tools_b) = (tool_set(a), tool_set(b));
    if tools_a != tools_b {
        compare(
            "execution.allowed_tools",
            describe_tools(tools_a.as_ref()),
            describe_tools(tools_b.as_ref()),
            DiffSeverity::Moderate,
        );
    }

    let similarity = body_similarity(&a.body, &b.body);
    if a.body != b.body {
        let severity = if similarity >= WHITESPACE_SIMILARITY {
            DiffSeverity::Minor
        } else if similarity >= 0.5 {
            DiffSeverity::Moderate
        } else {
            DiffSeverity::Significant
        };
        field_diffs.push(FieldDiff {
            field: "body",
            before: format!("{} characters", a.body.chars().count()),
            after: format!("{} characters", b.body.chars().count()),
            severity,
        });
    }

    let overall_severity = field_diffs
        .iter()
        .map(|d| d.severity)
        .max()
        .unwrap_or(DiffSeverity::Identical);
    SemanticDiff {
        field_diffs,
        overall_severity,
        body_similarity: similarity,
    }
}

/// Unified diff of the two bodies; empty when they are equal.
#[must_use]
pub fn body_patch(a: &ComponentSpec, b: &ComponentSpec) -> String {
    if a.body == b.body {
        return String::new();
    }
    TextDiff::from_lines(&a.body, &b.body)
        .unified_diff()
        .context_radius(3)
        .header(&a.id, &b.id)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivationMode, ComponentType};

    fn spec(body: &str) -> ComponentSpec {
        let mut spec = ComponentSpec::new("demo", ComponentType::Skill);
        spec.body = body.to_string();
        spec
    }

    #[test]
    fn identical_specs() {
        let a = spec("Review the diff.");
        let diff = diff_specs(&a, &a.clone());
        assert!(diff.is_identical());
        assert!(diff.field_diffs.is_empty());
        assert!((diff.body_similarity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn whitespace_only_body_change_is_minor() {
        let diff = diff_specs(&spec("Review  the\ndiff."), &spec("Review the diff."));
        assert!((diff.body_similarity - WHITESPACE_SIMILARITY).abs() < f64::EPSILON);
        assert_eq!(diff.overall_severity, DiffSeverity::Minor);
    }

    #[test]
    fn jaccard_is_case_insensitive() {
        assert!((body_similarity("Run Tests now", "run tests NOW!") - 0.5).abs() < f64::EPSILON);
        assert!((body_similarity("a b", "c d")).abs() < f64::EPSILON);
    }

    #[test]
    fn reordered_words_are_not_identical() {
        let a = spec("Always run tests. Never push to main.");
        let b = spec("Never run tests. Always push to main.");
        let diff = diff_specs(&a, &b);
        assert!(diff.overall_severity > DiffSeverity::Identical);
        assert_eq!(diff.overall_severity, DiffSeverity::Moderate);
        assert_eq!(diff.field_diffs.len(), 1);
        assert_eq!(diff.field_diffs[0].field, "body");
        assert!(diff.body_similarity < 1.0);
    }

    #[test]
    fn tool_order_is_ignored() {
        let mut a = spec("x");
        let mut b = spec("x");
        a.execution.allowed_tools = Some(vec!["Read".into(), "Grep".into()]);
        b.execution.allowed_tools = Some(vec!["Grep".into(), "Read".into()]);
        assert!(diff_specs(&a, &b).is_identical());
        b.execution.allowed_tools = None;
        let diff = diff_specs(&a, &b);
        assert_eq!(diff.overall_severity, DiffSeverity::Moderate);
        assert_eq!(diff.field_diffs[0].after, "(unrestricted)");
    }

    #[test]
    fn type_change_is_breaking() {
        let a = spec("x");
        let b = a.projected_as(ComponentType::Rule);
        let mut c = a.clone();
        c.activation.mode = ActivationMode::Auto;
        assert_eq!(diff_specs(&a, &b).overall_severity, DiffSeverity::Breaking);
        assert_eq!(diff_specs(&a, &c).overall_severity, DiffSeverity::Significant);
    }

    #[test]
    fn patch_shows_changed_lines() {
        let patch = body_patch(&spec("one\ntwo\n"), &spec("one\nthree\n"));
        assert!(patch.contains("-two"));
        assert!(patch.contains("+three"));
        assert!(body_patch(&spec("same"), &spec("same")).is_empty());
    }
}
