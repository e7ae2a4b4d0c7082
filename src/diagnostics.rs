//! Structured diagnostics for validation, parsing, rendering, and version
//! adaptation.
//!
//! Diagnostics carry stable codes, severity levels, and optional fix
//! suggestions. Conversion warnings reuse the same code space.

use std::fmt;

use serde::Serialize;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A rule violation that causes validation failure.
    Error,
    /// A potential issue that does not cause failure.
    Warning,
    /// An informational suggestion for improvement.
    Info,
}

/// A structured diagnostic message from validation.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Stable error code (e.g., `"E001"`, `"W001"`, `"I001"`).
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Field that caused the diagnostic (e.g., `"name"`, `"trigger"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    /// Suggested fix (actionable text).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with the given severity, code, and message.
    #[must_use]
    pub fn new(severity: Severity, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            field: None,
            suggestion: None,
        }
    }

    /// Set the field that caused this diagnostic.
    #[must_use]
    pub fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    /// Set a suggested fix for this diagnostic.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Returns `true` if this diagnostic is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Returns `true` if this diagnostic is a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Returns `true` if this diagnostic is informational.
    #[must_use]
    pub fn is_info(&self) -> bool {
        self.severity == Severity::Info
    }
}

/// Display format:
/// - Errors: `"E001: message"`
/// - Warnings: `"warning: W001: message"`
/// - Info: `"info: I001: message"`
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "{}: {}", self.code, self.message),
            Severity::Warning => write!(f, "warning: {}: {}", self.code, self.message),
            Severity::Info => write!(f, "info: {}: {}", self.code, self.message),
        }
    }
}

// ── Validation errors (E000–E011) ───────────────────────────────────────

/// Content is empty or cannot be split into frontmatter and body.
pub const E000: &str = "E000";
/// Frontmatter is required for this agent and component type.
pub const E001: &str = "E001";
/// Missing required field.
pub const E002: &str = "E002";
/// Field has the wrong type.
pub const E003: &str = "E003";
/// Field value is not one of the allowed values.
pub const E004: &str = "E004";
/// Numeric field is out of range.
pub const E005: &str = "E005";
/// Name is not valid kebab-case.
pub const E006: &str = "E006";
/// Name exceeds 64 characters.
pub const E007: &str = "E007";
/// Body is empty where instructions are required.
pub const E008: &str = "E008";
/// Construct was removed in the requested version.
pub const E009: &str = "E009";
/// Content exceeds the agent's size limit.
pub const E010: &str = "E010";
/// Hook definition is malformed.
pub const E011: &str = "E011";

// ── Validation warnings (W001–W007) ─────────────────────────────────────

/// Unexpected frontmatter field.
pub const W001: &str = "W001";
/// Construct is deprecated in the requested version.
pub const W002: &str = "W002";
/// Body is shorter than the recommended minimum.
pub const W003: &str = "W003";
/// Body is longer than recommended.
pub const W004: &str = "W004";
/// Name contains a reserved word.
pub const W005: &str = "W005";
/// Hook command uses an absolute path.
pub const W006: &str = "W006";
/// Hook timeout outside the recommended range.
pub const W007: &str = "W007";

// ── Validation info (I001–I002) ─────────────────────────────────────────

/// Description lacks a trigger phrase ("Use when…").
pub const I001: &str = "I001";
/// Description is very short.
pub const I002: &str = "I002";

// ── Parser warnings (P001–P006) ─────────────────────────────────────────

/// Forked or isolated execution context is not portable.
pub const P001: &str = "P001";
/// Tool allow-list is enforced only by some agents.
pub const P002: &str = "P002";
/// Sub-agent delegation is not portable.
pub const P003: &str = "P003";
/// Unrecognized field ignored.
pub const P004: &str = "P004";
/// Unrecognized enum value replaced with a default.
pub const P005: &str = "P005";
/// Identifier derived from the file name or description.
pub const P006: &str = "P006";

// ── Renderer warnings (R001–R004) ───────────────────────────────────────

/// Required target field synthesized from a default.
pub const R001: &str = "R001";
/// Author override applied.
pub const R002: &str = "R002";
/// Component type projected onto a different target type.
pub const R003: &str = "R003";
/// Rendered output failed post-render validation.
pub const R004: &str = "R004";

// ── Version adapter warnings (V001–V003) ────────────────────────────────

/// Breaking change needs manual migration.
pub const V001: &str = "V001";
/// Field deleted on downgrade.
pub const V002: &str = "V002";
/// Target version is no longer supported.
pub const V003: &str = "V003";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_has_code() {
        let d = Diagnostic::new(Severity::Error, E002, "missing required field `name`");
        assert_eq!(d.to_string(), "E002: missing required field `name`");
    }

    #[test]
    fn warning_display_with_prefix() {
        let d = Diagnostic::new(Severity::Warning, W001, "unexpected field: 'foo'");
        assert_eq!(d.to_string(), "warning: W001: unexpected field: 'foo'");
    }

    #[test]
    fn info_display_with_prefix() {
        let d = Diagnostic::new(Severity::Info, I001, "description lacks trigger phrase");
        assert_eq!(d.to_string(), "info: I001: description lacks trigger phrase");
    }

    #[test]
    fn severity_predicates() {
        let e = Diagnostic::new(Severity::Error, E000, "x");
        let w = Diagnostic::new(Severity::Warning, W001, "x");
        let i = Diagnostic::new(Severity::Info, I001, "x");
        assert!(e.is_error() && !e.is_warning() && !e.is_info());
        assert!(w.is_warning() && !w.is_error());
        assert!(i.is_info() && !i.is_error());
    }

    #[test]
    fn builder_pattern_chains() {
        let d = Diagnostic::new(Severity::Error, E004, "invalid trigger: 'sometimes'")
            .with_field("trigger")
            .with_suggestion("Use one of: always_on, model_decision, glob, manual");
        assert_eq!(d.field, Some("trigger"));
        assert!(d.suggestion.is_some());
    }

    #[test]
    fn serialize_json_omits_none_fields() {
        let d = Diagnostic::new(Severity::Error, E000, "content is empty");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["code"], "E000");
        assert!(json.get("field").is_none());
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn codes_are_unique() {
        let codes = [
            E000, E001, E002, E003, E004, E005, E006, E007, E008, E009, E010, E011, W001, W002,
            W003, W004, W005, W006, W007, I001, I002, P001, P002, P003, P004, P005, P006, R001, R002,
            R003, R004, V001, V002, V003,
        ];
        let mut seen = std::collections::HashSet::new();
        for code in &codes {
            assert!(seen.insert(code), "duplicate code: {code}");
        }
    }
}
