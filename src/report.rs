//! Conversion reports and fidelity scoring.
//!
//! A [`ConversionReport`] is produced once per render call. Renderers push
//! losses and warnings into a [`ReportBuilder`]; `finish` computes the
//! fidelity score from them:
//!
//! - start at the target's base score (95–100)
//! - subtract 18 per critical loss, 8 per warning loss, 3 per info loss
//! - subtract 2 per non-loss warning
//! - clamp to `[0, 100]`

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::models::{ComponentSpec, ComponentType};

/// Penalty per critical loss.
pub const CRITICAL_PENALTY: u32 = 18;
/// Penalty per warning loss.
pub const WARNING_PENALTY: u32 = 8;
/// Penalty per info loss.
pub const INFO_PENALTY: u32 = 3;
/// Penalty per non-loss warning.
pub const NOTICE_PENALTY: u32 = 2;

/// How much a loss matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossSeverity {
    /// Cosmetic or metadata only.
    Info,
    /// Degraded, with a textual workaround.
    Warning,
    /// Observable agent behavior changes.
    Critical,
}

impl LossSeverity {
    #[must_use]
    pub fn penalty(self) -> u32 {
        match self {
            LossSeverity::Critical => CRITICAL_PENALTY,
            LossSeverity::Warning => WARNING_PENALTY,
            LossSeverity::Info => INFO_PENALTY,
        }
    }
}

/// An IR feature the target dialect could not express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionLoss {
    /// Area of the IR, e.g. `"execution"`, `"activation"`, `"body"`.
    pub category: String,
    pub severity: LossSeverity,
    /// IR field path, e.g. `"execution.context"`.
    pub source_field: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl ConversionLoss {
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        severity: LossSeverity,
        source_field: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            severity,
            source_field: source_field.into(),
            description: description.into(),
            recommendation: None,
        }
    }

    #[must_use]
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// A non-loss observation made during parsing or rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionWarning {
    /// Stable code from [`crate::diagnostics`].
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ConversionWarning {
    #[must_use]
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentId>,
    pub id: String,
    pub component_type: ComponentType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTarget {
    pub agent: AgentId,
    pub filename: String,
}

/// Outcome of one render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub source: ReportSource,
    pub target: ReportTarget,
    pub fidelity_score: u8,
    pub losses: Vec<ConversionLoss>,
    pub warnings: Vec<ConversionWarning>,
    pub preserved_semantics: Vec<String>,
    pub suggestions: Vec<String>,
    pub converted_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ConversionReport {
    /// Number of losses at the given severity.
    #[must_use]
    pub fn count(&self, severity: LossSeverity) -> usize {
        self.losses.iter().filter(|l| l.severity == severity).count()
    }
}

/// Compute a fidelity score. Always within `[0, 100]`.
#[must_use]
pub fn fidelity_score(base: u8, losses: &[ConversionLoss], warnings: &[ConversionWarning]) -> u8 {
    let penalty: u32 = losses.iter().map(|l| l.severity.penalty()).sum::<u32>()
        + NOTICE_PENALTY * u32::try_from(warnings.len()).unwrap_or(u32::MAX / NOTICE_PENALTY);
    let base = u32::from(base.min(100));
    // Saturating: base is at most 100, so the result fits in u8.
    u8::try_from(base.saturating_sub(penalty)).unwrap_or(0)
}

/// Accumulates a report while a renderer works.
#[derive(Debug)]
pub struct ReportBuilder {
    started: Instant,
    source: ReportSource,
    target: AgentId,
    base_score: u8,
    losses: Vec<ConversionLoss>,
    warnings: Vec<ConversionWarning>,
    preserved: Vec<String>,
    suggestions: Vec<String>,
}

impl ReportBuilder {
    #[must_use]
    pub fn new(spec: &ComponentSpec, target: AgentId, base_score: u8) -> Self {
        Self {
            started: Instant::now(),
            source: ReportSource {
                agent: spec.source(),
                id: spec.id.clone(),
                component_type: spec.component_type(),
            },
            target,
            base_score,
            losses: Vec::new(),
            warnings: Vec::new(),
            preserved: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn loss(&mut self, loss: ConversionLoss) {
        self.losses.push(loss);
    }

    pub fn warn(&mut self, warning: ConversionWarning) {
        self.warnings.push(warning);
    }

    pub fn preserved(&mut self, what: impl Into<String>) {
        self.preserved.push(what.into());
    }

    pub fn suggest(&mut self, suggestion: impl Into<String>) {
        self.suggestions.push(suggestion.into());
    }

    #[must_use]
    pub fn losses(&self) -> &[ConversionLoss] {
        &self.losses
    }

    /// Move the losses and warnings of another report into this one.
    pub fn absorb(&mut self, other: ConversionReport) {
        self.losses.extend(other.losses);
        self.warnings.extend(other.warnings);
        self.preserved.extend(other.preserved_semantics);
        self.suggestions.extend(other.suggestions);
    }

    #[must_use]
    pub fn finish(self, filename: impl Into<String>) -> ConversionReport {
        let fidelity_score = fidelity_score(self.base_score, &self.losses, &self.warnings);
        ConversionReport {
            source: self.source,
            target: ReportTarget {
                agent: self.target,
                filename: filename.into(),
            },
            fidelity_score,
            losses: self.losses,
            warnings: self.warnings,
            preserved_semantics: self.preserved,
            suggestions: self.suggestions,
            converted_at: Utc::now(),
            duration_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}
