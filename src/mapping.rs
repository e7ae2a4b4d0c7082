//! Field-level capability profiles and the compatibility matrix derived
//! from them.
//!
//! Each agent declares, for every IR field, whether its dialect carries the
//! field natively, emulates it, silently assumes a default, or cannot
//! express it at all. The mapping strategy between two agents follows from
//! the two profiles. The matrix is an estimate shown before converting; the
//! real score comes from the renderer's report.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::agent::AgentId;
use crate::registry::Registry;

/// Score deducted per `transform` mapping.
pub const TRANSFORM_PENALTY: u8 = 2;
/// Score deducted per `fallback` mapping.
pub const FALLBACK_PENALTY: u8 = 5;
/// Score deducted per `unsupported` mapping.
pub const UNSUPPORTED_PENALTY: u8 = 10;

/// IR fields tracked by the profiles.
pub const FIELDS: [&str; 12] = [
    "id",
    "intent.summary",
    "activation.mode",
    "activation.globs",
    "invocation.user_invocable",
    "invocation.argument_hint",
    "invocation.requires_confirmation",
    "execution.context",
    "execution.allowed_tools",
    "execution.preferred_model",
    "capabilities.safety_level",
    "hooks",
];

/// How one agent's dialect carries an IR field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSupport {
    /// A frontmatter key or file holds the value.
    Native(&'static str),
    /// Expressed indirectly; the text says how.
    Emulated(&'static str),
    /// Not written; the dialect assumes this value.
    Defaulted(&'static str),
    /// No way to express it.
    Absent(&'static str),
}

use FieldSupport::{Absent, Defaulted, Emulated, Native};

type Profile = [FieldSupport; FIELDS.len()];

const CLAUDE: Profile = [
    Native("name"),
    Native("description"),
    Emulated("disable-model-invocation and user-invocable flags"),
    Native("paths"),
    Native("user-invocable"),
    Native("argument-hint"),
    Absent("no confirmation gate"),
    Native("context"),
    Native("allowed-tools"),
    Native("model"),
    Emulated("inferred from allowed-tools"),
    Native("hooks"),
];

const CODEX: Profile = [
    Native("name"),
    Native("description"),
    Defaulted("suggested"),
    Absent("no path scoping"),
    Defaulted("true"),
    Native("argument-hint"),
    Emulated("approval_policy"),
    Absent("no sub-agents"),
    Absent("no per-prompt tool list"),
    Native("model"),
    Native("sandbox_mode"),
    Absent("no hook events"),
];

const CURSOR: Profile = [
    Emulated("file name"),
    Native("description"),
    Emulated("alwaysApply, globs and description combination"),
    Native("globs"),
    Emulated("companion file under .cursor/commands"),
    Absent("commands take no argument hint"),
    Absent("no confirmation gate"),
    Absent("no sub-agents"),
    Absent("no tool restrictions"),
    Absent("no model selection"),
    Emulated("inferred from body"),
    Native("hooks.json"),
];

const WINDSURF: Profile = [
    Native("name"),
    Native("description"),
    Native("trigger"),
    Native("globs"),
    Emulated("workflow slash command"),
    Absent("workflows take no argument hint"),
    Native("auto_execution_mode"),
    Absent("no sub-agents"),
    Absent("no tool restrictions"),
    Absent("no model selection"),
    Emulated("inferred from body"),
    Absent("no hook events"),
];

const COPILOT: Profile = [
    Emulated("file name"),
    Native("description"),
    Emulated("applyTo"),
    Native("applyTo"),
    Defaulted("true"),
    Native("argument-hint"),
    Absent("no confirmation gate"),
    Absent("agents run in the main chat"),
    Native("tools"),
    Native("model"),
    Emulated("inferred from tools"),
    Absent("no hook events"),
];

const GEMINI: Profile = [
    Native("name"),
    Native("description"),
    Defaulted("manual"),
    Absent("no path scoping"),
    Defaulted("true"),
    Emulated("{{args}} placeholder"),
    Absent("no confirmation gate"),
    Emulated("sub-agent file"),
    Native("tools"),
    Native("model"),
    Emulated("inferred from tools"),
    Absent("no hook events"),
];

const KIRO: Profile = [
    Emulated("file name"),
    Native("description"),
    Native("inclusion"),
    Native("fileMatchPattern"),
    Absent("steering files are not invocable"),
    Absent("no argument hint"),
    Absent("no confirmation gate"),
    Absent("no sub-agents"),
    Absent("no tool restrictions"),
    Absent("no model selection"),
    Absent("no safety declaration"),
    Absent("no hook events"),
];

fn profile(agent: AgentId) -> &'static Profile {
    match agent {
        AgentId::Claude => &CLAUDE,
        AgentId::Codex => &CODEX,
        AgentId::Cursor => &CURSOR,
        AgentId::Windsurf => &WINDSURF,
        AgentId::Copilot => &COPILOT,
        AgentId::Gemini => &GEMINI,
        AgentId::Kiro => &KIRO,
    }
}

/// How `agent` carries `field`, or `None` for an untracked field.
#[must_use]
pub fn field_support(agent: AgentId, field: &str) -> Option<FieldSupport> {
    FIELDS
        .iter()
        .position(|f| *f == field)
        .map(|i| profile(agent)[i])
}

/// How a field travels from one dialect to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum Strategy {
    /// Renamed only.
    Direct {
        source_key: &'static str,
        target_key: &'static str,
    },
    /// Rewritten by a pure function.
    Transform { description: String },
    /// Dropped; the target assumes a default.
    Fallback { default: &'static str },
    /// Lost.
    Unsupported { reason: &'static str },
}

impl Strategy {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Direct { .. } => "direct",
            Strategy::Transform { .. } => "transform",
            Strategy::Fallback { .. } => "fallback",
            Strategy::Unsupported { .. } => "unsupported",
        }
    }

    /// Points this mapping costs in the matrix.
    #[must_use]
    pub fn penalty(&self) -> u8 {
        match self {
            Strategy::Direct { .. } => 0,
            Strategy::Transform { .. } => TRANSFORM_PENALTY,
            Strategy::Fallback { .. } => FALLBACK_PENALTY,
            Strategy::Unsupported { .. } => UNSUPPORTED_PENALTY,
        }
    }
}

/// One `(source, target, field)` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    pub source: AgentId,
    pub target: AgentId,
    pub field: &'static str,
    #[serde(flatten)]
    pub strategy: Strategy,
}

fn strategy(source: FieldSupport, target: FieldSupport) -> Option<Strategy> {
    Some(match (source, target) {
        // Nothing authored on the source side, nothing to carry.
        (Absent(_) | Defaulted(_), _) => return None,
        (Native(source_key), Native(target_key)) => Strategy::Direct {
            source_key,
            target_key,
        },
        (Emulated(how), Native(key)) => Strategy::Transform {
            description: format!("{how} → `{key}`"),
        },
        (_, Emulated(how)) => Strategy::Transform {
            description: how.to_string(),
        },
        (_, Defaulted(default)) => Strategy::Fallback { default },
        (_, Absent(reason)) => Strategy::Unsupported { reason },
    })
}

/// Mapping table for one ordered pair of agents.
///
/// Identical agents map every carried field directly.
#[must_use]
pub fn mappings(source: AgentId, target: AgentId) -> Vec<FieldMapping> {
    let (from, to) = (profile(source), profile(target));
    FIELDS
        .iter()
        .enumerate()
        .filter_map(|(i, &field)| {
            let strategy = if source == target {
                match from[i] {
                    Native(key) => Strategy::Direct {
                        source_key: key,
                        target_key: key,
                    },
                    _ => return None,
                }
            } else {
                strategy(from[i], to[i])?
            };
            Some(FieldMapping {
                source,
                target,
                field,
                strategy,
            })
        })
        .collect()
}

/// Estimated score for converting `source` to `target`.
///
/// 100 on the diagonal; 0 when either agent lacks a parser or renderer in
/// `registry`.
#[must_use]
pub fn pair_score(registry: &Registry, source: AgentId, target: AgentId) -> u8 {
    if !registry.supports(source) || !registry.supports(target) {
        return 0;
    }
    if source == target {
        return 100;
    }
    let penalty: u32 = mappings(source, target)
        .iter()
        .map(|m| u32::from(m.strategy.penalty()))
        .sum();
    u8::try_from(100u32.saturating_sub(penalty)).unwrap_or(0)
}

/// Pairwise compatibility estimates for every catalogued agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompatibilityMatrix(BTreeMap<AgentId, BTreeMap<AgentId, u8>>);

impl CompatibilityMatrix {
    /// Score for `source` → `target`.
    #[must_use]
    pub fn get(&self, source: AgentId, target: AgentId) -> u8 {
        self.0
            .get(&source)
            .and_then(|row| row.get(&target))
            .copied()
            .unwrap_or(0)
    }

    /// Rows in [`AgentId`] order.
    pub fn rows(&self) -> impl Iterator<Item = (AgentId, &BTreeMap<AgentId, u8>)> {
        self.0.iter().map(|(agent, row)| (*agent, row))
    }
}

/// Build the matrix for every agent in [`AgentId::ALL`].
#[must_use]
pub fn compatibility_matrix(registry: &Registry) -> CompatibilityMatrix {
    let matrix = AgentId::ALL
        .into_iter()
        .map(|source| {
            let row = AgentId::ALL
                .into_iter()
                .map(|target| (target, pair_score(registry, source, target)))
                .collect();
            (source, row)
        })
        .collect();
    CompatibilityMatrix(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_is_perfect() {
        let matrix = compatibility_matrix(&Registry::new());
        for agent in AgentId::ALL.into_iter().filter(|a| a.is_convertible()) {
            assert_eq!(matrix.get(agent, agent), 100, "{agent}");
        }
    }

    #[test]
    fn kiro_pairs_score_zero() {
        let matrix = compatibility_matrix(&Registry::new());
        for agent in AgentId::ALL {
            assert_eq!(matrix.get(AgentId::Kiro, agent), 0);
            assert_eq!(matrix.get(agent, AgentId::Kiro), 0);
        }
    }

    #[test]
    fn missing_renderer_zeroes_pair() {
        let registry = Registry::with_agents(&[AgentId::Claude]);
        assert_eq!(pair_score(&registry, AgentId::Claude, AgentId::Claude), 100);
        assert_eq!(pair_score(&registry, AgentId::Claude, AgentId::Cursor), 0);
    }

    #[test]
    fn off_diagonal_scores_are_below_perfect() {
        let matrix = compatibility_matrix(&Registry::new());
        for (source, row) in matrix.rows() {
            for (target, score) in row {
                if source != *target && source.is_convertible() && target.is_convertible() {
                    assert!(*score < 100, "{source} → {target}");
                }
            }
        }
    }

    #[test]
    fn claude_to_cursor_loses_tools() {
        let table = mappings(AgentId::Claude, AgentId::Cursor);
        let tools = table
            .iter()
            .find(|m| m.field == "execution.allowed_tools")
            .unwrap();
        assert_eq!(tools.strategy.kind(), "unsupported");
        let globs = table.iter().find(|m| m.field == "activation.globs").unwrap();
        assert_eq!(
            globs.strategy,
            Strategy::Direct {
                source_key: "paths",
                target_key: "globs"
            }
        );
    }

    #[test]
    fn unauthored_source_fields_are_skipped() {
        let table = mappings(AgentId::Codex, AgentId::Claude);
        assert!(table.iter().all(|m| m.field != "activation.mode"));
        assert!(table.iter().all(|m| m.field != "execution.allowed_tools"));
    }

    #[test]
    fn score_matches_penalty_sum() {
        let registry = Registry::new();
        let expected: u32 = mappings(AgentId::Claude, AgentId::Windsurf)
            .iter()
            .map(|m| u32::from(m.strategy.penalty()))
            .sum();
        assert_eq!(
            u32::from(pair_score(&registry, AgentId::Claude, AgentId::Windsurf)),
            100 - expected
        );
    }

    #[test]
    fn field_support_lookup() {
        assert_eq!(
            field_support(AgentId::Codex, "capabilities.safety_level"),
            Some(Native("sandbox_mode"))
        );
        assert_eq!(field_support(AgentId::Codex, "nope"), None);
    }

    #[test]
    fn matrix_serializes_by_agent_name() {
        let json = serde_json::to_value(compatibility_matrix(&Registry::new())).unwrap();
        assert_eq!(json["claude"]["claude"], 100);
        assert_eq!(json["kiro"]["claude"], 0);
    }
}
