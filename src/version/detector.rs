//! Weighted-vote version detection.
//!
//! Every catalog marker that matches adds its weight to its version, and to
//! every later version when it indicates "this version or later". The
//! highest score wins; ties go to the current version.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_yaml_ng::Mapping;

use crate::agent::AgentId;
use crate::frontmatter::{self, FieldsExt};

use super::catalog::{self, DetectionMarker, MarkerKind};

/// Confidence reported when no marker matched.
pub const BASE_CONFIDENCE: u8 = 40;

/// Result of [`detect_version`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDetection {
    pub agent: AgentId,
    pub version: String,
    /// 0 to 100.
    pub confidence: u8,
    pub matched_markers: Vec<String>,
    pub is_definitive: bool,
}

/// What a marker is matched against.
pub(crate) struct Evidence<'a> {
    pub content: &'a str,
    pub path: Option<String>,
    pub fields: Mapping,
    pub has_frontmatter: bool,
    pub body: String,
}

impl<'a> Evidence<'a> {
    pub fn new(content: &'a str, path: Option<&str>) -> Self {
        let path = path.map(|p| p.replace('\\', "/"));
        match frontmatter::split(content) {
            Ok(doc) => Self {
                content,
                path,
                has_frontmatter: doc.has_frontmatter(),
                fields: doc.fields,
                body: doc.body,
            },
            Err(_) => Self {
                content,
                path,
                fields: Mapping::new(),
                has_frontmatter: false,
                body: content.to_string(),
            },
        }
    }
}

/// Whether `marker` matches the evidence.
pub(crate) fn marker_matches(marker: &DetectionMarker, evidence: &Evidence<'_>) -> bool {
    match marker.kind {
        MarkerKind::FieldPresent => evidence.fields.has(marker.pattern),
        MarkerKind::FieldAbsent => {
            evidence.has_frontmatter && !evidence.fields.has(marker.pattern)
        }
        MarkerKind::FieldValue => match (evidence.fields.str_field(marker.pattern), marker.value) {
            (Some(actual), Some(expected)) => actual == expected,
            _ => false,
        },
        MarkerKind::FilePattern => evidence
            .path
            .as_deref()
            .is_some_and(|p| p.contains(marker.pattern)),
        MarkerKind::SyntaxPattern => regex_matches(marker.pattern, &evidence.body),
        MarkerKind::StructurePattern => regex_matches(marker.pattern, evidence.content),
    }
}

/// Every syntax and structure marker in the catalog, compiled once.
static MARKER_REGEXES: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    AgentId::ALL
        .into_iter()
        .flat_map(|agent| catalog::catalog(agent).versions)
        .flat_map(|version| version.markers)
        .filter(|m| matches!(m.kind, MarkerKind::SyntaxPattern | MarkerKind::StructurePattern))
        .map(|m| {
            let re = Regex::new(m.pattern).expect("catalog marker regex must compile");
            (m.pattern, re)
        })
        .collect()
});

fn regex_matches(pattern: &str, haystack: &str) -> bool {
    MARKER_REGEXES
        .get(pattern)
        .is_some_and(|re| re.is_match(haystack))
}

/// Highest score any single version of the catalog can reach.
fn max_score(cat: &catalog::AgentCatalog) -> u32 {
    (0..cat.versions.len())
        .map(|target| {
            cat.versions
                .iter()
                .enumerate()
                .flat_map(|(i, v)| v.markers.iter().map(move |m| (i, m)))
                .filter(|(i, m)| *i == target || (*i < target && m.indicates_or_later))
                .map(|(_, m)| m.weight)
                .sum::<u32>()
        })
        .max()
        .unwrap_or(0)
}

/// Confidence for a winning score against the catalog maximum.
#[must_use]
pub fn confidence(score: u32, max: u32) -> u8 {
    if score == 0 || max == 0 {
        return BASE_CONFIDENCE;
    }
    let scaled = u32::from(BASE_CONFIDENCE) + 60 * score.min(max) / max;
    u8::try_from(scaled.min(100)).unwrap_or(100)
}

/// Guess which version of `agent`'s dialect `content` is written for.
///
/// Deterministic: the same input always yields the same result.
#[must_use]
pub fn detect_version(agent: AgentId, content: &str, path: Option<&str>) -> VersionDetection {
    let cat = catalog::catalog(agent);
    let evidence = Evidence::new(content, path);
    let n = cat.versions.len();
    let mut scores = vec![0u32; n];
    let mut matched: Vec<Vec<String>> = vec![Vec::new(); n];

    for (i, version) in cat.versions.iter().enumerate() {
        for m in version.markers {
            if !marker_matches(m, &evidence) {
                continue;
            }
            let upto = if m.indicates_or_later { n } else { i + 1 };
            for j in i..upto {
                scores[j] += m.weight;
                matched[j].push(m.describe());
            }
        }
    }

    let current = cat.current_index();
    let best = scores.iter().copied().max().unwrap_or(0);
    let winner = if scores[current] == best {
        current
    } else {
        scores.iter().rposition(|&s| s == best).unwrap_or(current)
    };
    let score = scores[winner];
    VersionDetection {
        agent,
        version: cat.versions[winner].name.to_string(),
        confidence: confidence(score, max_score(cat)),
        matched_markers: std::mem::take(&mut matched[winner]),
        is_definitive: score >= cat.definitive_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_marker_is_compiled() {
        for agent in AgentId::ALL {
            for version in catalog::catalog(agent).versions {
                for m in version.markers {
                    if matches!(m.kind, MarkerKind::SyntaxPattern | MarkerKind::StructurePattern) {
                        assert!(
                            MARKER_REGEXES.contains_key(m.pattern),
                            "{agent} {}: {}",
                            version.name,
                            m.pattern
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn no_signal_defaults_to_current() {
        let d = detect_version(AgentId::Claude, "Just text.", None);
        assert_eq!(d.version, "2.1");
        assert_eq!(d.confidence, BASE_CONFIDENCE);
        assert!(d.matched_markers.is_empty());
        assert!(!d.is_definitive);
    }

    #[test]
    fn legacy_field_picks_old_version() {
        let d = detect_version(
            AgentId::Claude,
            "---\ndescription: x\nhidden: true\n---\nBody",
            Some(".claude/commands/x.md"),
        );
        assert_eq!(d.version, "1.0");
        assert!(d.is_definitive);
        assert!(d.matched_markers.contains(&"field_present hidden".to_string()));
    }

    #[test]
    fn or_later_markers_tie_to_current() {
        let d = detect_version(
            AgentId::Cursor,
            "---\nglobs: '*.rs'\nalwaysApply: false\n---\nx",
            Some(".cursor/rules/rust.mdc"),
        );
        assert_eq!(d.version, "1.7");
        assert!(d.is_definitive);
    }

    #[test]
    fn legacy_windsurf_trigger() {
        let d = detect_version(AgentId::Windsurf, "---\ntrigger: always\n---\nx", None);
        assert_eq!(d.version, "1.0");
        let d = detect_version(AgentId::Windsurf, "---\ntrigger: always_on\n---\nx", None);
        assert_eq!(d.version, "1.12");
    }

    #[test]
    fn gemini_sub_agent_markers() {
        let d = detect_version(
            AgentId::Gemini,
            "---\nname: a\ntemperature: 0.2\n---\nx",
            Some(".gemini/agents/a.md"),
        );
        assert_eq!(d.version, "0.4");
        assert!(d.confidence > BASE_CONFIDENCE);
    }

    #[test]
    fn confidence_is_monotonic_in_matched_markers() {
        let weak = detect_version(AgentId::Codex, "---\napproval_mode: suggest\n---\nx", None);
        let strong = detect_version(
            AgentId::Codex,
            "---\napproval_mode: suggest\n---\nx",
            Some("AGENTS.md"),
        );
        assert_eq!(weak.version, "0.1");
        assert_eq!(strong.version, "0.1");
        assert!(strong.confidence >= weak.confidence);
    }

    #[test]
    fn confidence_bounds() {
        assert_eq!(confidence(0, 10), BASE_CONFIDENCE);
        assert_eq!(confidence(10, 10), 100);
        assert_eq!(confidence(50, 10), 100);
        assert_eq!(confidence(5, 10), 70);
    }

    #[test]
    fn field_absent_needs_frontmatter() {
        let m = DetectionMarker {
            kind: MarkerKind::FieldAbsent,
            pattern: "name",
            value: None,
            weight: 1,
            indicates_or_later: false,
        };
        assert!(marker_matches(&m, &Evidence::new("---\nx: 1\n---\nb", None)));
        assert!(!marker_matches(&m, &Evidence::new("---\nname: a\n---\nb", None)));
        assert!(!marker_matches(&m, &Evidence::new("plain", None)));
    }

    #[test]
    fn syntax_pattern_reads_body_only() {
        let m = DetectionMarker {
            kind: MarkerKind::SyntaxPattern,
            pattern: "secret",
            value: None,
            weight: 1,
            indicates_or_later: false,
        };
        assert!(!marker_matches(&m, &Evidence::new("---\nsecret: 1\n---\nbody", None)));
        assert!(marker_matches(&m, &Evidence::new("---\nx: 1\n---\nthe secret", None)));
    }

    #[test]
    fn kiro_is_detectable() {
        let d = detect_version(
            AgentId::Kiro,
            "---\ninclusion: always\n---\nx",
            Some(".kiro/steering/tech.md"),
        );
        assert_eq!(d.version, "0.2");
        assert!(d.is_definitive);
    }
}
