//! Static catalog of dialect versions per agent.
//!
//! Entries are listed oldest first. The catalog is built at compile time and
//! never mutated.

use serde::Serialize;

use crate::agent::AgentId;

/// How a detection marker is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Frontmatter field `pattern` is present.
    FieldPresent,
    /// The document has frontmatter without field `pattern`.
    FieldAbsent,
    /// Frontmatter field `pattern` equals `value`.
    FieldValue,
    /// The file path contains `pattern`.
    FilePattern,
    /// Regex `pattern` matches the body.
    SyntaxPattern,
    /// Regex `pattern` matches the raw content.
    StructurePattern,
}

impl MarkerKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::FieldPresent => "field_present",
            MarkerKind::FieldAbsent => "field_absent",
            MarkerKind::FieldValue => "field_value",
            MarkerKind::FilePattern => "file_pattern",
            MarkerKind::SyntaxPattern => "syntax_pattern",
            MarkerKind::StructurePattern => "structure_pattern",
        }
    }
}

/// A weighted hint that content was written for a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetectionMarker {
    pub kind: MarkerKind,
    pub pattern: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'static str>,
    pub weight: u32,
    /// A match also votes for every later version.
    pub indicates_or_later: bool,
}

impl DetectionMarker {
    /// Short human-readable form, e.g. `field_value trigger=glob`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.value {
            Some(value) => format!("{} {}={value}", self.kind.as_str(), self.pattern),
            None => format!("{} {}", self.kind.as_str(), self.pattern),
        }
    }
}

/// A dialect feature and the frontmatter fields it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub id: &'static str,
    pub fields: &'static [&'static str],
}

/// A documented incompatibility introduced by a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakingChange {
    pub id: &'static str,
    pub description: &'static str,
    pub auto_migratable: bool,
    /// Name of the registered transform, when auto-migratable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<&'static str>,
    /// What to do by hand when no transform applies.
    pub migration: &'static str,
}

/// One named version of an agent's dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub agent: AgentId,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semver: Option<&'static str>,
    pub is_current: bool,
    pub is_supported: bool,
    pub introduced: &'static [Feature],
    pub deprecated: &'static [Feature],
    pub removed: &'static [Feature],
    pub breaking_changes: &'static [BreakingChange],
    pub markers: &'static [DetectionMarker],
}

/// All versions of one agent, oldest first.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AgentCatalog {
    pub agent: AgentId,
    pub versions: &'static [VersionEntry],
    /// Score at which a detection counts as definitive.
    pub definitive_threshold: u32,
}

impl AgentCatalog {
    /// Position of `name` in catalog order.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.versions
            .iter()
            .position(|v| v.name == name || v.semver == Some(name))
    }

    /// The version marked current.
    #[must_use]
    pub fn current(&self) -> &'static VersionEntry {
        let versions = self.versions;
        versions
            .iter()
            .find(|v| v.is_current)
            .unwrap_or(&versions[versions.len() - 1])
    }

    /// Index of the current version.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.versions
            .iter()
            .position(|v| v.is_current)
            .unwrap_or(self.versions.len() - 1)
    }

    /// Look a version up by name or semver.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&'static VersionEntry> {
        let versions = self.versions;
        self.index_of(name).map(|i| &versions[i])
    }
}

/// The catalog for `agent`.
#[must_use]
pub fn catalog(agent: AgentId) -> &'static AgentCatalog {
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

const fn marker(kind: MarkerKind, pattern: &'static str, weight: u32) -> DetectionMarker {
    DetectionMarker {
        kind,
        pattern,
        value: None,
        weight,
        indicates_or_later: false,
    }
}

const fn or_later(kind: MarkerKind, pattern: &'static str, weight: u32) -> DetectionMarker {
    DetectionMarker {
        kind,
        pattern,
        value: None,
        weight,
        indicates_or_later: true,
    }
}

const fn value(
    field: &'static str,
    value: &'static str,
    weight: u32,
    indicates_or_later: bool,
) -> DetectionMarker {
    DetectionMarker {
        kind: MarkerKind::FieldValue,
        pattern: field,
        value: Some(value),
        weight,
        indicates_or_later,
    }
}

use MarkerKind::{FieldPresent, FilePattern, StructurePattern, SyntaxPattern};

// ── Claude Code ─────────────────────────────────────────────────────────

const CLAUDE_HIDDEN: Feature = Feature {
    id: "hidden-commands",
    fields: &["hidden"],
};

static CLAUDE: AgentCatalog = AgentCatalog {
    agent: AgentId::Claude,
    definitive_threshold: 6,
    versions: &[
        VersionEntry {
            agent: AgentId::Claude,
            name: "1.0",
            semver: Some("1.0.0"),
            is_current: false,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "slash-commands",
                    fields: &["description", "allowed-tools"],
                },
                Feature {
                    id: "sub-agents",
                    fields: &["name", "tools", "model"],
                },
                CLAUDE_HIDDEN,
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                or_later(FilePattern, ".claude/commands/", 3),
                or_later(FilePattern, ".claude/agents/", 3),
                marker(FieldPresent, "hidden", 6),
            ],
        },
        VersionEntry {
            agent: AgentId::Claude,
            name: "2.0",
            semver: Some("2.0.0"),
            is_current: false,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "skills",
                    fields: &[],
                },
                Feature {
                    id: "argument-hints",
                    fields: &["argument-hint"],
                },
                Feature {
                    id: "hooks",
                    fields: &[],
                },
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                or_later(FilePattern, "SKILL.md", 6),
                or_later(FilePattern, "hooks.json", 4),
                or_later(FieldPresent, "argument-hint", 2),
            ],
        },
        VersionEntry {
            agent: AgentId::Claude,
            name: "2.1",
            semver: Some("2.1.0"),
            is_current: true,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "fork-context",
                    fields: &["context", "agent"],
                },
                Feature {
                    id: "invocation-control",
                    fields: &["user-invocable", "disable-model-invocation"],
                },
                Feature {
                    id: "path-rules",
                    fields: &["paths"],
                },
            ],
            deprecated: &[CLAUDE_HIDDEN],
            removed: &[],
            breaking_changes: &[BreakingChange {
                id: "hidden-replaced",
                description: "`hidden` replaced by `user-invocable`",
                auto_migratable: true,
                transform: Some("claude-hidden-to-user-invocable"),
                migration: "Replace `hidden: true` with `user-invocable: false`",
            }],
            markers: &[
                marker(FieldPresent, "context", 5),
                marker(FieldPresent, "user-invocable", 5),
                marker(FieldPresent, "disable-model-invocation", 4),
                marker(FieldPresent, "paths", 4),
                marker(FilePattern, ".claude/rules/", 6),
            ],
        },
    ],
};

// ── Codex CLI ───────────────────────────────────────────────────────────

const CODEX_LEGACY_APPROVAL: Feature = Feature {
    id: "approval-mode",
    fields: &["approval_mode"],
};

static CODEX: AgentCatalog = AgentCatalog {
    agent: AgentId::Codex,
    definitive_threshold: 5,
    versions: &[
        VersionEntry {
            agent: AgentId::Codex,
            name: "0.1",
            semver: Some("0.1.0"),
            is_current: false,
            is_supported: false,
            introduced: &[
                Feature {
                    id: "agents-md",
                    fields: &[],
                },
                CODEX_LEGACY_APPROVAL,
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                or_later(FilePattern, "AGENTS.md", 2),
                marker(FieldPresent, "approval_mode", 6),
            ],
        },
        VersionEntry {
            agent: AgentId::Codex,
            name: "0.20",
            semver: Some("0.20.0"),
            is_current: false,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "custom-prompts",
                    fields: &["argument-hint"],
                },
                Feature {
                    id: "sandbox",
                    fields: &["sandbox_mode", "approval_policy"],
                },
            ],
            deprecated: &[],
            removed: &[CODEX_LEGACY_APPROVAL],
            breaking_changes: &[BreakingChange {
                id: "approval-mode-renamed",
                description: "`approval_mode` replaced by `approval_policy`",
                auto_migratable: true,
                transform: Some("codex-approval-mode-to-policy"),
                migration: "Rename `approval_mode` to `approval_policy` and map its value",
            }],
            markers: &[
                or_later(FilePattern, ".codex/prompts/", 5),
                or_later(FieldPresent, "sandbox_mode", 4),
                or_later(FieldPresent, "approval_policy", 4),
            ],
        },
        VersionEntry {
            agent: AgentId::Codex,
            name: "0.40",
            semver: Some("0.40.0"),
            is_current: true,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "skills",
                    fields: &[],
                },
                Feature {
                    id: "reasoning-effort",
                    fields: &["model_reasoning_effort"],
                },
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                marker(FilePattern, ".codex/skills/", 6),
                marker(FieldPresent, "model_reasoning_effort", 4),
                marker(StructurePattern, r"\A---\s*\n[A-Za-z_-]+\s*=", 3),
            ],
        },
    ],
};

// ── Cursor ──────────────────────────────────────────────────────────────

const CURSOR_RULES_FILE: Feature = Feature {
    id: "cursorrules",
    fields: &[],
};

static CURSOR: AgentCatalog = AgentCatalog {
    agent: AgentId::Cursor,
    definitive_threshold: 6,
    versions: &[
        VersionEntry {
            agent: AgentId::Cursor,
            name: "legacy",
            semver: None,
            is_current: false,
            is_supported: true,
            introduced: &[CURSOR_RULES_FILE],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[marker(FilePattern, ".cursorrules", 8)],
        },
        VersionEntry {
            agent: AgentId::Cursor,
            name: "0.45",
            semver: Some("0.45.0"),
            is_current: false,
            is_supported: true,
            introduced: &[Feature {
                id: "mdc-rules",
                fields: &["globs", "alwaysApply"],
            }],
            deprecated: &[CURSOR_RULES_FILE],
            removed: &[],
            breaking_changes: &[BreakingChange {
                id: "cursorrules-to-mdc",
                description: "`.cursorrules` superseded by `.cursor/rules/*.mdc`",
                auto_migratable: false,
                transform: None,
                migration: "Move `.cursorrules` content into `.cursor/rules/*.mdc` files",
            }],
            markers: &[
                or_later(FilePattern, ".mdc", 6),
                or_later(FieldPresent, "alwaysApply", 4),
                or_later(FieldPresent, "globs", 2),
            ],
        },
        VersionEntry {
            agent: AgentId::Cursor,
            name: "1.7",
            semver: Some("1.7.0"),
            is_current: true,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "commands",
                    fields: &[],
                },
                Feature {
                    id: "hooks",
                    fields: &[],
                },
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                marker(FilePattern, ".cursor/commands/", 6),
                marker(FilePattern, "hooks.json", 6),
                marker(
                    StructurePattern,
                    r#""(beforeShellExecution|beforeMCPExecution|afterFileEdit|beforeSubmitPrompt)""#,
                    4,
                ),
            ],
        },
    ],
};

// ── Windsurf ────────────────────────────────────────────────────────────

static WINDSURF: AgentCatalog = AgentCatalog {
    agent: AgentId::Windsurf,
    definitive_threshold: 6,
    versions: &[
        VersionEntry {
            agent: AgentId::Windsurf,
            name: "1.0",
            semver: Some("1.0.0"),
            is_current: false,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "windsurfrules",
                    fields: &[],
                },
                Feature {
                    id: "rules",
                    fields: &["trigger", "globs", "description"],
                },
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                or_later(FilePattern, ".windsurfrules", 6),
                value("trigger", "always", 6, false),
                value("trigger", "model", 6, false),
                value("trigger", "globs", 6, false),
            ],
        },
        VersionEntry {
            agent: AgentId::Windsurf,
            name: "1.10",
            semver: Some("1.10.0"),
            is_current: false,
            is_supported: true,
            introduced: &[Feature {
                id: "workflows",
                fields: &["auto_execution_mode"],
            }],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[BreakingChange {
                id: "trigger-values-renamed",
                description: "rule triggers renamed to always_on, model_decision, glob, manual",
                auto_migratable: true,
                transform: Some("windsurf-trigger-rename"),
                migration: "Rename `trigger` values: always → always_on, model → model_decision, globs → glob",
            }],
            markers: &[
                value("trigger", "always_on", 6, true),
                value("trigger", "model_decision", 6, true),
                value("trigger", "glob", 6, true),
                or_later(FilePattern, ".windsurf/workflows/", 5),
                or_later(FieldPresent, "auto_execution_mode", 4),
            ],
        },
        VersionEntry {
            agent: AgentId::Windsurf,
            name: "1.12",
            semver: Some("1.12.0"),
            is_current: true,
            is_supported: true,
            introduced: &[Feature {
                id: "skills",
                fields: &["name"],
            }],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                marker(FilePattern, ".windsurf/skills/", 6),
                marker(FilePattern, "SKILL.md", 4),
            ],
        },
    ],
};

// ── GitHub Copilot ──────────────────────────────────────────────────────

const COPILOT_CHAT_MODE: Feature = Feature {
    id: "chat-mode",
    fields: &["mode"],
};

static COPILOT: AgentCatalog = AgentCatalog {
    agent: AgentId::Copilot,
    definitive_threshold: 5,
    versions: &[
        VersionEntry {
            agent: AgentId::Copilot,
            name: "1.0",
            semver: Some("1.0.0"),
            is_current: false,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "repository-instructions",
                    fields: &[],
                },
                Feature {
                    id: "path-instructions",
                    fields: &["applyTo"],
                },
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                or_later(FilePattern, "copilot-instructions.md", 6),
                or_later(FilePattern, ".instructions.md", 6),
                or_later(FieldPresent, "applyTo", 3),
            ],
        },
        VersionEntry {
            agent: AgentId::Copilot,
            name: "1.1",
            semver: Some("1.1.0"),
            is_current: false,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "prompt-files",
                    fields: &["tools", "model"],
                },
                COPILOT_CHAT_MODE,
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                or_later(FilePattern, ".prompt.md", 5),
                marker(FieldPresent, "mode", 5),
            ],
        },
        VersionEntry {
            agent: AgentId::Copilot,
            name: "1.2",
            semver: Some("1.2.0"),
            is_current: true,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "custom-agents",
                    fields: &["agent"],
                },
                Feature {
                    id: "argument-hints",
                    fields: &["argument-hint"],
                },
                Feature {
                    id: "skills",
                    fields: &["name"],
                },
            ],
            deprecated: &[COPILOT_CHAT_MODE],
            removed: &[],
            breaking_changes: &[BreakingChange {
                id: "mode-renamed",
                description: "prompt file `mode` renamed to `agent`",
                auto_migratable: true,
                transform: Some("copilot-mode-to-agent"),
                migration: "Rename `mode` to `agent` in prompt files",
            }],
            markers: &[
                or_later(FieldPresent, "agent", 5),
                or_later(FilePattern, ".agent.md", 6),
                marker(FieldPresent, "argument-hint", 3),
                marker(FilePattern, ".github/skills/", 6),
            ],
        },
    ],
};

// ── Gemini CLI ──────────────────────────────────────────────────────────

static GEMINI: AgentCatalog = AgentCatalog {
    agent: AgentId::Gemini,
    definitive_threshold: 6,
    versions: &[
        VersionEntry {
            agent: AgentId::Gemini,
            name: "0.1",
            semver: Some("0.1.0"),
            is_current: false,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "context-file",
                    fields: &[],
                },
                Feature {
                    id: "toml-commands",
                    fields: &["prompt", "description"],
                },
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                or_later(FilePattern, "GEMINI.md", 4),
                or_later(FilePattern, ".gemini/commands/", 6),
                or_later(StructurePattern, r"(?m)^prompt\s*=", 4),
                or_later(SyntaxPattern, r"\{\{args\}\}", 2),
            ],
        },
        VersionEntry {
            agent: AgentId::Gemini,
            name: "0.4",
            semver: Some("0.4.0"),
            is_current: true,
            is_supported: true,
            introduced: &[Feature {
                id: "sub-agents",
                fields: &["temperature", "max_turns"],
            }],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                marker(FilePattern, ".gemini/agents/", 6),
                marker(FieldPresent, "temperature", 4),
                marker(FieldPresent, "max_turns", 4),
                marker(SyntaxPattern, r"!\{[^}]+\}", 3),
            ],
        },
    ],
};

// ── Kiro ────────────────────────────────────────────────────────────────

static KIRO: AgentCatalog = AgentCatalog {
    agent: AgentId::Kiro,
    definitive_threshold: 6,
    versions: &[
        VersionEntry {
            agent: AgentId::Kiro,
            name: "0.1",
            semver: Some("0.1.0"),
            is_current: false,
            is_supported: true,
            introduced: &[Feature {
                id: "steering",
                fields: &["inclusion", "fileMatchPattern"],
            }],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                or_later(FilePattern, ".kiro/steering/", 6),
                or_later(FieldPresent, "inclusion", 4),
            ],
        },
        VersionEntry {
            agent: AgentId::Kiro,
            name: "0.2",
            semver: Some("0.2.0"),
            is_current: true,
            is_supported: true,
            introduced: &[
                Feature {
                    id: "agent-hooks",
                    fields: &[],
                },
                Feature {
                    id: "specs",
                    fields: &[],
                },
            ],
            deprecated: &[],
            removed: &[],
            breaking_changes: &[],
            markers: &[
                marker(FilePattern, ".kiro/hooks/", 6),
                marker(FilePattern, ".kiro/specs/", 6),
                value("inclusion", "fileMatch", 3, false),
            ],
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_agent_has_exactly_one_current_version() {
        for agent in AgentId::ALL {
            let cat = catalog(agent);
            assert_eq!(cat.agent, agent);
            assert!(!cat.versions.is_empty());
            let current = cat.versions.iter().filter(|v| v.is_current).count();
            assert_eq!(current, 1, "{agent}");
            assert!(cat.versions.iter().all(|v| v.agent == agent));
        }
    }

    #[test]
    fn current_version_is_last() {
        for agent in AgentId::ALL {
            let cat = catalog(agent);
            assert_eq!(cat.current_index(), cat.versions.len() - 1, "{agent}");
            assert!(cat.current().is_current);
        }
    }

    #[test]
    fn regex_markers_compile() {
        for agent in AgentId::ALL {
            for version in catalog(agent).versions {
                for m in version.markers {
                    if matches!(m.kind, SyntaxPattern | StructurePattern) {
                        assert!(regex::Regex::new(m.pattern).is_ok(), "{}", m.pattern);
                    }
                }
            }
        }
    }

    #[test]
    fn auto_migratable_changes_name_a_transform() {
        for agent in AgentId::ALL {
            for version in catalog(agent).versions {
                for change in version.breaking_changes {
                    assert_eq!(change.auto_migratable, change.transform.is_some(), "{}", change.id);
                }
            }
        }
    }

    #[test]
    fn lookup_by_name_or_semver() {
        let cat = catalog(AgentId::Claude);
        assert_eq!(cat.index_of("2.0"), Some(1));
        assert_eq!(cat.index_of("2.0.0"), Some(1));
        assert_eq!(cat.find("9.9"), None);
        assert_eq!(cat.current().name, "2.1");
    }

    #[test]
    fn marker_description() {
        assert_eq!(value("trigger", "glob", 1, false).describe(), "field_value trigger=glob");
        assert_eq!(marker(FilePattern, ".mdc", 1).describe(), "file_pattern .mdc");
    }
}
