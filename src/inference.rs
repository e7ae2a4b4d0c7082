//! Heuristic inference over free text.
//!
//! Fields the source dialect does not carry (capability flags, category
//! tags, safety level) are inferred from the body with keyword rule tables.
//! The tables are plain data so they can be tested on their own and are the
//! same for every agent. Inference is advisory; a parse never fails on it.

use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

use crate::models::{Capabilities, Capability, SafetyLevel};

/// Maximum identifier length, matching the strictest agent (skill names).
pub const MAX_ID_LEN: usize = 64;

/// Keywords that set one capability flag.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityRule {
    pub capability: Capability,
    pub keywords: &'static [&'static str],
}

/// Keywords that add one category tag.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub tag: &'static str,
    pub keywords: &'static [&'static str],
}

/// Keywords that raise the safety level.
#[derive(Debug, Clone, Copy)]
pub struct SafetyRule {
    pub level: SafetyLevel,
    pub keywords: &'static [&'static str],
}

pub const CAPABILITY_RULES: &[CapabilityRule] = &[
    CapabilityRule {
        capability: Capability::NeedsShell,
        keywords: &["shell", "bash", "terminal", "run the command", "npm ", "cargo ", "make "],
    },
    CapabilityRule {
        capability: Capability::NeedsGit,
        keywords: &["git", "commit", "branch", "pull request", "rebase", "diff"],
    },
    CapabilityRule {
        capability: Capability::NeedsNetwork,
        keywords: &["http", "api", "fetch", "download", "webhook", "curl"],
    },
    CapabilityRule {
        capability: Capability::NeedsBrowser,
        keywords: &["browser", "playwright", "puppeteer", "screenshot", "selenium"],
    },
    CapabilityRule {
        capability: Capability::NeedsCodeSearch,
        keywords: &["grep", "search the codebase", "find usages", "ripgrep", "glob"],
    },
    CapabilityRule {
        capability: Capability::NeedsMcp,
        keywords: &["mcp", "model context protocol"],
    },
    CapabilityRule {
        capability: Capability::ProvidesAnalysis,
        keywords: &["analyze", "analyse", "review", "audit", "inspect", "diagnose"],
    },
    CapabilityRule {
        capability: Capability::ProvidesCodeGeneration,
        keywords: &["generate", "scaffold", "implement", "create a new", "boilerplate"],
    },
    CapabilityRule {
        capability: Capability::ProvidesRefactoring,
        keywords: &["refactor", "rename", "extract", "restructure", "simplify"],
    },
    CapabilityRule {
        capability: Capability::ProvidesDocumentation,
        keywords: &["document", "docstring", "readme", "changelog", "comments"],
    },
];

/// Tool-name prefixes that imply a capability.
pub const TOOL_RULES: &[(&str, Capability)] = &[
    ("bash", Capability::NeedsShell),
    ("shell", Capability::NeedsShell),
    ("runcommand", Capability::NeedsShell),
    ("webfetch", Capability::NeedsNetwork),
    ("websearch", Capability::NeedsNetwork),
    ("fetch", Capability::NeedsNetwork),
    ("grep", Capability::NeedsCodeSearch),
    ("glob", Capability::NeedsCodeSearch),
    ("search", Capability::NeedsCodeSearch),
    ("mcp__", Capability::NeedsMcp),
    ("browser", Capability::NeedsBrowser),
];

pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        tag: "testing",
        keywords: &["test", "coverage", "assert", "tdd"],
    },
    CategoryRule {
        tag: "security",
        keywords: &["security", "vulnerability", "secret", "cve", "injection"],
    },
    CategoryRule {
        tag: "documentation",
        keywords: &["document", "readme", "docstring", "changelog"],
    },
    CategoryRule {
        tag: "git",
        keywords: &["git", "commit", "pull request", "branch"],
    },
    CategoryRule {
        tag: "review",
        keywords: &["review", "audit", "critique"],
    },
    CategoryRule {
        tag: "deployment",
        keywords: &["deploy", "release", "ci/cd", "pipeline", "kubernetes"],
    },
    CategoryRule {
        tag: "refactoring",
        keywords: &["refactor", "cleanup", "clean up", "restructure"],
    },
    CategoryRule {
        tag: "style",
        keywords: &["style guide", "formatting", "lint", "naming convention"],
    },
];

/// Checked in order; the first matching rule wins.
pub const SAFETY_RULES: &[SafetyRule] = &[
    SafetyRule {
        level: SafetyLevel::Dangerous,
        keywords: &[
            "rm -rf",
            "force push",
            "push --force",
            "git reset --hard",
            "drop table",
            "drop database",
            "deploy to production",
            "chmod 777",
            "sudo",
        ],
    },
    SafetyRule {
        level: SafetyLevel::Sensitive,
        keywords: &[
            "git push",
            "deploy",
            "publish",
            "credential",
            "password",
            "api key",
            "migrate the database",
            "delete files",
        ],
    },
];

/// Trigger phrases that mark the "when to use" part of a description.
pub const TRIGGER_PHRASES: &[&str] = &[
    "use when",
    "use for",
    "use this",
    "invoke when",
    "activate when",
];

/// Whether `term` occurs in `haystack` on word boundaries.
///
/// Both arguments are expected in lowercase. Terms that begin or end with a
/// non-alphanumeric character match at that edge unconditionally.
#[must_use]
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    let starts_alnum = term.chars().next().is_some_and(char::is_alphanumeric);
    let ends_alnum = term.chars().last().is_some_and(char::is_alphanumeric);
    haystack.match_indices(term).any(|(start, _)| {
        let before_ok = !starts_alnum
            || haystack[..start]
                .chars()
                .last()
                .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = !ends_alnum
            || haystack[start + term.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

fn matches_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| contains_term(lower, k))
}

/// Infer capability flags from the body and tool allow-list.
#[must_use]
pub fn infer_capabilities(body: &str, tools: Option<&[String]>) -> Capabilities {
    let lower = body.to_lowercase();
    let mut caps = Capabilities::default();
    for rule in CAPABILITY_RULES {
        if matches_any(&lower, rule.keywords) {
            caps.set(rule.capability, true);
        }
    }
    for tool in tools.unwrap_or_default() {
        let tool = tool.to_lowercase();
        for (prefix, capability) in TOOL_RULES {
            if tool.starts_with(prefix) {
                caps.set(*capability, true);
            }
        }
    }
    caps
}

/// Infer category tags from arbitrary text.
#[must_use]
pub fn infer_categories(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    CATEGORY_RULES
        .iter()
        .filter(|rule| matches_any(&lower, rule.keywords))
        .map(|rule| rule.tag.to_string())
        .collect()
}

/// Infer a safety level from the body text.
#[must_use]
pub fn infer_safety(body: &str) -> SafetyLevel {
    let lower = body.to_lowercase();
    SAFETY_RULES
        .iter()
        .find(|rule| matches_any(&lower, rule.keywords))
        .map_or(SafetyLevel::Safe, |rule| rule.level)
}

/// First sentence of a description.
#[must_use]
pub fn summarize(description: &str) -> String {
    let text = description.trim();
    let mut end = text.len();
    for (idx, _) in text.match_indices('.') {
        let next = text[idx + 1..].chars().next();
        if next.is_none_or(char::is_whitespace) {
            end = idx + 1;
            break;
        }
    }
    text[..end].split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The sentence of a description that says when to use the component.
#[must_use]
pub fn when_to_use(description: &str) -> Option<String> {
    description
        .split_inclusive(". ")
        .map(str::trim)
        .find(|sentence| {
            let lower = sentence.to_lowercase();
            TRIGGER_PHRASES.iter().any(|p| lower.contains(p))
        })
        .map(str::to_string)
}

/// Collapse consecutive hyphens into a single hyphen.
fn collapse_hyphens(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_hyphen = false;
    for c in s.chars() {
        if c == '-' {
            if !prev_hyphen {
                result.push(c);
            }
            prev_hyphen = true;
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }
    result
}

/// Derive a kebab-case identifier from free text.
///
/// NFKC-normalizes, lowercases, replaces every run of non-alphanumeric
/// characters with one hyphen, and truncates at a hyphen boundary so the
/// result stays within [`MAX_ID_LEN`].
#[must_use]
pub fn slugify(text: &str) -> String {
    let normalized: String = text.nfkc().collect::<String>().to_lowercase();
    let replaced: String = normalized
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let collapsed = collapse_hyphens(&replaced);
    let trimmed = collapsed.trim_matches('-');
    if trimmed.chars().count() <= MAX_ID_LEN {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(MAX_ID_LEN).collect();
    match head.rfind('-') {
        Some(pos) if pos > 0 => head[..pos].to_string(),
        _ => head,
    }
}

/// First markdown heading text, or else the first non-empty line.
#[must_use]
pub fn first_heading_or_line(body: &str) -> Option<&str> {
    let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());
    let heading = body
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with('#'))
        .map(|l| l.trim_start_matches('#').trim());
    heading.or_else(|| lines.next())
}
