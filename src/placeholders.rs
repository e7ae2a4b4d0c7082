//! Deterministic body rewrites between agent placeholder syntaxes.
//!
//! Agents that support argument placeholders, shell-output injection, or
//! file-content injection each spell them differently. When a target has an
//! equivalent construct the placeholder is translated; when it does not, it
//! becomes prose or a plain code span and the rewrite is marked degraded so
//! the renderer can record a loss.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::agent::AgentId;

static DOLLAR_ARGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$ARGUMENTS\b").expect("args regex must compile"));

static POSITIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([1-9])\b").expect("positional regex must compile"));

static BANG_BACKTICK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!`([^`\n]+)`").expect("shell regex must compile"));

static AT_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|\s)@([\w./-]+\.[A-Za-z0-9]+)").expect("file ref regex must compile")
});

static MUSTACHE_ARGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*args\s*\}\}").expect("args regex must compile"));

static BANG_BRACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\{([^}\n]+)\}").expect("shell regex must compile"));

static AT_BRACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\{([^}\n]+)\}").expect("file ref regex must compile"));

static COPILOT_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{input:[A-Za-z0-9_-]+(?::[^}]*)?\}").expect("input regex must compile")
});

/// Prose used when the target has no argument placeholder.
pub const ARGUMENTS_PROSE: &str = "the arguments provided by the user";

/// Kind of placeholder rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Arguments,
    Positional,
    Shell,
    FileRef,
}

impl PlaceholderKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PlaceholderKind::Arguments => "argument placeholder",
            PlaceholderKind::Positional => "positional argument",
            PlaceholderKind::Shell => "shell-output injection",
            PlaceholderKind::FileRef => "file-content injection",
        }
    }
}

/// One class of substitution applied to a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub kind: PlaceholderKind,
    pub count: usize,
    /// `true` when the target has no equivalent and the construct became text.
    pub degraded: bool,
}

/// A rewritten body and what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRewrite {
    pub body: String,
    pub substitutions: Vec<Substitution>,
}

struct Syntax {
    arguments: Option<(&'static Regex, &'static str)>,
    positional: bool,
    shell: Option<(&'static Regex, fn(&str) -> String)>,
    file_ref: Option<(&'static Regex, usize, fn(&str) -> String)>,
}

fn bang_backtick(cmd: &str) -> String {
    format!("!`{cmd}`")
}

fn bang_brace(cmd: &str) -> String {
    format!("!{{{cmd}}}")
}

fn at_path(path: &str) -> String {
    format!("@{path}")
}

fn at_brace(path: &str) -> String {
    format!("@{{{path}}}")
}

fn syntax(agent: AgentId) -> Syntax {
    match agent {
        AgentId::Claude => Syntax {
            arguments: Some((&DOLLAR_ARGS_RE, "$ARGUMENTS")),
            positional: true,
            shell: Some((&BANG_BACKTICK_RE, bang_backtick)),
            file_ref: Some((&AT_PATH_RE, 2, at_path)),
        },
        AgentId::Codex => Syntax {
            arguments: Some((&DOLLAR_ARGS_RE, "$ARGUMENTS")),
            positional: true,
            shell: None,
            file_ref: None,
        },
        AgentId::Gemini => Syntax {
            arguments: Some((&MUSTACHE_ARGS_RE, "{{args}}")),
            positional: false,
            shell: Some((&BANG_BRACE_RE, bang_brace)),
            file_ref: Some((&AT_BRACE_RE, 1, at_brace)),
        },
        AgentId::Copilot => Syntax {
            arguments: Some((&COPILOT_INPUT_RE, "${input:args}")),
            positional: false,
            shell: None,
            file_ref: None,
        },
        AgentId::Cursor | AgentId::Windsurf | AgentId::Kiro => Syntax {
            arguments: None,
            positional: false,
            shell: None,
            file_ref: None,
        },
    }
}

/// Rewrite `body` from the `from` agent's placeholder syntax into `to`'s.
///
/// Identical agents, or an unknown source, return the body unchanged.
#[must_use]
pub fn rewrite(body: &str, from: Option<AgentId>, to: AgentId) -> BodyRewrite {
    let unchanged = BodyRewrite {
        body: body.to_string(),
        substitutions: Vec::new(),
    };
    let Some(from) = from else { return unchanged };
    if from == to {
        return unchanged;
    }
    let src = syntax(from);
    let dst = syntax(to);
    let mut text = body.to_string();
    let mut substitutions = Vec::new();

    if let Some((re, _)) = src.arguments {
        let replacement = dst.arguments.map_or(ARGUMENTS_PROSE, |(_, t)| t);
        let count = re.find_iter(&text).count();
        if count > 0 {
            text = re.replace_all(&text, regex::NoExpand(replacement)).into_owned();
            substitutions.push(Substitution {
                kind: PlaceholderKind::Arguments,
                count,
                degraded: dst.arguments.is_none(),
            });
        }
    }

    if src.positional && !dst.positional {
        let count = POSITIONAL_RE.find_iter(&text).count();
        if count > 0 {
            text = POSITIONAL_RE
                .replace_all(&text, |caps: &Captures| format!("argument {}", &caps[1]))
                .into_owned();
            substitutions.push(Substitution {
                kind: PlaceholderKind::Positional,
                count,
                degraded: true,
            });
        }
    }

    if let Some((re, _)) = src.shell {
        let count = re.find_iter(&text).count();
        if count > 0 {
            text = re
                .replace_all(&text, |caps: &Captures| match dst.shell {
                    Some((_, emit)) => emit(&caps[1]),
                    None => format!("`{}`", &caps[1]),
                })
                .into_owned();
            substitutions.push(Substitution {
                kind: PlaceholderKind::Shell,
                count,
                degraded: dst.shell.is_none(),
            });
        }
    }

    if let Some((re, group, _)) = src.file_ref {
        let count = re.find_iter(&text).count();
        if count > 0 {
            text = re
                .replace_all(&text, |caps: &Captures| {
                    let prefix = if group == 2 { &caps[1] } else { "" };
                    let path = &caps[group];
                    match dst.file_ref {
                        Some((_, _, emit)) => format!("{prefix}{}", emit(path)),
                        None => format!("{prefix}`{path}`"),
                    }
                })
                .into_owned();
            substitutions.push(Substitution {
                kind: PlaceholderKind::FileRef,
                count,
                degraded: dst.file_ref.is_none(),
            });
        }
    }

    BodyRewrite {
        body: text,
        substitutions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_agent_is_identity() {
        let out = rewrite("Fix $ARGUMENTS", Some(AgentId::Claude), AgentId::Claude);
        assert_eq!(out.body, "Fix $ARGUMENTS");
        assert!(out.substitutions.is_empty());
    }

    #[test]
    fn unknown_source_is_identity() {
        let out = rewrite("Fix $ARGUMENTS", None, AgentId::Gemini);
        assert_eq!(out.body, "Fix $ARGUMENTS");
    }

    #[test]
    fn claude_arguments_to_gemini() {
        let out = rewrite("Fix issue $ARGUMENTS now", Some(AgentId::Claude), AgentId::Gemini);
        assert_eq!(out.body, "Fix issue {{args}} now");
        assert_eq!(out.substitutions.len(), 1);
        assert!(!out.substitutions[0].degraded);
    }

    #[test]
    fn arguments_become_prose_without_target_syntax() {
        let out = rewrite("Fix $ARGUMENTS", Some(AgentId::Claude), AgentId::Windsurf);
        assert_eq!(out.body, format!("Fix {ARGUMENTS_PROSE}"));
        assert!(out.substitutions[0].degraded);
    }

    #[test]
    fn positional_arguments_kept_for_codex() {
        let out = rewrite("Compare $1 and $2", Some(AgentId::Claude), AgentId::Codex);
        assert_eq!(out.body, "Compare $1 and $2");
        assert!(out.substitutions.is_empty());
    }

    #[test]
    fn positional_arguments_to_prose() {
        let out = rewrite("Compare $1 and $2", Some(AgentId::Claude), AgentId::Cursor);
        assert_eq!(out.body, "Compare argument 1 and argument 2");
        assert_eq!(out.substitutions[0].count, 2);
    }

    #[test]
    fn shell_injection_translated_between_claude_and_gemini() {
        let out = rewrite("Status: !`git status`", Some(AgentId::Claude), AgentId::Gemini);
        assert_eq!(out.body, "Status: !{git status}");
        let back = rewrite(&out.body, Some(AgentId::Gemini), AgentId::Claude);
        assert_eq!(back.body, "Status: !`git status`");
    }

    #[test]
    fn shell_injection_becomes_code_span() {
        let out = rewrite("Status: !`git status`", Some(AgentId::Claude), AgentId::Copilot);
        assert_eq!(out.body, "Status: `git status`");
        assert_eq!(out.substitutions[0].kind, PlaceholderKind::Shell);
        assert!(out.substitutions[0].degraded);
    }

    #[test]
    fn file_refs_translated() {
        let out = rewrite("See @src/main.rs first", Some(AgentId::Claude), AgentId::Gemini);
        assert_eq!(out.body, "See @{src/main.rs} first");
        let back = rewrite("Read @{docs/a.md}", Some(AgentId::Gemini), AgentId::Claude);
        assert_eq!(back.body, "Read @docs/a.md");
    }

    #[test]
    fn email_not_treated_as_file_ref() {
        let out = rewrite("Mail dev@example.com", Some(AgentId::Claude), AgentId::Cursor);
        assert_eq!(out.body, "Mail dev@example.com");
    }

    #[test]
    fn copilot_input_to_claude() {
        let out = rewrite(
            "Name: ${input:name:Component name}",
            Some(AgentId::Copilot),
            AgentId::Claude,
        );
        assert_eq!(out.body, "Name: $ARGUMENTS");
    }
}
