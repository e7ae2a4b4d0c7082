//! Hook files: Claude's `hooks` JSON fragment and Cursor's `hooks.json`.
//!
//! Both are flattened into [`HookBinding`]s. Claude event names are the
//! vocabulary the IR uses for [`Trigger::Event`]; Cursor events are mapped
//! onto them (and back) through a fixed table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Severity, E011, W006, W007};
use crate::errors::{Result, SkillportError};
use crate::models::Trigger;

/// Valid Claude Code hook event names.
pub const CLAUDE_EVENTS: &[&str] = &[
    "PreToolUse",
    "PostToolUse",
    "Stop",
    "SubagentStop",
    "SessionStart",
    "SessionEnd",
    "UserPromptSubmit",
    "PreCompact",
    "Notification",
];

/// Valid Cursor hook event names.
pub const CURSOR_EVENTS: &[&str] = &[
    "beforeShellExecution",
    "beforeMCPExecution",
    "afterFileEdit",
    "beforeReadFile",
    "beforeSubmitPrompt",
    "stop",
];

/// Cursor event ↔ (Claude event, matcher).
const CURSOR_EVENT_MAP: &[(&str, &str, Option<&str>)] = &[
    ("beforeShellExecution", "PreToolUse", Some("Bash")),
    ("beforeMCPExecution", "PreToolUse", Some("mcp__.*")),
    ("beforeReadFile", "PreToolUse", Some("Read")),
    ("afterFileEdit", "PostToolUse", Some("Edit|Write")),
    ("beforeSubmitPrompt", "UserPromptSubmit", None),
    ("stop", "Stop", None),
];

const CURSOR_HOOKS_VERSION: u64 = 1;

/// Whether a hook runs a shell command or injects a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    #[default]
    Command,
    Prompt,
}

/// A single hook definition within a Claude event entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookDefinition {
    /// Hook type: `command` or `prompt`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub hook_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

/// A Claude event entry: a matcher and its hooks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hooks: Option<Vec<HookDefinition>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorHookFile {
    version: u64,
    hooks: BTreeMap<String, Vec<CursorHook>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorHook {
    command: String,
}

/// One event → action binding flattened out of a hooks file.
#[derive(Debug, Clone, PartialEq)]
pub struct HookBinding {
    /// Claude event name.
    pub event: String,
    pub matcher: Option<String>,
    pub kind: HookKind,
    /// Command line or prompt text.
    pub action: String,
    pub timeout: Option<f64>,
}

fn events_value(raw: serde_json::Value) -> serde_json::Value {
    match raw {
        serde_json::Value::Object(mut map) if map.contains_key("hooks") => {
            map.remove("hooks").unwrap_or_default()
        }
        other => other,
    }
}

/// Whether `content` looks like a JSON hooks file.
#[must_use]
pub fn looks_like_hooks(content: &str) -> bool {
    let trimmed = content.trim_start();
    trimmed.starts_with('{')
        && (trimmed.contains("\"hooks\"")
            || CLAUDE_EVENTS.iter().any(|e| trimmed.contains(&format!("\"{e}\""))))
}

/// Parse a Claude hooks fragment, with or without the outer `hooks` key.
///
/// # Errors
///
/// Returns a parse error for invalid JSON or an invalid structure.
pub fn parse_claude(content: &str) -> Result<Vec<HookBinding>> {
    let raw: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| SkillportError::parse(format!("invalid hooks JSON: {e}")))?;
    let events: BTreeMap<String, Vec<HookEntry>> = serde_json::from_value(events_value(raw))
        .map_err(|e| SkillportError::parse(format!("invalid hooks structure: {e}")))?;

    let mut bindings = Vec::new();
    for (event, entries) in events {
        for entry in entries {
            for hook in entry.hooks.unwrap_or_default() {
                let (kind, action) = match hook.hook_type.as_deref() {
                    Some("prompt") => (HookKind::Prompt, hook.prompt),
                    _ => (HookKind::Command, hook.command),
                };
                let Some(action) = action else { continue };
                bindings.push(HookBinding {
                    event: event.clone(),
                    matcher: entry.matcher.clone(),
                    kind,
                    action,
                    timeout: hook.timeout,
                });
            }
        }
    }
    if bindings.is_empty() {
        return Err(SkillportError::parse("hooks file defines no hooks"));
    }
    Ok(bindings)
}

/// Render bindings as a Claude hooks fragment (`{"hooks": {...}}`).
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_claude(bindings: &[HookBinding]) -> Result<String> {
    let mut events: BTreeMap<String, Vec<HookEntry>> = BTreeMap::new();
    for binding in bindings {
        let entries = events.entry(binding.event.clone()).or_default();
        let definition = HookDefinition {
            hook_type: Some(
                match binding.kind {
                    HookKind::Command => "command",
                    HookKind::Prompt => "prompt",
                }
                .to_string(),
            ),
            command: (binding.kind == HookKind::Command).then(|| binding.action.clone()),
            prompt: (binding.kind == HookKind::Prompt).then(|| binding.action.clone()),
            timeout: binding.timeout,
        };
        match entries.iter_mut().find(|e| e.matcher == binding.matcher) {
            Some(entry) => entry.hooks.get_or_insert_with(Vec::new).push(definition),
            None => entries.push(HookEntry {
                matcher: binding.matcher.clone(),
                hooks: Some(vec![definition]),
            }),
        }
    }
    let wrapper = serde_json::json!({ "hooks": events });
    Ok(format!("{}\n", serde_json::to_string_pretty(&wrapper)?))
}

/// Map a Cursor event to a Claude event and matcher.
#[must_use]
pub fn from_cursor_event(event: &str) -> Option<(&'static str, Option<&'static str>)> {
    CURSOR_EVENT_MAP
        .iter()
        .find(|(cursor, _, _)| *cursor == event)
        .map(|(_, claude, matcher)| (*claude, *matcher))
}

/// Map a Claude event and matcher to a Cursor event.
///
/// Tool events only map when the matcher is one Cursor has a dedicated event
/// for.
#[must_use]
pub fn to_cursor_event(event: &str, matcher: Option<&str>) -> Option<&'static str> {
    CURSOR_EVENT_MAP
        .iter()
        .find(|(_, claude, m)| *claude == event && (m.is_none() || *m == matcher))
        .map(|(cursor, _, _)| *cursor)
}

/// Parse a Cursor `hooks.json`.
///
/// # Errors
///
/// Returns a parse error for invalid JSON, structure, or unknown events.
pub fn parse_cursor(content: &str) -> Result<Vec<HookBinding>> {
    let file: CursorHookFile = serde_json::from_str(content)
        .map_err(|e| SkillportError::parse(format!("invalid Cursor hooks file: {e}")))?;
    let mut bindings = Vec::new();
    for (event, hooks) in file.hooks {
        let (claude, matcher) = from_cursor_event(&event)
            .ok_or_else(|| SkillportError::parse(format!("unknown Cursor hook event: '{event}'")))?;
        for hook in hooks {
            bindings.push(HookBinding {
                event: claude.to_string(),
                matcher: matcher.map(str::to_string),
                kind: HookKind::Command,
                action: hook.command,
                timeout: None,
            });
        }
    }
    if bindings.is_empty() {
        return Err(SkillportError::parse("hooks file defines no hooks"));
    }
    Ok(bindings)
}

/// Render bindings as a Cursor `hooks.json`.
///
/// Returns the file text and the bindings Cursor has no event for.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_cursor(bindings: &[HookBinding]) -> Result<(String, Vec<HookBinding>)> {
    let mut hooks: BTreeMap<String, Vec<CursorHook>> = BTreeMap::new();
    let mut unmapped = Vec::new();
    for binding in bindings {
        match (
            binding.kind,
            to_cursor_event(&binding.event, binding.matcher.as_deref()),
        ) {
            (HookKind::Command, Some(event)) => hooks
                .entry(event.to_string())
                .or_default()
                .push(CursorHook {
                    command: binding.action.clone(),
                }),
            _ => unmapped.push(binding.clone()),
        }
    }
    let file = CursorHookFile {
        version: CURSOR_HOOKS_VERSION,
        hooks,
    };
    Ok((format!("{}\n", serde_json::to_string_pretty(&file)?), unmapped))
}

/// Event triggers and body text for a set of bindings.
///
/// When every binding runs the same action the body is that action;
/// otherwise it holds one action per line, aligned with the triggers.
#[must_use]
pub fn to_ir(bindings: &[HookBinding]) -> (Vec<Trigger>, String) {
    let triggers = bindings
        .iter()
        .map(|b| Trigger::Event {
            event: b.event.clone(),
            matcher: b.matcher.clone(),
        })
        .collect();
    let first = bindings.first().map(|b| b.action.as_str()).unwrap_or_default();
    let body = if bindings.iter().all(|b| b.action == first) {
        first.to_string()
    } else {
        bindings
            .iter()
            .map(|b| b.action.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    };
    (triggers, body)
}

/// Rebuild bindings from event triggers and a body; the inverse of [`to_ir`].
#[must_use]
pub fn from_ir(
    triggers: &[Trigger],
    body: &str,
    kind: HookKind,
    timeout: Option<f64>,
) -> Vec<HookBinding> {
    let events: Vec<(&str, Option<&str>)> = triggers
        .iter()
        .filter_map(|t| match t {
            Trigger::Event { event, matcher } => Some((event.as_str(), matcher.as_deref())),
            _ => None,
        })
        .collect();
    let lines: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let paired = kind == HookKind::Command && events.len() > 1 && lines.len() == events.len();
    events
        .iter()
        .enumerate()
        .map(|(i, (event, matcher))| HookBinding {
            event: (*event).to_string(),
            matcher: matcher.map(str::to_string),
            kind,
            action: if paired {
                lines[i].to_string()
            } else {
                body.trim().to_string()
            },
            timeout,
        })
        .collect()
}

/// Validate a Claude hooks fragment.
///
/// Never panics; parse failures are reported as diagnostics.
#[must_use]
pub fn validate_claude(content: &str) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    let raw: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            diags.push(Diagnostic::new(
                Severity::Error,
                E011,
                format!("invalid JSON syntax: {e}"),
            ));
            return diags;
        }
    };

    let events: BTreeMap<String, Vec<HookEntry>> = match serde_json::from_value(events_value(raw))
    {
        Ok(m) => m,
        Err(e) => {
            diags.push(Diagnostic::new(
                Severity::Error,
                E011,
                format!("invalid hooks structure: {e}"),
            ));
            return diags;
        }
    };

    for (event_name, entries) in &events {
        if !CLAUDE_EVENTS.contains(&event_name.as_str()) {
            diags.push(
                Diagnostic::new(
                    Severity::Error,
                    E011,
                    format!("unknown event name: \"{event_name}\""),
                )
                .with_field("hooks")
                .with_suggestion(format!("Valid events: {}", CLAUDE_EVENTS.join(", "))),
            );
        }

        for entry in entries {
            let Some(hooks) = &entry.hooks else {
                diags.push(Diagnostic::new(
                    Severity::Error,
                    E011,
                    format!("hook entry for \"{event_name}\" missing `hooks` array"),
                ));
                continue;
            };

            for hook in hooks {
                let hook_type = match hook.hook_type.as_deref() {
                    Some(t @ ("command" | "prompt")) => t,
                    Some(other) => {
                        diags.push(
                            Diagnostic::new(
                                Severity::Error,
                                E011,
                                format!("unknown hook type: \"{other}\""),
                            )
                            .with_suggestion("Valid types: command, prompt"),
                        );
                        continue;
                    }
                    None => {
                        diags.push(Diagnostic::new(
                            Severity::Error,
                            E011,
                            format!("hook in \"{event_name}\" missing `type` field"),
                        ));
                        continue;
                    }
                };

                if hook_type == "command" && hook.command.is_none() {
                    diags.push(Diagnostic::new(
                        Severity::Error,
                        E011,
                        format!("command hook in \"{event_name}\" missing `command` field"),
                    ));
                }
                if hook_type == "prompt" && hook.prompt.is_none() {
                    diags.push(Diagnostic::new(
                        Severity::Error,
                        E011,
                        format!("prompt hook in \"{event_name}\" missing `prompt` field"),
                    ));
                }

                if let Some(timeout) = hook.timeout {
                    if !(5.0..=600.0).contains(&timeout) {
                        diags.push(
                            Diagnostic::new(
                                Severity::Warning,
                                W007,
                                format!("timeout {timeout}s is outside recommended range (5–600s)"),
                            )
                            .with_suggestion("Use a timeout between 5 and 600 seconds"),
                        );
                    }
                }

                if let Some(cmd) = hook.command.as_deref().filter(|c| c.starts_with('/')) {
                    diags.push(
                        Diagnostic::new(
                            Severity::Warning,
                            W006,
                            format!("absolute path in command: \"{cmd}\""),
                        )
                        .with_suggestion("Use a path relative to the project root"),
                    );
                }
            }
        }
    }

    diags
}

/// Validate a Cursor `hooks.json`.
#[must_use]
pub fn validate_cursor(content: &str) -> Vec<Diagnostic> {
    let file: CursorHookFile = match serde_json::from_str(content) {
        Ok(f) => f,
        Err(e) => {
            return vec![Diagnostic::new(
                Severity::Error,
                E011,
                format!("invalid Cursor hooks file: {e}"),
            )
            .with_suggestion("Expected {\"version\": 1, \"hooks\": {\"<event>\": [{\"command\": \"...\"}]}}")];
        }
    };
    let mut diags = Vec::new();
    if file.version != CURSOR_HOOKS_VERSION {
        diags.push(
            Diagnostic::new(
                Severity::Error,
                E011,
                format!("unsupported hooks version: {}", file.version),
            )
            .with_field("version"),
        );
    }
    for (event, hooks) in &file.hooks {
        if !CURSOR_EVENTS.contains(&event.as_str()) {
            diags.push(
                Diagnostic::new(Severity::Error, E011, format!("unknown event name: \"{event}\""))
                    .with_suggestion(format!("Valid events: {}", CURSOR_EVENTS.join(", "))),
            );
        }
        for hook in hooks.iter().filter(|h| h.command.starts_with('/')) {
            diags.push(Diagnostic::new(
                Severity::Warning,
                W006,
                format!("absolute path in command: \"{}\"", hook.command),
            ));
        }
    }
    diags
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLAUDE_HOOKS: &str = r#"{
        "hooks": {
            "PreToolUse": [{
                "matcher": "Bash",
                "hooks": [{ "type": "command", "command": "./scripts/audit.sh", "timeout": 30 }]
            }],
            "Stop": [{ "hooks": [{ "type": "command", "command": "./scripts/audit.sh" }] }]
        }
    }"#;

    #[test]
    fn parse_claude_flattens_bindings() {
        let bindings = parse_claude(CLAUDE_HOOKS).unwrap();
        assert_eq!(bindings.len(), 2);
        let pre = bindings.iter().find(|b| b.event == "PreToolUse").unwrap();
        assert_eq!(pre.matcher.as_deref(), Some("Bash"));
        assert_eq!(pre.timeout, Some(30.0));
        assert_eq!(pre.kind, HookKind::Command);
    }

    #[test]
    fn parse_claude_accepts_bare_events_map() {
        let bindings =
            parse_claude(r#"{ "Stop": [{ "hooks": [{ "type": "prompt", "prompt": "Check" }] }] }"#)
                .unwrap();
        assert_eq!(bindings[0].kind, HookKind::Prompt);
        assert_eq!(bindings[0].action, "Check");
    }

    #[test]
    fn parse_claude_rejects_empty_and_invalid() {
        assert!(parse_claude("{ not json }").is_err());
        assert!(parse_claude(r#"{ "hooks": {} }"#).is_err());
        assert!(parse_claude(r#"["a"]"#).is_err());
    }

    #[test]
    fn claude_render_then_parse_is_stable() {
        let bindings = parse_claude(CLAUDE_HOOKS).unwrap();
        let rendered = render_claude(&bindings).unwrap();
        assert_eq!(parse_claude(&rendered).unwrap(), bindings);
        assert!(rendered.contains("\"type\": \"command\""));
    }

    #[test]
    fn ir_uses_single_body_for_shared_action() {
        let bindings = parse_claude(CLAUDE_HOOKS).unwrap();
        let (triggers, body) = to_ir(&bindings);
        assert_eq!(triggers.len(), 2);
        assert_eq!(body, "./scripts/audit.sh");
        let rebuilt = from_ir(&triggers, &body, HookKind::Command, None);
        assert!(rebuilt.iter().all(|b| b.action == "./scripts/audit.sh"));
    }

    #[test]
    fn ir_pairs_distinct_actions_with_triggers() {
        let bindings = vec![
            HookBinding {
                event: "PreToolUse".into(),
                matcher: Some("Bash".into()),
                kind: HookKind::Command,
                action: "./a.sh".into(),
                timeout: None,
            },
            HookBinding {
                event: "Stop".into(),
                matcher: None,
                kind: HookKind::Command,
                action: "./b.sh".into(),
                timeout: None,
            },
        ];
        let (triggers, body) = to_ir(&bindings);
        assert_eq!(body, "./a.sh\n./b.sh");
        assert_eq!(from_ir(&triggers, &body, HookKind::Command, None), bindings);
    }

    #[test]
    fn cursor_event_mapping_both_ways() {
        assert_eq!(
            to_cursor_event("PreToolUse", Some("Bash")),
            Some("beforeShellExecution")
        );
        assert_eq!(to_cursor_event("PreToolUse", Some("Grep")), None);
        assert_eq!(to_cursor_event("Stop", None), Some("stop"));
        assert_eq!(to_cursor_event("SessionStart", None), None);
        assert_eq!(
            from_cursor_event("afterFileEdit"),
            Some(("PostToolUse", Some("Edit|Write")))
        );
    }

    #[test]
    fn render_cursor_reports_unmapped() {
        let mut bindings = parse_claude(CLAUDE_HOOKS).unwrap();
        bindings.push(HookBinding {
            event: "SessionStart".into(),
            matcher: None,
            kind: HookKind::Command,
            action: "./init.sh".into(),
            timeout: None,
        });
        let (text, unmapped) = render_cursor(&bindings).unwrap();
        assert!(text.contains("\"version\": 1"));
        assert!(text.contains("beforeShellExecution"));
        assert_eq!(unmapped.len(), 1);
        assert_eq!(unmapped[0].event, "SessionStart");
        let parsed = parse_cursor(&text).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn parse_cursor_rejects_unknown_event() {
        let err = parse_cursor(r#"{"version":1,"hooks":{"onSave":[{"command":"x"}]}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn looks_like_hooks_detects_json() {
        assert!(looks_like_hooks(CLAUDE_HOOKS));
        assert!(looks_like_hooks(r#"{"PreToolUse": []}"#));
        assert!(!looks_like_hooks("---\nname: x\n---\n"));
    }

    #[test]
    fn valid_hooks_no_errors() {
        let diags = validate_claude(CLAUDE_HOOKS);
        assert!(diags.iter().all(|d| !d.is_error()), "{diags:?}");
    }

    #[test]
    fn invalid_json_reported() {
        let diags = validate_claude("{ not json }");
        assert!(diags.iter().any(|d| d.code == E011));
    }

    #[test]
    fn unknown_event_reported() {
        let diags = validate_claude(
            r#"{ "OnSave": [{ "hooks": [{ "type": "command", "command": "echo" }] }] }"#,
        );
        assert!(diags.iter().any(|d| d.is_error() && d.message.contains("OnSave")));
    }

    #[test]
    fn missing_type_and_command_reported() {
        let diags = validate_claude(r#"{ "PreToolUse": [{ "hooks": [{ "command": "echo" }] }] }"#);
        assert!(diags.iter().any(|d| d.message.contains("missing `type`")));
        let diags = validate_claude(r#"{ "PreToolUse": [{ "hooks": [{ "type": "command" }] }] }"#);
        assert!(diags.iter().any(|d| d.message.contains("missing `command`")));
    }

    #[test]
    fn timeout_out_of_range_warns() {
        let diags = validate_claude(
            r#"{ "PreToolUse": [{ "hooks": [{ "type": "command", "command": "echo", "timeout": 700 }] }] }"#,
        );
        assert!(diags.iter().any(|d| d.code == W007));
    }

    #[test]
    fn absolute_path_warns() {
        let diags = validate_claude(
            r#"{ "PreToolUse": [{ "hooks": [{ "type": "command", "command": "/usr/bin/test" }] }] }"#,
        );
        assert!(diags.iter().any(|d| d.code == W006));
    }

    #[test]
    fn all_claude_events_accepted() {
        for event in CLAUDE_EVENTS {
            let json = format!(
                r#"{{ "{event}": [{{ "hooks": [{{ "type": "command", "command": "echo" }}] }}] }}"#
            );
            assert!(validate_claude(&json).iter().all(|d| !d.is_error()), "{event}");
        }
    }

    #[test]
    fn cursor_validation() {
        assert!(validate_cursor(r#"{"version":1,"hooks":{"stop":[{"command":"./s.sh"}]}}"#)
            .is_empty());
        let diags = validate_cursor(r#"{"version":2,"hooks":{"onSave":[{"command":"/x"}]}}"#);
        assert_eq!(diags.iter().filter(|d| d.is_error()).count(), 2);
        assert!(diags.iter().any(|d| d.code == W006));
        assert!(validate_cursor("[]").iter().any(|d| d.is_error()));
    }
}
