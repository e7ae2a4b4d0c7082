//! Per-dialect validation of raw component text.
//!
//! Validation never mutates its input and never fails: every problem is a
//! [`Diagnostic`]. A result is valid when it has no errors; strict mode
//! also rejects warnings.

use serde::Serialize;
use serde_yaml_ng::{Mapping, Value};
use unicode_normalization::UnicodeNormalization;

use crate::agent::AgentId;
use crate::diagnostics::{
    Diagnostic, Severity, E000, E001, E002, E003, E004, E005, E006, E007, E008, E009, E010, I001,
    I002, W001, W002, W003, W004, W005,
};
use crate::frontmatter::{self, FieldsExt};
use crate::hooks;
use crate::models::{ComponentType, WindsurfTrigger};
use crate::parsers::{legacy_trigger, CHAT_MODES};
use crate::version::catalog;

/// Windsurf ignores rule and workflow text past this many characters.
pub const WINDSURF_CHAR_LIMIT: usize = 12_000;

/// Longest accepted `name`.
pub const MAX_NAME_CHARS: usize = 64;

/// Skill and agent bodies shorter than this draw a warning.
pub const MIN_BODY_CHARS: usize = 20;

/// Bodies longer than this draw a warning.
pub const MAX_BODY_LINES: usize = 500;

/// Names that must not appear as hyphen-delimited segments.
const RESERVED_WORDS: &[&str] = &["anthropic", "claude"];

const CLAUDE_AGENT_MODELS: &[&str] = &["sonnet", "opus", "haiku", "inherit"];
const CLAUDE_AGENT_COLORS: &[&str] = &[
    "red", "blue", "green", "yellow", "purple", "orange", "pink", "cyan",
];
const REASONING_EFFORTS: &[&str] = &["minimal", "low", "medium", "high"];
const KIRO_INCLUSIONS: &[&str] = &["always", "fileMatch", "manual", "auto"];
const SANDBOX_MODES: &[&str] = &["read-only", "workspace-write", "danger-full-access"];
const APPROVAL_POLICIES: &[&str] = &["untrusted", "on-failure", "on-request", "never"];
const LEGACY_APPROVAL_MODES: &[&str] = &["suggest", "auto-edit", "full-auto"];

/// Options for [`validate`].
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Treat warnings as failures.
    pub strict: bool,
    /// Check deprecated and removed constructs against this catalog version.
    pub version: Option<String>,
}

/// Diagnostics grouped by severity.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub info: Vec<Diagnostic>,
}

impl ValidationResult {
    fn new(diags: Vec<Diagnostic>, strict: bool) -> Self {
        let (issues, rest): (Vec<_>, Vec<_>) = diags.into_iter().partition(Diagnostic::is_error);
        let (warnings, info): (Vec<_>, Vec<_>) = rest.into_iter().partition(Diagnostic::is_warning);
        let valid = issues.is_empty() && (!strict || warnings.is_empty());
        Self {
            valid,
            issues,
            warnings,
            info,
        }
    }

    /// Every diagnostic, errors first.
    pub fn all(&self) -> impl Iterator<Item = &Diagnostic> {
        self.issues.iter().chain(&self.warnings).chain(&self.info)
    }
}

/// Frontmatter keys each dialect understands.
fn known_keys(agent: AgentId) -> &'static [&'static str] {
    match agent {
        AgentId::Claude => &[
            "name",
            "description",
            "allowed-tools",
            "tools",
            "model",
            "argument-hint",
            "disable-model-invocation",
            "user-invocable",
            "hidden",
            "context",
            "agent",
            "color",
            "permissionMode",
            "paths",
            "license",
            "metadata",
            "compatibility",
            "version",
            "overrides",
        ],
        AgentId::Codex => &[
            "name",
            "description",
            "argument-hint",
            "model",
            "sandbox_mode",
            "approval_policy",
            "approval_mode",
            "model_reasoning_effort",
            "metadata",
            "overrides",
        ],
        AgentId::Cursor => &["description", "globs", "alwaysApply", "overrides"],
        AgentId::Windsurf => &[
            "name",
            "description",
            "trigger",
            "globs",
            "auto_execution_mode",
            "overrides",
        ],
        AgentId::Copilot => &[
            "name",
            "description",
            "applyTo",
            "mode",
            "agent",
            "tools",
            "model",
            "argument-hint",
            "overrides",
        ],
        AgentId::Gemini => &[
            "name",
            "description",
            "tools",
            "model",
            "temperature",
            "max_turns",
            "overrides",
        ],
        AgentId::Kiro => &["name", "description", "inclusion", "fileMatchPattern"],
    }
}

/// Fields that must be present, for pairs whose files require frontmatter.
fn required_fields(agent: AgentId, component_type: ComponentType) -> Option<&'static [&'static str]> {
    use ComponentType as T;
    match (agent, component_type) {
        (AgentId::Claude, T::Skill) => Some(&["description"]),
        (AgentId::Claude | AgentId::Codex | AgentId::Gemini, T::Agent)
        | (AgentId::Codex | AgentId::Windsurf | AgentId::Copilot, T::Skill) => {
            Some(&["name", "description"])
        }
        (AgentId::Copilot, T::Agent) => Some(&["description"]),
        (AgentId::Windsurf, T::Rule) => Some(&["trigger"]),
        (AgentId::Kiro, T::Rule) => Some(&["inclusion"]),
        (AgentId::Cursor, T::Rule) => Some(&[]),
        _ => None,
    }
}

/// Whether the pair is a whole-file TOML document.
fn is_toml_file(agent: AgentId, component_type: ComponentType) -> bool {
    matches!(
        (agent, component_type),
        (AgentId::Codex, ComponentType::Config) | (AgentId::Gemini, ComponentType::Command)
    )
}

fn error(code: &'static str, message: impl Into<String>) -> Diagnostic {
    Diagnostic::new(Severity::Error, code, message)
}

fn warning(code: &'static str, message: impl Into<String>) -> Diagnostic {
    Diagnostic::new(Severity::Warning, code, message)
}

/// Validate `content` as a `component_type` file of `agent`'s dialect.
#[must_use]
pub fn validate(
    content: &str,
    agent: AgentId,
    component_type: ComponentType,
    options: &ValidateOptions,
) -> ValidationResult {
    ValidationResult::new(diagnose(content, agent, component_type, options), options.strict)
}

fn diagnose(
    content: &str,
    agent: AgentId,
    component_type: ComponentType,
    options: &ValidateOptions,
) -> Vec<Diagnostic> {
    if content.trim().is_empty() {
        return vec![error(E000, "content is empty")];
    }

    let mut diags = Vec::new();
    if agent == AgentId::Windsurf {
        let chars = content.chars().count();
        if chars > WINDSURF_CHAR_LIMIT {
            diags.push(
                error(
                    E010,
                    format!("{chars} characters exceeds the {WINDSURF_CHAR_LIMIT}-character limit"),
                )
                .with_suggestion("Split the content into several files"),
            );
        }
    }

    let fields = match component_type {
        ComponentType::Hook if agent == AgentId::Claude => {
            diags.extend(hooks::validate_claude(content));
            return diags;
        }
        ComponentType::Hook if agent == AgentId::Cursor => {
            diags.extend(hooks::validate_cursor(content));
            return diags;
        }
        _ if is_toml_file(agent, component_type) => {
            match frontmatter::parse_toml_document(content) {
                Ok(table) => {
                    check_toml_file(agent, &table, &mut diags);
                    table
                }
                Err(e) => {
                    diags.push(error(E000, format!("invalid TOML: {e}")));
                    return diags;
                }
            }
        }
        _ => match frontmatter::split(content) {
            Ok(doc) => {
                check_document(agent, component_type, &doc, &mut diags);
                doc.fields
            }
            Err(e) => {
                diags.push(error(E000, e.to_string()));
                return diags;
            }
        },
    };

    check_enums(agent, component_type, &fields, &mut diags);
    if let Some(version) = &options.version {
        check_version(agent, version, &fields, &mut diags);
    }
    diags
}

fn check_toml_file(agent: AgentId, table: &Mapping, diags: &mut Vec<Diagnostic>) {
    if agent != AgentId::Gemini {
        return;
    }
    match table.get("prompt") {
        None => diags.push(error(E002, "missing required field `prompt`").with_field("prompt")),
        Some(Value::String(p)) if p.trim().is_empty() => {
            diags.push(error(E008, "`prompt` is empty").with_field("prompt"));
        }
        Some(Value::String(_)) => {}
        Some(_) => diags.push(error(E003, "`prompt` must be a string").with_field("prompt")),
    }
    check_description(ComponentType::Command, table, diags);
}

fn check_document(
    agent: AgentId,
    component_type: ComponentType,
    doc: &frontmatter::Document,
    diags: &mut Vec<Diagnostic>,
) {
    let f = &doc.fields;
    if let Some(required) = required_fields(agent, component_type) {
        if !doc.has_frontmatter() {
            diags.push(
                error(
                    E001,
                    format!(
                        "{} {} files need a frontmatter block",
                        agent.display_name(),
                        component_type.as_str()
                    ),
                )
                .with_suggestion("Start the file with a `---` delimited block"),
            );
        }
        for field in required {
            if !f.has(field) {
                diags.push(
                    error(E002, format!("missing required field `{field}`")).with_field(field),
                );
            }
        }
    }

    let mut unknown: Vec<&str> = f
        .keys()
        .filter_map(Value::as_str)
        .filter(|k| !known_keys(agent).contains(k))
        .collect();
    unknown.sort_unstable();
    for key in unknown {
        diags.push(warning(W001, format!("unexpected field: '{key}'")));
    }

    match f.get("name") {
        Some(Value::String(name)) => diags.extend(check_name(name)),
        Some(_) => diags.push(error(E003, "`name` must be a string").with_field("name")),
        None => {}
    }
    check_description(component_type, f, diags);
    check_body(component_type, &doc.body, diags);
}

/// Validate a name after NFKC normalization.
fn check_name(name: &str) -> Vec<Diagnostic> {
    let normalized: String = name.nfkc().collect();
    let mut diags = Vec::new();
    if normalized.is_empty() {
        diags.push(error(E002, "`name` must not be empty").with_field("name"));
        return diags;
    }
    if normalized.chars().count() > MAX_NAME_CHARS {
        let head: String = normalized.chars().take(MAX_NAME_CHARS).collect();
        let truncated = head.rfind('-').map_or(head.as_str(), |pos| &head[..pos]);
        diags.push(
            error(E007, format!("name exceeds {MAX_NAME_CHARS} characters"))
                .with_field("name")
                .with_suggestion(format!("Truncate to: '{truncated}'")),
        );
    }

    let valid_chars = normalized
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || (c.is_alphabetic() && !c.is_uppercase()));
    let valid_hyphens =
        !normalized.starts_with('-') && !normalized.ends_with('-') && !normalized.contains("--");
    if !valid_chars || !valid_hyphens {
        diags.push(
            error(E006, format!("name '{normalized}' is not kebab-case"))
                .with_field("name")
                .with_suggestion(format!("Use: '{}'", crate::inference::slugify(&normalized))),
        );
    }

    for word in RESERVED_WORDS {
        if normalized.split('-').any(|segment| segment == *word) {
            diags.push(
                warning(W005, format!("name contains reserved word: '{word}'")).with_field("name"),
            );
        }
    }
    diags
}

fn check_description(component_type: ComponentType, f: &Mapping, diags: &mut Vec<Diagnostic>) {
    let description = match f.get("description") {
        None => return,
        Some(Value::String(d)) => d.trim(),
        Some(_) => {
            diags.push(error(E003, "`description` must be a string").with_field("description"));
            return;
        }
    };
    if description.chars().count() < 20 {
        diags.push(
            Diagnostic::new(Severity::Info, I002, "description is very short")
                .with_field("description"),
        );
    }
    if component_type == ComponentType::Skill && !description.to_lowercase().contains("use when") {
        diags.push(
            Diagnostic::new(Severity::Info, I001, "description lacks a trigger phrase")
                .with_field("description")
                .with_suggestion("Add a sentence starting with \"Use when\""),
        );
    }
}

fn check_body(component_type: ComponentType, body: &str, diags: &mut Vec<Diagnostic>) {
    use ComponentType as T;
    let needs_body = matches!(
        component_type,
        T::Skill | T::Agent | T::Command | T::Workflow | T::Rule
    );
    if needs_body && body.trim().is_empty() {
        diags.push(error(E008, "body is empty"));
        return;
    }
    let chars = body.trim().chars().count();
    if matches!(component_type, T::Skill | T::Agent) && chars < MIN_BODY_CHARS {
        diags.push(warning(
            W003,
            format!("body has {chars} characters; at least {MIN_BODY_CHARS} recommended"),
        ));
    }
    let lines = body.lines().count();
    if lines > MAX_BODY_LINES {
        diags.push(warning(
            W004,
            format!("body has {lines} lines; at most {MAX_BODY_LINES} recommended"),
        ));
    }
}

fn one_of(
    f: &Mapping,
    field: &'static str,
    allowed: &[&str],
    diags: &mut Vec<Diagnostic>,
) {
    match f.get(field) {
        None => {}
        Some(Value::String(v)) if allowed.contains(&v.as_str()) => {}
        Some(Value::String(v)) => diags.push(
            error(E004, format!("invalid {field}: '{v}'"))
                .with_field(field)
                .with_suggestion(format!("Use one of: {}", allowed.join(", "))),
        ),
        Some(_) => diags.push(error(E003, format!("`{field}` must be a string")).with_field(field)),
    }
}

fn check_enums(
    agent: AgentId,
    component_type: ComponentType,
    f: &Mapping,
    diags: &mut Vec<Diagnostic>,
) {
    match agent {
        AgentId::Claude => {
            if component_type == ComponentType::Agent {
                if let Some(model) = f.str_field("model") {
                    if !CLAUDE_AGENT_MODELS.contains(&model) && !model.starts_with("claude-") {
                        diags.push(
                            error(E004, format!("invalid model: '{model}'"))
                                .with_field("model")
                                .with_suggestion("Use sonnet, opus, haiku, inherit, or a full model id"),
                        );
                    }
                }
                one_of(f, "color", CLAUDE_AGENT_COLORS, diags);
            }
        }
        AgentId::Codex => {
            one_of(f, "sandbox_mode", SANDBOX_MODES, diags);
            one_of(f, "approval_policy", APPROVAL_POLICIES, diags);
            one_of(f, "approval_mode", LEGACY_APPROVAL_MODES, diags);
            one_of(f, "model_reasoning_effort", REASONING_EFFORTS, diags);
        }
        AgentId::Cursor => {
            if f.get("alwaysApply").is_some() && f.bool_field("alwaysApply").is_none() {
                diags.push(
                    error(E003, "`alwaysApply` must be a boolean").with_field("alwaysApply"),
                );
            }
        }
        AgentId::Windsurf => {
            if let Some(trigger) = f.str_field("trigger") {
                if WindsurfTrigger::parse(trigger).is_none() {
                    match legacy_trigger(trigger) {
                        Some(modern) => diags.push(
                            warning(W002, format!("trigger '{trigger}' is deprecated"))
                                .with_field("trigger")
                                .with_suggestion(format!("Use '{}'", modern.as_str())),
                        ),
                        None => one_of(
                            f,
                            "trigger",
                            &["always_on", "model_decision", "glob", "manual"],
                            diags,
                        ),
                    }
                }
            } else if f.get("trigger").is_some() {
                diags.push(error(E003, "`trigger` must be a string").with_field("trigger"));
            }
            if f.get("auto_execution_mode").is_some() {
                match f.u64_field("auto_execution_mode") {
                    Some(1..=3) => {}
                    Some(n) => diags.push(
                        error(E005, format!("auto_execution_mode {n} is outside 1..=3"))
                            .with_field("auto_execution_mode"),
                    ),
                    None => diags.push(
                        error(E003, "`auto_execution_mode` must be an integer")
                            .with_field("auto_execution_mode"),
                    ),
                }
            }
        }
        AgentId::Copilot => one_of(f, "mode", CHAT_MODES, diags),
        AgentId::Gemini => {
            if f.get("temperature").is_some() {
                match f.f64_field("temperature") {
                    Some(t) if (0.0..=2.0).contains(&t) => {}
                    Some(t) => diags.push(
                        error(E005, format!("temperature {t} is outside 0..=2"))
                            .with_field("temperature"),
                    ),
                    None => diags.push(
                        error(E003, "`temperature` must be a number").with_field("temperature"),
                    ),
                }
            }
            if f.get("max_turns").is_some() && f.u64_field("max_turns").is_none() {
                diags.push(
                    error(E003, "`max_turns` must be a positive integer").with_field("max_turns"),
                );
            }
        }
        AgentId::Kiro => one_of(f, "inclusion", KIRO_INCLUSIONS, diags),
    }
}

fn check_version(agent: AgentId, version: &str, f: &Mapping, diags: &mut Vec<Diagnostic>) {
    let cat = catalog(agent);
    let Some(idx) = cat.index_of(version) else {
        diags.push(
            error(
                E004,
                format!("unknown {} version: '{version}'", agent.display_name()),
            )
            .with_suggestion(format!(
                "Use one of: {}",
                cat.versions.iter().map(|v| v.name).collect::<Vec<_>>().join(", ")
            )),
        );
        return;
    };
    for entry in &cat.versions[..=idx] {
        for feature in entry.deprecated {
            for field in feature.fields.iter().filter(|k| f.has(k)) {
                diags.push(
                    warning(
                        W002,
                        format!("`{field}` is deprecated since {} {}", agent.display_name(), entry.name),
                    )
                    .with_field(field),
                );
            }
        }
        for feature in entry.removed {
            for field in feature.fields.iter().filter(|k| f.has(k)) {
                diags.push(
                    error(
                        E009,
                        format!("`{field}` was removed in {} {}", agent.display_name(), entry.name),
                    )
                    .with_field(field),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(content: &str, agent: AgentId, component_type: ComponentType) -> ValidationResult {
        validate(content, agent, component_type, &ValidateOptions::default())
    }

    fn codes(result: &ValidationResult) -> Vec<&'static str> {
        result.all().map(|d| d.code).collect()
    }

    #[test]
    fn empty_content_is_invalid_everywhere() {
        for agent in AgentId::ALL {
            for component_type in ComponentType::ALL {
                let result = check(" \n\t", agent, component_type);
                assert!(!result.valid, "{agent} {component_type:?}");
                assert_eq!(result.issues[0].code, E000);
            }
        }
    }

    #[test]
    fn valid_claude_skill() {
        let result = check(
            "---\nname: code-review\ndescription: Reviews code for bugs. Use when asked for a review.\n---\nReview the diff for correctness and style.",
            AgentId::Claude,
            ComponentType::Skill,
        );
        assert!(result.valid, "{:?}", codes(&result));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn missing_frontmatter_and_fields() {
        let result = check("Just a body that is long enough.", AgentId::Claude, ComponentType::Agent);
        assert!(!result.valid);
        let c = codes(&result);
        assert!(c.contains(&E001));
        assert_eq!(c.iter().filter(|c| **c == E002).count(), 2);
    }

    #[test]
    fn name_is_normalized_and_checked() {
        let result = check(
            "---\nname: Code_Review\ndescription: Reviews code carefully. Use when asked.\n---\nReview the diff for correctness.",
            AgentId::Codex,
            ComponentType::Skill,
        );
        assert!(codes(&result).contains(&E006));
        // Full-width letters normalize to ASCII.
        let result = check(
            "---\nname: ｒｅｖｉｅｗ\ndescription: Reviews code carefully. Use when asked.\n---\nReview the diff for correctness.",
            AgentId::Codex,
            ComponentType::Skill,
        );
        assert!(result.valid, "{:?}", codes(&result));
    }

    #[test]
    fn long_name_suggests_truncation() {
        let name = "abcd-".repeat(14) + "end";
        let diags = check_name(&name);
        let long = diags.iter().find(|d| d.code == E007).unwrap();
        assert!(long.suggestion.as_deref().unwrap().starts_with("Truncate to: 'abcd-"));
    }

    #[test]
    fn gemini_temperature_range() {
        let bad = check(
            "---\nname: a\ndescription: Audits code\ntemperature: 2.5\n---\nAudit the code base thoroughly.",
            AgentId::Gemini,
            ComponentType::Agent,
        );
        assert!(codes(&bad).contains(&E005));
        let ok = check(
            "---\nname: a\ndescription: Audits code\ntemperature: 2\n---\nAudit the code base thoroughly.",
            AgentId::Gemini,
            ComponentType::Agent,
        );
        assert!(ok.valid, "{:?}", codes(&ok));
    }

    #[test]
    fn windsurf_trigger_values() {
        let bad = check("---\ntrigger: sometimes\n---\nx", AgentId::Windsurf, ComponentType::Rule);
        assert!(codes(&bad).contains(&E004));
        let legacy = check("---\ntrigger: always\n---\nx", AgentId::Windsurf, ComponentType::Rule);
        assert!(legacy.valid);
        assert_eq!(legacy.warnings[0].code, W002);
    }

    #[test]
    fn windsurf_size_limit() {
        let content = format!("---\ntrigger: always_on\n---\n{}", "x".repeat(WINDSURF_CHAR_LIMIT));
        let result = check(&content, AgentId::Windsurf, ComponentType::Rule);
        assert!(codes(&result).contains(&E010));
    }

    #[test]
    fn codex_config_enums() {
        let result = check(
            "model = \"o3\"\nsandbox_mode = \"everything\"\n",
            AgentId::Codex,
            ComponentType::Config,
        );
        assert!(codes(&result).contains(&E004));
        let ok = check(
            "sandbox_mode = \"read-only\"\napproval_policy = \"on-request\"\n",
            AgentId::Codex,
            ComponentType::Config,
        );
        assert!(ok.valid);
    }

    #[test]
    fn gemini_command_needs_prompt() {
        let result = check("description = \"x\"\n", AgentId::Gemini, ComponentType::Command);
        assert!(codes(&result).contains(&E002));
    }

    #[test]
    fn copilot_mode_enum() {
        let result = check("---\nmode: fast\n---\nDo it.", AgentId::Copilot, ComponentType::Command);
        assert!(codes(&result).contains(&E004));
    }

    #[test]
    fn hooks_delegate_to_hook_checks() {
        let result = check("{not json", AgentId::Cursor, ComponentType::Hook);
        assert!(!result.valid);
    }

    #[test]
    fn version_checks() {
        let options = ValidateOptions {
            strict: false,
            version: Some("2.1".into()),
        };
        let result = validate(
            "---\ndescription: Deploys things\nhidden: true\n---\nRun the release steps.",
            AgentId::Claude,
            ComponentType::Command,
            &options,
        );
        assert!(result.valid);
        assert!(codes(&result).contains(&W002));

        let options = ValidateOptions {
            strict: false,
            version: Some("0.40".into()),
        };
        let result = validate(
            "approval_mode = \"suggest\"\n",
            AgentId::Codex,
            ComponentType::Config,
            &options,
        );
        assert!(codes(&result).contains(&E009));
    }

    #[test]
    fn strict_rejects_warnings() {
        let content = "---\nname: test-skill\ndescription: A test skill\n---\nBody.";
        assert!(check(content, AgentId::Claude, ComponentType::Skill).valid);
        let strict = validate(
            content,
            AgentId::Claude,
            ComponentType::Skill,
            &ValidateOptions {
                strict: true,
                version: None,
            },
        );
        assert!(!strict.valid);
        assert_eq!(strict.warnings[0].code, W003);
    }

    #[test]
    fn validation_does_not_touch_input() {
        let content = String::from("---\ntrigger: glob\nglobs: '*.rs'\n---\nUse rustfmt.");
        let before = content.clone();
        let _ = check(&content, AgentId::Windsurf, ComponentType::Rule);
        assert_eq!(content, before);
    }
}
