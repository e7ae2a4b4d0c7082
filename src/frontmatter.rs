//! Frontmatter splitting and rebuilding.
//!
//! Frontmatter is delimited by a line containing exactly `---` at the start
//! of the file and a matching closing line. The block is YAML for most
//! agents and TOML-style `key = value` for Codex; the format is detected
//! from the block itself, never from the file extension. A `+++` delimiter
//! always means TOML.
//!
//! Field maps are [`serde_yaml_ng::Mapping`] regardless of the source
//! format, so every parser works against one representation. Mappings keep
//! insertion order, which makes rebuilt documents deterministic.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};

use crate::errors::{Result, SkillportError};

/// Largest frontmatter block accepted, in bytes.
pub const MAX_FRONTMATTER_BYTES: usize = 64 * 1024;

/// Most YAML alias references accepted in one block.
pub const MAX_YAML_ALIASES: usize = 32;

/// Syntax of a frontmatter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontmatterFormat {
    Yaml,
    Toml,
}

/// A document split into frontmatter fields and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// `None` when the document has no frontmatter block.
    pub format: Option<FrontmatterFormat>,
    pub fields: Mapping,
    pub body: String,
}

impl Document {
    fn plain(body: &str) -> Self {
        Self {
            format: None,
            fields: Mapping::new(),
            body: body.trim().to_string(),
        }
    }

    /// Whether the document had a frontmatter block.
    #[must_use]
    pub fn has_frontmatter(&self) -> bool {
        self.format.is_some()
    }

    /// Rebuild the document text in its own format (YAML when absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the fields cannot be serialized.
    pub fn rebuild(&self) -> Result<String> {
        build(
            self.format.unwrap_or(FrontmatterFormat::Yaml),
            &self.fields,
            &self.body,
        )
    }
}

/// Matches a TOML `key = value` line or a `[table]` header.
static TOML_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:[A-Za-z0-9_."-]+\s*=|\[\[?[A-Za-z0-9_."-]+\]\]?\s*$)"#)
        .expect("TOML line regex must compile")
});

/// Matches a YAML alias reference such as `*anchor`.
static YAML_ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|[\s\[{,])\*[A-Za-z_][\w-]*").expect("alias regex must compile")
});

/// Split `content` into frontmatter fields and body.
///
/// # Errors
///
/// Returns a parse error for empty content, an unterminated or empty block,
/// oversized or alias-heavy frontmatter, or invalid YAML/TOML.
pub fn split(content: &str) -> Result<Document> {
    let normalized = content.replace("\r\n", "\n");
    let text = normalized.strip_prefix('\u{feff}').unwrap_or(&normalized);
    if text.trim().is_empty() {
        return Err(SkillportError::parse("content is empty"));
    }

    let first_line = text.split('\n').next().unwrap_or_default();
    let delimiter = match first_line.trim_end() {
        "---" => "---",
        "+++" => "+++",
        _ => return Ok(Document::plain(text)),
    };

    let rest = text
        .get(first_line.len()..)
        .and_then(|s| s.strip_prefix('\n'))
        .unwrap_or_default();

    let mut offset = 0;
    let mut close = None;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == delimiter {
            close = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let (raw_end, body_start) = close.ok_or_else(|| {
        SkillportError::parse(format!("missing closing {delimiter} delimiter"))
    })?;

    let raw = &rest[..raw_end];
    let body = rest[body_start..].trim_start_matches('\n').trim_end();

    let format = if delimiter == "+++" {
        FrontmatterFormat::Toml
    } else {
        detect_format(raw)
    };
    let fields = parse_fields(raw, format)?;
    if fields.is_empty() {
        return Err(SkillportError::parse("frontmatter is empty"));
    }

    Ok(Document {
        format: Some(format),
        fields,
        body: body.to_string(),
    })
}

/// Guess whether a frontmatter block is YAML or TOML.
///
/// Looks at the first line that is neither blank nor a comment.
#[must_use]
pub fn detect_format(raw: &str) -> FrontmatterFormat {
    let first = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'));
    match first {
        Some(line) if TOML_LINE_RE.is_match(line) && !line.contains(": ") => {
            FrontmatterFormat::Toml
        }
        _ => FrontmatterFormat::Yaml,
    }
}

/// Parse a frontmatter block in the given format into a field map.
///
/// # Errors
///
/// Returns a parse error if the block is oversized, alias-heavy, invalid, or
/// not a mapping.
pub fn parse_fields(raw: &str, format: FrontmatterFormat) -> Result<Mapping> {
    if raw.len() > MAX_FRONTMATTER_BYTES {
        return Err(SkillportError::parse(format!(
            "frontmatter exceeds {MAX_FRONTMATTER_BYTES} bytes"
        )));
    }
    match format {
        FrontmatterFormat::Yaml => parse_yaml_fields(raw),
        FrontmatterFormat::Toml => parse_toml_fields(raw),
    }
}

fn parse_yaml_fields(raw: &str) -> Result<Mapping> {
    let aliases = YAML_ALIAS_RE.find_iter(raw).count();
    if aliases > MAX_YAML_ALIASES {
        return Err(SkillportError::parse(format!(
            "frontmatter uses {aliases} YAML aliases (limit {MAX_YAML_ALIASES})"
        )));
    }
    let value: Value = serde_yaml_ng::from_str(raw)
        .map_err(|e| SkillportError::parse(format!("invalid YAML frontmatter: {e}")))?;
    match value {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(SkillportError::parse("frontmatter must be a mapping")),
    }
}

fn parse_toml_fields(raw: &str) -> Result<Mapping> {
    let table: toml::Table = raw
        .parse()
        .map_err(|e| SkillportError::parse(format!("invalid TOML frontmatter: {e}")))?;
    Ok(table_to_mapping(table))
}

/// Parse a whole file as a TOML document (e.g. Gemini command files).
///
/// # Errors
///
/// Returns a parse error for empty, oversized, or invalid TOML.
pub fn parse_toml_document(content: &str) -> Result<Mapping> {
    if content.trim().is_empty() {
        return Err(SkillportError::parse("content is empty"));
    }
    parse_fields(content, FrontmatterFormat::Toml)
}

/// Build a document from fields and body.
///
/// Fields are emitted in insertion order. An empty field map yields the body
/// alone.
///
/// # Errors
///
/// Returns an error if a field cannot be serialized.
pub fn build(format: FrontmatterFormat, fields: &Mapping, body: &str) -> Result<String> {
    let body = body.trim();
    if fields.is_empty() {
        return Ok(format!("{body}\n"));
    }
    let block = match format {
        FrontmatterFormat::Yaml => serde_yaml_ng::to_string(fields)?,
        FrontmatterFormat::Toml => to_toml_string(fields)?,
    };
    let block = block.trim_end();
    if body.is_empty() {
        Ok(format!("---\n{block}\n---\n"))
    } else {
        Ok(format!("---\n{block}\n---\n\n{body}\n"))
    }
}

/// Serialize a field map as a TOML document.
///
/// # Errors
///
/// Returns an error if TOML serialization fails.
pub fn to_toml_string(fields: &Mapping) -> Result<String> {
    Ok(toml::to_string(&mapping_to_table(fields))?)
}

fn table_to_mapping(table: toml::Table) -> Mapping {
    table
        .into_iter()
        .map(|(k, v)| (Value::String(k), toml_to_yaml(v)))
        .collect()
}

fn toml_to_yaml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Value::Number(f.into()),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Sequence(items.into_iter().map(toml_to_yaml).collect()),
        toml::Value::Table(t) => Value::Mapping(table_to_mapping(t)),
    }
}

fn mapping_to_table(fields: &Mapping) -> toml::Table {
    let mut table = toml::Table::new();
    for (key, value) in fields {
        let Some(key) = key.as_str() else { continue };
        if let Some(v) = yaml_to_toml(value) {
            table.insert(key.to_string(), v);
        }
    }
    table
}

fn yaml_to_toml(value: &Value) -> Option<toml::Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(toml::Value::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(toml::Value::Integer)
            .or_else(|| n.as_f64().map(toml::Value::Float)),
        Value::String(s) => Some(toml::Value::String(s.clone())),
        Value::Sequence(items) => Some(toml::Value::Array(
            items.iter().filter_map(yaml_to_toml).collect(),
        )),
        Value::Mapping(m) => Some(toml::Value::Table(mapping_to_table(m))),
        Value::Tagged(tagged) => yaml_to_toml(&tagged.value),
    }
}

/// Typed accessors over a frontmatter field map.
pub trait FieldsExt {
    /// String value of `key`, if it is a string.
    fn str_field(&self, key: &str) -> Option<&str>;
    /// Boolean value of `key`; accepts `true`/`false` strings too.
    fn bool_field(&self, key: &str) -> Option<bool>;
    /// Unsigned integer value of `key`; accepts numeric strings too.
    fn u64_field(&self, key: &str) -> Option<u64>;
    /// Float value of `key`.
    fn f64_field(&self, key: &str) -> Option<f64>;
    /// List value of `key`: a sequence, or a comma-separated string.
    fn list_field(&self, key: &str) -> Option<Vec<String>>;
    /// Whether `key` is present with any value.
    fn has(&self, key: &str) -> bool;
    /// Insert a string value.
    fn put_str(&mut self, key: &str, value: impl Into<String>);
    /// Insert a list value as a YAML sequence.
    fn put_list(&mut self, key: &str, values: &[String]);
}

impl FieldsExt for Mapping {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn bool_field(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn u64_field(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn f64_field(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn list_field(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            Value::Sequence(items) => Some(
                items
                    .iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.trim().to_string()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            Value::String(s) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }

    fn has(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn put_str(&mut self, key: &str, value: impl Into<String>) {
        self.insert(Value::String(key.to_string()), Value::String(value.into()));
    }

    fn put_list(&mut self, key: &str, values: &[String]) {
        self.insert(
            Value::String(key.to_string()),
            Value::Sequence(values.iter().cloned().map(Value::String).collect()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_yaml_frontmatter() {
        let doc = split("---\nname: demo\ndescription: A demo\n---\n\n# Title\n\nBody.\n").unwrap();
        assert_eq!(doc.format, Some(FrontmatterFormat::Yaml));
        assert_eq!(doc.fields.str_field("name"), Some("demo"));
        assert_eq!(doc.body, "# Title\n\nBody.");
    }

    #[test]
    fn split_toml_frontmatter_between_dashes() {
        let doc = split("---\ndescription = \"Review code\"\nsandbox_mode = \"read-only\"\n---\nBody").unwrap();
        assert_eq!(doc.format, Some(FrontmatterFormat::Toml));
        assert_eq!(doc.fields.str_field("sandbox_mode"), Some("read-only"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn split_plus_delimiters_force_toml() {
        let doc = split("+++\nname = \"x\"\n+++\nBody").unwrap();
        assert_eq!(doc.format, Some(FrontmatterFormat::Toml));
        assert_eq!(doc.fields.str_field("name"), Some("x"));
    }

    #[test]
    fn split_without_frontmatter() {
        let doc = split("# Project rules\n\nUse tabs.\n").unwrap();
        assert!(!doc.has_frontmatter());
        assert!(doc.fields.is_empty());
        assert_eq!(doc.body, "# Project rules\n\nUse tabs.");
    }

    #[test]
    fn split_crlf_line_endings() {
        let doc = split("---\r\nname: demo\r\n---\r\nBody\r\n").unwrap();
        assert_eq!(doc.fields.str_field("name"), Some("demo"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn body_keeps_horizontal_rules() {
        let doc = split("---\nname: x\n---\nabove\n\n---\n\nbelow").unwrap();
        assert!(doc.body.contains("---"));
        assert!(doc.body.ends_with("below"));
    }

    #[test]
    fn empty_content_is_error() {
        assert!(split("").is_err());
        assert!(split("  \n\t\n").is_err());
    }

    #[test]
    fn unterminated_frontmatter_is_error() {
        let err = split("---\nname: x\nBody").unwrap_err();
        assert!(err.to_string().contains("missing closing"));
    }

    #[test]
    fn empty_frontmatter_block_is_error() {
        for content in ["---\n---\nBody", "---\n\n# only a comment\n---\nBody", "+++\n+++\nBody"] {
            let err = split(content).unwrap_err();
            assert!(err.to_string().contains("frontmatter is empty"), "{content:?}");
        }
    }

    #[test]
    fn scalar_frontmatter_is_error() {
        assert!(split("---\njust a string\n---\nBody").is_err());
    }

    #[test]
    fn invalid_yaml_is_error() {
        assert!(split("---\nname: [unclosed\n---\nBody").is_err());
    }

    #[test]
    fn alias_bomb_fails_fast() {
        let mut yaml = String::from("a: &a [x, x, x, x, x, x, x, x, x]\n");
        let mut prev = 'a';
        for c in 'b'..='z' {
            yaml.push_str(&format!("{c}: &{c} [*{prev}, *{prev}, *{prev}, *{prev}, *{prev}]\n"));
            prev = c;
        }
        let content = format!("---\n{yaml}---\nBody");
        let err = split(&content).unwrap_err();
        assert!(err.to_string().contains("aliases"));
    }

    #[test]
    fn deep_nesting_fails_fast() {
        let deep = format!("k: {}{}", "[".repeat(10_000), "]".repeat(10_000));
        let content = format!("---\n{deep}\n---\nBody");
        assert!(split(&content).is_err());
    }

    #[test]
    fn oversized_frontmatter_rejected() {
        let big = format!("k: \"{}\"", "x".repeat(MAX_FRONTMATTER_BYTES + 1));
        let content = format!("---\n{big}\n---\nBody");
        assert!(split(&content).unwrap_err().to_string().contains("exceeds"));
    }

    #[test]
    fn detect_format_ignores_comments() {
        assert_eq!(detect_format("# note\nmodel = \"o3\"\n"), FrontmatterFormat::Toml);
        assert_eq!(detect_format("# note\nmodel: o3\n"), FrontmatterFormat::Yaml);
        assert_eq!(detect_format("[profile]\nmodel = \"o3\"\n"), FrontmatterFormat::Toml);
    }

    #[test]
    fn yaml_with_equals_in_value_stays_yaml() {
        assert_eq!(
            detect_format("description: use a = b style\n"),
            FrontmatterFormat::Yaml
        );
    }

    #[test]
    fn build_keeps_insertion_order() {
        let mut fields = Mapping::new();
        fields.put_str("zeta", "1");
        fields.put_str("alpha", "2");
        let out = build(FrontmatterFormat::Yaml, &fields, "  Body  ").unwrap();
        assert_eq!(out, "---\nzeta: '1'\nalpha: '2'\n---\n\nBody\n");
    }

    #[test]
    fn build_toml_block() {
        let mut fields = Mapping::new();
        fields.put_str("description", "Review");
        let out = build(FrontmatterFormat::Toml, &fields, "Body").unwrap();
        assert!(out.starts_with("---\ndescription = \"Review\"\n---\n"));
        let doc = split(&out).unwrap();
        assert_eq!(doc.format, Some(FrontmatterFormat::Toml));
        assert_eq!(doc.fields.str_field("description"), Some("Review"));
    }

    #[test]
    fn build_without_fields_is_body_only() {
        assert_eq!(build(FrontmatterFormat::Yaml, &Mapping::new(), "Body").unwrap(), "Body\n");
    }

    #[test]
    fn list_field_accepts_comma_string_and_sequence() {
        let doc = split("---\na: Bash, Read\nb:\n  - Grep\n  - Glob\n---\n").unwrap();
        assert_eq!(doc.fields.list_field("a").unwrap(), vec!["Bash", "Read"]);
        assert_eq!(doc.fields.list_field("b").unwrap(), vec!["Grep", "Glob"]);
    }

    #[test]
    fn bool_and_number_accessors() {
        let doc = split("---\nflag: \"true\"\nmode: 3\nt: 0.5\n---\n").unwrap();
        assert_eq!(doc.fields.bool_field("flag"), Some(true));
        assert_eq!(doc.fields.u64_field("mode"), Some(3));
        assert_eq!(doc.fields.f64_field("t"), Some(0.5));
    }

    #[test]
    fn toml_document_parses_multiline_prompt() {
        let fields = parse_toml_document(
            "description = \"Plan\"\nprompt = \"\"\"\nStep one.\nStep two.\n\"\"\"\n",
        )
        .unwrap();
        assert_eq!(fields.str_field("prompt"), Some("Step one.\nStep two.\n"));
    }
}
