use thiserror::Error;

use crate::agent::AgentId;

/// Errors that can occur while parsing, rendering, or adapting components.
#[derive(Error, Debug)]
pub enum SkillportError {
    /// Source content could not be parsed into a component.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// No parser is registered for the requested agent.
    #[error("no parser registered for agent '{0}'")]
    NoParser(AgentId),

    /// No renderer is registered for the requested agent.
    #[error("no renderer registered for agent '{0}'")]
    NoRenderer(AgentId),

    /// Source agent could not be detected from the content.
    #[error("could not detect the source agent; pass it explicitly")]
    UndetectedAgent,

    /// Version name is not in the catalog for the agent.
    #[error("unknown version '{version}' for agent '{agent}'")]
    UnknownVersion { agent: AgentId, version: String },

    /// A strict downgrade would have deleted fields.
    #[error("downgrade to '{to}' would delete fields: {}", fields.join(", "))]
    LossyDowngrade { to: String, fields: Vec<String> },

    /// A breaking change names a transform that is not registered.
    #[error("transform '{0}' is registered in the catalog but has no implementation")]
    MissingTransform(String),

    /// Rendering failed on malformed IR.
    #[error("render error: {message}")]
    Render { message: String },

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SkillportError {
    /// Shorthand for a [`SkillportError::Parse`].
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Shorthand for a [`SkillportError::Render`].
    pub(crate) fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }
}

/// Convenience alias for `Result<T, SkillportError>`.
pub type Result<T> = std::result::Result<T, SkillportError>;
