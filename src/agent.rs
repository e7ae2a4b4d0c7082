//! Agent identifiers.
//!
//! Every supported coding assistant is a variant of [`AgentId`]. Dispatch to
//! parsers, renderers, and validators matches exhaustively on this enum, so a
//! new agent cannot be added without wiring every subsystem.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SkillportError;

/// An AI coding assistant with its own configuration dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    /// Claude Code.
    Claude,
    /// OpenAI Codex CLI.
    Codex,
    /// Cursor.
    Cursor,
    /// Windsurf (Cascade).
    Windsurf,
    /// GitHub Copilot.
    Copilot,
    /// Gemini CLI.
    Gemini,
    /// Kiro. Catalogued for version detection only.
    Kiro,
}

impl AgentId {
    /// All agents, in detection priority order.
    pub const ALL: [AgentId; 7] = [
        AgentId::Claude,
        AgentId::Codex,
        AgentId::Cursor,
        AgentId::Windsurf,
        AgentId::Copilot,
        AgentId::Gemini,
        AgentId::Kiro,
    ];

    /// Stable lowercase identifier.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AgentId::Claude => "claude",
            AgentId::Codex => "codex",
            AgentId::Cursor => "cursor",
            AgentId::Windsurf => "windsurf",
            AgentId::Copilot => "copilot",
            AgentId::Gemini => "gemini",
            AgentId::Kiro => "kiro",
        }
    }

    /// Human-readable product name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            AgentId::Claude => "Claude Code",
            AgentId::Codex => "Codex CLI",
            AgentId::Cursor => "Cursor",
            AgentId::Windsurf => "Windsurf",
            AgentId::Copilot => "GitHub Copilot",
            AgentId::Gemini => "Gemini CLI",
            AgentId::Kiro => "Kiro",
        }
    }

    /// Whether the crate ships both a parser and a renderer for this agent.
    #[must_use]
    pub fn is_convertible(self) -> bool {
        !matches!(self, AgentId::Kiro)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = SkillportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let agent = match lowered.as_str() {
            "claude" | "claude-code" => AgentId::Claude,
            "codex" | "openai-codex" => AgentId::Codex,
            "cursor" => AgentId::Cursor,
            "windsurf" | "cascade" => AgentId::Windsurf,
            "copilot" | "github-copilot" => AgentId::Copilot,
            "gemini" | "gemini-cli" => AgentId::Gemini,
            "kiro" => AgentId::Kiro,
            _ => {
                return Err(SkillportError::parse(format!("unknown agent: '{s}'")));
            }
        };
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_from_str() {
        for agent in AgentId::ALL {
            let parsed: AgentId = agent.to_string().parse().unwrap();
            assert_eq!(parsed, agent);
        }
    }

    #[test]
    fn aliases_accepted() {
        assert_eq!("Claude-Code".parse::<AgentId>().unwrap(), AgentId::Claude);
        assert_eq!("cascade".parse::<AgentId>().unwrap(), AgentId::Windsurf);
    }

    #[test]
    fn unknown_agent_rejected() {
        assert!("emacs".parse::<AgentId>().is_err());
    }

    #[test]
    fn kiro_is_not_convertible() {
        assert!(!AgentId::Kiro.is_convertible());
        assert!(AgentId::Claude.is_convertible());
    }

    #[test]
    fn serializes_lowercase() {
        let v = serde_json::to_value(AgentId::Windsurf).unwrap();
        assert_eq!(v, "windsurf");
    }
}
