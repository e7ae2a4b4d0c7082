//! The set of parsers and renderers a conversion may dispatch to.
//!
//! A [`Registry`] is built once and never mutated; it is threaded through
//! every call that needs dispatch. Tests build isolated registries with
//! [`Registry::with_agents`].

use crate::agent::AgentId;
use crate::parsers::{
    ClaudeParser, CodexParser, CopilotParser, CursorParser, DialectParser, GeminiParser,
    WindsurfParser,
};
use crate::renderers::{
    ClaudeRenderer, CodexRenderer, CopilotRenderer, CursorRenderer, DialectRenderer,
    GeminiRenderer, WindsurfRenderer,
};

/// Built-in parser for `agent`, if the crate ships one.
#[must_use]
pub fn builtin_parser(agent: AgentId) -> Option<Box<dyn DialectParser>> {
    match agent {
        AgentId::Claude => Some(Box::new(ClaudeParser)),
        AgentId::Codex => Some(Box::new(CodexParser)),
        AgentId::Cursor => Some(Box::new(CursorParser)),
        AgentId::Windsurf => Some(Box::new(WindsurfParser)),
        AgentId::Copilot => Some(Box::new(CopilotParser)),
        AgentId::Gemini => Some(Box::new(GeminiParser)),
        AgentId::Kiro => None,
    }
}

/// Built-in renderer for `agent`, if the crate ships one.
#[must_use]
pub fn builtin_renderer(agent: AgentId) -> Option<Box<dyn DialectRenderer>> {
    match agent {
        AgentId::Claude => Some(Box::new(ClaudeRenderer)),
        AgentId::Codex => Some(Box::new(CodexRenderer)),
        AgentId::Cursor => Some(Box::new(CursorRenderer)),
        AgentId::Windsurf => Some(Box::new(WindsurfRenderer)),
        AgentId::Copilot => Some(Box::new(CopilotRenderer)),
        AgentId::Gemini => Some(Box::new(GeminiRenderer)),
        AgentId::Kiro => None,
    }
}

/// Immutable parser and renderer tables, in detection priority order.
pub struct Registry {
    parsers: Vec<Box<dyn DialectParser>>,
    renderers: Vec<Box<dyn DialectRenderer>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("parsers", &self.parsers.iter().map(|p| p.agent()).collect::<Vec<_>>())
            .field(
                "renderers",
                &self.renderers.iter().map(|r| r.agent()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Registry {
    /// Every built-in parser and renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_agents(&AgentId::ALL)
    }

    /// Built-ins for the given agents only; order follows [`AgentId::ALL`].
    #[must_use]
    pub fn with_agents(agents: &[AgentId]) -> Self {
        let selected = AgentId::ALL.into_iter().filter(|a| agents.contains(a));
        let (parsers, renderers) = selected.fold(
            (Vec::new(), Vec::new()),
            |(mut parsers, mut renderers), agent| {
                parsers.extend(builtin_parser(agent));
                renderers.extend(builtin_renderer(agent));
                (parsers, renderers)
            },
        );
        Self { parsers, renderers }
    }

    #[must_use]
    pub fn parser(&self, agent: AgentId) -> Option<&dyn DialectParser> {
        self.parsers
            .iter()
            .find(|p| p.agent() == agent)
            .map(AsRef::as_ref)
    }

    #[must_use]
    pub fn renderer(&self, agent: AgentId) -> Option<&dyn DialectRenderer> {
        self.renderers
            .iter()
            .find(|r| r.agent() == agent)
            .map(AsRef::as_ref)
    }

    /// Whether `agent` has both a parser and a renderer.
    #[must_use]
    pub fn supports(&self, agent: AgentId) -> bool {
        self.parser(agent).is_some() && self.renderer(agent).is_some()
    }

    /// Agents with both a parser and a renderer.
    #[must_use]
    pub fn agents(&self) -> Vec<AgentId> {
        AgentId::ALL
            .into_iter()
            .filter(|a| self.supports(*a))
            .collect()
    }

    /// First parser, in priority order, that claims `content`.
    ///
    /// The file name is consulted first; when no parser recognizes the path
    /// the content alone decides.
    #[must_use]
    pub fn detect_agent(&self, content: &str, filename: Option<&str>) -> Option<AgentId> {
        let claim = |name: Option<&str>| {
            self.parsers
                .iter()
                .find(|p| p.can_parse(content, name))
                .map(|p| p.agent())
        };
        filename.and_then(|name| claim(Some(name))).or_else(|| claim(None))
    }
}
