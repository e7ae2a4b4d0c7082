//! The agent-neutral intermediate representation.
//!
//! Every parser produces a [`ComponentSpec`] and every renderer consumes one.
//! The types here carry no behavior beyond construction and projection.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::errors::SkillportError;
use crate::frontmatter::FrontmatterFormat;
use crate::hooks::HookKind;

/// Default IR version for newly parsed components.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Kind of configuration artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Skill,
    Command,
    Rule,
    Hook,
    Memory,
    Agent,
    Workflow,
    Config,
}

impl ComponentType {
    /// All component types.
    pub const ALL: [ComponentType; 8] = [
        ComponentType::Skill,
        ComponentType::Command,
        ComponentType::Rule,
        ComponentType::Hook,
        ComponentType::Memory,
        ComponentType::Agent,
        ComponentType::Workflow,
        ComponentType::Config,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Skill => "skill",
            ComponentType::Command => "command",
            ComponentType::Rule => "rule",
            ComponentType::Hook => "hook",
            ComponentType::Memory => "memory",
            ComponentType::Agent => "agent",
            ComponentType::Workflow => "workflow",
            ComponentType::Config => "config",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = SkillportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| SkillportError::parse(format!("unknown component type: '{s}'")))
    }
}

/// How a component gets activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    /// Only when the user explicitly invokes it.
    #[default]
    Manual,
    /// The model decides based on the description.
    Suggested,
    /// Always loaded.
    Auto,
    /// Loaded when a trigger (glob, keyword) matches.
    Contextual,
    /// Fired by a lifecycle event.
    Hooked,
}

impl ActivationMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivationMode::Manual => "manual",
            ActivationMode::Suggested => "suggested",
            ActivationMode::Auto => "auto",
            ActivationMode::Contextual => "contextual",
            ActivationMode::Hooked => "hooked",
        }
    }
}

/// Risk carried by running the component unattended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    #[default]
    Safe,
    Sensitive,
    Dangerous,
}

impl SafetyLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyLevel::Safe => "safe",
            SafetyLevel::Sensitive => "sensitive",
            SafetyLevel::Dangerous => "dangerous",
        }
    }
}

/// Where the component's instructions execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// The main conversation.
    #[default]
    Main,
    /// A forked copy of the conversation.
    Fork,
    /// A fresh sub-agent context.
    Isolated,
}

impl ExecutionContext {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionContext::Main => "main",
            ExecutionContext::Fork => "fork",
            ExecutionContext::Isolated => "isolated",
        }
    }
}

/// Condition that activates a contextual or hooked component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Trigger {
    /// File glob, e.g. `src/**/*.rs`.
    Glob { pattern: String },
    /// Keyword in the user request.
    Keyword { word: String },
    /// Lifecycle event with optional tool matcher.
    Event {
        event: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        matcher: Option<String>,
    },
}

impl Trigger {
    /// Glob pattern, if this is a glob trigger.
    #[must_use]
    pub fn as_glob(&self) -> Option<&str> {
        match self {
            Trigger::Glob { pattern } => Some(pattern),
            _ => None,
        }
    }
}

/// Which agent a spec came from, and when that was determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAgent {
    pub agent: AgentId,
    pub detected_at: DateTime<Utc>,
}

/// Human-facing description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Intent {
    /// One-sentence summary.
    pub summary: String,
    /// Full description as authored.
    pub purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when_to_use: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl Intent {
    /// The text a renderer should emit as the target's `description`.
    #[must_use]
    pub fn description(&self) -> &str {
        if self.purpose.is_empty() {
            &self.summary
        } else {
            &self.purpose
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Activation {
    pub mode: ActivationMode,
    pub safety_level: SafetyLevel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_confirmation: Option<bool>,
}

impl Activation {
    /// Glob patterns among the triggers, in order.
    #[must_use]
    pub fn globs(&self) -> Vec<&str> {
        self.triggers.iter().filter_map(Trigger::as_glob).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slash_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,
    pub user_invocable: bool,
}

impl Default for Invocation {
    fn default() -> Self {
        Self {
            slash_command: None,
            argument_hint: None,
            user_invocable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Execution {
    pub context: ExecutionContext,
    /// `None` means unrestricted; `Some(vec![])` means no tools at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_agent: Option<String>,
}

/// Capability flags. Each is set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub needs_shell: bool,
    pub needs_git: bool,
    pub needs_network: bool,
    pub needs_browser: bool,
    pub needs_code_search: bool,
    pub needs_mcp: bool,
    pub provides_analysis: bool,
    pub provides_code_generation: bool,
    pub provides_refactoring: bool,
    pub provides_documentation: bool,
}

/// Capability flag names, matching the [`Capabilities`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    NeedsShell,
    NeedsGit,
    NeedsNetwork,
    NeedsBrowser,
    NeedsCodeSearch,
    NeedsMcp,
    ProvidesAnalysis,
    ProvidesCodeGeneration,
    ProvidesRefactoring,
    ProvidesDocumentation,
}

impl Capabilities {
    /// Set a single flag.
    pub fn set(&mut self, capability: Capability, value: bool) {
        let slot = match capability {
            Capability::NeedsShell => &mut self.needs_shell,
            Capability::NeedsGit => &mut self.needs_git,
            Capability::NeedsNetwork => &mut self.needs_network,
            Capability::NeedsBrowser => &mut self.needs_browser,
            Capability::NeedsCodeSearch => &mut self.needs_code_search,
            Capability::NeedsMcp => &mut self.needs_mcp,
            Capability::ProvidesAnalysis => &mut self.provides_analysis,
            Capability::ProvidesCodeGeneration => &mut self.provides_code_generation,
            Capability::ProvidesRefactoring => &mut self.provides_refactoring,
            Capability::ProvidesDocumentation => &mut self.provides_documentation,
        };
        *slot = value;
    }

    /// Read a single flag.
    #[must_use]
    pub fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::NeedsShell => self.needs_shell,
            Capability::NeedsGit => self.needs_git,
            Capability::NeedsNetwork => self.needs_network,
            Capability::NeedsBrowser => self.needs_browser,
            Capability::NeedsCodeSearch => self.needs_code_search,
            Capability::NeedsMcp => self.needs_mcp,
            Capability::ProvidesAnalysis => self.provides_analysis,
            Capability::ProvidesCodeGeneration => self.provides_code_generation,
            Capability::ProvidesRefactoring => self.provides_refactoring,
            Capability::ProvidesDocumentation => self.provides_documentation,
        }
    }
}

/// Claude Code sub-agent permission modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    Default,
    Plan,
    AcceptEdits,
    BypassPermissions,
}

impl PermissionMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::Plan => "plan",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(PermissionMode::Default),
            "plan" => Some(PermissionMode::Plan),
            "acceptEdits" => Some(PermissionMode::AcceptEdits),
            "bypassPermissions" => Some(PermissionMode::BypassPermissions),
            _ => None,
        }
    }
}

/// Codex sandbox modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxMode {
    ReadOnly,
    WorkspaceWrite,
    DangerFullAccess,
}

impl SandboxMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SandboxMode::ReadOnly => "read-only",
            SandboxMode::WorkspaceWrite => "workspace-write",
            SandboxMode::DangerFullAccess => "danger-full-access",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read-only" => Some(SandboxMode::ReadOnly),
            "workspace-write" => Some(SandboxMode::WorkspaceWrite),
            "danger-full-access" => Some(SandboxMode::DangerFullAccess),
            _ => None,
        }
    }
}

/// Codex approval policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalPolicy {
    Untrusted,
    OnFailure,
    OnRequest,
    Never,
}

impl ApprovalPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalPolicy::Untrusted => "untrusted",
            ApprovalPolicy::OnFailure => "on-failure",
            ApprovalPolicy::OnRequest => "on-request",
            ApprovalPolicy::Never => "never",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "untrusted" => Some(ApprovalPolicy::Untrusted),
            "on-failure" => Some(ApprovalPolicy::OnFailure),
            "on-request" => Some(ApprovalPolicy::OnRequest),
            "never" => Some(ApprovalPolicy::Never),
            _ => None,
        }
    }
}

/// Windsurf rule activation triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindsurfTrigger {
    AlwaysOn,
    ModelDecision,
    Glob,
    Manual,
}

impl WindsurfTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WindsurfTrigger::AlwaysOn => "always_on",
            WindsurfTrigger::ModelDecision => "model_decision",
            WindsurfTrigger::Glob => "glob",
            WindsurfTrigger::Manual => "manual",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "always_on" => Some(WindsurfTrigger::AlwaysOn),
            "model_decision" => Some(WindsurfTrigger::ModelDecision),
            "glob" => Some(WindsurfTrigger::Glob),
            "manual" => Some(WindsurfTrigger::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClaudeExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<PermissionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_model_invocation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_kind: Option<HookKind>,
    /// Hook timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_timeout: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodexExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_mode: Option<SandboxMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_policy: Option<ApprovalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CursorExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_apply: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindsurfExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<WindsurfTrigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_execution_mode: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CopilotExtensions {
    /// Chat mode for prompt files (`agent`, `ask`, `edit`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeminiExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,
}

/// Agent-specific fields with no IR slot, keyed by source agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "agent", rename_all = "lowercase")]
pub enum AgentExtensions {
    #[default]
    None,
    Claude(ClaudeExtensions),
    Codex(CodexExtensions),
    Cursor(CursorExtensions),
    Windsurf(WindsurfExtensions),
    Copilot(CopilotExtensions),
    Gemini(GeminiExtensions),
}

impl AgentExtensions {
    #[must_use]
    pub fn claude(&self) -> Option<&ClaudeExtensions> {
        match self {
            AgentExtensions::Claude(ext) => Some(ext),
            _ => None,
        }
    }

    #[must_use]
    pub fn codex(&self) -> Option<&CodexExtensions> {
        match self {
            AgentExtensions::Codex(ext) => Some(ext),
            _ => None,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> Option<&CursorExtensions> {
        match self {
            AgentExtensions::Cursor(ext) => Some(ext),
            _ => None,
        }
    }

    #[must_use]
    pub fn windsurf(&self) -> Option<&WindsurfExtensions> {
        match self {
            AgentExtensions::Windsurf(ext) => Some(ext),
            _ => None,
        }
    }

    #[must_use]
    pub fn copilot(&self) -> Option<&CopilotExtensions> {
        match self {
            AgentExtensions::Copilot(ext) => Some(ext),
            _ => None,
        }
    }

    #[must_use]
    pub fn gemini(&self) -> Option<&GeminiExtensions> {
        match self {
            AgentExtensions::Gemini(ext) => Some(ext),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_format: Option<FrontmatterFormat>,
    #[serde(default)]
    pub extensions: AgentExtensions,
}

/// Author-supplied hints for one target agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentOverride {
    /// Replacement body for this target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Extra frontmatter fields merged into the rendered output.
    #[serde(default, skip_serializing_if = "serde_yaml_ng::Mapping::is_empty")]
    pub frontmatter: serde_yaml_ng::Mapping,
}

/// One configuration artifact in agent-neutral form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub id: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_agent: Option<SourceAgent>,
    component_type: ComponentType,
    #[serde(default)]
    pub category: BTreeSet<String>,
    pub intent: Intent,
    pub activation: Activation,
    pub invocation: Invocation,
    pub execution: Execution,
    pub body: String,
    pub capabilities: Capabilities,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub agent_overrides: BTreeMap<AgentId, AgentOverride>,
}

impl ComponentSpec {
    /// Create an empty spec of the given type.
    #[must_use]
    pub fn new(id: impl Into<String>, component_type: ComponentType) -> Self {
        Self {
            id: id.into(),
            version: DEFAULT_VERSION.to_string(),
            source_agent: None,
            component_type,
            category: BTreeSet::new(),
            intent: Intent::default(),
            activation: Activation::default(),
            invocation: Invocation::default(),
            execution: Execution::default(),
            body: String::new(),
            capabilities: Capabilities::default(),
            metadata: Metadata::default(),
            agent_overrides: BTreeMap::new(),
        }
    }

    /// The component type assigned at construction.
    #[must_use]
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// Clone this spec as a different component type.
    ///
    /// Used by renderers that emit one artifact as two target files.
    #[must_use]
    pub fn projected_as(&self, component_type: ComponentType) -> Self {
        let mut projected = self.clone();
        projected.component_type = component_type;
        projected
    }

    /// Source agent id, if known.
    #[must_use]
    pub fn source(&self) -> Option<AgentId> {
        self.source_agent.as_ref().map(|s| s.agent)
    }
}
