//! Convert AI coding-assistant components between agent dialects.
//!
//! Every supported dialect is parsed into one intermediate representation,
//! [`ComponentSpec`], and rendered back out. Losses along the way are
//! recorded in a [`ConversionReport`] together with a fidelity score.
//!
//! ```
//! use skillport::{transform, AgentId, Registry, TransformOptions};
//!
//! let registry = Registry::new();
//! let source = "---\nname: review\ndescription: Review a diff\n---\nReview the staged diff.";
//! let out = transform(
//!     &registry,
//!     source,
//!     &TransformOptions::to(AgentId::Cursor).from(AgentId::Claude),
//! )
//! .unwrap();
//! assert!(out.fidelity_score <= 100);
//! ```

pub mod agent;
pub mod diagnostics;
pub mod diff;
pub mod errors;
pub mod frontmatter;
pub mod hooks;
pub mod inference;
pub mod mapping;
pub mod models;
pub mod parsers;
pub mod placeholders;
pub mod registry;
pub mod renderers;
pub mod report;
pub mod transform;
pub mod validator;
pub mod version;

// Re-export key types at crate root for convenience.
pub use agent::AgentId;
pub use diagnostics::{Diagnostic, Severity};
pub use diff::{body_patch, diff_specs, DiffSeverity, SemanticDiff};
pub use errors::{Result, SkillportError};
pub use mapping::{compatibility_matrix, mappings, CompatibilityMatrix, FieldMapping};
pub use models::{ComponentSpec, ComponentType};
pub use parsers::{DialectParser, ParseOptions, Parsed};
pub use registry::Registry;
pub use renderers::{DialectRenderer, RenderOptions, Rendered};
pub use report::{ConversionLoss, ConversionReport, ConversionWarning, LossSeverity};
pub use transform::{parse, render, transform, TransformOptions, Transformed};
pub use validator::{validate, ValidateOptions, ValidationResult};
pub use version::{
    adapt_version, adapt_version_with, detect_version, AdaptPolicy, VersionAdaptation,
    VersionDetection,
};
