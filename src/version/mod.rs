//! Dialect versions: the catalog, detection, and adaptation between them.

pub mod catalog;
mod adapter;
mod detector;

pub use adapter::{
    adapt_version, adapt_version_with, AdaptPolicy, Direction, TransformFn, VersionAdaptation,
    TRANSFORMS,
};
pub use catalog::{
    catalog, AgentCatalog, BreakingChange, DetectionMarker, Feature, MarkerKind, VersionEntry,
};
pub use detector::{confidence, detect_version, VersionDetection, BASE_CONFIDENCE};
