//! Project manifest parsing and build-option resolution (strata.toml)
//!
//! The manifest declares everything about a project that is not discoverable
//! from the source tree: source roots and the object root, external tool
//! programs, the per-file option table, foreign files, extraction settings,
//! and manual dependency edges.

pub mod error;
pub mod manifest;
pub mod options;

pub use error::{ManifestError, ManifestResult};
pub use manifest::{
    ExtractionConfig, ForeignFile, OptionRule, OptionsConfig, PathsConfig, ProjectManifest,
    ProjectMeta, ToolsConfig,
};
pub use options::{OptionBundle, OptionTable};
