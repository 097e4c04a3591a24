//! Build-graph synthesis for the Strata verification pipeline
//!
//! Strata models a multi-stage pipeline (meta-source files translated into
//! a verifier-native interface/implementation pair, checked by an external
//! verifier, optionally extracted into a compiled form) as a
//! backend-agnostic build graph:
//! - Source discovery and module registration (globally-unique names)
//! - Directive scanning of meta-source files (include/open/friend forms)
//! - Integration of an external whole-project dependency-inference tool
//! - Deterministic topological type-export ordering per meta-source file
//!
//! Construction is one synchronous pass owned by a single [`GraphBuilder`];
//! the finished [`strata_graph::TargetGraph`] is drained by backend
//! emitters. Any fatal error aborts before backend output exists.

pub mod builder;
pub mod depend;
pub mod directives;
pub mod error;
mod export_order;
pub mod registry;
mod scan;
pub mod source;

pub use builder::GraphBuilder;
pub use depend::DependTool;
pub use directives::{Directive, DirectiveScanner};
pub use error::{BuildError, BuildResult};
pub use registry::ModuleRegistry;
pub use source::{ObjectLayout, SourceFile, SourceKind};
