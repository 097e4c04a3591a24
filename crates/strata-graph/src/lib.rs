//! Backend-agnostic build target graph
//!
//! Stores build targets, their commands, and ordering edges, and drains the
//! finished graph into concrete build-file formats (make, ninja). The graph
//! enforces one command per target: re-declaring an identical command is a
//! no-op, re-declaring a different one is a fatal inconsistency. Emission is
//! always sorted, so an unchanged graph renders byte-identically.

pub mod emit;
pub mod error;
pub mod graph;

pub use emit::{Emitter, MakeEmitter, NinjaEmitter};
pub use error::{GraphError, GraphResult};
pub use graph::{CommandRule, TargetCommand, TargetGraph};
