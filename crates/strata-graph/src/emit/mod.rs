//! Backend emitters
//!
//! Each emitter drains a finished [`TargetGraph`](crate::TargetGraph) into a
//! complete textual build description: copy rules, command rules, pure
//! ordering rules, and one umbrella `all` target depending on every declared
//! target. Emitters render to a string so callers can refuse to persist
//! anything unless the whole construction pass succeeded.

mod make;
mod ninja;

pub use make::MakeEmitter;
pub use ninja::NinjaEmitter;

use crate::graph::TargetGraph;

/// A build-description backend.
pub trait Emitter {
    /// Conventional file name for this backend's output.
    fn default_file_name(&self) -> &'static str;

    /// Render the graph as a complete build description.
    fn emit(&self, graph: &TargetGraph) -> String;
}
