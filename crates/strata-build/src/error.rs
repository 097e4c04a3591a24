/// Build-graph construction error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("found more than one module named '{module}': {first} and {second} (module names must be unique for references to resolve)")]
    DuplicateModule {
        module: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Graph(#[from] strata_graph::GraphError),

    #[error(transparent)]
    Manifest(#[from] strata_manifest::ManifestError),

    #[error("cyclic type-export dependency: {cycle}")]
    CyclicDependency { cycle: String },

    #[error("unresolved module reference '{name}' in {file}")]
    UnresolvedReference { name: String, file: String },

    #[error("type-export include of module '{module}' resolves outside the managed tree ({path}); foreign type-export includes are not supported")]
    ForeignTypeInclude { module: String, path: String },

    #[error("dependency analysis failed:\n{output}")]
    DependAnalysis { output: String },

    #[error("failed to run dependency tool '{tool}': {source}")]
    DependSpawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("malformed dependency line: {line}")]
    MalformedDepLine { line: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BuildError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a duplicate-module error.
    pub fn duplicate_module(
        module: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateModule {
            module: module.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create an unresolved-reference error.
    pub fn unresolved(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            name: name.into(),
            file: file.into(),
        }
    }
}
