/// Target graph error types
use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("incompatible commands for target '{target}': already produced by `{existing}`, now requested `{requested}`")]
    CommandConflict {
        target: String,
        existing: String,
        requested: String,
    },
}

impl GraphError {
    pub fn conflict(
        target: impl Into<String>,
        existing: impl ToString,
        requested: impl ToString,
    ) -> Self {
        Self::CommandConflict {
            target: target.into(),
            existing: existing.to_string(),
            requested: requested.to_string(),
        }
    }
}
