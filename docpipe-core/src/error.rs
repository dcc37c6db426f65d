//! Error types for query compilation, pipeline construction and input validation

/// Errors surfaced by the engine.
///
/// Every variant is raised synchronously while compiling criteria, parsing an
/// expression, building a pipeline stage or validating a raw collection.
/// Evaluating a compiled query or pipeline never fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid stage: {0}")]
    InvalidStage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

impl QueryError {
    /// True for errors raised while compiling criteria, expressions or stages
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidOperator(_)
                | QueryError::InvalidFormat(_)
                | QueryError::InvalidRegex(_)
                | QueryError::UnsupportedOperator(_)
                | QueryError::InvalidStage(_)
        )
    }

    /// True when the collection handed to the engine has the wrong shape
    pub fn is_input_error(&self) -> bool {
        matches!(self, QueryError::InvalidInput(_) | QueryError::InvalidJson(_))
    }
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
