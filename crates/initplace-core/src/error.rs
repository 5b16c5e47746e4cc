use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Analysis of '{type_name}' was cancelled")]
    Cancelled { type_name: String },

    /// A ledger or decision invariant did not hold. Indicates a bug in the engine.
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
