use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaturityError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Insufficient data: {rows} rows, at least {required} required")]
    InsufficientData { rows: usize, required: usize },

    #[error("Mismatched length: before has {before} values, after has {after}")]
    MismatchedLength { before: usize, after: usize },

    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaturityError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput { reason: reason.into() }
    }

    /// Stable short name for the error kind, used by the runner's messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. }     => "invalid_input",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::MismatchedLength { .. } => "mismatched_length",
            Self::DegenerateInput { .. }  => "degenerate_input",
            Self::Database(_)             => "database",
            Self::Serialization(_)        => "serialization",
            Self::Other(_)                => "other",
        }
    }
}

pub type MaturityResult<T> = Result<T, MaturityError>;
