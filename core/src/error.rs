use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssaError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing input: table '{table}' is absent or empty")]
    MissingInput { table: &'static str },

    #[error("Invalid scoring config: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AssaResult<T> = Result<T, AssaError>;
