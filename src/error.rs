use thiserror::Error;

/// Errors surfaced by the store, the summaries and the cascade rules.
#[derive(Error, Debug)]
pub(crate) enum Error {
    /// A required field was missing, empty or malformed. Nothing was written.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A summed total does not fit in a `Decimal`.
    #[error("total overflow: {0}")]
    Overflow(String),

    /// The underlying SQLite call failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn category_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "category",
            id: id.to_string(),
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
