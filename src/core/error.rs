use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Schema or query declaration does not line up with the entity.
    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A required argument is missing or null.
    #[error("Argument error: {0}")]
    Argument(String),

    #[error("Non-unique result: {0}")]
    NonUniqueResult(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping(message.into())
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
