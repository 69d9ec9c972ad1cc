use thiserror::Error;

pub type Result<T> = std::result::Result<T, SheetError>;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for SheetError {
    fn from(s: String) -> Self {
        SheetError::Other(s)
    }
}

impl From<&str> for SheetError {
    fn from(s: &str) -> Self {
        SheetError::Other(s.to_string())
    }
}

impl SheetError {
    /// Transport and status failures are absorbed at call sites (logged,
    /// local state kept); validation failures are surfaced to the user.
    pub fn is_transport(&self) -> bool {
        matches!(self, SheetError::Network(_))
    }
}
