use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("corpus source failed: {0}")]
    Source(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search options: {0}")]
    InvalidOptions(String),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T, E = CorpusError> = std::result::Result<T, E>;
