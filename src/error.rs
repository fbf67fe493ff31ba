use thiserror::Error;

#[derive(Error, Debug)]
pub enum RcaError {
    /// Pagination or network failure while reading history or replies.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// File download or issue lookup failure.
    #[error("Enrichment error: {0}")]
    Enrichment(String),

    /// Generative-text call failed or came back empty.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Structured response did not match the expected schema.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type RcaResult<T> = Result<T, RcaError>;
