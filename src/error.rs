use thiserror::Error;

/// Main error type for Modgraph
#[derive(Error, Debug)]
pub enum ModgraphError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Relation lookup failed (unknown record, broken store)
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stop/exclude domain could not be evaluated
    #[error("Predicate error: {0}")]
    Predicate(String),

    /// Network failure talking to the graph API (retryable)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Well-formed error response from the graph API (not retryable)
    #[error("Remote error: {0}")]
    Remote(String),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ModgraphError {
    /// Whether the ingestion fetcher should try the request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModgraphError::Transport(_))
    }
}

impl From<serde_json::Error> for ModgraphError {
    fn from(err: serde_json::Error) -> Self {
        ModgraphError::Parse(err.to_string())
    }
}

/// Convenient Result type using ModgraphError
pub type Result<T> = std::result::Result<T, ModgraphError>;
