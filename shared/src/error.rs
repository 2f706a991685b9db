use thiserror::Error;

/// Failure reported by a fetch/decode backend to a resource.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("failed to fetch resource: {0}")]
    Fetch(String),
    #[error("failed to decode resource: {0}")]
    Decode(String),
    #[error("page {page} is outside 1..={total}")]
    PageOutOfRange { page: i32, total: i32 },
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("invalid viewer configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to load {src}: {source}")]
    Load {
        src: String,
        #[source]
        source: LoadError,
    },
}
