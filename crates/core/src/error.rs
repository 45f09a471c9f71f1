use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("pdf has no extractable text: {0}")]
    NoExtractableText(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no content indexed yet: {0}")]
    NotReady(String),

    #[error("search request failed: {0}")]
    Request(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("model produced no continuation for prompt: {0}")]
    NoContinuation(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
