pub mod chat;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod stores;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use chat::ChatEngine;
pub use embeddings::{Embedder, EmbedderConfig, SentenceEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ChatError, GenerationError, IngestError, ModelError, SearchError};
pub use extractor::{
    extract_page_texts, normalize_whitespace, LopdfExtractor, PageText, PdfExtractor,
};
pub use generation::{NgramLanguageModel, TextGenerator, DEFAULT_SAMPLING_TOP_K};
pub use ingest::{
    digest_bytes, discover_pdf_files, fingerprint_upload, ingest_uploads_best_effort, read_upload,
    IngestionReport, SkippedPdf,
};
pub use models::{
    ChatEntry, ChatMode, DocumentFingerprint, GenerationOptions, PageUnit, PdfUpload,
    RetrievalOptions, SearchHit,
};
pub use orchestrator::{RetrievalCoordinator, NO_RELEVANT_CONTENT};
pub use session::SessionState;
pub use stores::InMemoryVectorIndex;
pub use traits::VectorIndex;
