use crate::embeddings::Embedder;
use crate::ingest::{ingest_uploads_best_effort, IngestionReport};
use crate::models::{PdfUpload, RetrievalOptions};
use crate::traits::VectorIndex;
use crate::SearchError;

/// Fixed response for queries that nothing indexed can answer.
pub const NO_RELEVANT_CONTENT: &str = "No relevant content found.";

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Runs the two halves of the pipeline: upload batch -> pages ->
/// embeddings -> index build, and query -> embedding -> top-k lookup ->
/// context string.
pub struct RetrievalCoordinator<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    embedder: E,
    index: V,
    options: RetrievalOptions,
}

impl<E, V> RetrievalCoordinator<E, V>
where
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
{
    pub fn new(embedder: E, index: V) -> Self {
        Self {
            embedder,
            index,
            options: RetrievalOptions::default(),
        }
    }

    pub fn with_options(embedder: E, index: V, options: RetrievalOptions) -> Self {
        Self {
            embedder,
            index,
            options,
        }
    }

    pub fn options(&self) -> RetrievalOptions {
        self.options
    }

    /// Ingests the batch best-effort and builds the index from whatever
    /// extracted. An all-skipped batch leaves the index untouched; the
    /// report carries the skip reasons and is not an error.
    pub async fn ingest_and_index(
        &self,
        uploads: &[PdfUpload],
    ) -> Result<IngestionReport, SearchError> {
        let report = ingest_uploads_best_effort(uploads);

        if report.is_empty() {
            return Ok(report);
        }

        let embeddings: Vec<_> = report
            .pages
            .iter()
            .map(|page| self.embedder.embed(&page.text))
            .collect();

        self.index.index_pages(&report.pages, &embeddings).await?;
        Ok(report)
    }

    /// Embeds the query, takes the `top_k` nearest pages, and joins
    /// their text nearest-first. A missing index or an empty hit list
    /// yields the sentinel, never an error.
    pub async fn answer_from_index(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> Result<String, SearchError> {
        if query_text.trim().is_empty() {
            return Err(SearchError::Request("query is empty".to_string()));
        }

        let query_vector = self.embedder.embed(query_text);
        let hits = match self.index.search_vector(&query_vector, top_k).await {
            Ok(hits) => hits,
            Err(SearchError::NotReady(_)) => return Ok(NO_RELEVANT_CONTENT.to_string()),
            Err(error) => return Err(error),
        };

        if hits.is_empty() {
            return Ok(NO_RELEVANT_CONTENT.to_string());
        }

        Ok(hits
            .iter()
            .map(|hit| hit.unit.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR))
    }
}
