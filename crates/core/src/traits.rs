use crate::error::SearchError;
use crate::models::{PageUnit, SearchHit};
use async_trait::async_trait;

#[async_trait]
pub trait VectorIndex {
    /// Builds the index from an upload batch, replacing any previous
    /// batch wholesale. An empty batch skips construction entirely and
    /// leaves the index in its prior state.
    async fn index_pages(
        &self,
        pages: &[PageUnit],
        embeddings: &[Vec<f32>],
    ) -> Result<(), SearchError>;

    /// Returns up to `top_k` nearest pages, nearest first. Searching
    /// before any batch has been indexed is `SearchError::NotReady`,
    /// which callers must not conflate with an empty result.
    async fn search_vector(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;
}
