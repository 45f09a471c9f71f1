use crate::error::SearchError;
use crate::models::{PageUnit, SearchHit};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use tokio::sync::RwLock;

struct IndexedBatch {
    units: Vec<PageUnit>,
    embeddings: Vec<Vec<f32>>,
    dimensions: usize,
}

/// Exact nearest-neighbor index over the current upload batch. Vectors
/// are stored unit-length, so dot product is cosine similarity. There is
/// one build per batch and no incremental update path.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    batch: RwLock<Option<IndexedBatch>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_ready(&self) -> bool {
        self.batch.read().await.is_some()
    }

    pub async fn len(&self) -> usize {
        self.batch
            .read()
            .await
            .as_ref()
            .map_or(0, |batch| batch.units.len())
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn index_pages(
        &self,
        pages: &[PageUnit],
        embeddings: &[Vec<f32>],
    ) -> Result<(), SearchError> {
        if pages.len() != embeddings.len() {
            return Err(SearchError::Request(format!(
                "embedding count {} doesn't match page count {}",
                embeddings.len(),
                pages.len()
            )));
        }

        if pages.is_empty() {
            return Ok(());
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 {
            return Err(SearchError::Request(
                "embeddings must not be zero-dimensional".to_string(),
            ));
        }

        let mut normalized = Vec::with_capacity(embeddings.len());
        for embedding in embeddings {
            if embedding.len() != dimensions {
                return Err(SearchError::DimensionMismatch {
                    expected: dimensions,
                    actual: embedding.len(),
                });
            }
            normalized.push(normalize(embedding));
        }

        let mut guard = self.batch.write().await;
        *guard = Some(IndexedBatch {
            units: pages.to_vec(),
            embeddings: normalized,
            dimensions,
        });

        Ok(())
    }

    async fn search_vector(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let guard = self.batch.read().await;
        let batch = guard.as_ref().ok_or_else(|| {
            SearchError::NotReady("no documents have been indexed".to_string())
        })?;

        if query_vector.len() != batch.dimensions {
            return Err(SearchError::DimensionMismatch {
                expected: batch.dimensions,
                actual: query_vector.len(),
            });
        }

        let query = normalize(query_vector);
        let mut hits: Vec<SearchHit> = batch
            .units
            .iter()
            .zip(batch.embeddings.iter())
            .map(|(unit, embedding)| SearchHit {
                unit: unit.clone(),
                score: dot(&query, embedding),
            })
            .collect();

        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(top_k);

        Ok(hits)
    }
}

fn normalize(vector: &[f32]) -> Vec<f32> {
    let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if magnitude <= 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|value| value / magnitude).collect()
}

fn dot(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right.iter()).map(|(a, b)| a * b).sum()
}

#[cfg(test)]
mod tests {
    use super::InMemoryVectorIndex;
    use crate::error::SearchError;
    use crate::models::PageUnit;
    use crate::traits::VectorIndex;

    fn unit(document: &str, page: u32, text: &str) -> PageUnit {
        PageUnit {
            document_id: format!("{document}-id"),
            document_title: document.to_string(),
            page_number: page,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn search_before_build_reports_not_ready() {
        let index = InMemoryVectorIndex::new();
        let result = index.search_vector(&[1.0, 0.0], 3).await;
        assert!(matches!(result, Err(SearchError::NotReady(_))));
    }

    #[tokio::test]
    async fn empty_batch_skips_construction() {
        let index = InMemoryVectorIndex::new();
        index
            .index_pages(&[], &[])
            .await
            .expect("empty batch is not an error");

        assert!(!index.is_ready().await);
        let result = index.search_vector(&[1.0, 0.0], 3).await;
        assert!(matches!(result, Err(SearchError::NotReady(_))));
    }

    #[tokio::test]
    async fn search_returns_min_of_k_and_len_nearest_first() {
        let index = InMemoryVectorIndex::new();
        let pages = vec![
            unit("a.pdf", 1, "east"),
            unit("a.pdf", 2, "north"),
            unit("b.pdf", 1, "northeast"),
        ];
        let embeddings = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.7, 0.7],
        ];
        index
            .index_pages(&pages, &embeddings)
            .await
            .expect("build should succeed");
        assert_eq!(index.len().await, 3);

        let hits = index
            .search_vector(&[1.0, 0.0], 10)
            .await
            .expect("search should succeed");

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].unit.text, "east");
        assert_eq!(hits[1].unit.text, "northeast");
        assert_eq!(hits[2].unit.text, "north");
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);

        let capped = index
            .search_vector(&[1.0, 0.0], 2)
            .await
            .expect("search should succeed");
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn mismatched_query_dimension_is_rejected() {
        let index = InMemoryVectorIndex::new();
        index
            .index_pages(&[unit("a.pdf", 1, "text")], &[vec![1.0, 0.0]])
            .await
            .expect("build should succeed");

        let result = index.search_vector(&[1.0, 0.0, 0.0], 3).await;
        assert!(matches!(
            result,
            Err(SearchError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[tokio::test]
    async fn new_batch_replaces_previous_one_wholesale() {
        let index = InMemoryVectorIndex::new();
        index
            .index_pages(
                &[unit("old.pdf", 1, "old"), unit("old.pdf", 2, "older")],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .await
            .expect("first build should succeed");

        index
            .index_pages(&[unit("new.pdf", 1, "new")], &[vec![1.0, 0.0]])
            .await
            .expect("second build should succeed");

        let hits = index
            .search_vector(&[1.0, 0.0], 10)
            .await
            .expect("search should succeed");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].unit.document_title, "new.pdf");
    }

    #[tokio::test]
    async fn embedding_count_must_match_page_count() {
        let index = InMemoryVectorIndex::new();
        let result = index
            .index_pages(&[unit("a.pdf", 1, "text")], &[])
            .await;
        assert!(matches!(result, Err(SearchError::Request(_))));
    }
}
