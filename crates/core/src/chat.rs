use crate::embeddings::Embedder;
use crate::generation::TextGenerator;
use crate::ingest::IngestionReport;
use crate::models::{ChatEntry, ChatMode, GenerationOptions, PdfUpload};
use crate::orchestrator::RetrievalCoordinator;
use crate::session::SessionState;
use crate::traits::VectorIndex;
use crate::{ChatError, SearchError};

/// Routes a submitted query by the session's mode and keeps the
/// transcript. AskAnything goes to the generator with the verbatim
/// prompt; both retrieval modes share the identical index lookup.
pub struct ChatEngine<E, V, G>
where
    E: Embedder,
    V: VectorIndex,
    G: TextGenerator,
{
    retrieval: RetrievalCoordinator<E, V>,
    generator: G,
    session: SessionState,
    generation: GenerationOptions,
}

impl<E, V, G> ChatEngine<E, V, G>
where
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
    G: TextGenerator,
{
    pub fn new(retrieval: RetrievalCoordinator<E, V>, generator: G) -> Self {
        Self::with_options(retrieval, generator, GenerationOptions::default())
    }

    pub fn with_options(
        retrieval: RetrievalCoordinator<E, V>,
        generator: G,
        generation: GenerationOptions,
    ) -> Self {
        Self {
            retrieval,
            generator,
            session: SessionState::new(),
            generation,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn mode(&self) -> ChatMode {
        self.session.mode()
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        self.session.set_mode(mode);
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub async fn upload(&self, uploads: &[PdfUpload]) -> Result<IngestionReport, SearchError> {
        self.retrieval.ingest_and_index(uploads).await
    }

    /// Answers `query` in the current mode and records the exchange. A
    /// failed interaction is propagated and leaves no transcript entry.
    pub async fn submit(&mut self, query: &str) -> Result<&ChatEntry, ChatError> {
        let response = match self.session.mode() {
            ChatMode::AskAnything => self.generator.generate(
                query,
                self.generation.max_new_tokens,
                self.generation.temperature,
            )?,
            ChatMode::ChatWithPdfs | ChatMode::ComparePdfs => {
                let top_k = self.retrieval.options().top_k;
                self.retrieval.answer_from_index(query, top_k).await?
            }
        };

        Ok(self.session.record(query, response))
    }
}

#[cfg(test)]
mod tests {
    use super::ChatEngine;
    use crate::embeddings::{EmbedderConfig, SentenceEmbedder};
    use crate::error::GenerationError;
    use crate::generation::TextGenerator;
    use crate::models::{ChatMode, PdfUpload};
    use crate::orchestrator::{RetrievalCoordinator, NO_RELEVANT_CONTENT};
    use crate::stores::InMemoryVectorIndex;
    use crate::test_support::pdf_with_pages;
    use crate::ChatError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeGenerator {
        calls: RefCell<Vec<(String, usize, f32)>>,
        response: String,
    }

    impl FakeGenerator {
        fn new(response: &str) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                response: response.to_string(),
            }
        }
    }

    impl TextGenerator for FakeGenerator {
        fn generate(
            &self,
            prompt: &str,
            max_new_tokens: usize,
            temperature: f32,
        ) -> Result<String, GenerationError> {
            self.calls
                .borrow_mut()
                .push((prompt.to_string(), max_new_tokens, temperature));
            Ok(self.response.clone())
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        fn generate(
            &self,
            prompt: &str,
            _max_new_tokens: usize,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            Err(GenerationError::NoContinuation(prompt.to_string()))
        }
    }

    fn engine_with<G: TextGenerator>(
        generator: G,
    ) -> ChatEngine<SentenceEmbedder, InMemoryVectorIndex, G> {
        let embedder = SentenceEmbedder::from_parts(EmbedderConfig::default(), HashMap::new())
            .expect("default config should be valid");
        let retrieval = RetrievalCoordinator::new(embedder, InMemoryVectorIndex::new());
        ChatEngine::new(retrieval, generator)
    }

    #[tokio::test]
    async fn ask_anything_passes_the_verbatim_prompt_regardless_of_retrieval_state() {
        let mut engine = engine_with(FakeGenerator::new("Waves under moonlight"));
        engine.set_mode(ChatMode::AskAnything);

        let entry = engine
            .submit("Write a haiku about the sea.")
            .await
            .expect("submission should succeed");
        assert_eq!(entry.query, "Write a haiku about the sea.");
        assert_eq!(entry.response, "Waves under moonlight");

        let calls = engine.generator.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Write a haiku about the sea.");
        assert!(calls[0].1 > 0);

        assert_eq!(engine.session().transcript().len(), 1);
    }

    #[tokio::test]
    async fn retrieval_modes_share_the_same_lookup() {
        let mut engine = engine_with(FakeGenerator::new("unused"));
        engine
            .upload(&[PdfUpload::new(
                "doc.pdf",
                pdf_with_pages(&["The hydraulic pump pressure limit is 250 bar."]),
            )])
            .await
            .expect("upload should succeed");

        engine.set_mode(ChatMode::ChatWithPdfs);
        let chat = engine
            .submit("hydraulic pump pressure")
            .await
            .expect("chat query should succeed")
            .response
            .clone();

        engine.set_mode(ChatMode::ComparePdfs);
        let compare = engine
            .submit("hydraulic pump pressure")
            .await
            .expect("compare query should succeed")
            .response
            .clone();

        assert_eq!(chat, compare);
        assert!(chat.contains("250 bar"));
        assert!(engine.generator.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn retrieval_query_without_uploads_records_the_sentinel() {
        let mut engine = engine_with(FakeGenerator::new("unused"));
        engine.set_mode(ChatMode::ChatWithPdfs);

        let entry = engine
            .submit("anything at all")
            .await
            .expect("missing index is not an error");
        assert_eq!(entry.response, NO_RELEVANT_CONTENT);
    }

    #[tokio::test]
    async fn failed_generation_leaves_no_transcript_entry() {
        let mut engine = engine_with(FailingGenerator);
        engine.set_mode(ChatMode::AskAnything);

        let result = engine.submit("prompt").await;
        assert!(matches!(result, Err(ChatError::Generation(_))));
        assert!(engine.session().transcript().is_empty());
    }

    #[tokio::test]
    async fn mode_switch_keeps_transcript_and_index() {
        let mut engine = engine_with(FakeGenerator::new("generated"));
        engine
            .upload(&[PdfUpload::new(
                "doc.pdf",
                pdf_with_pages(&["Indexed page body"]),
            )])
            .await
            .expect("upload should succeed");

        engine.set_mode(ChatMode::ChatWithPdfs);
        engine
            .submit("indexed page")
            .await
            .expect("query should succeed");

        engine.set_mode(ChatMode::AskAnything);
        engine.submit("a prompt").await.expect("generation succeeds");

        engine.set_mode(ChatMode::ChatWithPdfs);
        let entry = engine
            .submit("indexed page")
            .await
            .expect("query should succeed");

        assert_ne!(entry.response, NO_RELEVANT_CONTENT);
        assert_eq!(engine.session().transcript().len(), 3);
    }
}
