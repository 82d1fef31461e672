//! RAG pipeline orchestrator.
//!
//! [`RagPipeline`] coordinates the query workflow by composing an
//! [`EmbeddingProvider`], a [`SimilaritySearchEngine`], and an
//! [`AnswerComposer`]. The pipeline is total: every stage failure is logged
//! and converted into a user-facing fallback answer, so callers of
//! [`query`](RagPipeline::query) always receive a response.
//!
//! # Example
//!
//! ```rust,ignore
//! use dof_rag::{RagConfig, RagPipeline};
//!
//! let config = RagConfig::from_env()?;
//! let pipeline = RagPipeline::with_mock_collaborators(&config);
//! let response = pipeline.query("¿Quién está obligado al pago del ISR?").await;
//! println!("{}", response.answer);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use crate::answer::{AnswerComposer, MockAnswerComposer};
use crate::config::RagConfig;
use crate::document::ChatResponse;
use crate::embedding::{EmbeddingProvider, MockEmbeddingProvider};
use crate::error::{RagError, Result};
use crate::search::SimilaritySearchEngine;
use crate::store::StoreStatus;

/// User-facing answer served when a pipeline stage fails.
const FALLBACK_ANSWER: &str = "Lo siento, hubo un error al procesar tu consulta. \
                               Por favor, inténtalo de nuevo más tarde.";

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`], or use
/// [`RagPipeline::with_mock_collaborators()`] for the development wiring
/// where no embedding model or LLM is configured.
pub struct RagPipeline {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    engine: Arc<SimilaritySearchEngine>,
    composer: Arc<dyn AnswerComposer>,
    initialized: AtomicBool,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Build a pipeline wired with the deterministic mock collaborators.
    ///
    /// The embedding provider and answer composer are simulations; the
    /// search engine is real and will use the configured store when it is
    /// reachable.
    pub fn with_mock_collaborators(config: &RagConfig) -> Self {
        Self {
            embedding_provider: Arc::new(MockEmbeddingProvider::new(config.embedding_dimension)),
            engine: Arc::new(SimilaritySearchEngine::new(config)),
            composer: Arc::new(MockAnswerComposer),
            initialized: AtomicBool::new(false),
        }
    }

    /// Return a reference to the search engine.
    pub fn engine(&self) -> &Arc<SimilaritySearchEngine> {
        &self.engine
    }

    /// Log store connectivity and mark the pipeline ready.
    ///
    /// The pipeline proceeds when the store is unreachable (searches will
    /// degrade to synthetic data), so initialization never fails. Idempotent;
    /// also runs lazily on the first query.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::Relaxed) {
            return;
        }
        match self.engine.store_status() {
            StoreStatus::Ok { path } => {
                info!(path = %path.display(), "chunk store connected");
            }
            StoreStatus::Error { message } => {
                warn!(%message, "chunk store connection failed, continuing with synthetic data");
            }
        }
        info!("RAG pipeline ready");
    }

    /// Run the full query workflow: embed, search, compose.
    ///
    /// Total: any embedding, search-task, or composition failure is logged
    /// and converted into a fallback answer with no sources. End users always
    /// receive some answer, grounded in live or synthetic chunks.
    pub async fn query(&self, text: &str) -> ChatResponse {
        match self.try_query(text).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "query processing failed");
                ChatResponse { answer: FALLBACK_ANSWER.to_string(), sources: Vec::new() }
            }
        }
    }

    async fn try_query(&self, text: &str) -> Result<ChatResponse> {
        self.initialize();

        let embedding = self.embedding_provider.embed(text).await?;

        // The store round-trip blocks; keep it off the async workers.
        let engine = Arc::clone(&self.engine);
        let (chunks, documents) =
            tokio::task::spawn_blocking(move || engine.search_similar_chunks(&embedding, None))
                .await
                .map_err(|e| RagError::Pipeline(format!("search task failed: {e}")))?;
        info!(
            chunk_count = chunks.len(),
            document_count = documents.len(),
            "retrieved context for query"
        );

        let answer = self.composer.compose(text, &chunks).await?;

        let sources: Vec<String> =
            chunks.iter().map(|c| c.header.clone()).filter(|h| !h.is_empty()).collect();

        info!(
            answer_chars = answer.chars().count(),
            source_count = sources.len(),
            "RAG pipeline completed"
        );
        Ok(ChatResponse { answer, sources })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required. Call [`build()`](RagPipelineBuilder::build) to
/// validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    engine: Option<Arc<SimilaritySearchEngine>>,
    composer: Option<Arc<dyn AnswerComposer>>,
}

impl RagPipelineBuilder {
    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the similarity search engine.
    pub fn engine(mut self, engine: Arc<SimilaritySearchEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the answer composer.
    pub fn composer(mut self, composer: Arc<dyn AnswerComposer>) -> Self {
        self.composer = Some(composer);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let engine =
            self.engine.ok_or_else(|| RagError::Config("engine is required".to_string()))?;
        let composer =
            self.composer.ok_or_else(|| RagError::Config("composer is required".to_string()))?;

        Ok(RagPipeline {
            embedding_provider,
            engine,
            composer,
            initialized: AtomicBool::new(false),
        })
    }
}
