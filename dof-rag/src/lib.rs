//! # dof-rag
//!
//! Retrieval core for DOF Chat: cosine-similarity search over
//! official-gazette (DOF) legal document chunks stored in an embedded SQLite
//! database, with graceful degradation when the store is unusable.
//!
//! ## Overview
//!
//! - [`SimilaritySearchEngine`] - ranked nearest-neighbor lookup over the
//!   chunk store, with a one-way circuit breaker and a fixed synthetic
//!   fallback payload
//! - [`ChunkStore`] - read-only connection manager with probe-and-reconnect
//!   handling and the SQL-side cosine similarity function
//! - [`EmbeddingProvider`] / [`AnswerComposer`] - contracts for the external
//!   collaborators, with deterministic mock implementations for development
//! - [`RagPipeline`] - embed, search, compose orchestration that always
//!   returns an answer
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use dof_rag::{RagConfig, RagPipeline};
//!
//! let config = RagConfig::from_env()?;
//! let pipeline = RagPipeline::with_mock_collaborators(&config);
//! pipeline.initialize();
//!
//! let response = pipeline.query("¿Quién está obligado al pago del ISR?").await;
//! println!("{}", response.answer);
//! for source in &response.sources {
//!     println!("  fuente: {source}");
//! }
//! ```

pub mod answer;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod search;
pub mod store;

mod synthetic;

pub use answer::{AnswerComposer, MockAnswerComposer};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{ChatResponse, Chunk, Document};
pub use embedding::{EmbeddingProvider, MockEmbeddingProvider};
pub use error::{RagError, Result};
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use search::SimilaritySearchEngine;
pub use store::{ChunkStore, StoreStatus, encode_embedding};
