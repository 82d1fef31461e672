//! Error types for the `dof-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in retrieval operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The configured chunk store location does not exist or cannot be opened.
    #[error("Chunk store unreachable: {path}")]
    StoreUnreachable {
        /// The configured store file path.
        path: PathBuf,
    },

    /// A failure while executing a query against the chunk store.
    ///
    /// Covers malformed parameters, embedding dimension mismatches, store
    /// internal errors, and lock-wait timeouts.
    #[error("Query execution failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// An error from the embedding provider.
    ///
    /// Upstream of the search engine: the engine's failure recovery does not
    /// cover it.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error from the answer composer.
    #[error("Answer composition error ({composer}): {message}")]
    Composer {
        /// The composer that produced the error.
        composer: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in the pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
