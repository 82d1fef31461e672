//! Cosine-similarity search over the chunk store.
//!
//! [`SimilaritySearchEngine`] executes one ranked join query against the
//! chunk store and assembles the matched chunks together with their
//! deduplicated parent documents. Any store failure trips a one-way breaker:
//! the engine stops querying the store for the rest of its lifetime and
//! serves a fixed synthetic payload instead, so callers always get a
//! well-formed result.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dof_rag::{RagConfig, SimilaritySearchEngine};
//!
//! let config = RagConfig::from_env()?;
//! let engine = Arc::new(SimilaritySearchEngine::new(&config));
//! let (chunks, documents) = engine.search_similar_chunks(&query_embedding, Some(5));
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::params;
use tracing::{info, warn};

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::error::Result;
use crate::store::{self, ChunkStore, StoreStatus};
use crate::synthetic;

/// Ranked similarity lookup with graceful degradation.
///
/// One engine value is constructed per process and shared behind an `Arc`
/// across concurrent callers. The store handle is serialized behind a mutex;
/// the health flag is a relaxed atomic because its only transition is
/// healthy to unhealthy and a lost race costs at most one extra live attempt.
pub struct SimilaritySearchEngine {
    store: Mutex<ChunkStore>,
    default_top_k: usize,
    force_synthetic: bool,
    healthy: AtomicBool,
}

impl SimilaritySearchEngine {
    /// Create an engine from configuration. No connection is opened yet.
    pub fn new(config: &RagConfig) -> Self {
        Self {
            store: Mutex::new(ChunkStore::new(config.store_path.clone())),
            default_top_k: config.default_top_k,
            force_synthetic: config.force_synthetic,
            healthy: AtomicBool::new(true),
        }
    }

    /// Check store connectivity, for startup logging.
    ///
    /// Does not affect the degradation state: a failed check here leaves
    /// live searching enabled.
    pub fn store_status(&self) -> StoreStatus {
        let mut store = self.lock_store();
        store.status()
    }

    /// Return the `top_k` chunks most similar to `query_embedding`, plus
    /// their parent documents deduplicated in first-seen order.
    ///
    /// `top_k` defaults to the configured limit when unset; `Some(0)` is
    /// honored and yields empty lists. Never fails: when forced into
    /// synthetic mode, after a previous failure, or on any store error, the
    /// fixed synthetic payload is returned instead and the error is only
    /// logged. Callers cannot distinguish live data from synthetic data
    /// through the return value.
    pub fn search_similar_chunks(
        &self,
        query_embedding: &[f32],
        top_k: Option<usize>,
    ) -> (Vec<Chunk>, Vec<Document>) {
        let top_k = top_k.unwrap_or(self.default_top_k);

        if self.force_synthetic {
            info!("force synthetic mode enabled, serving synthetic data for vector search");
            return synthetic::synthetic_results(top_k);
        }

        // Breaker: after the first failure, never retry the store.
        if !self.healthy.load(Ordering::Relaxed) {
            return synthetic::synthetic_results(top_k);
        }

        match self.live_search(query_embedding, top_k) {
            Ok((chunks, documents)) => {
                info!(
                    chunk_count = chunks.len(),
                    document_count = documents.len(),
                    "similarity search completed"
                );
                (chunks, documents)
            }
            Err(e) => {
                warn!(error = %e, "vector search failed, disabling store and serving synthetic data");
                self.healthy.store(false, Ordering::Relaxed);
                synthetic::synthetic_results(top_k)
            }
        }
    }

    /// One statement: join chunks to documents, rank by cosine similarity of
    /// the stored embedding against the bound query vector, limit to `top_k`.
    fn live_search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<(Vec<Chunk>, Vec<Document>)> {
        let mut store = self.lock_store();
        let conn = store.connect()?;

        let sql = format!(
            "SELECT c.text, c.header, c.document_id, \
                    d.id, d.title, d.url, d.file_path, d.created_at \
             FROM chunks c \
             JOIN documents d ON c.document_id = d.id \
             WHERE c.embedding IS NOT NULL \
             ORDER BY {cosine}(c.embedding, ?1) DESC \
             LIMIT ?2",
            cosine = store::COSINE_FN,
        );

        let mut stmt = conn.prepare(&sql)?;
        let query_blob = store::encode_embedding(query_embedding);
        let rows = stmt.query_map(params![query_blob, top_k as i64], decode_row)?;

        let mut chunks = Vec::new();
        let mut documents = Vec::new();
        let mut seen_documents = HashSet::new();
        for row in rows {
            let (chunk, document) = row?;
            if seen_documents.insert(document.id) {
                documents.push(document);
            }
            chunks.push(chunk);
        }

        Ok((chunks, documents))
    }

    fn lock_store(&self) -> MutexGuard<'_, ChunkStore> {
        // A panic while holding the lock leaves the store in a defined state
        // (worst case: a stale handle the next probe replaces).
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Map one result row to its typed `(Chunk, Document)` pair.
///
/// Column order matches the SELECT list above. NULL chunk text and headers
/// and NULL document titles decode as empty strings.
fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Chunk, Document)> {
    let chunk = Chunk {
        text: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        header: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        document_id: row.get(2)?,
    };
    let document = Document {
        id: row.get(3)?,
        title: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        url: row.get(5)?,
        file_path: row.get(6)?,
        created_at: row.get(7)?,
    };
    Ok((chunk, document))
}
