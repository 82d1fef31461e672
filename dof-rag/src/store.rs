//! Chunk store connection management.
//!
//! [`ChunkStore`] manages a read-only SQLite handle to the database produced
//! by the offline ingestion process. Cached handles are validated with a
//! probe query and transparently re-established when the probe fails; a
//! missing store file surfaces as [`RagError::StoreUnreachable`].
//!
//! Embeddings are stored in the chunk table as BLOBs of consecutive
//! little-endian `f32` values (see [`encode_embedding`]). Every connection
//! registers the `embedding_cosine` scalar function so that similarity
//! ranking happens inside the SQL statement itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RagError, Result};

/// Name of the SQL scalar function that scores embedding similarity.
pub(crate) const COSINE_FN: &str = "embedding_cosine";

/// Upper bound on waiting for a locked store before failing the query.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a connectivity check, for startup logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StoreStatus {
    /// The store was reached and probed successfully.
    Ok {
        /// Path of the store that answered the probe.
        path: PathBuf,
    },
    /// The store could not be reached.
    Error {
        /// Description of the failure.
        message: String,
    },
}

/// Manages the read-only SQLite connection to the chunk store.
///
/// The store is written by an offline ingester and never mutated here: all
/// connections are opened with `SQLITE_OPEN_READ_ONLY`.
pub struct ChunkStore {
    path: PathBuf,
    conn: Option<Connection>,
}

impl ChunkStore {
    /// Create a manager for the store at `path`. No connection is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), conn: None }
    }

    /// Path of the store file this manager points at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return a live connection to the store.
    ///
    /// A cached handle is validated with a `SELECT 1` probe and replaced if
    /// the probe fails or returns an unexpected result.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreUnreachable`] if the store file does not
    /// exist, or [`RagError::Query`] if opening the connection fails.
    pub fn connect(&mut self) -> Result<&Connection> {
        if !self.path.exists() {
            return Err(RagError::StoreUnreachable { path: self.path.clone() });
        }

        let conn = match self.conn.take() {
            Some(conn) => match probe(&conn) {
                Ok(1) => conn,
                Ok(other) => {
                    warn!(result = other, "connection probe returned unexpected result, reconnecting");
                    self.open()?
                }
                Err(e) => {
                    warn!(error = %e, "existing connection failed validation, reconnecting");
                    self.open()?
                }
            },
            None => self.open()?,
        };

        Ok(self.conn.insert(conn))
    }

    /// Release the connection handle. Safe to call when already closed.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_conn, e)) = conn.close() {
                warn!(error = %e, "failed to close chunk store connection");
            }
        }
    }

    /// Report whether the store can currently be reached.
    ///
    /// Never fails: the outcome is returned as a [`StoreStatus`] so callers
    /// can log connectivity at startup without handling errors.
    pub fn status(&mut self) -> StoreStatus {
        match self.connect() {
            Ok(_) => StoreStatus::Ok { path: self.path.clone() },
            Err(e) => StoreStatus::Error { message: e.to_string() },
        }
    }

    fn open(&self) -> Result<Connection> {
        info!(path = %self.path.display(), "connecting to chunk store");
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        register_embedding_cosine(&conn)?;
        Ok(conn)
    }
}

fn probe(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT 1", [], |row| row.get(0))
}

/// Encode an embedding in the BLOB format of the chunk table.
///
/// Components are serialized as consecutive little-endian `f32` values. The
/// offline ingester and test fixtures write embeddings in this format, and
/// the registered SQL function interprets its operands the same way.
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Register `embedding_cosine(stored, query)` on the connection.
///
/// The function errors when an operand is not a whole number of `f32`
/// components or when the operand lengths differ. The length comparison is
/// the storage-layer dimension check: a query vector of the wrong dimension
/// fails the whole statement rather than scoring garbage.
fn register_embedding_cosine(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        COSINE_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let stored = blob_arg(ctx.get_raw(0))?;
            let query = blob_arg(ctx.get_raw(1))?;
            cosine_from_blobs(stored, query).map_err(|message| {
                rusqlite::Error::UserFunctionError(message.into())
            })
        },
    )
}

fn blob_arg(value: ValueRef<'_>) -> rusqlite::Result<&[u8]> {
    value.as_blob().map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))
}

/// Cosine similarity of two embedding BLOBs, accumulated in `f64`.
///
/// Returns 0.0 when either vector has zero magnitude.
fn cosine_from_blobs(a: &[u8], b: &[u8]) -> std::result::Result<f64, String> {
    if a.len() % 4 != 0 || b.len() % 4 != 0 {
        return Err("embedding blob length is not a multiple of 4 bytes".to_string());
    }
    if a.len() != b.len() {
        return Err(format!(
            "embedding dimension mismatch: stored {} vs query {}",
            a.len() / 4,
            b.len() / 4
        ));
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (xa, xb) in a.chunks_exact(4).zip(b.chunks_exact(4)) {
        let x = f64::from(f32::from_le_bytes([xa[0], xa[1], xa[2], xa[3]]));
        let y = f64::from(f32::from_le_bytes([xb[0], xb[1], xb[2], xb[3]]));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / denom)
}
