//! Data types for documents, chunks, and chat responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contiguous span of text extracted from a source [`Document`].
///
/// The chunk's embedding vector lives in the chunk store alongside this data
/// and is never exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the fragment. May be empty.
    pub text: String,
    /// Section header or label for the fragment. May be empty.
    pub header: String,
    /// The id of the parent [`Document`].
    pub document_id: i64,
}

/// Metadata for a source publication in the official gazette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Primary key in the document table.
    pub id: i64,
    /// Document title or identifier.
    pub title: String,
    /// URL of the original publication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Local path of the archived source file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Publication timestamp, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A generated answer together with the source headers that grounded it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    /// Generated answer based on the retrieved context.
    pub answer: String,
    /// Non-empty chunk headers, in rank order.
    #[serde(default)]
    pub sources: Vec<String>,
}
