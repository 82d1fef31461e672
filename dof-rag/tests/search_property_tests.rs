//! Property tests for similarity search ordering over real store fixtures.

use std::path::Path;

use dof_rag::{RagConfig, SimilaritySearchEngine, encode_embedding};
use proptest::prelude::*;
use rusqlite::{Connection, params};
use tempfile::TempDir;

const DIM: usize = 8;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Brute-force oracle matching the store-side scoring: `f64` accumulation
/// over `f32` components.
fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += f64::from(x) * f64::from(y);
        norm_a += f64::from(x) * f64::from(x);
        norm_b += f64::from(y) * f64::from(y);
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}

fn seed_store(path: &Path, embeddings: &[Vec<f32>]) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE documents (
             id INTEGER PRIMARY KEY,
             title TEXT,
             url TEXT,
             file_path TEXT,
             created_at TEXT
         );
         CREATE TABLE chunks (
             id INTEGER PRIMARY KEY,
             document_id INTEGER NOT NULL REFERENCES documents(id),
             text TEXT,
             header TEXT,
             embedding BLOB
         );
         INSERT INTO documents (id, title) VALUES (1, 'DOC_UNICO');",
    )
    .unwrap();
    for (i, embedding) in embeddings.iter().enumerate() {
        conn.execute(
            "INSERT INTO chunks (document_id, text, header, embedding) VALUES (1, ?1, ?2, ?3)",
            params![format!("texto {i}"), i.to_string(), encode_embedding(embedding)],
        )
        .unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// For any set of embedded chunks, search returns at most `top_k` chunks
    /// ordered by non-increasing cosine similarity to the query vector.
    #[test]
    fn results_ordered_by_descending_similarity(
        embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..16),
        query in arb_normalized_embedding(DIM),
        top_k in 1usize..20,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunks.db");
        seed_store(&path, &embeddings);

        let config = RagConfig::builder()
            .store_path(&path)
            .embedding_dimension(DIM)
            .build()
            .unwrap();
        let engine = SimilaritySearchEngine::new(&config);
        let (chunks, documents) = engine.search_similar_chunks(&query, Some(top_k));

        prop_assert_eq!(chunks.len(), top_k.min(embeddings.len()));
        prop_assert_eq!(documents.len(), 1);

        let scores: Vec<f64> = chunks
            .iter()
            .map(|c| {
                let index: usize = c.header.parse().unwrap();
                cosine(&embeddings[index], &query)
            })
            .collect();
        for window in scores.windows(2) {
            prop_assert!(
                window[0] >= window[1] - 1e-9,
                "results not in descending order: {} < {}",
                window[0],
                window[1],
            );
        }
    }
}
