//! Integration tests for the RAG pipeline: embed, search, compose, and the
//! guarantee that callers always receive an answer.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dof_rag::{
    AnswerComposer, Chunk, MockAnswerComposer, MockEmbeddingProvider, RagConfig, RagError,
    RagPipeline, SimilaritySearchEngine, encode_embedding,
};
use rusqlite::{Connection, params};
use tempfile::TempDir;

const DIM: usize = 8;

fn seed_store(path: &Path, headers: &[&str]) {
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
         INSERT INTO documents (id, title) VALUES (1, 'LEY_ISR_2024');",
    )
    .unwrap();
    for (i, header) in headers.iter().enumerate() {
        let component = (i + 1) as f32 * 0.1;
        let embedding = vec![component; DIM];
        conn.execute(
            "INSERT INTO chunks (document_id, text, header, embedding) VALUES (1, ?1, ?2, ?3)",
            params![format!("texto {i}"), header, encode_embedding(&embedding)],
        )
        .unwrap();
    }
}

fn live_pipeline(path: &Path) -> RagPipeline {
    let config = RagConfig::builder()
        .store_path(path)
        .embedding_dimension(DIM)
        .build()
        .unwrap();
    RagPipeline::builder()
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
        .engine(Arc::new(SimilaritySearchEngine::new(&config)))
        .composer(Arc::new(MockAnswerComposer))
        .build()
        .unwrap()
}

struct FailingComposer;

#[async_trait]
impl AnswerComposer for FailingComposer {
    async fn compose(&self, _query: &str, _chunks: &[Chunk]) -> dof_rag::Result<String> {
        Err(RagError::Composer {
            composer: "failing".to_string(),
            message: "LLM backend offline".to_string(),
        })
    }
}

#[tokio::test]
async fn end_to_end_over_live_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chunks.db");
    let headers = ["Art 1 - Obligaciones fiscales", "Art 2 - Residentes", "Art 3 - Ingresos"];
    seed_store(&path, &headers);

    let pipeline = live_pipeline(&path);
    pipeline.initialize();
    let response = pipeline.query("¿Quién está obligado al pago del ISR?").await;

    assert!(response.answer.contains("He encontrado 3 documentos relevantes"));
    assert!(response.answer.contains("¿Quién está obligado al pago del ISR?"));
    assert_eq!(response.sources.len(), 3);
    for source in &response.sources {
        assert!(headers.contains(&source.as_str()));
    }
}

#[tokio::test]
async fn unreachable_store_still_answers_from_synthetic_context() {
    let config =
        RagConfig::builder().store_path("/nonexistent/chunks.db").build().unwrap();
    let pipeline = RagPipeline::with_mock_collaborators(&config);

    let response = pipeline.query("¿Qué dice la ley del ISR?").await;

    assert!(response.answer.starts_with("Basándome en la información"));
    assert_eq!(
        response.sources,
        ["Art 1 - Obligaciones", "Art 5 - Seguridad", "Art 10 - Tierras"]
    );
}

#[tokio::test]
async fn empty_store_uses_the_not_found_answer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chunks.db");
    seed_store(&path, &[]);

    let pipeline = live_pipeline(&path);
    let response = pipeline.query("consulta sin resultados").await;

    assert!(response.answer.starts_with("No encontré documentos"));
    assert!(response.sources.is_empty());
}

#[tokio::test]
async fn failing_composer_yields_the_apology_answer() {
    let config = RagConfig::builder().store_path("/nonexistent/chunks.db").build().unwrap();
    let pipeline = RagPipeline::builder()
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
        .engine(Arc::new(SimilaritySearchEngine::new(&config)))
        .composer(Arc::new(FailingComposer))
        .build()
        .unwrap();

    let response = pipeline.query("cualquier consulta").await;

    assert!(response.answer.starts_with("Lo siento"));
    assert!(response.sources.is_empty());
}

#[tokio::test]
async fn blank_headers_are_excluded_from_sources() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chunks.db");
    seed_store(&path, &["Art 1 - Obligaciones", ""]);

    let pipeline = live_pipeline(&path);
    let response = pipeline.query("obligaciones").await;

    assert_eq!(response.sources, ["Art 1 - Obligaciones"]);
}

#[test]
fn builder_requires_every_collaborator() {
    let result = RagPipeline::builder().build();
    assert!(matches!(result, Err(RagError::Config(_))));

    let result = RagPipeline::builder()
        .embedding_provider(Arc::new(MockEmbeddingProvider::new(DIM)))
        .build();
    assert!(matches!(result, Err(RagError::Config(_))));
}

#[tokio::test]
async fn repeated_queries_are_stable() {
    let config = RagConfig::builder().store_path("/nonexistent/chunks.db").build().unwrap();
    let pipeline = RagPipeline::with_mock_collaborators(&config);

    let first = pipeline.query("tierras ejidales").await;
    let second = pipeline.query("tierras ejidales").await;
    assert_eq!(first, second);
}
