//! Answer composer trait and the simulated Spanish-language composer.

use async_trait::async_trait;
use tracing::debug;

use crate::document::Chunk;
use crate::error::Result;

/// A composer that turns a query and its retrieved context into a
/// natural-language answer.
///
/// Implementations wrap LLM backends. Composer failures are upstream of the
/// search engine and surface to the pipeline as
/// [`RagError::Composer`](crate::RagError::Composer).
#[async_trait]
pub trait AnswerComposer: Send + Sync {
    /// Compose an answer for `query` grounded in `chunks`.
    async fn compose(&self, query: &str, chunks: &[Chunk]) -> Result<String>;
}

/// Deterministic composer producing a simulated Spanish answer.
///
/// Summarizes the retrieved chunk headers and flags itself as a simulation,
/// matching the development mode where no LLM is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAnswerComposer;

#[async_trait]
impl AnswerComposer for MockAnswerComposer {
    async fn compose(&self, query: &str, chunks: &[Chunk]) -> Result<String> {
        debug!(chunk_count = chunks.len(), "composing simulated answer");

        if chunks.is_empty() {
            return Ok(format!(
                "No encontré documentos específicos relacionados con tu consulta: \"{query}\"\n\n\
                 NOTA: Esta es una respuesta simulada para pruebas de integración. En el modo \
                 de producción, el sistema buscaría en la base de datos completa de documentos \
                 del DOF y proporcionaría información relevante o sugerencias alternativas."
            ));
        }

        let bullets: Vec<String> = chunks.iter().map(|c| format!("• {}", c.header)).collect();
        Ok(format!(
            "Basándome en la información encontrada en los documentos del DOF, puedo ayudarte \
             con tu consulta sobre: \"{query}\"\n\n\
             He encontrado {count} documentos relevantes:\n{bullets}\n\n\
             NOTA: Esta es una respuesta simulada para pruebas de integración. En el modo de \
             producción, aquí se generaría una respuesta detallada utilizando inteligencia \
             artificial basada en el contenido específico de los documentos encontrados.",
            count = chunks.len(),
            bullets = bullets.join("\n"),
        ))
    }
}
