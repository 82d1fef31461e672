//! Fixed fallback payload served when the chunk store is unusable.

use chrono::{TimeZone, Utc};
use tracing::info;

use crate::document::{Chunk, Document};

/// Build the synthetic `(chunks, documents)` payload, sliced to `top_k`.
///
/// The fixed set holds three chunks over two documents, so the two lists can
/// have different lengths: chunks slice to `top_k` while documents cap at
/// `min(document_count, top_k)`. Stable for a given `top_k`.
pub(crate) fn synthetic_results(top_k: usize) -> (Vec<Chunk>, Vec<Document>) {
    info!("serving synthetic data");

    let mut documents = vec![
        Document {
            id: 1,
            title: "LEY_ISR_2024".to_string(),
            url: Some("https://dof.gob.mx/isr".to_string()),
            file_path: Some("/docs/isr.pdf".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).single(),
        },
        Document {
            id: 2,
            title: "REGLAMENTO_SALUD".to_string(),
            url: Some("https://dof.gob.mx/salud".to_string()),
            file_path: Some("/docs/salud.pdf".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 2, 20, 0, 0, 0).single(),
        },
    ];

    let mut chunks = vec![
        Chunk {
            text: "Artículo 1.- Las personas físicas y las morales están obligadas \
                   al pago del impuesto sobre la renta."
                .to_string(),
            header: "Art 1 - Obligaciones".to_string(),
            document_id: 1,
        },
        Chunk {
            text: "Artículo 5.- Los patrones deberán implementar un sistema de \
                   gestión de seguridad y salud en el trabajo."
                .to_string(),
            header: "Art 5 - Seguridad".to_string(),
            document_id: 2,
        },
        Chunk {
            text: "Artículo 10.- Las tierras ejidales serán inembargables, \
                   imprescriptibles e inalienables."
                .to_string(),
            header: "Art 10 - Tierras".to_string(),
            document_id: 1,
        },
    ];

    chunks.truncate(top_k);
    let document_cap = documents.len().min(top_k);
    documents.truncate(document_cap);
    (chunks, documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_top_k_returns_full_fixed_set() {
        let (chunks, documents) = synthetic_results(5);
        assert_eq!(chunks.len(), 3);
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].title, "LEY_ISR_2024");
        assert_eq!(documents[1].title, "REGLAMENTO_SALUD");
    }

    #[test]
    fn small_top_k_slices_both_lists() {
        let (chunks, documents) = synthetic_results(1);
        assert_eq!(chunks.len(), 1);
        assert_eq!(documents.len(), 1);
        assert_eq!(chunks[0].header, "Art 1 - Obligaciones");
    }

    #[test]
    fn zero_top_k_is_empty() {
        let (chunks, documents) = synthetic_results(0);
        assert!(chunks.is_empty());
        assert!(documents.is_empty());
    }

    #[test]
    fn payload_is_stable_across_calls() {
        assert_eq!(synthetic_results(3), synthetic_results(3));
    }
}
