pub mod mocks;

use pdfchat::db::{InMemoryVectorIndex, VectorIndex};
use pdfchat::rag::{RetrievalPipeline, TextChunker};
use pdfchat::Config;
use std::collections::HashMap;
use std::sync::Arc;

use mocks::MockEmbeddings;

pub const DIMENSIONS: usize = 64;

/// Configuration for tests: defaults plus the given overrides.
#[allow(dead_code)]
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("OPENAI_API_KEY".into(), "sk-test".into());
    vars.insert("EMBEDDING_DIMENSIONS".into(), DIMENSIONS.to_string());
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("valid test config")
}

/// Pipeline over a fresh in-memory index with the mock embedder.
#[allow(dead_code)]
pub fn test_pipeline(
    chunk_size: usize,
    chunk_overlap: usize,
) -> (Arc<RetrievalPipeline>, Arc<MockEmbeddings>, Arc<InMemoryVectorIndex>) {
    let embedder = Arc::new(MockEmbeddings::new(DIMENSIONS));
    let index = Arc::new(InMemoryVectorIndex::new(DIMENSIONS));
    let pipeline = RetrievalPipeline::new(
        index.clone() as Arc<dyn VectorIndex>,
        embedder.clone(),
        TextChunker::new(chunk_size, chunk_overlap).expect("valid chunker"),
        4000,
    )
    .expect("valid pipeline");
    (Arc::new(pipeline), embedder, index)
}

/// A single-page PDF showing `text` in Helvetica, with a valid xref table.
#[allow(dead_code)]
pub fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    pdf.into_bytes()
}
