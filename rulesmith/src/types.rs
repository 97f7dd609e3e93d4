//! Shared types for rulebook ingestion and retrieval.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures across the rulebook pipeline.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// One rulebook source file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    /// Path (relative or absolute) the document was read from.
    pub source: String,
    /// Display title: the first markdown heading, or the file stem.
    pub title: String,
    pub text: String,
}

/// A semantically coherent slice of a rulebook document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleChunk {
    pub id: String,
    pub source: String,
    pub heading: String,
    /// Zero-based position of this chunk within its source document.
    pub chunk_index: usize,
    pub content: String,
    /// The embedding vector, when one was computed.
    pub embedding: Option<Vec<f32>>,
}

impl RuleChunk {
    pub fn new(
        source: impl Into<String>,
        heading: impl Into<String>,
        chunk_index: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            heading: heading.into(),
            chunk_index,
            content: content.into(),
            embedding: None,
        }
    }

    /// Attaches an embedding vector.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Telemetry for one chunking run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkingStats {
    /// Sentences fed into breakpoint detection.
    pub total_segments: usize,
    pub total_chunks: usize,
    /// Mean whitespace-approximated token count per chunk.
    pub average_tokens: f32,
}

/// A retrieved chunk with its similarity to the query (higher is closer).
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    pub chunk: RuleChunk,
    pub score: f32,
}
