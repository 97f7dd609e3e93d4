//! Build-or-reuse wrapper tying ingestion, chunking, and storage together.

use std::path::Path;
use std::sync::Arc;

use crate::chunker::{ChunkingConfig, SemanticChunker};
use crate::embeddings::{EmbeddingProvider, ProviderModel};
use crate::ingestion::read_rulebook;
use crate::store::RuleChunkStore;
use crate::types::{RuleError, ScoredChunk};

/// What [`RuleIndex::open_or_build`] did.
#[derive(Clone, Debug)]
pub struct BuildOutcome {
    /// `true` when an already-populated index was reused as-is.
    pub reused: bool,
    /// Documents ingested (zero on reuse).
    pub documents: usize,
    /// Chunks present in the store afterwards.
    pub chunks_written: usize,
    /// Chunks dropped for lacking embeddings.
    pub chunks_skipped: usize,
}

/// The queryable rulebook index.
pub struct RuleIndex {
    store: RuleChunkStore<ProviderModel>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl RuleIndex {
    /// Opens the on-disk index, ingesting the rulebook only when the store is
    /// empty. A populated store is never re-embedded.
    pub async fn open_or_build(
        db_path: impl AsRef<Path>,
        rulebook_dir: impl AsRef<Path>,
        provider: Arc<dyn EmbeddingProvider>,
        config: ChunkingConfig,
    ) -> Result<(Self, BuildOutcome), RuleError> {
        let model = ProviderModel::new(provider.clone());
        let store = RuleChunkStore::open(db_path, &model).await?;

        let existing = store.count().await?;
        if existing > 0 {
            tracing::info!(chunks = existing, "reusing rule index");
            return Ok((
                Self { store, provider },
                BuildOutcome {
                    reused: true,
                    documents: 0,
                    chunks_written: existing,
                    chunks_skipped: 0,
                },
            ));
        }

        let documents = read_rulebook(rulebook_dir).await?;
        let chunker = SemanticChunker::new(provider.clone(), config);
        let mut written = 0usize;
        let mut skipped = 0usize;
        for doc in &documents {
            let (chunks, stats) = chunker.chunk(doc).await?;
            tracing::info!(
                source = %doc.source,
                segments = stats.total_segments,
                chunks = stats.total_chunks,
                "rulebook document indexed"
            );
            let (w, s) = store.insert_chunks(chunks).await?;
            written += w;
            skipped += s;
        }

        Ok((
            Self { store, provider },
            BuildOutcome {
                reused: false,
                documents: documents.len(),
                chunks_written: written,
                chunks_skipped: skipped,
            },
        ))
    }

    /// Embeds the query and returns the `top_k` most similar chunks.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>, RuleError> {
        let mut vectors = self.provider.embed_batch(&[query.to_string()]).await?;
        let embedding = vectors
            .pop()
            .ok_or_else(|| RuleError::Embedding("provider returned no vector for query".into()))?;
        self.store.search_similar(&embedding, top_k).await
    }

    /// The underlying chunk store.
    #[must_use]
    pub fn store(&self) -> &RuleChunkStore<ProviderModel> {
        &self.store
    }
}
