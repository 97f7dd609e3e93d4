//! Integration tests for the rulebook index with deterministic mock
//! embeddings: build once, reuse on reopen, retrieve what was stored.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::tempdir;

use rulesmith::{
    ChunkingConfig, EmbeddingProvider, MockEmbeddingProvider, RuleError, RuleIndex,
};

/// Counts embed calls so reuse can be asserted, delegating to the mock.
struct CountingProvider {
    inner: MockEmbeddingProvider,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new() -> Self {
        Self {
            inner: MockEmbeddingProvider::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    fn id(&self) -> &str {
        "counting-mock"
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RuleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }
}

fn write_rulebook(dir: &std::path::Path) {
    std::fs::write(
        dir.join("01_summoning.md"),
        "# Summoning\n\nYou can Normal Summon one monster per turn. \
         Tribute Summons require sacrificing monsters you control. \
         Special Summons are not limited per turn.",
    )
    .unwrap();
    std::fs::write(
        dir.join("02_battle.md"),
        "# Battle\n\nEach monster can attack once per Battle Phase. \
         Attack position monsters deal battle damage. \
         A replay occurs when the attack target changes.",
    )
    .unwrap();
}

#[tokio::test]
async fn builds_then_reuses_without_re_embedding() {
    let dir = tempdir().unwrap();
    let rulebook_dir = dir.path().join("rulebook");
    std::fs::create_dir_all(&rulebook_dir).unwrap();
    write_rulebook(&rulebook_dir);
    let db_path = dir.path().join("rule_index.sqlite");

    let provider = Arc::new(CountingProvider::new());
    let (_, outcome) = RuleIndex::open_or_build(
        &db_path,
        &rulebook_dir,
        provider.clone(),
        ChunkingConfig::default(),
    )
    .await
    .unwrap();

    assert!(!outcome.reused);
    assert_eq!(outcome.documents, 2);
    assert!(outcome.chunks_written > 0, "{outcome:?}");
    assert_eq!(outcome.chunks_skipped, 0);
    let build_calls = provider.calls();
    assert!(build_calls > 0);

    // Second open sees the populated store and never re-embeds.
    let (index, outcome) = RuleIndex::open_or_build(
        &db_path,
        &rulebook_dir,
        provider.clone(),
        ChunkingConfig::default(),
    )
    .await
    .unwrap();
    assert!(outcome.reused);
    assert_eq!(provider.calls(), build_calls);

    // Retrieval embeds exactly the query.
    let hits = index.retrieve("How many attacks per turn?", 3).await.unwrap();
    assert_eq!(provider.calls(), build_calls + 1);
    assert!(!hits.is_empty());
    assert!(hits.len() <= 3);
}

#[tokio::test]
async fn retrieval_prefers_the_identical_chunk() {
    let dir = tempdir().unwrap();
    let rulebook_dir = dir.path().join("rulebook");
    std::fs::create_dir_all(&rulebook_dir).unwrap();
    write_rulebook(&rulebook_dir);
    let db_path = dir.path().join("rule_index.sqlite");

    let provider = Arc::new(MockEmbeddingProvider::new());
    let (index, _) = RuleIndex::open_or_build(
        &db_path,
        &rulebook_dir,
        provider,
        ChunkingConfig::default(),
    )
    .await
    .unwrap();

    // Grab some stored chunk, then query with its exact content: under a
    // deterministic provider its own vector is the nearest neighbor.
    let seed = index.retrieve("monsters", 1).await.unwrap();
    let target = seed.first().expect("store has chunks").chunk.content.clone();

    let hits = index.retrieve(&target, 2).await.unwrap();
    assert_eq!(hits.first().expect("has hits").chunk.content, target);
    assert!(hits[0].score >= hits.last().unwrap().score);
}

#[tokio::test]
async fn missing_rulebook_directory_surfaces_as_error() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("rule_index.sqlite");
    let provider = Arc::new(MockEmbeddingProvider::new());

    let result = RuleIndex::open_or_build(
        &db_path,
        dir.path().join("does_not_exist"),
        provider,
        ChunkingConfig::default(),
    )
    .await;
    assert!(result.is_err());
}
