//! Ingests the rulebook directory into the sqlite-vec index and runs one
//! retrieval against it.
//!
//! ```bash
//! cargo run -p rulesmith --example ingest_rulebook
//! ```
//!
//! Env knobs: `RULEBOOK_DIR` (default `./docs/rulebook`), `RULE_INDEX_DB`
//! (default `./rule_index.sqlite`), `OLLAMA_URL`, `EMBED_MODEL`,
//! `EMBED_DIMS`. Set `USE_MOCK_EMBEDDINGS=1` to run without a live Ollama.

use std::env;
use std::sync::Arc;
use std::time::Instant;

use rulesmith::{
    ChunkingConfig, EmbeddingProvider, MockEmbeddingProvider, OllamaEmbeddingProvider, RuleError,
    RuleIndex,
};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), RuleError> {
    let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let rulebook_dir = env::var("RULEBOOK_DIR").unwrap_or_else(|_| "./docs/rulebook".to_string());
    let db_path = env::var("RULE_INDEX_DB").unwrap_or_else(|_| "./rule_index.sqlite".to_string());

    let provider: Arc<dyn EmbeddingProvider> = if env::var("USE_MOCK_EMBEDDINGS").is_ok() {
        Arc::new(MockEmbeddingProvider::new())
    } else {
        let base_url =
            env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
        let model = env::var("EMBED_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string());
        let dims = env::var("EMBED_DIMS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(768);
        Arc::new(OllamaEmbeddingProvider::new(base_url, model, dims)?)
    };

    let start = Instant::now();
    let (index, outcome) =
        RuleIndex::open_or_build(&db_path, &rulebook_dir, provider, ChunkingConfig::default())
            .await?;

    if outcome.reused {
        println!("reused existing index ({} chunks)", outcome.chunks_written);
    } else {
        println!(
            "indexed {} documents into {} chunks ({} skipped) in {:.2}s",
            outcome.documents,
            outcome.chunks_written,
            outcome.chunks_skipped,
            start.elapsed().as_secs_f64()
        );
    }

    let question = "How does the Battle Phase work?";
    println!("\nquery: {question}");
    for hit in index.retrieve(question, 3).await? {
        let preview: String = hit.chunk.content.chars().take(96).collect();
        println!(
            "  {:.3}  [{} #{}] {}",
            hit.score, hit.chunk.heading, hit.chunk.chunk_index, preview
        );
    }

    Ok(())
}
