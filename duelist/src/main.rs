//! Bootstrap: card snapshot → SQLite table → rule index → tools → agent →
//! chat loop. Any bootstrap failure surfaces as the process result.

mod agent;
mod chat;
mod config;
mod engines;
mod errors;
mod llm;
mod tools;
mod transcript;

use std::sync::Arc;

use cardvault::{CardApi, CardStore, SnapshotStore};
use rig::prelude::*;
use rig::providers::ollama;
use rulesmith::{ChunkingConfig, EmbeddingProvider, OllamaEmbeddingProvider, RuleIndex};
use tracing_subscriber::EnvFilter;

use crate::agent::Assistant;
use crate::config::AppConfig;
use crate::engines::{JoinQueryEngine, RulebookQueryEngine, SqlQueryEngine, SubQuestionEngine};
use crate::errors::AppError;
use crate::llm::{Llm, RigCompleter};
use crate::tools::{CardDbTool, JoinTool, RulebookTool, SubQuestionTool};
use crate::transcript::Transcript;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    // Card data: fetch-or-reuse the snapshot, then load the table.
    let api = CardApi::new(config.api_url.clone())?;
    let snapshots = SnapshotStore::new(&config.snapshot_path);
    let outcome = snapshots.ensure(&api, config.snapshot_policy()).await?;
    println!(
        "{} cards ({}, fetched {})",
        outcome.cards.len(),
        if outcome.from_cache {
            "snapshot"
        } else {
            "fresh download"
        },
        outcome.fetched_at.format("%Y-%m-%d %H:%M UTC")
    );

    let store = match &config.card_db_path {
        Some(path) => CardStore::open(path).await?,
        None => CardStore::open_in_memory().await?,
    };
    let rows = store.materialize(&outcome.cards).await?;
    tracing::info!(rows, "card table ready");

    // Rulebook index: reuse the on-disk store, build it on first run.
    if let Some(parent) = config.rule_index_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbeddingProvider::new(
        &config.ollama_url,
        &config.embed_model,
        config.embed_dimensions,
    )?);
    let (index, build) = RuleIndex::open_or_build(
        &config.rule_index_path,
        &config.rulebook_dir,
        provider,
        ChunkingConfig::default(),
    )
    .await?;
    if build.reused {
        println!("rule index reused ({} chunks)", build.chunks_written);
    } else {
        println!(
            "rule index built: {} documents, {} chunks ({} skipped)",
            build.documents, build.chunks_written, build.chunks_skipped
        );
    }

    // Engines share one tool-less completer; the agent gets the tools.
    let client = ollama::Client::builder()
        .api_key(rig::client::Nothing)
        .base_url(&config.ollama_url)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;
    let completer: Arc<dyn Llm> = Arc::new(RigCompleter::new(
        &client,
        &config.engine_model,
        config.temperature,
    ));

    let sql_engine = Arc::new(SqlQueryEngine::new(Arc::new(store), completer.clone()));
    let rulebook_engine = Arc::new(RulebookQueryEngine::new(
        Arc::new(index),
        completer.clone(),
        config.top_k,
    ));
    let subquestion_engine = Arc::new(SubQuestionEngine::new(
        sql_engine.clone(),
        rulebook_engine.clone(),
        completer.clone(),
    ));
    let join_engine = Arc::new(JoinQueryEngine::new(
        sql_engine.clone(),
        subquestion_engine.clone(),
        completer,
    ));

    let assistant = Assistant::new(
        &client,
        &config,
        CardDbTool::new(sql_engine),
        RulebookTool::new(rulebook_engine),
        SubQuestionTool::new(subquestion_engine),
        JoinTool::new(join_engine),
    );

    chat::run(&assistant, Transcript::seeded(chat::GREETING)).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
