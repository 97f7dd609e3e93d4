//! Fetches (or reuses) the card snapshot and materializes it into SQLite.
//!
//! ```bash
//! cargo run -p cardvault --example fetch_cards
//! ```
//!
//! Env knobs: `CARDVAULT_API_URL`, `CARDVAULT_SNAPSHOT` (default
//! `./cards.json`), `CARDVAULT_DB` (default in-memory).

use std::env;

use cardvault::{CardApi, CardError, CardStore, DEFAULT_API_URL, SnapshotPolicy, SnapshotStore};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), CardError> {
    let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let endpoint = env::var("CARDVAULT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let snapshot_path =
        env::var("CARDVAULT_SNAPSHOT").unwrap_or_else(|_| "./cards.json".to_string());

    let api = CardApi::new(endpoint)?;
    let snapshot = SnapshotStore::new(&snapshot_path);
    let outcome = snapshot.ensure(&api, SnapshotPolicy::ReuseAlways).await?;

    println!(
        "{} cards ({}) fetched at {}",
        outcome.cards.len(),
        if outcome.from_cache {
            "from snapshot"
        } else {
            "freshly downloaded"
        },
        outcome.fetched_at
    );

    let store = match env::var("CARDVAULT_DB") {
        Ok(path) => CardStore::open(path).await?,
        Err(_) => CardStore::open_in_memory().await?,
    };
    let rows = store.materialize(&outcome.cards).await?;
    println!("materialized {rows} rows into the `cards` table");

    let sample = store
        .select("SELECT name, atk, \"def\" FROM cards WHERE atk IS NOT NULL ORDER BY atk DESC LIMIT 5")
        .await?;
    for row in sample {
        println!("{}", serde_json::to_string(&row).unwrap_or_default());
    }

    Ok(())
}
