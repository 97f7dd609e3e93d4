//! Environment-driven configuration.
//!
//! `dotenvy` loads a `.env` if present; every knob is a `DUELIST_*` variable
//! with a sensible local default, so a bare `cargo run` works against a
//! stock Ollama install.

use std::path::PathBuf;
use std::time::Duration;

use cardvault::SnapshotPolicy;

use crate::errors::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Upstream card API endpoint.
    pub api_url: String,
    /// Snapshot file for the raw card payload.
    pub snapshot_path: PathBuf,
    /// Card database path; `None` keeps the table in memory.
    pub card_db_path: Option<PathBuf>,
    /// Directory of rulebook documents.
    pub rulebook_dir: PathBuf,
    /// On-disk sqlite-vec index, reused across runs.
    pub rule_index_path: PathBuf,
    /// Ollama base URL, shared by chat, engines, and embeddings.
    pub ollama_url: String,
    /// Model driving the tool-routing agent.
    pub chat_model: String,
    /// Model used by the query engines (SQL generation, synthesis).
    pub engine_model: String,
    pub embed_model: String,
    pub embed_dimensions: usize,
    pub temperature: f64,
    /// Chunks retrieved per rulebook query.
    pub top_k: usize,
    /// Agent iteration ceiling per chat turn.
    pub max_turns: usize,
    /// Snapshot invalidation: `None` reuses forever.
    pub snapshot_max_age_hours: Option<u64>,
    /// Force a fresh fetch regardless of any existing snapshot.
    pub refresh_snapshot: bool,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let chat_model = string("DUELIST_CHAT_MODEL", "llama3.2:3b");
        let engine_model = lookup("DUELIST_ENGINE_MODEL").unwrap_or_else(|| chat_model.clone());

        Ok(Self {
            api_url: string("DUELIST_API_URL", cardvault::DEFAULT_API_URL),
            snapshot_path: PathBuf::from(string("DUELIST_SNAPSHOT", "./cards.json")),
            card_db_path: lookup("DUELIST_CARD_DB").map(PathBuf::from),
            rulebook_dir: PathBuf::from(string("DUELIST_RULEBOOK_DIR", "./docs/rulebook")),
            rule_index_path: PathBuf::from(string(
                "DUELIST_RULE_INDEX",
                "./storage/rule_index.sqlite",
            )),
            ollama_url: string("DUELIST_OLLAMA_URL", "http://localhost:11434"),
            chat_model,
            engine_model,
            embed_model: string("DUELIST_EMBED_MODEL", "nomic-embed-text"),
            embed_dimensions: parse(&lookup, "DUELIST_EMBED_DIMS", 768)?,
            temperature: parse(&lookup, "DUELIST_TEMPERATURE", 0.2)?,
            top_k: parse(&lookup, "DUELIST_TOP_K", 4)?,
            max_turns: parse(&lookup, "DUELIST_MAX_TURNS", 50)?,
            snapshot_max_age_hours: match lookup("DUELIST_SNAPSHOT_MAX_AGE_HOURS") {
                Some(raw) => Some(raw.parse().map_err(|_| {
                    AppError::Config(format!(
                        "DUELIST_SNAPSHOT_MAX_AGE_HOURS must be an integer, got '{raw}'"
                    ))
                })?),
                None => None,
            },
            refresh_snapshot: lookup("DUELIST_REFRESH_SNAPSHOT")
                .map(|raw| raw == "1" || raw.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    /// The snapshot policy implied by the refresh/max-age knobs.
    #[must_use]
    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        if self.refresh_snapshot {
            SnapshotPolicy::Refresh
        } else if let Some(hours) = self.snapshot_max_age_hours {
            SnapshotPolicy::MaxAge(Duration::from_secs(hours * 3600))
        } else {
            SnapshotPolicy::ReuseAlways
        }
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has invalid value '{raw}'"))),
        None => Ok(default),
    }
}
