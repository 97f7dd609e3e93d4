//! ```text
//! CardApi::fetch_all ──► SnapshotStore::ensure ──► Snapshot (cards.json)
//!                                  │
//!                                  ▼
//!                        CardStore::materialize ──► SQLite `cards` table
//!                                  │
//!                                  ▼
//!                        CardStore::select ──► NL→SQL query engines
//! ```
//!
//! The data layer for the duelist assistant: fetch the full card set from the
//! public card database API, persist it as a timestamped snapshot so repeated
//! runs reuse the local copy, and materialize the flat scalar columns into a
//! queryable SQLite table.

pub mod api;
pub mod card;
pub mod snapshot;
pub mod store;
pub mod types;

pub use api::{CardApi, DEFAULT_API_URL};
pub use card::Card;
pub use snapshot::{EnsureOutcome, Snapshot, SnapshotPolicy, SnapshotStore};
pub use store::{CardStore, TABLE_NAME};
pub use types::CardError;
