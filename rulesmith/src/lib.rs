//! ```text
//! Rulebook files ──► ingestion::read_rulebook ──► RuleDocument
//!
//! RuleDocument ──► chunker::SemanticChunker ──┬─► RuleChunk + ChunkingStats
//!                        │                    │
//!                        ├─► segmenter        └─► embeddings::EmbeddingProvider
//!                        └─► percentile breakpoints
//!
//! RuleChunk ──► store::RuleChunkStore (sqlite-vec) ──► index::RuleIndex::retrieve
//! ```
//!
//! Retrieval side of the duelist assistant: local rulebook documents are
//! segmented into sentences, split at semantic breakpoints, embedded, and
//! persisted into a sqlite-vec store that is rebuilt only when absent.

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod ingestion;
pub mod segmenter;
pub mod store;
pub mod types;

pub use chunker::{ChunkingConfig, SemanticChunker};
pub use embeddings::{EmbeddingProvider, MockEmbeddingProvider, OllamaEmbeddingProvider, ProviderModel};
pub use index::{BuildOutcome, RuleIndex};
pub use ingestion::read_rulebook;
pub use store::{RuleChunkDoc, RuleChunkStore};
pub use types::{ChunkingStats, RuleChunk, RuleDocument, RuleError, ScoredChunk};
