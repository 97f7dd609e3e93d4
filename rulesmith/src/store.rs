//! sqlite-vec backed persistence for rule chunks.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;

use rig::OneOrMany;
use rig::embeddings::{Embedding, EmbeddingModel};
use rig_sqlite::{Column, ColumnValue, SqliteVectorStore, SqliteVectorStoreTable};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{Connection, ffi};

use crate::types::{RuleChunk, RuleError, ScoredChunk};

/// Row shape persisted for each chunk. `chunk_index` travels as TEXT because
/// that is how it comes back out of the vector-store round trip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleChunkDoc {
    pub id: String,
    pub source: String,
    pub heading: String,
    #[serde(deserialize_with = "deserialize_chunk_index")]
    pub chunk_index: usize,
    pub content: String,
}

impl SqliteVectorStoreTable for RuleChunkDoc {
    fn name() -> &'static str {
        "rule_chunks"
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("source", "TEXT").indexed(),
            Column::new("heading", "TEXT"),
            Column::new("chunk_index", "TEXT"),
            Column::new("content", "TEXT"),
        ]
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn column_values(&self) -> Vec<(&'static str, Box<dyn ColumnValue>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("source", Box::new(self.source.clone())),
            ("heading", Box::new(self.heading.clone())),
            ("chunk_index", Box::new(self.chunk_index.to_string())),
            ("content", Box::new(self.content.clone())),
        ]
    }
}

fn deserialize_chunk_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Num(value) => usize::try_from(value)
            .map_err(|_| de::Error::custom(format!("chunk_index {value} does not fit in usize"))),
        Repr::Text(text) => text.parse::<usize>().map_err(|err| {
            de::Error::custom(format!("unable to parse chunk_index '{text}': {err}"))
        }),
    }
}

impl From<RuleChunk> for RuleChunkDoc {
    fn from(chunk: RuleChunk) -> Self {
        Self {
            id: chunk.id,
            source: chunk.source,
            heading: chunk.heading,
            chunk_index: chunk.chunk_index,
            content: chunk.content,
        }
    }
}

impl From<RuleChunkDoc> for RuleChunk {
    fn from(doc: RuleChunkDoc) -> Self {
        Self {
            id: doc.id,
            source: doc.source,
            heading: doc.heading,
            chunk_index: doc.chunk_index,
            content: doc.content,
            embedding: None,
        }
    }
}

/// Vector store for rule chunks: rig-sqlite handles table creation and
/// insertion, similarity search goes through sqlite-vec directly.
#[derive(Clone)]
pub struct RuleChunkStore<E>
where
    E: EmbeddingModel + 'static,
{
    inner: SqliteVectorStore<E, RuleChunkDoc>,
    /// Separate handle for the raw queries rig-sqlite does not cover.
    conn: Connection,
}

impl<E> RuleChunkStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    /// Opens (or creates) a chunk database at `path`.
    pub async fn open(path: impl AsRef<Path>, model: &E) -> Result<Self, RuleError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| RuleError::Storage(err.to_string()))?;
        conn.call(|conn| {
            let result = conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0));
            match result {
                Ok(_) => Ok(()),
                Err(err) => Err(tokio_rusqlite::Error::Rusqlite(err)),
            }
        })
        .await
        .map_err(|err| RuleError::Storage(err.to_string()))?;
        let conn_for_queries = conn.clone();
        let inner = SqliteVectorStore::new(conn, model)
            .await
            .map_err(|err| RuleError::Storage(err.to_string()))?;
        Ok(Self {
            inner,
            conn: conn_for_queries,
        })
    }

    /// Inserts the chunks that carry embeddings; returns `(written, skipped)`.
    pub async fn insert_chunks(&self, chunks: Vec<RuleChunk>) -> Result<(usize, usize), RuleError> {
        let mut rows = Vec::with_capacity(chunks.len());
        let mut skipped = 0usize;
        for chunk in chunks {
            let Some(embedding) = chunk.embedding.clone() else {
                skipped += 1;
                continue;
            };
            let embed = Embedding {
                document: chunk.content.clone(),
                vec: embedding.into_iter().map(f64::from).collect(),
            };
            rows.push((RuleChunkDoc::from(chunk), OneOrMany::one(embed)));
        }
        let written = rows.len();
        if written > 0 {
            self.inner
                .add_rows(rows)
                .await
                .map_err(|err| RuleError::Storage(err.to_string()))?;
        }
        Ok((written, skipped))
    }

    /// Cosine top-k over the stored vectors; scores are similarities in
    /// descending order.
    pub async fn search_similar(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, RuleError> {
        let embedding_json = serde_json::to_string(query_embedding)
            .map_err(|err| RuleError::Storage(err.to_string()))?;
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT c.id, c.source, c.heading, c.chunk_index, c.content, \
                     vec_distance_cosine(e.embedding, vec_f32(?)) AS distance \
                     FROM rule_chunks c \
                     JOIN rule_chunks_embeddings e ON c.id = e.id \
                     ORDER BY distance ASC \
                     LIMIT {top_k}"
                ))?;

                let rows = stmt.query_map([&embedding_json], |row| {
                    let chunk = RuleChunk {
                        id: row.get(0)?,
                        source: row.get(1)?,
                        heading: row.get(2)?,
                        chunk_index: row.get::<_, String>(3)?.parse().unwrap_or(0),
                        content: row.get(4)?,
                        embedding: None,
                    };
                    let distance: f32 = row.get(5)?;
                    Ok(ScoredChunk {
                        chunk,
                        score: 1.0 - distance,
                    })
                })?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| RuleError::Storage(err.to_string()))
    }

    /// Total number of stored chunks.
    pub async fn count(&self) -> Result<usize, RuleError> {
        self.conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM rule_chunks", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RuleError::Storage(err.to_string()))
    }

    /// The underlying connection, for queries the store does not cover.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Registers sqlite-vec as an auto extension, once per process.
fn register_sqlite_vec() -> Result<(), RuleError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    let result = REGISTERED.get_or_init(|| unsafe {
        type SqliteExtensionInit = unsafe extern "C" fn(
            *mut ffi::sqlite3,
            *mut *mut c_char,
            *const ffi::sqlite3_api_routines,
        ) -> i32;

        let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
        let init_fn: SqliteExtensionInit =
            transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
        let rc = ffi::sqlite3_auto_extension(Some(init_fn));
        if rc != 0 {
            Err(format!("failed to register sqlite-vec extension (code {rc})"))
        } else {
            Ok(())
        }
    });

    result.clone().map_err(RuleError::Storage)
}
