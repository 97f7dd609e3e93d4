//! Tabular materialization of the card set into SQLite.

use serde_json::{Map, Value};
use tokio_rusqlite::Connection;

use crate::card::Card;
use crate::types::CardError;

/// Name of the materialized card table.
pub const TABLE_NAME: &str = "cards";

/// The fixed column list of the materialized table. Nested payload sections
/// never appear here whatever the upstream response carried.
pub const COLUMNS: [&str; 16] = [
    "id",
    "name",
    "card_type",
    "human_readable_card_type",
    "frame_type",
    "desc",
    "race",
    "archetype",
    "ygoprodeck_url",
    "typeline",
    "atk",
    "def",
    "level",
    "scale",
    "linkval",
    "attribute",
];

const CREATE_TABLE_SQL: &str = r#"CREATE TABLE cards (
    id INTEGER,
    name TEXT,
    card_type TEXT,
    human_readable_card_type TEXT,
    frame_type TEXT,
    "desc" TEXT,
    race TEXT,
    archetype TEXT,
    ygoprodeck_url TEXT,
    typeline TEXT,
    atk INTEGER,
    "def" INTEGER,
    level INTEGER,
    scale INTEGER,
    linkval INTEGER,
    attribute TEXT
)"#;

const INSERT_SQL: &str = r#"INSERT INTO cards
    (id, name, card_type, human_readable_card_type, frame_type, "desc", race,
     archetype, ygoprodeck_url, typeline, atk, "def", level, scale, linkval, attribute)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"#;

/// Flat row shape handed to SQLite; owned so it can cross into the
/// connection's blocking closure.
type CardRow = (
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<String>,
);

fn card_to_row(card: &Card) -> CardRow {
    (
        card.id,
        card.name.clone(),
        card.card_type.clone(),
        card.human_readable_card_type.clone(),
        card.frame_type.clone(),
        card.desc.clone(),
        card.race.clone(),
        card.archetype.clone(),
        card.ygoprodeck_url.clone(),
        card.typeline_text(),
        card.atk,
        card.def,
        card.level,
        card.scale,
        card.linkval,
        card.attribute.clone(),
    )
}

/// SQLite-backed card table with a read-only SQL surface.
///
/// The implicit SQLite rowid serves as the surrogate row index; there is no
/// schema evolution, and each [`materialize`](CardStore::materialize) replaces
/// the whole set.
#[derive(Clone)]
pub struct CardStore {
    conn: Connection,
}

impl CardStore {
    /// Opens (or creates) a card database at the given path.
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self, CardError> {
        let conn = Connection::open(path)
            .await
            .map_err(|err| CardError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    /// Opens an in-memory card database.
    pub async fn open_in_memory() -> Result<Self, CardError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| CardError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    /// The underlying connection, for operations the store does not cover.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Renders the table schema handed to SQL-generating prompts.
    #[must_use]
    pub fn schema_text() -> &'static str {
        CREATE_TABLE_SQL
    }

    /// Drops and recreates the table, bulk-loading the card set in one
    /// transaction. Returns the number of rows written.
    pub async fn materialize(&self, cards: &[Card]) -> Result<usize, CardError> {
        let rows: Vec<CardRow> = cards.iter().map(card_to_row).collect();
        let written = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DROP TABLE IF EXISTS cards", [])?;
                tx.execute(CREATE_TABLE_SQL, [])?;
                {
                    let mut stmt = tx.prepare(INSERT_SQL)?;
                    for row in &rows {
                        stmt.execute(row.clone())?;
                    }
                }
                tx.commit()?;
                Ok(rows.len())
            })
            .await
            .map_err(|err| CardError::Storage(err.to_string()))?;
        tracing::debug!(rows = written, "card table materialized");
        Ok(written)
    }

    /// Number of rows in the card table.
    pub async fn count(&self) -> Result<usize, CardError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| CardError::Storage(err.to_string()))
    }

    /// Executes a single SELECT statement and returns its rows as JSON
    /// objects keyed by column name.
    ///
    /// Anything that is not exactly one SELECT is rejected before it reaches
    /// the database.
    pub async fn select(&self, sql: &str) -> Result<Vec<Map<String, Value>>, CardError> {
        let sql = sanitize_select(sql)?;
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let column_names: Vec<String> =
                    stmt.column_names().iter().map(|s| s.to_string()).collect();
                let mut rows = stmt.query([])?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut object = Map::new();
                    for (idx, name) in column_names.iter().enumerate() {
                        // Integer before real: SQLite hands an INTEGER out
                        // as f64 just as happily.
                        let value = if let Ok(v) = row.get::<_, i64>(idx) {
                            Value::from(v)
                        } else if let Ok(v) = row.get::<_, f64>(idx) {
                            serde_json::Number::from_f64(v)
                                .map(Value::Number)
                                .unwrap_or(Value::Null)
                        } else if let Ok(v) = row.get::<_, String>(idx) {
                            Value::String(v)
                        } else {
                            Value::Null
                        };
                        object.insert(name.clone(), value);
                    }
                    out.push(object);
                }
                Ok(out)
            })
            .await
            .map_err(|err| CardError::Storage(err.to_string()))
    }
}

fn sanitize_select(sql: &str) -> Result<String, CardError> {
    let trimmed = sql.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return Err(CardError::Query("empty statement".into()));
    }
    if trimmed.contains(';') {
        return Err(CardError::Query(
            "multiple statements are not allowed".into(),
        ));
    }
    if !trimmed
        .get(..6)
        .map(|head| head.eq_ignore_ascii_case("select"))
        .unwrap_or(false)
    {
        return Err(CardError::Query(format!(
            "only SELECT statements are allowed, got: {}",
            trimmed.chars().take(32).collect::<String>()
        )));
    }
    Ok(trimmed.to_string())
}
