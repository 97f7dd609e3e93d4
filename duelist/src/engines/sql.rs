//! Natural-language-to-SQL over the card table.
//!
//! Two completions per question: one to produce a SELECT against the fixed
//! schema, one to phrase the rows as an answer. The store's read-only guard
//! is the last line of defense against whatever the model emits.

use std::sync::Arc;

use cardvault::CardStore;

use crate::engines::strip_code_fences;
use crate::errors::AppError;
use crate::llm::Llm;

const MAX_RENDERED_ROWS: usize = 50;

pub struct SqlQueryEngine {
    store: Arc<CardStore>,
    llm: Arc<dyn Llm>,
}

impl SqlQueryEngine {
    #[must_use]
    pub fn new(store: Arc<CardStore>, llm: Arc<dyn Llm>) -> Self {
        Self { store, llm }
    }

    /// Generates SQL for the question, runs it, and phrases the result.
    pub async fn query(&self, question: &str) -> Result<String, AppError> {
        let sql = self.generate_sql(question).await?;
        tracing::info!(%sql, "running generated SQL");
        let rows = self.store.select(&sql).await?;
        let rendered = render_rows(&rows);

        let prompt = format!(
            "Answer the question using only the SQL result below.\n\n\
             Question: {question}\n\
             SQL: {sql}\n\
             Result rows (JSON): {rendered}\n\n\
             If the result is empty, say that no matching card was found. \
             Keep the answer short and factual.\nAnswer:"
        );
        self.llm.complete(&prompt).await
    }

    async fn generate_sql(&self, question: &str) -> Result<String, AppError> {
        let prompt = format!(
            "You translate questions about a trading card database into SQLite.\n\
             The only table is defined as:\n\n{}\n\n\
             Rules:\n\
             - Respond with exactly one SELECT statement and nothing else.\n\
             - Double-quote the \"desc\" column whenever you reference it.\n\
             - Match card names with LIKE and '%' wildcards.\n\n\
             Question: {question}\nSQL:",
            CardStore::schema_text(),
        );
        let raw = self.llm.complete(&prompt).await?;
        extract_sql(&raw)
    }
}

/// Pulls the SELECT out of a model response, dropping fences and any prose
/// before it.
fn extract_sql(raw: &str) -> Result<String, AppError> {
    let cleaned = strip_code_fences(raw);
    let lowered = cleaned.to_ascii_lowercase();
    let start = lowered.find("select").ok_or_else(|| {
        AppError::Sql(cleaned.chars().take(80).collect::<String>())
    })?;
    Ok(cleaned[start..].trim().to_string())
}

fn render_rows(rows: &[serde_json::Map<String, serde_json::Value>]) -> String {
    if rows.is_empty() {
        return "[]".to_string();
    }
    let shown = rows.len().min(MAX_RENDERED_ROWS);
    let mut rendered = serde_json::to_string(&rows[..shown]).unwrap_or_else(|_| "[]".to_string());
    if rows.len() > shown {
        rendered.push_str(&format!("\n({shown} of {} rows shown)", rows.len()));
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::testing::StubLlm;

    fn sample_cards() -> Vec<cardvault::Card> {
        [
            serde_json::json!({
                "id": 46986414,
                "name": "Dark Magician",
                "type": "Normal Monster",
                "desc": "The ultimate wizard.",
                "race": "Spellcaster",
                "atk": 2500,
                "def": 2100,
                "level": 7,
                "attribute": "DARK"
            }),
            serde_json::json!({
                "id": 53129443,
                "name": "Dark Hole",
                "type": "Spell Card",
                "desc": "Destroy all monsters on the field.",
                "race": "Normal"
            }),
        ]
        .into_iter()
        .map(|raw| serde_json::from_value(raw).unwrap())
        .collect()
    }

    async fn engine_with(llm: Arc<StubLlm>) -> SqlQueryEngine {
        let store = CardStore::open_in_memory().await.unwrap();
        store.materialize(&sample_cards()).await.unwrap();
        SqlQueryEngine::new(Arc::new(store), llm)
    }

    #[test]
    fn extract_sql_handles_fences_and_preambles() {
        assert_eq!(
            extract_sql("```sql\nSELECT name FROM cards\n```").unwrap(),
            "SELECT name FROM cards"
        );
        assert_eq!(
            extract_sql("Here is the query:\nSELECT atk FROM cards WHERE name LIKE '%Magician%'")
                .unwrap(),
            "SELECT atk FROM cards WHERE name LIKE '%Magician%'"
        );
        let err = extract_sql("I cannot answer that.").unwrap_err();
        assert!(matches!(err, AppError::Sql(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn query_runs_the_generated_select_and_phrases_rows() {
        let llm = Arc::new(StubLlm::new([
            "```sql\nSELECT name, atk FROM cards WHERE atk IS NOT NULL\n```",
            "Dark Magician has 2500 ATK.",
        ]));
        let engine = engine_with(llm.clone()).await;

        let answer = engine
            .query("What is the ATK of Dark Magician?")
            .await
            .unwrap();
        assert_eq!(answer, "Dark Magician has 2500 ATK.");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("CREATE TABLE cards"));
        assert!(prompts[1].contains("Dark Magician"), "{}", prompts[1]);
        assert!(prompts[1].contains("2500"));
    }

    #[tokio::test]
    async fn mutating_sql_from_the_model_never_reaches_the_table() {
        let llm = Arc::new(StubLlm::new(["SELECT 1; DROP TABLE cards"]));
        let engine = engine_with(llm).await;

        let err = engine.query("delete everything").await.unwrap_err();
        assert!(matches!(err, AppError::Cards(_)), "got {err:?}");
        assert_eq!(engine.store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn refusals_surface_as_sql_errors() {
        let llm = Arc::new(StubLlm::new(["DROP TABLE cards"]));
        let engine = engine_with(llm).await;
        let err = engine.query("anything").await.unwrap_err();
        assert!(matches!(err, AppError::Sql(_)), "got {err:?}");
    }

    #[test]
    fn row_rendering_caps_large_results() {
        let row: serde_json::Map<String, serde_json::Value> =
            [("name".to_string(), serde_json::Value::String("X".into()))]
                .into_iter()
                .collect();
        let rows = vec![row; 60];
        let rendered = render_rows(&rows);
        assert!(rendered.contains("(50 of 60 rows shown)"));
        assert_eq!(render_rows(&[]), "[]");
    }
}
