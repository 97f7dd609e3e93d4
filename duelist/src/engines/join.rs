//! Join engine: table answer first, then an optional augmentation pass.
//!
//! Runs the SQL engine, asks the model whether that answer suffices, and if
//! not routes a follow-up through the sub-question engine before combining
//! both. The agent is told to prefer this tool for complex questions.

use std::sync::Arc;

use crate::engines::{SqlQueryEngine, SubQuestionEngine};
use crate::errors::AppError;
use crate::llm::Llm;

pub struct JoinQueryEngine {
    sql: Arc<SqlQueryEngine>,
    subquestion: Arc<SubQuestionEngine>,
    llm: Arc<dyn Llm>,
}

impl JoinQueryEngine {
    #[must_use]
    pub fn new(
        sql: Arc<SqlQueryEngine>,
        subquestion: Arc<SubQuestionEngine>,
        llm: Arc<dyn Llm>,
    ) -> Self {
        Self {
            sql,
            subquestion,
            llm,
        }
    }

    pub async fn query(&self, question: &str) -> Result<String, AppError> {
        let table_answer = self.sql.query(question).await?;

        let decision_prompt = format!(
            "A question was answered from the card table alone.\n\n\
             Question: {question}\n\
             Table answer: {table_answer}\n\n\
             If that fully answers the question, reply with exactly NONE. \
             Otherwise reply with one follow-up question covering what is \
             still missing (rules, interactions, other cards). No other output."
        );
        let decision = self.llm.complete(&decision_prompt).await?;
        let follow_up = decision.trim();

        if follow_up.is_empty() || follow_up.to_ascii_lowercase().starts_with("none") {
            tracing::info!("table answer considered sufficient");
            return Ok(table_answer);
        }

        tracing::info!(%follow_up, "augmenting table answer");
        let augmented = self.subquestion.query(follow_up).await?;

        let prompt = format!(
            "Combine both partial answers into one final answer.\n\n\
             Question: {question}\n\
             From the card table: {table_answer}\n\
             Additional findings: {augmented}\n\nAnswer:"
        );
        self.llm.complete(&prompt).await
    }
}
