//! Sub-question decomposition across the two base engines.
//!
//! The model plans a JSON list of `{sub_question, tool}` items; each item is
//! dispatched to the card table or the rulebook, and a final completion
//! combines the sub-answers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engines::{RulebookQueryEngine, SqlQueryEngine, strip_code_fences};
use crate::errors::AppError;
use crate::llm::Llm;

/// One planned step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestion {
    pub sub_question: String,
    pub tool: String,
}

pub struct SubQuestionEngine {
    sql: Arc<SqlQueryEngine>,
    rulebook: Arc<RulebookQueryEngine>,
    llm: Arc<dyn Llm>,
}

impl SubQuestionEngine {
    #[must_use]
    pub fn new(
        sql: Arc<SqlQueryEngine>,
        rulebook: Arc<RulebookQueryEngine>,
        llm: Arc<dyn Llm>,
    ) -> Self {
        Self { sql, rulebook, llm }
    }

    /// Plans, runs every sub-question, and combines the answers.
    pub async fn query(&self, question: &str) -> Result<String, AppError> {
        let plan = self.plan(question).await?;
        tracing::info!(sub_questions = plan.len(), "sub-question plan ready");

        let mut findings = Vec::with_capacity(plan.len());
        for item in &plan {
            tracing::debug!(tool = %item.tool, sub_question = %item.sub_question, "dispatching");
            let answer = match item.tool.as_str() {
                "ygo_card_db" => self.sql.query(&item.sub_question).await?,
                "ygo_rulebook" => self.rulebook.query(&item.sub_question).await?,
                other => {
                    return Err(AppError::Plan(format!(
                        "plan names unknown tool '{other}'"
                    )));
                }
            };
            findings.push(format!("Q: {}\nA: {answer}", item.sub_question));
        }

        let prompt = format!(
            "Combine the sub-answers below into one answer to the original \
             question. Do not repeat the sub-questions.\n\n\
             Original question: {question}\n\n{}\n\nAnswer:",
            findings.join("\n\n")
        );
        self.llm.complete(&prompt).await
    }

    async fn plan(&self, question: &str) -> Result<Vec<SubQuestion>, AppError> {
        let prompt = format!(
            "Break the question into the smallest set of sub-questions that \
             together answer it. Respond with a JSON array of objects, each \
             {{\"sub_question\": \"...\", \"tool\": \"...\"}} where tool is \
             \"ygo_card_db\" for card data (stats, text, types) or \
             \"ygo_rulebook\" for game mechanics and rules. No other output.\n\n\
             Question: {question}"
        );
        let raw = self.llm.complete(&prompt).await?;
        let plan = parse_plan(&raw)?;
        if plan.is_empty() {
            return Err(AppError::Plan("the model produced an empty plan".into()));
        }
        Ok(plan)
    }
}

/// Parses the planner output, tolerating fences and prose around the array.
pub(crate) fn parse_plan(raw: &str) -> Result<Vec<SubQuestion>, AppError> {
    let cleaned = strip_code_fences(raw);
    let slice = match (cleaned.find('['), cleaned.rfind(']')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => cleaned.as_str(),
    };
    serde_json::from_str(slice).map_err(|err| {
        AppError::Plan(format!(
            "{err} in: {}",
            slice.chars().take(120).collect::<String>()
        ))
    })
}
