//! The agent-facing tools.
//!
//! Each tool is a thin wrapper over one query engine; the descriptions below
//! are the entire routing surface the reasoning agent sees, so they spell
//! out when to pick which tool.

use std::sync::Arc;

use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::Deserialize;
use thiserror::Error;

use crate::engines::{JoinQueryEngine, RulebookQueryEngine, SqlQueryEngine, SubQuestionEngine};

const CARD_DB_DESCRIPTION: &str = "Use a detailed plain text question as input to the tool. \
    Provides information about every YuGiOh card since the last update. \
    Used for translating a natural language query into SQL over a table \
    containing the data of each card including name and description. \
    Example input: What is the ATK and DEF of ###[Card Name]";

const RULEBOOK_DESCRIPTION: &str = "Use a detailed plain text question as input to the tool. \
    Contains the latest information on general game mechanics and rules for the YuGiOh TCG.";

const SQE_DESCRIPTION: &str = "Use a detailed plain text question as input to the tool. \
    Used internally by the ygo_jqe tool. \
    Breaks up questions about YuGiOh into sub queries to run with the underlying tools \
    and then combines the results in order to better answer the question.";

const JQE_DESCRIPTION: &str = "Prioritize this tool first. \
    Use a detailed plain text question as input to the tool. \
    Utilizes all of the previous tools to provide the best answer. \
    Useful for answering interactions between multiple cards and effects, \
    as well as for answering complex questions in general.";

/// Every tool takes the same shape: one detailed plain-text question.
#[derive(Debug, Deserialize)]
pub struct QuestionArgs {
    pub input: String,
}

fn question_parameters() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "input": {
                "type": "string",
                "description": "A detailed plain text question."
            }
        },
        "required": ["input"]
    })
}

/// Engine failures surfaced back into the agent loop as tool errors.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ToolError(String);

pub struct CardDbTool {
    engine: Arc<SqlQueryEngine>,
}

impl CardDbTool {
    #[must_use]
    pub fn new(engine: Arc<SqlQueryEngine>) -> Self {
        Self { engine }
    }
}

impl Tool for CardDbTool {
    const NAME: &'static str = "ygo_card_db";

    type Error = ToolError;
    type Args = QuestionArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: CARD_DB_DESCRIPTION.to_string(),
            parameters: question_parameters(),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.engine
            .query(&args.input)
            .await
            .map_err(|err| ToolError(err.to_string()))
    }
}

pub struct RulebookTool {
    engine: Arc<RulebookQueryEngine>,
}

impl RulebookTool {
    #[must_use]
    pub fn new(engine: Arc<RulebookQueryEngine>) -> Self {
        Self { engine }
    }
}

impl Tool for RulebookTool {
    const NAME: &'static str = "ygo_rulebook";

    type Error = ToolError;
    type Args = QuestionArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: RULEBOOK_DESCRIPTION.to_string(),
            parameters: question_parameters(),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.engine
            .query(&args.input)
            .await
            .map_err(|err| ToolError(err.to_string()))
    }
}

pub struct SubQuestionTool {
    engine: Arc<SubQuestionEngine>,
}

impl SubQuestionTool {
    #[must_use]
    pub fn new(engine: Arc<SubQuestionEngine>) -> Self {
        Self { engine }
    }
}

impl Tool for SubQuestionTool {
    const NAME: &'static str = "ygo_sqe";

    type Error = ToolError;
    type Args = QuestionArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: SQE_DESCRIPTION.to_string(),
            parameters: question_parameters(),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.engine
            .query(&args.input)
            .await
            .map_err(|err| ToolError(err.to_string()))
    }
}

pub struct JoinTool {
    engine: Arc<JoinQueryEngine>,
}

impl JoinTool {
    #[must_use]
    pub fn new(engine: Arc<JoinQueryEngine>) -> Self {
        Self { engine }
    }
}

impl Tool for JoinTool {
    const NAME: &'static str = "ygo_jqe";

    type Error = ToolError;
    type Args = QuestionArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: JQE_DESCRIPTION.to_string(),
            parameters: question_parameters(),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        self.engine
            .query(&args.input)
            .await
            .map_err(|err| ToolError(err.to_string()))
    }
}
