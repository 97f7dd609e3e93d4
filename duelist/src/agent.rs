//! Assembly of the tool-routing agent and its streaming chat turn.

use futures_util::StreamExt;
use rig::agent::MultiTurnStreamItem;
use rig::message::{Message, Reasoning, Text};
use rig::prelude::*;
use rig::providers::ollama;
use rig::streaming::{StreamedAssistantContent, StreamingPrompt};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::tools::{CardDbTool, JoinTool, RulebookTool, SubQuestionTool};
use crate::transcript::{Transcript, Turn};

/// Expert context handed to the agent; tool routing beyond this is the
/// model's call.
const SYSTEM_CONTEXT: &str = "You are an expert on the YuGiOh card game. \
    You answer questions about cards used in the game from a technical perspective. \
    You must use tools when specific card names are mentioned. \
    Try searching for the card description first.";

/// The reasoning agent plus its per-turn iteration ceiling.
pub struct Assistant {
    agent: rig::agent::Agent<ollama::CompletionModel>,
    max_turns: usize,
}

impl Assistant {
    /// Builds the agent with all four query tools attached.
    #[must_use]
    pub fn new(
        client: &ollama::Client,
        config: &AppConfig,
        card_db: CardDbTool,
        rulebook: RulebookTool,
        subquestion: SubQuestionTool,
        join: JoinTool,
    ) -> Self {
        let agent = client
            .agent(&config.chat_model)
            .preamble(SYSTEM_CONTEXT)
            .temperature(config.temperature)
            .tool(card_db)
            .tool(rulebook)
            .tool(subquestion)
            .tool(join)
            .build();
        Self {
            agent,
            max_turns: config.max_turns,
        }
    }

    /// Runs one chat turn, streaming text tokens through `on_token` as they
    /// arrive, and returns the full response.
    pub async fn stream_turn(
        &self,
        prompt: &str,
        transcript: &Transcript,
        mut on_token: impl FnMut(&str),
    ) -> Result<String, AppError> {
        let history = to_history(transcript);
        let mut stream = self
            .agent
            .stream_prompt(prompt)
            .with_history(history)
            .multi_turn(self.max_turns)
            .await;

        let mut accumulated = String::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(MultiTurnStreamItem::StreamAssistantItem(StreamedAssistantContent::Text(Text {
                    text,
                }))) => {
                    on_token(&text);
                    accumulated.push_str(&text);
                }
                Ok(MultiTurnStreamItem::StreamAssistantItem(StreamedAssistantContent::Reasoning(
                    Reasoning { reasoning, .. },
                ))) => {
                    tracing::debug!(chars = reasoning.join("").len(), "reasoning segment");
                }
                Ok(MultiTurnStreamItem::FinalResponse(response)) => {
                    // Some providers only deliver text here.
                    if accumulated.is_empty() {
                        on_token(response.response());
                        accumulated.push_str(response.response());
                    }
                }
                Ok(_) => {}
                Err(err) => return Err(AppError::Completion(err.to_string())),
            }
        }

        if accumulated.is_empty() {
            accumulated.push_str("No response produced.");
        }
        Ok(accumulated)
    }
}

/// Converts the explicit transcript into rig chat history.
fn to_history(transcript: &Transcript) -> Vec<Message> {
    transcript
        .turns()
        .iter()
        .map(|turn| {
            if turn.has_role(Turn::USER) {
                Message::user(&turn.content)
            } else {
                Message::assistant(&turn.content)
            }
        })
        .collect()
}
