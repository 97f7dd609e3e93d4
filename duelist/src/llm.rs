//! One-shot completion abstraction used by the query engines.
//!
//! The engines never talk to a provider directly; they go through [`Llm`] so
//! tests can hand them canned completions.

use async_trait::async_trait;
use rig::completion::Prompt;
use rig::prelude::*;
use rig::providers::ollama;

use crate::errors::AppError;

/// A single prompt-in, text-out completion.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

/// [`Llm`] backed by a tool-less rig agent.
pub struct RigCompleter {
    agent: rig::agent::Agent<ollama::CompletionModel>,
}

impl RigCompleter {
    #[must_use]
    pub fn new(client: &ollama::Client, model: &str, temperature: f64) -> Self {
        let agent = client.agent(model).temperature(temperature).build();
        Self { agent }
    }
}

#[async_trait]
impl Llm for RigCompleter {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        self.agent
            .prompt(prompt)
            .await
            .map_err(|err| AppError::Completion(err.to_string()))
    }
}
