//! Retrieval-then-synthesis over the rulebook index.

use std::sync::Arc;

use rulesmith::RuleIndex;

use crate::errors::AppError;
use crate::llm::Llm;

const NO_MATCH_ANSWER: &str =
    "The rulebook index has no passage matching that question.";

pub struct RulebookQueryEngine {
    index: Arc<RuleIndex>,
    llm: Arc<dyn Llm>,
    top_k: usize,
}

impl RulebookQueryEngine {
    #[must_use]
    pub fn new(index: Arc<RuleIndex>, llm: Arc<dyn Llm>, top_k: usize) -> Self {
        Self { index, llm, top_k }
    }

    /// Answers strictly from the retrieved rulebook excerpts.
    pub async fn query(&self, question: &str) -> Result<String, AppError> {
        let hits = self.index.retrieve(question, self.top_k).await?;
        tracing::info!(hits = hits.len(), "rulebook retrieval");
        if hits.is_empty() {
            return Ok(NO_MATCH_ANSWER.to_string());
        }

        let context = hits
            .iter()
            .map(|hit| {
                format!(
                    "[{} #{}] {}",
                    hit.chunk.heading, hit.chunk.chunk_index, hit.chunk.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Answer the question using only the rulebook excerpts below. \
             If they do not cover it, say the rulebook does not cover it; \
             do not invent rules.\n\n\
             Excerpts:\n{context}\n\n\
             Question: {question}\nAnswer:"
        );
        self.llm.complete(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::testing::StubLlm;
    use rulesmith::{ChunkingConfig, MockEmbeddingProvider};
    use tempfile::tempdir;

    async fn build_index(dir: &std::path::Path) -> RuleIndex {
        let rulebook_dir = dir.join("rulebook");
        std::fs::create_dir_all(&rulebook_dir).unwrap();
        std::fs::write(
            rulebook_dir.join("battle.md"),
            "# Battle\n\nEach monster can attack once per Battle Phase. \
             A replay occurs when the attack target changes.",
        )
        .unwrap();
        let (index, _) = RuleIndex::open_or_build(
            dir.join("rules.sqlite"),
            &rulebook_dir,
            Arc::new(MockEmbeddingProvider::new()),
            ChunkingConfig::default(),
        )
        .await
        .unwrap();
        index
    }

    #[tokio::test]
    async fn answers_from_retrieved_excerpts() {
        let dir = tempdir().unwrap();
        let index = build_index(dir.path()).await;
        let llm = Arc::new(StubLlm::new(["Once per Battle Phase."]));
        let engine = RulebookQueryEngine::new(Arc::new(index), llm.clone(), 2);

        let answer = engine
            .query("How many attacks can a monster make?")
            .await
            .unwrap();
        assert_eq!(answer, "Once per Battle Phase.");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Battle"), "{}", prompts[0]);
        assert!(prompts[0].contains("How many attacks can a monster make?"));
    }
}
