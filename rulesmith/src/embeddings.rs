//! Embedding providers and the adapter into rig's model trait.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use rig::embeddings::embedding::{Embedding, EmbeddingError, EmbeddingModel};
use serde::Deserialize;

use crate::types::RuleError;

/// Batch text-to-vector interface shared by the chunker, the index, and the
/// store adapter.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for telemetry.
    fn id(&self) -> &str;

    /// Output vector dimensionality.
    fn dimensions(&self) -> usize;

    /// Embeds each input text, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RuleError>;
}

// ============================================================================
// Ollama provider
// ============================================================================

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embeddings served by a local Ollama instance (`/api/embed`).
#[derive(Clone, Debug)]
pub struct OllamaEmbeddingProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Creates a provider against `base_url` (e.g. `http://localhost:11434`).
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, RuleError> {
        let client = Client::builder().use_rustls_tls().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn id(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RuleError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&serde_json::json!({ "model": self.model, "input": texts }))
            .send()
            .await?
            .error_for_status()?;
        let payload: EmbedResponse = response.json().await?;
        if payload.embeddings.len() != texts.len() {
            return Err(RuleError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                payload.embeddings.len()
            )));
        }
        Ok(payload.embeddings)
    }
}

// ============================================================================
// Deterministic mock provider
// ============================================================================

/// Hash-derived vectors for tests and offline runs: equal text, equal vector.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: 8 }
    }
}

impl MockEmbeddingProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RuleError> {
        Ok(texts
            .iter()
            .map(|text| hash_to_vec(text, self.dimensions))
            .collect())
    }
}

fn hash_to_vec(text: &str, dimensions: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..dimensions)
        .map(|i| {
            let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
            (bits as f32) / u32::MAX as f32
        })
        .collect()
}

// ============================================================================
// rig adapter
// ============================================================================

/// Wraps an [`EmbeddingProvider`] as a rig [`EmbeddingModel`] so the vector
/// store and the rest of the pipeline share one implementation.
#[derive(Clone)]
pub struct ProviderModel {
    provider: Arc<dyn EmbeddingProvider>,
}

impl ProviderModel {
    #[must_use]
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }
}

impl EmbeddingModel for ProviderModel {
    const MAX_DOCUMENTS: usize = 64;

    type Client = Arc<dyn EmbeddingProvider>;

    fn make(client: &Self::Client, _model: impl Into<String>, _dims: Option<usize>) -> Self {
        Self::new(client.clone())
    }

    fn ndims(&self) -> usize {
        self.provider.dimensions()
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send {
        let provider = self.provider.clone();
        let docs: Vec<String> = texts.into_iter().collect();
        async move {
            let vectors = provider
                .embed_batch(&docs)
                .await
                .map_err(|err| EmbeddingError::ProviderError(err.to_string()))?;
            Ok(docs
                .into_iter()
                .zip(vectors)
                .map(|(document, vec)| Embedding {
                    vec: vec.into_iter().map(f64::from).collect(),
                    document,
                })
                .collect())
        }
    }
}
