//! Semantic chunking: split a document where adjacent sentence windows stop
//! resembling each other.

use std::sync::Arc;

use crate::embeddings::EmbeddingProvider;
use crate::segmenter::{approx_tokens, segment};
use crate::types::{ChunkingStats, RuleChunk, RuleDocument, RuleError};

/// Knobs for breakpoint detection and chunk assembly.
#[derive(Clone, Debug)]
pub struct ChunkingConfig {
    /// Sentences on each side included in a sentence's embedding window.
    pub buffer_size: usize,
    /// Percentile (0–100) of adjacent-window distances above which a
    /// boundary is inserted.
    pub breakpoint_percentile: f32,
    /// Chunks shorter than this merge into their predecessor.
    pub min_chunk_chars: usize,
    /// Hard cap on chunk length; oversized runs split at sentence boundaries.
    pub max_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1,
            breakpoint_percentile: 95.0,
            min_chunk_chars: 16,
            max_chunk_chars: 2000,
        }
    }
}

/// Splits documents into embedded [`RuleChunk`]s.
pub struct SemanticChunker {
    provider: Arc<dyn EmbeddingProvider>,
    config: ChunkingConfig,
}

impl SemanticChunker {
    #[must_use]
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: ChunkingConfig) -> Self {
        Self { provider, config }
    }

    /// Chunks one document and embeds each chunk's content.
    pub async fn chunk(
        &self,
        doc: &RuleDocument,
    ) -> Result<(Vec<RuleChunk>, ChunkingStats), RuleError> {
        let sentences = segment(&doc.text);
        if sentences.is_empty() {
            return Ok((Vec::new(), ChunkingStats::default()));
        }

        let groups = if sentences.len() < 2 {
            vec![sentences.clone()]
        } else {
            let windows = self.windows(&sentences);
            let embeddings = self.provider.embed_batch(&windows).await?;
            let distances: Vec<f32> = embeddings
                .windows(2)
                .map(|pair| cosine_distance(&pair[0], &pair[1]))
                .collect();
            let threshold = percentile(&distances, self.config.breakpoint_percentile);
            split_at_breakpoints(&sentences, &distances, threshold)
        };

        let contents = assemble(groups, &self.config);
        let embeddings = self.provider.embed_batch(&contents).await?;

        let chunks: Vec<RuleChunk> = contents
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(idx, (content, embedding))| {
                RuleChunk::new(&doc.source, &doc.title, idx, content).with_embedding(embedding)
            })
            .collect();

        let stats = ChunkingStats {
            total_segments: sentences.len(),
            total_chunks: chunks.len(),
            average_tokens: if chunks.is_empty() {
                0.0
            } else {
                chunks
                    .iter()
                    .map(|chunk| approx_tokens(&chunk.content) as f32)
                    .sum::<f32>()
                    / chunks.len() as f32
            },
        };

        tracing::debug!(
            source = %doc.source,
            segments = stats.total_segments,
            chunks = stats.total_chunks,
            "document chunked"
        );
        Ok((chunks, stats))
    }

    fn windows(&self, sentences: &[String]) -> Vec<String> {
        (0..sentences.len())
            .map(|i| {
                let lo = i.saturating_sub(self.config.buffer_size);
                let hi = (i + self.config.buffer_size).min(sentences.len() - 1);
                sentences[lo..=hi].join(" ")
            })
            .collect()
    }
}

fn split_at_breakpoints(
    sentences: &[String],
    distances: &[f32],
    threshold: f32,
) -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    for (idx, sentence) in sentences.iter().enumerate() {
        current.push(sentence.clone());
        if idx < distances.len() && distances[idx] > threshold {
            groups.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Joins sentence groups into chunk contents, enforcing the size bounds:
/// oversized groups split at sentence boundaries, undersized chunks merge
/// into their predecessor.
fn assemble(groups: Vec<Vec<String>>, config: &ChunkingConfig) -> Vec<String> {
    let mut contents: Vec<String> = Vec::new();
    for group in groups {
        let mut current = String::new();
        for sentence in group {
            if !current.is_empty() && current.len() + sentence.len() + 1 > config.max_chunk_chars {
                contents.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&sentence);
        }
        if !current.is_empty() {
            contents.push(current);
        }
    }

    let mut merged: Vec<String> = Vec::new();
    for content in contents {
        if content.len() < config.min_chunk_chars {
            if let Some(previous) = merged.last_mut() {
                previous.push(' ');
                previous.push_str(&content);
                continue;
            }
        }
        merged.push(content);
    }
    merged
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Linear-interpolated percentile over unsorted distances.
fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return f32::MAX;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f32) * (sorted[hi] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Maps "alpha"/"beta" word counts onto a two-dimensional vector so
    /// breakpoints land exactly where topics change.
    struct TopicProvider;

    #[async_trait]
    impl EmbeddingProvider for TopicProvider {
        fn id(&self) -> &str {
            "topic"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RuleError> {
            Ok(texts
                .iter()
                .map(|text| {
                    let lowered = text.to_lowercase();
                    vec![
                        lowered.matches("alpha").count() as f32,
                        lowered.matches("beta").count() as f32,
                    ]
                })
                .collect())
        }
    }

    fn doc(text: &str) -> RuleDocument {
        RuleDocument {
            source: "rulebook.md".into(),
            title: "Rulebook".into(),
            text: text.into(),
        }
    }

    fn chunker(config: ChunkingConfig) -> SemanticChunker {
        SemanticChunker::new(Arc::new(TopicProvider), config)
    }

    const TWO_TOPICS: &str = "The alpha rule covers summoning. Every alpha summon needs tribute. \
        An alpha tribute uses your monsters. The beta phase handles battle. \
        Each beta attack targets one monster. A beta replay happens on target loss.";

    #[tokio::test]
    async fn splits_at_the_topic_boundary() {
        let chunker = chunker(ChunkingConfig::default());
        let (chunks, stats) = chunker.chunk(&doc(TWO_TOPICS)).await.unwrap();

        assert_eq!(stats.total_segments, 6);
        assert_eq!(chunks.len(), 2, "{chunks:#?}");
        assert!(chunks[0].content.contains("alpha rule"));
        assert!(!chunks[0].content.contains("beta"));
        assert!(chunks[1].content.contains("beta phase"));
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[1].chunk_index, 1);
        for chunk in &chunks {
            assert!(chunk.embedding.is_some());
            assert_eq!(chunk.heading, "Rulebook");
        }
    }

    #[tokio::test]
    async fn percentile_100_keeps_one_chunk() {
        let chunker = chunker(ChunkingConfig {
            breakpoint_percentile: 100.0,
            ..ChunkingConfig::default()
        });
        let (chunks, _) = chunker.chunk(&doc(TWO_TOPICS)).await.unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn single_sentence_is_one_chunk() {
        let chunker = chunker(ChunkingConfig::default());
        let (chunks, stats) = chunker
            .chunk(&doc("Only one alpha sentence here."))
            .await
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(stats.total_segments, 1);
        assert!(stats.average_tokens > 0.0);
    }

    #[tokio::test]
    async fn empty_document_yields_nothing() {
        let chunker = chunker(ChunkingConfig::default());
        let (chunks, stats) = chunker.chunk(&doc("   ")).await.unwrap();
        assert!(chunks.is_empty());
        assert_eq!(stats, ChunkingStats::default());
    }

    #[tokio::test]
    async fn oversized_runs_split_at_sentence_boundaries() {
        let chunker = chunker(ChunkingConfig {
            breakpoint_percentile: 100.0,
            max_chunk_chars: 80,
            min_chunk_chars: 0,
            ..ChunkingConfig::default()
        });
        let (chunks, _) = chunker.chunk(&doc(TWO_TOPICS)).await.unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.len() <= 80, "{}", chunk.content);
        }
    }

    #[tokio::test]
    async fn tiny_chunks_merge_into_their_predecessor() {
        let chunker = chunker(ChunkingConfig {
            // Percentile zero turns every boundary into a breakpoint...
            breakpoint_percentile: 0.0,
            // ...and a huge minimum folds them all back together.
            min_chunk_chars: 10_000,
            ..ChunkingConfig::default()
        });
        let (chunks, _) = chunker.chunk(&doc(TWO_TOPICS)).await.unwrap();
        assert_eq!(chunks.len(), 1, "{chunks:#?}");
    }
}
