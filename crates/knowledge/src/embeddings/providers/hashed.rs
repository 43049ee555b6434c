//! Deterministic feature-hashing embeddings.
//!
//! Words and their character trigrams are hashed into a fixed number of
//! buckets. Texts sharing vocabulary land close together, which is enough
//! for offline use and for tests that need stable retrieval without a model.

use crate::embeddings::provider::EmbeddingProvider;
use kbhub_core::AppResult;
use std::collections::HashMap;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "who", "when", "how", "did", "does",
];

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Seeds keep word and trigram features in separate hash spaces.
const WORD_SEED: u64 = 0x9e37_79b9;
const TRIGRAM_SEED: u64 = 0x85eb_ca6b;

/// Feature-hashing embedding provider.
#[derive(Debug, Clone)]
pub struct HashedProvider {
    model: String,
    dimensions: usize,
}

impl HashedProvider {
    /// Create a provider producing vectors of `dimensions` entries.
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model: model.into(),
            dimensions,
        }
    }

    /// Embed one text. Texts without any content words map to the zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let mut term_freq: HashMap<String, u32> = HashMap::new();
        for word in tokenize(text) {
            *term_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &term_freq {
            let weight = *freq as f32;
            self.accumulate(&mut embedding, word.as_bytes(), WORD_SEED, weight);

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                self.accumulate(&mut embedding, trigram.as_bytes(), TRIGRAM_SEED, weight.sqrt());
            }
        }

        normalize(&mut embedding);
        embedding
    }

    fn accumulate(&self, embedding: &mut [f32], feature: &[u8], seed: u64, weight: f32) {
        let hash = fnv1a(feature, seed);
        let bucket = (hash % self.dimensions as u64) as usize;
        // High bit picks the sign so collisions tend to cancel instead of pile up
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashedProvider {
    fn provider_name(&self) -> &str {
        "hashed"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}

fn fnv1a(bytes: &[u8], seed: u64) -> u64 {
    bytes.iter().fold(FNV_OFFSET ^ seed, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

fn normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}
