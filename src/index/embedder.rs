//! Deterministic embedder used by tests and offline runs.

use super::types::EmbeddingModel;
use super::IndexError;

/// Produces stable hash-derived vectors without a model call. The same text
/// always embeds to the same vector, so similarity assertions are repeatable.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self { dimension: 384 }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        Ok(deterministic_vector(text, self.dimension))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Hash each byte into a bucket, then L2-normalize so cosine scores stay in
/// a sane range.
pub fn deterministic_vector(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];

    for (i, byte) in text.bytes().enumerate() {
        let bucket = (byte as usize).wrapping_mul(31).wrapping_add(i.wrapping_mul(7)) % dimension;
        vector[bucket] += 1.0;
    }

    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }

    vector
}
