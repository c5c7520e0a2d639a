use serde::{Deserialize, Serialize};

use super::IndexError;

/// Converts text into fixed-size vectors for similarity search.
pub trait EmbeddingModel: Send + Sync {
    /// Embed a single piece of text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError>;

    /// Embed a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError>;

    /// Vector dimension produced by this model.
    fn dimension(&self) -> usize;
}

impl EmbeddingModel for Box<dyn EmbeddingModel> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Provenance attached to every indexed chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMetadata {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub filenames: String,
}

impl DocMetadata {
    pub fn requirement(filenames: impl Into<String>) -> Self {
        Self {
            doc_type: "requirement".to_string(),
            filenames: filenames.into(),
        }
    }
}

/// A chunk held in the index together with its embedding.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: DocMetadata,
}

/// One search result, best matches first.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub content: String,
    pub score: f32,
    pub metadata: DocMetadata,
}
