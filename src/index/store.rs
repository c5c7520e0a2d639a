//! In-memory vector store behind the semantic search operations.

use std::sync::Mutex;

use super::chunker::ParagraphChunker;
use super::types::{DocMetadata, EmbeddingModel, SearchHit, StoredChunk};
use super::IndexError;

/// Chunked document index with embedding-based retrieval. Safe to share
/// behind an `Arc`; all interior state sits under one mutex.
pub struct SemanticIndex {
    embedder: Box<dyn EmbeddingModel>,
    chunker: ParagraphChunker,
    entries: Mutex<Vec<StoredChunk>>,
}

impl SemanticIndex {
    pub fn new(embedder: Box<dyn EmbeddingModel>) -> Self {
        Self::with_chunker(embedder, ParagraphChunker::new())
    }

    pub fn with_chunker(embedder: Box<dyn EmbeddingModel>, chunker: ParagraphChunker) -> Self {
        Self {
            embedder,
            chunker,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Chunk, embed, and store one document. Returns the number of chunks
    /// added; blank content stores nothing.
    pub fn store_document(
        &self,
        content: &str,
        metadata: DocMetadata,
    ) -> Result<usize, IndexError> {
        let chunks = self.chunker.chunk(content);
        if chunks.is_empty() {
            return Ok(0);
        }

        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&refs)?;

        let mut entries = self.entries.lock().map_err(|_| IndexError::LockPoisoned)?;
        let added = chunks.len();
        for (content, embedding) in chunks.into_iter().zip(embeddings) {
            entries.push(StoredChunk {
                content,
                embedding,
                metadata: metadata.clone(),
            });
        }

        Ok(added)
    }

    /// Return the `top_k` chunks most similar to the query, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, IndexError> {
        let query_embedding = self.embedder.embed(query)?;

        let entries = self.entries.lock().map_err(|_| IndexError::LockPoisoned)?;
        let mut scored: Vec<(f32, &StoredChunk)> = entries
            .iter()
            .map(|chunk| (cosine_similarity(&query_embedding, &chunk.embedding), chunk))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, chunk)| SearchHit {
                content: chunk.content.clone(),
                score,
                metadata: chunk.metadata.clone(),
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::super::embedder::MockEmbedder;
    use super::*;

    struct FailingEmbedder;

    impl EmbeddingModel for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, IndexError> {
            Err(IndexError::Embedding("model offline".to_string()))
        }

        fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError> {
            Err(IndexError::Embedding("model offline".to_string()))
        }

        fn dimension(&self) -> usize {
            0
        }
    }

    fn index() -> SemanticIndex {
        SemanticIndex::new(Box::new(MockEmbedder::new()))
    }

    #[test]
    fn exact_text_ranks_first() {
        let index = index();
        index
            .store_document(
                "The pump shall stop infusion when occlusion is detected.",
                DocMetadata::requirement("srs.pdf"),
            )
            .unwrap();
        index
            .store_document(
                "All user actions are written to the audit log.",
                DocMetadata::requirement("annex.docx"),
            )
            .unwrap();

        let hits = index
            .search("The pump shall stop infusion when occlusion is detected.", 2)
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits[0].content.contains("occlusion"));
        assert!(hits[0].score > hits[1].score);
        assert!((hits[0].score - 1.0).abs() < 1e-4);
        assert_eq!(hits[0].metadata.doc_type, "requirement");
        assert_eq!(hits[0].metadata.filenames, "srs.pdf");
    }

    #[test]
    fn search_respects_top_k() {
        let index = index();
        for i in 0..5 {
            index
                .store_document(
                    &format!("requirement number {i} about dosing"),
                    DocMetadata::requirement("srs.pdf"),
                )
                .unwrap();
        }

        let hits = index.search("dosing", 3).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn empty_index_returns_no_hits() {
        let index = index();
        assert!(index.is_empty());
        assert!(index.search("anything", 5).unwrap().is_empty());
    }

    #[test]
    fn blank_content_stores_nothing() {
        let index = index();
        let added = index
            .store_document("   \n\n  ", DocMetadata::requirement("srs.pdf"))
            .unwrap();
        assert_eq!(added, 0);
        assert!(index.is_empty());
    }

    #[test]
    fn long_documents_store_multiple_chunks() {
        let index = SemanticIndex::with_chunker(
            Box::new(MockEmbedder::new()),
            ParagraphChunker::with_max_chars(40),
        );

        let content = "dose limit check ".repeat(20);
        let added = index
            .store_document(&content, DocMetadata::requirement("srs.pdf"))
            .unwrap();

        assert!(added > 1);
        assert_eq!(index.len(), added);
    }

    #[test]
    fn embedder_failure_surfaces_as_error() {
        let index = SemanticIndex::new(Box::new(FailingEmbedder));

        let stored = index.store_document("some text", DocMetadata::requirement("srs.pdf"));
        assert!(matches!(stored, Err(IndexError::Embedding(_))));

        let searched = index.search("some text", 3);
        assert!(matches!(searched, Err(IndexError::Embedding(_))));
    }

    #[test]
    fn cosine_similarity_guards_degenerate_input() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
