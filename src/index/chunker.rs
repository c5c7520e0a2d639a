//! Paragraph-oriented chunking for indexed documents.

/// Splits document text on blank lines and packs paragraphs into chunks of
/// bounded size. Oversized paragraphs are re-split on word boundaries so no
/// chunk exceeds the limit by more than one word.
pub struct ParagraphChunker {
    max_chars: usize,
}

impl ParagraphChunker {
    pub fn new() -> Self {
        Self { max_chars: 1200 }
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in text.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            if paragraph.len() > self.max_chars {
                flush(&mut current, &mut chunks);
                self.split_long_paragraph(paragraph, &mut chunks);
                continue;
            }

            if !current.is_empty() && current.len() + paragraph.len() + 2 > self.max_chars {
                flush(&mut current, &mut chunks);
            }

            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        }

        flush(&mut current, &mut chunks);
        chunks
    }

    fn split_long_paragraph(&self, paragraph: &str, chunks: &mut Vec<String>) {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            if !current.is_empty() && current.len() + word.len() + 1 > self.max_chars {
                flush(&mut current, chunks);
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }

        flush(&mut current, chunks);
    }
}

impl Default for ParagraphChunker {
    fn default() -> Self {
        Self::new()
    }
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = ParagraphChunker::new();
        let chunks = chunker.chunk("The system shall log every dose event.");
        assert_eq!(chunks, vec!["The system shall log every dose event."]);
    }

    #[test]
    fn paragraphs_pack_until_the_limit() {
        let chunker = ParagraphChunker::with_max_chars(30);
        let chunks = chunker.chunk("first paragraph\n\nsecond one\n\nthird paragraph here");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "first paragraph\n\nsecond one");
        assert_eq!(chunks[1], "third paragraph here");
    }

    #[test]
    fn oversized_paragraph_splits_on_words() {
        let chunker = ParagraphChunker::with_max_chars(20);
        let chunks = chunker.chunk("alpha beta gamma delta epsilon zeta");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 20, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn blank_input_yields_no_chunks() {
        let chunker = ParagraphChunker::new();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("  \n\n   \n ").is_empty());
    }
}
