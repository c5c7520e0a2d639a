//! Text extraction from uploaded document files.

pub mod docx;
pub mod markup;
pub mod pdf;

pub use docx::*;
pub use markup::*;
pub use pdf::*;

use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Word document parsing failed: {0}")]
    DocxParsing(String),

    #[error("Text encoding error: {0}")]
    Encoding(String),
}

/// Extract plain text from uploaded file bytes, dispatching on the filename
/// extension. Unknown extensions are treated as plain text.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    let extension = Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => extract_pdf_text(bytes),
        "docx" => extract_docx_text(bytes),
        "xml" | "html" | "htm" => Ok(strip_markup(&decode_utf8(bytes)?)),
        _ => decode_utf8(bytes),
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, DocumentError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| DocumentError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let text = extract_text("notes.txt", b"The system shall alarm on occlusion.").unwrap();
        assert_eq!(text, "The system shall alarm on occlusion.");
    }

    #[test]
    fn markdown_is_treated_as_plain_text() {
        let text = extract_text("readme.md", b"# Heading\n\nBody line.").unwrap();
        assert_eq!(text, "# Heading\n\nBody line.");
    }

    #[test]
    fn unknown_extension_falls_back_to_plain_text() {
        let text = extract_text("notes.log", b"line one\nline two").unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        let text = extract_text("SPEC.TXT", b"uppercase extension").unwrap();
        assert_eq!(text, "uppercase extension");
    }

    #[test]
    fn html_is_stripped_to_text() {
        let html = b"<html><body><h1>Title</h1><p>First rule.</p></body></html>";
        let text = extract_text("page.html", html).unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("First rule."));
        assert!(!text.contains('<'));
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let result = extract_text("notes.txt", &[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(DocumentError::Encoding(_))));
    }
}
