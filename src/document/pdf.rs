//! PDF text extraction from the embedded text layer.

use super::DocumentError;

/// Extract the text layer of a digital PDF. Scanned pages without a text
/// layer yield empty text rather than an error.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| DocumentError::PdfParsing(e.to_string()))?;

    Ok(text
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a minimal one-page PDF carrying `text` in its content stream.
    fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn digital_pdf_text_is_recovered() {
        let bytes = make_test_pdf("The device shall log every infusion event");
        let text = extract_pdf_text(&bytes).unwrap();
        assert!(
            text.contains("infusion") || text.contains("device"),
            "unexpected extraction output: {text:?}"
        );
    }

    #[test]
    fn invalid_pdf_is_a_parsing_error() {
        let result = extract_pdf_text(b"not a pdf at all");
        assert!(matches!(result, Err(DocumentError::PdfParsing(_))));
    }
}
