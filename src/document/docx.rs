//! DOCX text extraction. A .docx file is a ZIP container whose body text
//! lives in the `word/document.xml` entry.

use std::io::Read;

use flate2::read::DeflateDecoder;

use super::markup::strip_markup;
use super::DocumentError;

const LOCAL_HEADER_SIG: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
const DESCRIPTOR_SIG: [u8; 4] = [0x50, 0x4b, 0x07, 0x08];
const DOCUMENT_ENTRY: &str = "word/document.xml";

pub fn extract_docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let xml = read_zip_entry(bytes, DOCUMENT_ENTRY)?.ok_or_else(|| {
        DocumentError::DocxParsing(format!("{DOCUMENT_ENTRY} entry not found"))
    })?;

    // Keep paragraph boundaries as line breaks before tags are stripped.
    let with_breaks = xml.replace("</w:p>", "</w:p>\n");
    Ok(strip_markup(&with_breaks))
}

/// Walk the ZIP local file headers and return the named entry's contents.
/// Only stored and deflated entries occur in Office archives.
fn read_zip_entry(bytes: &[u8], wanted: &str) -> Result<Option<String>, DocumentError> {
    let mut pos = 0usize;

    while pos + 30 <= bytes.len() && bytes[pos..pos + 4] == LOCAL_HEADER_SIG {
        let flags = u16_at(bytes, pos + 6);
        let method = u16_at(bytes, pos + 8);
        let compressed_size = u32_at(bytes, pos + 18) as usize;
        let name_len = u16_at(bytes, pos + 26) as usize;
        let extra_len = u16_at(bytes, pos + 28) as usize;

        let name_start = pos + 30;
        let data_start = name_start + name_len + extra_len;
        if data_start > bytes.len() {
            return Err(DocumentError::DocxParsing("truncated archive".to_string()));
        }

        let entry_name =
            std::str::from_utf8(&bytes[name_start..name_start + name_len]).unwrap_or("");

        if entry_name == wanted {
            return read_entry_data(&bytes[data_start..], method, compressed_size).map(Some);
        }

        pos = match entry_advance(bytes, data_start, method, compressed_size, flags)? {
            Some(next) => next,
            None => return Ok(None),
        };
    }

    Ok(None)
}

fn read_entry_data(
    data: &[u8],
    method: u16,
    compressed_size: usize,
) -> Result<String, DocumentError> {
    match method {
        0 => {
            if compressed_size > data.len() {
                return Err(DocumentError::DocxParsing("truncated archive".to_string()));
            }
            String::from_utf8(data[..compressed_size].to_vec())
                .map_err(|e| DocumentError::DocxParsing(e.to_string()))
        }
        8 => {
            let mut decoder = DeflateDecoder::new(data);
            let mut xml = String::new();
            decoder
                .read_to_string(&mut xml)
                .map_err(|e| DocumentError::DocxParsing(e.to_string()))?;
            Ok(xml)
        }
        other => Err(DocumentError::DocxParsing(format!(
            "unsupported compression method {other}"
        ))),
    }
}

/// Position of the next local header after the entry at `data_start`. Entries
/// written with a trailing data descriptor (size fields zeroed) must be
/// inflated to find their end.
fn entry_advance(
    bytes: &[u8],
    data_start: usize,
    method: u16,
    compressed_size: usize,
    flags: u16,
) -> Result<Option<usize>, DocumentError> {
    if compressed_size > 0 || flags & 0x0008 == 0 {
        return Ok(Some(data_start + compressed_size));
    }

    if method != 8 {
        return Ok(None);
    }

    let mut decoder = DeflateDecoder::new(&bytes[data_start..]);
    let mut sink = Vec::new();
    decoder
        .read_to_end(&mut sink)
        .map_err(|e| DocumentError::DocxParsing(e.to_string()))?;

    let mut next = data_start + decoder.total_in() as usize;
    if next + 4 <= bytes.len() && bytes[next..next + 4] == DESCRIPTOR_SIG {
        next += 16;
    } else {
        next += 12;
    }
    Ok(Some(next))
}

fn u16_at(bytes: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([bytes[pos], bytes[pos + 1]])
}

fn u32_at(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

#[cfg(test)]
mod tests {
    use flate2::read::DeflateEncoder;
    use flate2::Compression;

    use super::*;

    fn zip_entry(name: &str, method: u16, data: &[u8], uncompressed_len: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&LOCAL_HEADER_SIG);
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&method.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&uncompressed_len.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);
        out
    }

    fn deflate(text: &str) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(text.as_bytes(), Compression::default());
        let mut out = Vec::new();
        encoder.read_to_end(&mut out).unwrap();
        out
    }

    const BODY_XML: &str = "<w:document><w:body>\
        <w:p><w:r><w:t>First paragraph of the plan.</w:t></w:r></w:p>\
        <w:p><w:r><w:t>Second paragraph with limits.</w:t></w:r></w:p>\
        </w:body></w:document>";

    #[test]
    fn stored_document_entry_is_extracted() {
        let mut archive = zip_entry("[Content_Types].xml", 0, b"<Types/>", 8);
        archive.extend(zip_entry(DOCUMENT_ENTRY, 0, BODY_XML.as_bytes(), BODY_XML.len() as u32));

        let text = extract_docx_text(&archive).unwrap();
        assert_eq!(
            text,
            "First paragraph of the plan.\nSecond paragraph with limits."
        );
    }

    #[test]
    fn deflated_document_entry_is_extracted() {
        let compressed = deflate(BODY_XML);
        let archive = zip_entry(DOCUMENT_ENTRY, 8, &compressed, BODY_XML.len() as u32);

        let text = extract_docx_text(&archive).unwrap();
        assert!(text.contains("First paragraph"));
        assert!(text.contains("Second paragraph"));
    }

    #[test]
    fn non_zip_bytes_report_a_missing_entry() {
        let result = extract_docx_text(b"plain text, not an archive");
        assert!(matches!(result, Err(DocumentError::DocxParsing(_))));
    }

    #[test]
    fn archive_without_document_entry_is_an_error() {
        let archive = zip_entry("word/styles.xml", 0, b"<w:styles/>", 11);
        let result = extract_docx_text(&archive);
        assert!(matches!(result, Err(DocumentError::DocxParsing(_))));
    }
}
