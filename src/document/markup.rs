//! Tag stripping for HTML and XML documents.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").unwrap());
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Reduce markup to readable text: drop script/style bodies, replace tags
/// with spaces, decode the common entities, and normalize whitespace per
/// line.
pub fn strip_markup(input: &str) -> String {
    let without_blocks = SCRIPT_STYLE.replace_all(input, " ");
    let without_tags = TAGS.replace_all(&without_blocks, " ");
    let decoded = decode_entities(&without_tags);

    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_replaced_with_text() {
        let html = "<div><p>The pump <b>shall</b> alarm.</p></div>";
        assert_eq!(strip_markup(html), "The pump shall alarm.");
    }

    #[test]
    fn script_and_style_bodies_are_dropped() {
        let html = "<style>p { color: red; }</style><p>Visible</p><script>var x = 1;</script>";
        assert_eq!(strip_markup(html), "Visible");
    }

    #[test]
    fn entities_are_decoded() {
        let html = "<p>Rate &lt; 5 mL/h &amp; &quot;stable&quot;</p>";
        assert_eq!(strip_markup(html), "Rate < 5 mL/h & \"stable\"");
    }

    #[test]
    fn xml_elements_reduce_to_their_text() {
        let xml = "<requirements><req id=\"1\">Log every dose</req><req id=\"2\">Encrypt data</req></requirements>";
        let text = strip_markup(xml);
        assert!(text.contains("Log every dose"));
        assert!(text.contains("Encrypt data"));
        assert!(!text.contains("id="));
    }

    #[test]
    fn blank_lines_are_collapsed() {
        let html = "<p>one</p>\n\n\n<p>two</p>";
        assert_eq!(strip_markup(html), "one\ntwo");
    }
}
