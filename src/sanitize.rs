//! HTML sanitization for model-generated strings
//!
//! Strips or whitelists markup before generated text is stored or rendered,
//! mirroring the front-end sanitizer's allow-lists. Delegates to the
//! `ammonia` allow-list sanitizer.

use serde_json::Value;
use std::collections::{HashMap, HashSet};

const ALLOWED_TAGS: &[&str] = &[
    "b", "i", "strong", "em", "u", "br", "p", "ul", "ol", "li", "span", "a",
];

const ALLOWED_PROTOCOLS: &[&str] = &["http", "https", "mailto"];

/// Return a sanitized HTML fragment safe for storage and rendering.
///
/// Allows a minimal formatting subset (bold, lists, links, spans); strips
/// disallowed tags/attributes, scripts, and event handlers.
pub fn sanitize_html(text: &str) -> String {
    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    tag_attributes.insert("a", ["href", "title", "target", "rel"].into_iter().collect());
    tag_attributes.insert("span", ["style"].into_iter().collect());

    ammonia::Builder::new()
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .url_schemes(ALLOWED_PROTOCOLS.iter().copied().collect())
        // rel is caller-controlled here, so disable the automatic rewrite.
        .link_rel(None)
        .clean(text)
        .to_string()
}

/// Walk a JSON value and sanitize every string leaf.
pub fn cleanse_json(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_html(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(cleanse_json).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (key, cleanse_json(val)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_script_tags() {
        let cleaned = sanitize_html("<p>hello</p><script>alert('x')</script>");
        assert!(cleaned.contains("<p>hello</p>"));
        assert!(!cleaned.contains("script"));
        assert!(!cleaned.contains("alert"));
    }

    #[test]
    fn test_keeps_allowed_formatting() {
        let cleaned = sanitize_html("<strong>bold</strong> and <em>emphasis</em>");
        assert!(cleaned.contains("<strong>bold</strong>"));
        assert!(cleaned.contains("<em>emphasis</em>"));
    }

    #[test]
    fn test_strips_event_handlers() {
        let cleaned = sanitize_html(r#"<a href="https://example.com" onclick="steal()">link</a>"#);
        assert!(cleaned.contains("href"));
        assert!(!cleaned.contains("onclick"));
    }

    #[test]
    fn test_cleanse_json_recurses_into_leaves() {
        let dirty = json!({
            "summary": "<script>x</script>fine",
            "items": ["<b>ok</b>", {"nested": "<img src=x onerror=y>text"}],
            "count": 3,
        });

        let clean = cleanse_json(dirty);
        assert_eq!(clean["summary"], "fine");
        assert_eq!(clean["items"][0], "<b>ok</b>");
        assert_eq!(clean["items"][1]["nested"], "text");
        assert_eq!(clean["count"], 3);
    }
}
