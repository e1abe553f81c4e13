//! HTML text escaping for values interpolated into server-rendered markup.

use std::borrow::Cow;

/// Escape `&`, `<`, `>`, `"` and `'` so the value is safe inside element
/// content and double- or single-quoted attribute values.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    let Some(first) = input.find(['&', '<', '>', '"', '\'']) else {
        return Cow::Borrowed(input);
    };

    let mut escaped = String::with_capacity(input.len() + 16);
    escaped.push_str(&input[..first]);
    for ch in input[first..].chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_plain_text_is_borrowed() {
        let out = escape_html("홍길동 후보");
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, "홍길동 후보");
    }

    #[test]
    fn test_escape_html_all_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_html_does_not_double_decode_entities() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }
}
