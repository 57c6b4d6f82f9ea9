//! Shared utility functions for rendering.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters percent-encoded in page paths embedded in URLs.
const PAGE_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Escape HTML special characters.
///
/// # Examples
///
/// ```
/// use wiki_renderer::escape_html;
///
/// assert_eq!(escape_html("<a href='x'>&</a>"), "&lt;a href=&#x27;x&#x27;&gt;&amp;&lt;/a&gt;");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Percent-encode a page path for use in a URL, keeping `/` separators.
pub(crate) fn encode_page_path(path: &str) -> String {
    utf8_percent_encode(path, PAGE_PATH).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_plain() {
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_escape_html_specials() {
        assert_eq!(
            escape_html(r#"a < b && c > "d" 'e'"#),
            "a &lt; b &amp;&amp; c &gt; &quot;d&quot; &#x27;e&#x27;"
        );
    }

    #[test]
    fn test_encode_page_path() {
        assert_eq!(encode_page_path("FrontPage"), "FrontPage");
        assert_eq!(encode_page_path("Team Notes"), "Team%20Notes");
        assert_eq!(encode_page_path("Projects/Road map"), "Projects/Road%20map");
        assert_eq!(encode_page_path("Q&A"), "Q%26A");
    }
}
