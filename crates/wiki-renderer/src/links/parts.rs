//! Link target parsing.
//!
//! Splits a link or image target into its pieces:
//! `[wiki:]page[@revision][/attachment][#fragment]`, or an absolute URI.

use std::sync::LazyLock;

use regex::Regex;

/// Absolute URI with a scheme, or a `mailto:` address.
static URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.-]*://\S+|mailto:\S+)$").expect("invalid URI regex")
});

/// Leading `wiki:` prefix.
static WIKI_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9]*):(.+)$").expect("invalid wiki regex"));

/// Trailing `@revision` suffix.
static REVISION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)@(\d+)$").expect("invalid revision regex"));

/// Parsed pieces of a link or image target.
///
/// # Example
///
/// ```
/// use wiki_renderer::LinkParts;
///
/// let parts = LinkParts::parse("c2:WelcomeVisitors#intro", "Welcome");
/// assert_eq!(parts.wiki.as_deref(), Some("c2"));
/// assert_eq!(parts.page_name.as_deref(), Some("WelcomeVisitors"));
/// assert_eq!(parts.fragment.as_deref(), Some("intro"));
/// assert_eq!(parts.text, "Welcome");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkParts {
    /// Display text.
    pub text: String,
    /// Foreign wiki name.
    pub wiki: Option<String>,
    /// Target page path.
    pub page_name: Option<String>,
    /// Pinned revision.
    pub revision: Option<u64>,
    /// Attachment file name.
    pub attachment: Option<String>,
    /// Fragment after `#`.
    pub fragment: Option<String>,
    /// Absolute URI when the target is external.
    pub uri: Option<String>,
}

impl LinkParts {
    /// Parse a target string.
    ///
    /// Never fails; unusual targets are kept as page names and rejected later
    /// during resolution.
    #[must_use]
    pub fn parse(target: &str, text: &str) -> Self {
        let target = target.trim();
        let mut parts = Self {
            text: text.to_owned(),
            ..Self::default()
        };

        if URI_PATTERN.is_match(target) {
            parts.uri = Some(target.to_owned());
            return parts;
        }

        let (path, fragment) = match target.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (target, None),
        };
        parts.fragment = fragment.filter(|f| !f.is_empty()).map(str::to_owned);

        let path = match WIKI_PREFIX.captures(path) {
            Some(caps) => {
                parts.wiki = Some(caps[1].to_owned());
                caps.get(2).map_or("", |m| m.as_str())
            }
            None => path,
        };

        // Attachments are the last segment when it carries a file extension.
        let (page, attachment) = match path.rsplit_once('/') {
            Some((page, file)) if file.contains('.') => (page, Some(file)),
            _ => (path, None),
        };
        parts.attachment = attachment.map(str::to_owned);

        let page = match REVISION_SUFFIX.captures(page) {
            Some(caps) => {
                parts.revision = caps[2].parse().ok();
                caps.get(1).map_or("", |m| m.as_str())
            }
            None => page,
        };

        if !page.is_empty() {
            parts.page_name = Some(page.to_owned());
        }

        parts
    }

    /// Whether the target is an absolute URI.
    #[must_use]
    pub fn is_uri(&self) -> bool {
        self.uri.is_some()
    }

    /// Whether the target is a `mailto:` address.
    #[must_use]
    pub fn is_mailto(&self) -> bool {
        self.uri.as_deref().is_some_and(|u| u.starts_with("mailto:"))
    }
}
