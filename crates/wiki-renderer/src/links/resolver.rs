//! URL construction for link targets.

use std::collections::BTreeMap;
use std::sync::Arc;

use wiki_config::{INTERWIKI_PLACEHOLDER, LinksConfig};
use wiki_storage::{PageReference, PageStore};

use super::{LinkError, LinkParts};
use crate::util::encode_page_path;

/// Characters that cannot appear in a page name.
const FORBIDDEN_PAGE_CHARS: &[char] = &['<', '>', '"', '\'', '[', ']', '{', '}', '|', '\\'];

/// What a resolved target points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedKind {
    /// Absolute URI taken verbatim.
    External,
    /// Page of the local wiki.
    LocalPage(PageReference),
    /// Attachment of a local page.
    Attachment,
    /// Page of a foreign wiki.
    InterWiki,
    /// Fragment of the current page.
    Fragment,
}

/// A resolved target, before URL output filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub url: String,
    pub kind: ResolvedKind,
}

/// Everything needed to turn link parts into URLs.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use wiki_renderer::{LinkParts, LinkResolutionContext};
/// use wiki_storage::{MockPageStore, PageReference};
///
/// let context = LinkResolutionContext::new(Arc::new(MockPageStore::new()))
///     .with_interwiki("wikipedia", "https://en.wikipedia.org/wiki/%s");
///
/// let parts = LinkParts::parse("wikipedia:Creole", "Creole");
/// let resolved = context.resolve(&PageReference::local("Here"), &parts).unwrap();
/// assert_eq!(resolved.url, "https://en.wikipedia.org/wiki/Creole");
/// ```
pub struct LinkResolutionContext {
    store: Arc<dyn PageStore>,
    base_url: String,
    local_wiki: Option<String>,
    interwiki: BTreeMap<String, String>,
}

impl LinkResolutionContext {
    /// Create a context with the default base URL `/pages` and no foreign wikis.
    #[must_use]
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self {
            store,
            base_url: "/pages".to_owned(),
            local_wiki: None,
            interwiki: BTreeMap::new(),
        }
    }

    /// Create a context from the `[links]` configuration section.
    #[must_use]
    pub fn from_config(config: &LinksConfig, store: Arc<dyn PageStore>) -> Self {
        Self {
            store,
            base_url: config.base_url.clone(),
            local_wiki: config.local_wiki.clone(),
            interwiki: config.interwiki.clone(),
        }
    }

    /// Set the URL prefix for local pages.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the name of the local wiki.
    #[must_use]
    pub fn with_local_wiki(mut self, name: impl Into<String>) -> Self {
        self.local_wiki = Some(name.into());
        self
    }

    /// Register a foreign wiki URL template containing `%s`.
    #[must_use]
    pub fn with_interwiki(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.interwiki.insert(name.into(), template.into());
        self
    }

    /// The page store links are checked against.
    pub fn store(&self) -> &dyn PageStore {
        self.store.as_ref()
    }

    /// Whether a local page exists. Lookup failures count as "doesn't exist".
    pub fn exists(&self, page: &PageReference) -> bool {
        self.store.exists(page).unwrap_or_else(|e| {
            tracing::debug!(page = %page, error = %e, "Page existence check failed");
            false
        })
    }

    fn is_local_wiki(&self, wiki: Option<&str>) -> bool {
        match wiki {
            None => true,
            Some(name) => self.local_wiki.as_deref() == Some(name),
        }
    }

    /// Resolve link parts appearing on `page` to an unfiltered URL.
    ///
    /// # Errors
    ///
    /// Returns `LinkError::UnknownWiki` for wiki names without a template and
    /// `LinkError::MalformedTarget` for targets that name nothing or contain
    /// characters not allowed in page names.
    pub fn resolve(&self, page: &PageReference, parts: &LinkParts) -> Result<Resolved, LinkError> {
        if let Some(uri) = &parts.uri {
            return Ok(Resolved {
                url: uri.clone(),
                kind: ResolvedKind::External,
            });
        }

        let fragment = parts
            .fragment
            .as_ref()
            .map(|f| format!("#{f}"))
            .unwrap_or_default();

        if parts.page_name.is_none() && parts.attachment.is_none() {
            if fragment.is_empty() || parts.wiki.is_some() {
                return Err(LinkError::MalformedTarget(parts.text.clone()));
            }
            return Ok(Resolved {
                url: fragment,
                kind: ResolvedKind::Fragment,
            });
        }

        if let Some(name) = &parts.page_name {
            validate_page_name(name)?;
        }

        if !self.is_local_wiki(parts.wiki.as_deref()) {
            return self.resolve_interwiki(parts, &fragment);
        }

        let page_path = parts.page_name.as_deref().unwrap_or(&page.path);
        let mut url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            encode_page_path(page_path)
        );

        let kind = if let Some(attachment) = &parts.attachment {
            url.push_str("/attachments/");
            url.push_str(&encode_page_path(attachment));
            ResolvedKind::Attachment
        } else {
            ResolvedKind::LocalPage(PageReference::local(page_path))
        };

        if let Some(revision) = parts.revision {
            url.push_str(&format!("?revision={revision}"));
        }
        url.push_str(&fragment);

        Ok(Resolved { url, kind })
    }

    fn resolve_interwiki(&self, parts: &LinkParts, fragment: &str) -> Result<Resolved, LinkError> {
        let wiki = parts.wiki.as_deref().unwrap_or_default();
        let template = self
            .interwiki
            .get(wiki)
            .ok_or_else(|| LinkError::UnknownWiki(wiki.to_owned()))?;

        let mut path = parts.page_name.clone().unwrap_or_default();
        if let Some(attachment) = &parts.attachment {
            path.push('/');
            path.push_str(attachment);
        }

        let url = template.replace(INTERWIKI_PLACEHOLDER, &encode_page_path(&path));
        Ok(Resolved {
            url: format!("{url}{fragment}"),
            kind: ResolvedKind::InterWiki,
        })
    }
}

fn validate_page_name(name: &str) -> Result<(), LinkError> {
    if name.trim().is_empty() || name.contains(FORBIDDEN_PAGE_CHARS) {
        return Err(LinkError::MalformedTarget(name.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wiki_storage::MockPageStore;

    use super::*;

    fn context() -> LinkResolutionContext {
        LinkResolutionContext::new(Arc::new(MockPageStore::new().with_page("FrontPage", "hi")))
            .with_base_url("/wiki/pages/")
            .with_local_wiki("main")
            .with_interwiki("c2", "https://c2.com/cgi/wiki?%s")
    }

    fn resolve(target: &str) -> Result<Resolved, LinkError> {
        context().resolve(
            &PageReference::local("Current"),
            &LinkParts::parse(target, target),
        )
    }

    #[test]
    fn test_local_page() {
        let resolved = resolve("FrontPage").unwrap();
        assert_eq!(resolved.url, "/wiki/pages/FrontPage");
        assert_eq!(
            resolved.kind,
            ResolvedKind::LocalPage(PageReference::local("FrontPage"))
        );
    }

    #[test]
    fn test_explicit_local_wiki() {
        assert_eq!(resolve("main:FrontPage").unwrap().url, "/wiki/pages/FrontPage");
    }

    #[test]
    fn test_encoded_page_with_revision_and_fragment() {
        let resolved = resolve("Team Notes@4#todo").unwrap();
        assert_eq!(resolved.url, "/wiki/pages/Team%20Notes?revision=4#todo");
    }

    #[test]
    fn test_attachment() {
        let resolved = resolve("FrontPage/logo.png").unwrap();
        assert_eq!(resolved.url, "/wiki/pages/FrontPage/attachments/logo.png");
        assert_eq!(resolved.kind, ResolvedKind::Attachment);
    }

    #[test]
    fn test_interwiki() {
        let resolved = resolve("c2:WelcomeVisitors").unwrap();
        assert_eq!(resolved.url, "https://c2.com/cgi/wiki?WelcomeVisitors");
        assert_eq!(resolved.kind, ResolvedKind::InterWiki);
    }

    #[test]
    fn test_unknown_wiki() {
        let err = resolve("meatball:FrontPage").unwrap_err();
        assert!(matches!(err, LinkError::UnknownWiki(ref w) if w == "meatball"));
    }

    #[test]
    fn test_fragment_only() {
        let resolved = resolve("#top").unwrap();
        assert_eq!(resolved.url, "#top");
        assert_eq!(resolved.kind, ResolvedKind::Fragment);
    }

    #[test]
    fn test_malformed_page_name() {
        let err = resolve("Bad<Name").unwrap_err();
        assert!(matches!(err, LinkError::MalformedTarget(_)));
    }

    #[test]
    fn test_external_uri_untouched() {
        let resolved = resolve("https://example.com/a?b=c").unwrap();
        assert_eq!(resolved.url, "https://example.com/a?b=c");
        assert_eq!(resolved.kind, ResolvedKind::External);
    }

    #[test]
    fn test_exists() {
        let ctx = context();
        assert!(ctx.exists(&PageReference::local("FrontPage")));
        assert!(!ctx.exists(&PageReference::local("Missing")));
    }
}
