//! Page store trait and error types.
//!
//! Provides the [`PageStore`] trait through which the renderer fetches page
//! content, along with [`StorageError`] for unified error handling across
//! backends.
//!
//! # Page Names
//!
//! Pages are addressed by a [`PageReference`]: an optional wiki name plus a
//! page path. A reference without a wiki name addresses the local wiki:
//! - `FrontPage` - page of the local wiki
//! - `Projects/Roadmap` - nested page of the local wiki
//! - `c2:WelcomeVisitors` - page of the foreign wiki `c2`

use std::collections::BTreeMap;
use std::fmt;

/// Reference to a page, possibly on another wiki.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageReference {
    /// Wiki name (`None` for the local wiki).
    pub wiki: Option<String>,
    /// Page path within the wiki.
    pub path: String,
}

impl PageReference {
    /// Reference a page of the local wiki.
    #[must_use]
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            wiki: None,
            path: path.into(),
        }
    }

    /// Reference a page of a named wiki.
    #[must_use]
    pub fn on_wiki(wiki: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            wiki: Some(wiki.into()),
            path: path.into(),
        }
    }

    /// Page name: the last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for PageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.wiki {
            Some(wiki) => write!(f, "{wiki}:{}", self.path),
            None => f.write_str(&self.path),
        }
    }
}

/// Page content and metadata as supplied by a page store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// The page this content belongs to.
    pub reference: PageReference,
    /// Revision number (`None` for unsaved or unversioned content).
    pub revision: Option<u64>,
    /// Raw wiki markup.
    pub content: String,
    /// Free-form page attributes.
    pub attributes: BTreeMap<String, String>,
    /// Markup syntax identifier (e.g., "creole"), if recorded.
    pub syntax: Option<String>,
}

impl PageInfo {
    /// Create page info for unversioned content.
    #[must_use]
    pub fn new(reference: PageReference, content: impl Into<String>) -> Self {
        Self {
            reference,
            revision: None,
            content: content.into(),
            attributes: BTreeMap::new(),
            syntax: None,
        }
    }

    /// Set the revision number.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Add a page attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the syntax identifier.
    #[must_use]
    pub fn with_syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    /// Get an attribute value by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Page does not exist.
    NotFound,
    /// The wiki named in the reference is not known to the store.
    UnknownWiki,
    /// Invalid page name or revision.
    InvalidPath,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Page context (if applicable).
    pub page: Option<PageReference>,
    /// Backend identifier (e.g., "Memory").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            page: None,
            backend: None,
            source: None,
        }
    }

    /// Attach page context.
    #[must_use]
    pub fn with_page(mut self, page: PageReference) -> Self {
        self.page = Some(page);
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not found error for a page.
    #[must_use]
    pub fn not_found(page: PageReference) -> Self {
        Self::new(StorageErrorKind::NotFound).with_page(page)
    }

    /// Create an unknown wiki error for a page.
    #[must_use]
    pub fn unknown_wiki(page: PageReference) -> Self {
        Self::new(StorageErrorKind::UnknownWiki).with_page(page)
    }

    /// Whether this error means the page does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "[Backend] Kind: message (page: wiki:Name)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Page not found",
            StorageErrorKind::UnknownWiki => "Unknown wiki",
            StorageErrorKind::InvalidPath => "Invalid page name",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(page) = &self.page {
            write!(f, " (page: {page})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Page accessor consumed by the renderer.
///
/// Implementations own persistence and version history; the renderer only
/// reads through this interface.
pub trait PageStore: Send + Sync {
    /// Fetch page content, attributes and syntax metadata.
    ///
    /// # Arguments
    ///
    /// * `page` - Page to fetch
    /// * `revision` - Specific revision, or `None` for the latest
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] with kind `NotFound` if the page doesn't exist,
    /// or `UnknownWiki` if the reference names a wiki the store doesn't serve.
    fn get(&self, page: &PageReference, revision: Option<u64>) -> Result<PageInfo, StorageError>;

    /// Check whether a page exists.
    ///
    /// Default implementation fetches the latest revision and treats
    /// `NotFound` as "doesn't exist".
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] for failures other than a missing page.
    fn exists(&self, page: &PageReference) -> Result<bool, StorageError> {
        match self.get(page, None) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct SinglePageStore;

    impl PageStore for SinglePageStore {
        fn get(
            &self,
            page: &PageReference,
            _revision: Option<u64>,
        ) -> Result<PageInfo, StorageError> {
            if page.wiki.is_some() {
                return Err(StorageError::unknown_wiki(page.clone()));
            }
            if page.path == "FrontPage" {
                Ok(PageInfo::new(page.clone(), "Welcome"))
            } else {
                Err(StorageError::not_found(page.clone()))
            }
        }
    }

    #[test]
    fn test_page_reference_display() {
        assert_eq!(PageReference::local("FrontPage").to_string(), "FrontPage");
        assert_eq!(
            PageReference::on_wiki("c2", "WelcomeVisitors").to_string(),
            "c2:WelcomeVisitors"
        );
    }

    #[test]
    fn test_page_reference_name() {
        assert_eq!(PageReference::local("Projects/Roadmap").name(), "Roadmap");
        assert_eq!(PageReference::local("FrontPage").name(), "FrontPage");
    }

    #[test]
    fn test_page_info_builders() {
        let info = PageInfo::new(PageReference::local("FrontPage"), "text")
            .with_revision(7)
            .with_attribute("author", "alice")
            .with_syntax("creole");

        assert_eq!(info.revision, Some(7));
        assert_eq!(info.attribute("author"), Some("alice"));
        assert_eq!(info.attribute("missing"), None);
        assert_eq!(info.syntax.as_deref(), Some("creole"));
    }

    #[test]
    fn test_default_exists() {
        let store = SinglePageStore;
        assert!(store.exists(&PageReference::local("FrontPage")).unwrap());
        assert!(!store.exists(&PageReference::local("Missing")).unwrap());
    }

    #[test]
    fn test_default_exists_propagates_unknown_wiki() {
        let store = SinglePageStore;
        let err = store
            .exists(&PageReference::on_wiki("c2", "FrontPage"))
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::UnknownWiki);
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found(PageReference::local("Missing")).with_backend("Memory");
        assert_eq!(err.to_string(), "[Memory] Page not found (page: Missing)");
    }

    #[test]
    fn test_error_display_with_source() {
        let io = std::io::Error::other("disk on fire");
        let err = StorageError::new(StorageErrorKind::Unavailable).with_source(io);
        assert_eq!(err.to_string(), "Unavailable: disk on fire");
        assert!(std::error::Error::source(&err).is_some());
    }
}
