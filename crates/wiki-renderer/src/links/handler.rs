//! Pluggable link and image handlers.

use std::fmt;
use std::sync::Arc;

use wiki_storage::{PageReference, StorageError};

use super::LinkParts;

/// Error resolving a link or image target.
///
/// Renderers never surface this error; they substitute a fallback rendering.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The target names a wiki with no known URL.
    #[error("unknown wiki: {0}")]
    UnknownWiki(String),
    /// The target cannot be turned into a URL.
    #[error("malformed link target: {0}")]
    MalformedTarget(String),
    /// Page lookup failed.
    #[error("page lookup failed")]
    Storage(#[from] StorageError),
}

/// Transform applied to every constructed URL before it is embedded.
///
/// Hosting applications use it for session-parameter rewriting and similar;
/// the renderer never inspects it.
pub trait UrlOutputFilter {
    /// Filter a URL.
    fn filter(&self, url: &str) -> String;
}

/// URL filter that returns URLs unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFilter;

impl UrlOutputFilter for IdentityFilter {
    fn filter(&self, url: &str) -> String {
        url.to_owned()
    }
}

impl<F> UrlOutputFilter for F
where
    F: Fn(&str) -> String,
{
    fn filter(&self, url: &str) -> String {
        self(url)
    }
}

/// Resolves and renders link or image targets.
///
/// One handler is attached to every link node and one to every image node
/// at parse time.
pub trait LinkPartsHandler: Send + Sync {
    /// Resolve the target to a filtered URL.
    ///
    /// # Arguments
    ///
    /// * `page` - Page the link appears on
    /// * `parts` - Parsed link target
    /// * `filter` - URL output filter applied to the result
    fn resolve(
        &self,
        page: &PageReference,
        parts: &LinkParts,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, LinkError>;

    /// Render the target as an HTML fragment.
    ///
    /// # Arguments
    ///
    /// * `page` - Page the link appears on
    /// * `xhtml_content` - Already escaped display text
    /// * `parts` - Parsed link target
    /// * `filter` - URL output filter
    fn handle(
        &self,
        page: &PageReference,
        xhtml_content: &str,
        parts: &LinkParts,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, LinkError>;
}

/// Shared reference to a handler, stored on link and image nodes.
///
/// Two references are equal when they point at the same handler instance.
#[derive(Clone)]
pub struct HandlerRef(Arc<dyn LinkPartsHandler>);

impl HandlerRef {
    /// Wrap a handler.
    pub fn new(handler: impl LinkPartsHandler + 'static) -> Self {
        Self(Arc::new(handler))
    }

    /// Wrap an already shared handler.
    #[must_use]
    pub fn from_arc(handler: Arc<dyn LinkPartsHandler>) -> Self {
        Self(handler)
    }

    /// Resolve through the handler.
    pub fn resolve(
        &self,
        page: &PageReference,
        parts: &LinkParts,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, LinkError> {
        self.0.resolve(page, parts, filter)
    }

    /// Render through the handler.
    pub fn handle(
        &self,
        page: &PageReference,
        xhtml_content: &str,
        parts: &LinkParts,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, LinkError> {
        self.0.handle(page, xhtml_content, parts, filter)
    }
}

impl PartialEq for HandlerRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerRef(..)")
    }
}
