//! Built-in link and image handlers backed by a [`LinkResolutionContext`].

use std::sync::Arc;

use wiki_storage::PageReference;

use super::resolver::{LinkResolutionContext, ResolvedKind};
use super::{LinkError, LinkParts, LinkPartsHandler, UrlOutputFilter};
use crate::util::escape_html;

/// Renders links as `<a>` elements classed by target type.
///
/// Local pages are checked against the page store: existing pages get the
/// `existing-page` class, missing ones `new-page`.
pub struct SimpleAnchors {
    context: Arc<LinkResolutionContext>,
}

impl SimpleAnchors {
    #[must_use]
    pub fn new(context: Arc<LinkResolutionContext>) -> Self {
        Self { context }
    }
}

impl LinkPartsHandler for SimpleAnchors {
    fn resolve(
        &self,
        page: &PageReference,
        parts: &LinkParts,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, LinkError> {
        let resolved = self.context.resolve(page, parts)?;
        Ok(filter.filter(&resolved.url))
    }

    fn handle(
        &self,
        page: &PageReference,
        xhtml_content: &str,
        parts: &LinkParts,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, LinkError> {
        let resolved = self.context.resolve(page, parts)?;
        let class = match &resolved.kind {
            ResolvedKind::External => "external",
            ResolvedKind::LocalPage(target) if self.context.exists(target) => "existing-page",
            ResolvedKind::LocalPage(_) => "new-page",
            ResolvedKind::Attachment => "attachment",
            ResolvedKind::InterWiki => "inter-wiki",
            ResolvedKind::Fragment => "fragment",
        };
        let href = filter.filter(&resolved.url);
        Ok(format!(
            "<a class='{class}' href='{}'>{xhtml_content}</a>",
            escape_html(&href)
        ))
    }
}

/// Renders images as `<img>` elements.
///
/// A bare image name without a page is an attachment of the current page.
pub struct SimpleImages {
    context: Arc<LinkResolutionContext>,
    css_class: String,
}

impl SimpleImages {
    #[must_use]
    pub fn new(context: Arc<LinkResolutionContext>) -> Self {
        Self {
            context,
            css_class: "wiki-content".to_owned(),
        }
    }

    /// Set the CSS class on rendered images.
    #[must_use]
    pub fn with_css_class(mut self, css_class: impl Into<String>) -> Self {
        self.css_class = css_class.into();
        self
    }

    fn image_parts(parts: &LinkParts) -> LinkParts {
        if parts.is_uri() || parts.wiki.is_some() || parts.attachment.is_some() {
            return parts.clone();
        }
        match &parts.page_name {
            Some(name) if !name.contains('/') && name.contains('.') => LinkParts {
                page_name: None,
                attachment: Some(name.clone()),
                ..parts.clone()
            },
            _ => parts.clone(),
        }
    }
}

impl LinkPartsHandler for SimpleImages {
    fn resolve(
        &self,
        page: &PageReference,
        parts: &LinkParts,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, LinkError> {
        let resolved = self.context.resolve(page, &Self::image_parts(parts))?;
        Ok(filter.filter(&resolved.url))
    }

    fn handle(
        &self,
        page: &PageReference,
        xhtml_content: &str,
        parts: &LinkParts,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, LinkError> {
        let src = self.resolve(page, parts, filter)?;
        Ok(format!(
            "<img class='{}' src='{}' alt='{xhtml_content}' />",
            escape_html(&self.css_class),
            escape_html(&src)
        ))
    }
}
