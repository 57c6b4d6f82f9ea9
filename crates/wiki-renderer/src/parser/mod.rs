//! Creole markup parser.
//!
//! Parsing never fails: markup that cannot be recognized is kept as literal
//! text. Block structure is recognized line by line ([`block`]), inline
//! structure within each block's text ([`inline`]).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wiki_renderer::{CreoleParser, LinkResolutionContext, NodeKind};
//! use wiki_storage::{MockPageStore, PageReference};
//!
//! let context = Arc::new(LinkResolutionContext::new(Arc::new(MockPageStore::new())));
//! let parser = CreoleParser::with_context(context);
//!
//! let tree = parser.parse(&PageReference::local("Home"), "= Title =\nSome **bold** text.");
//! assert_eq!(tree.children().len(), 2);
//! assert_eq!(tree.children()[0].kind(), &NodeKind::Heading(1));
//! ```

mod block;
mod inline;

use std::sync::Arc;

use wiki_storage::PageReference;

use crate::ast::Node;
use crate::links::{HandlerRef, LinkResolutionContext, SimpleAnchors, SimpleImages};

/// Parser turning Creole markup into a syntax tree.
///
/// Every link node it produces carries the link handler, every image node the
/// image handler.
#[derive(Debug, Clone)]
pub struct CreoleParser {
    link_handler: HandlerRef,
    image_handler: HandlerRef,
}

impl CreoleParser {
    /// Create a parser attaching the given handlers to links and images.
    #[must_use]
    pub fn new(link_handler: HandlerRef, image_handler: HandlerRef) -> Self {
        Self {
            link_handler,
            image_handler,
        }
    }

    /// Create a parser with [`SimpleAnchors`] and [`SimpleImages`] over a shared context.
    #[must_use]
    pub fn with_context(context: Arc<LinkResolutionContext>) -> Self {
        Self::new(
            HandlerRef::new(SimpleAnchors::new(Arc::clone(&context))),
            HandlerRef::new(SimpleImages::new(context)),
        )
    }

    /// Parse a whole page into a tree rooted at a page node.
    #[must_use]
    pub fn parse(&self, page: &PageReference, text: &str) -> Node {
        Node::page(self.parse_blocks(page, text))
    }

    /// Parse markup into a sequence of block nodes.
    #[must_use]
    pub fn parse_blocks(&self, page: &PageReference, text: &str) -> Vec<Node> {
        block::BlockParser::new(self, page).parse(text)
    }

    /// Parse markup into a sequence of inline nodes.
    #[must_use]
    pub fn parse_inline(&self, page: &PageReference, text: &str) -> Vec<Node> {
        inline::InlineParser::new(self, page).parse(text)
    }

    pub(crate) fn link_handler(&self) -> &HandlerRef {
        &self.link_handler
    }

    pub(crate) fn image_handler(&self) -> &HandlerRef {
        &self.image_handler
    }
}
