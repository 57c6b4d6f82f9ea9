//! Creole wiki markup renderer.
//!
//! Pages are parsed into an immutable syntax tree ([`Node`]), macro
//! invocations are expanded ([`MacroExpander`]), and the tree is rendered by
//! an [`AstVisitor`] implementation:
//! - [`HtmlRenderer`]: HTML fragment with a CSS marker class on every element
//! - [`DocbookRenderer`]: Docbook 5 `article` with headings nested into sections
//!
//! Link and image targets are resolved through pluggable
//! [`LinkPartsHandler`]s. Resolution failures, unknown macros and unreadable
//! directives never abort a render; the affected node falls back to literal
//! output.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wiki_renderer::{IdentityFilter, WikiRenderer};
//! use wiki_storage::{MockPageStore, PageInfo, PageReference};
//!
//! let renderer = WikiRenderer::from_config(&Default::default(), Arc::new(MockPageStore::new()));
//! let page = PageInfo::new(PageReference::local("Home"), "= Hello =\n//Welcome//");
//!
//! let html = renderer.render_html(&page, &IdentityFilter);
//! assert_eq!(
//!     html.body,
//!     "<h1 class='wiki-content'>Hello</h1>\
//!      <p class='wiki-content'><em class='wiki-content'>Welcome</em></p>"
//! );
//! ```

mod ast;
pub mod directive;
mod docbook;
mod error;
mod html;
mod links;
mod macros;
mod parser;
mod renderer;
mod util;
mod visitor;

pub use ast::{Directive, LinkNode, MacroInvocation, Node, NodeKind};
pub use directive::{DirectiveError, Directives};
pub use docbook::{
    DOCBOOK_NAMESPACE, DOCBOOK_VERSION, DocbookRenderer, XLINK_NAMESPACE, XmlElement, XmlNode,
    to_xml_string,
};
pub use error::RenderError;
pub use html::{DEFAULT_CSS_CLASS, HtmlRenderer};
pub use links::{
    HandlerRef, IdentityFilter, LinkError, LinkParts, LinkPartsHandler, LinkResolutionContext,
    Resolved, ResolvedKind, SimpleAnchors, SimpleImages, UrlOutputFilter,
};
pub use macros::{
    DEFAULT_MAX_DEPTH, FnMacro, Macro, MacroError, MacroExpander, MacroOutput, MacroRegistry,
};
pub use parser::CreoleParser;
pub use renderer::{OutputFormat, RenderOptions, Rendered, WikiRenderer};
pub use util::escape_html;
pub use visitor::{AstVisitor, RenderContext};
