//! Docbook 5 renderer.
//!
//! Produces an `article` document tree. Headings become nested `section`
//! elements (see [`sections`]); verbatim content is stored as CDATA.
//!
//! # Example
//!
//! ```
//! use wiki_renderer::{DocbookRenderer, IdentityFilter, Node, NodeKind};
//!
//! let tree = Node::page(vec![
//!     Node::heading(1, vec![Node::text("Intro")]),
//!     Node::new(NodeKind::Paragraph, vec![Node::text("Hello")]),
//! ]);
//! let article = DocbookRenderer::new().render(&tree, &IdentityFilter);
//! assert_eq!(article.name, "article");
//! assert_eq!(article.elements("section").count(), 1);
//! ```

mod sections;
mod serializer;
mod tree;

pub use serializer::to_xml_string;
pub use tree::{XmlElement, XmlNode};

use sections::SectionBuilder;

use crate::ast::{LinkNode, MacroInvocation, Node};
use crate::error::RenderError;
use crate::links::UrlOutputFilter;
use crate::visitor::{AstVisitor, RenderContext};

pub const DOCBOOK_NAMESPACE: &str = "http://docbook.org/ns/docbook";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
pub const DOCBOOK_VERSION: &str = "5.0";

/// Renders a tree to a Docbook document.
#[derive(Debug, Clone)]
pub struct DocbookRenderer {
    lang: String,
    indent: usize,
}

impl Default for DocbookRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocbookRenderer {
    /// Create a renderer for English documents indented by two spaces.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lang: "en".to_owned(),
            indent: 2,
        }
    }

    /// Set the `xml:lang` of the article.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Set the serialization indent width.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Render a tree into an `article` element with fresh directive state.
    #[must_use]
    pub fn render(&self, root: &Node, filter: &dyn UrlOutputFilter) -> XmlElement {
        let mut ctx = RenderContext::new(filter);
        let content = self.visit(root, &mut ctx);
        XmlElement::new("article")
            .with_attr("xmlns", DOCBOOK_NAMESPACE)
            .with_attr("xmlns:xl", XLINK_NAMESPACE)
            .with_attr("version", DOCBOOK_VERSION)
            .with_attr("xml:lang", self.lang.as_str())
            .with_children(content)
    }

    /// Render a tree and serialize it.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Xml` if serialization fails.
    pub fn render_to_string(
        &self,
        root: &Node,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, RenderError> {
        to_xml_string(&self.render(root, filter), self.indent)
    }

    /// Render children into nested sections, one per heading.
    fn sectioned(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        let mut builder = SectionBuilder::new();
        for child in node.children() {
            if let Some(level) = child.heading_level() {
                builder.open(level);
            }
            let out = self.visit(child, ctx);
            builder.append(out);
        }
        builder.finish()
    }

    fn element(&self, name: &str, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        vec![XmlElement::new(name).with_children(self.visit_children(node, ctx)).into()]
    }

    fn emphasis(
        &self,
        role: Option<&str>,
        node: &Node,
        ctx: &mut RenderContext<'_>,
    ) -> Vec<XmlNode> {
        let mut element = XmlElement::new("emphasis");
        if let Some(role) = role {
            element = element.with_attr("role", role);
        }
        vec![element.with_children(self.visit_children(node, ctx)).into()]
    }

    /// Resolve a link target through its handler, falling back to the raw target.
    fn href(link: &LinkNode, ctx: &RenderContext<'_>) -> String {
        link.handler
            .resolve(&link.page, &link.parts, ctx.filter)
            .unwrap_or_else(|e| {
                tracing::debug!(target_ref = %link.target, error = %e, "Link resolution failed");
                link.target.clone()
            })
    }
}

fn cdata(name: &str, text: &str) -> XmlElement {
    XmlElement::new(name).with_children(vec![XmlNode::CData(text.to_owned())])
}

fn with_language(element: XmlElement, language: Option<&str>) -> XmlElement {
    match language {
        Some(language) => element.with_attr("language", language),
        None => element,
    }
}

impl AstVisitor for DocbookRenderer {
    type Output = Vec<XmlNode>;

    fn identity(&self) -> Vec<XmlNode> {
        Vec::new()
    }

    fn combine(&self, mut left: Vec<XmlNode>, right: Vec<XmlNode>) -> Vec<XmlNode> {
        left.extend(right);
        left
    }

    fn visit_page(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.sectioned(node, ctx)
    }

    fn visit_paragraph(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.element("para", node, ctx)
    }

    fn visit_heading(&self, node: &Node, _level: u8, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        let title = XmlElement::new("title").with_children(self.visit_children(node, ctx));
        vec![XmlElement::new("info").with_children(vec![title.into()]).into()]
    }

    fn visit_blockquote(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        let children = if node.children().iter().any(|c| c.heading_level().is_some()) {
            self.sectioned(node, ctx)
        } else {
            self.visit_children(node, ctx)
        };
        vec![
            XmlElement::new("section")
                .with_attr("role", "blockquote")
                .with_children(children)
                .into(),
        ]
    }

    fn visit_bold(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.emphasis(Some("bold"), node, ctx)
    }

    fn visit_italic(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.emphasis(None, node, ctx)
    }

    fn visit_strikethrough(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.emphasis(Some("strike"), node, ctx)
    }

    fn visit_ordered_list(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.element("orderedlist", node, ctx)
    }

    fn visit_unordered_list(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.element("itemizedlist", node, ctx)
    }

    fn visit_list_item(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.element("listitem", node, ctx)
    }

    fn visit_table(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.element("table", node, ctx)
    }

    fn visit_table_row(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        self.element("tr", node, ctx)
    }

    fn visit_table_cell(
        &self,
        node: &Node,
        header: bool,
        ctx: &mut RenderContext<'_>,
    ) -> Vec<XmlNode> {
        let mut cell = XmlElement::new(if header { "th" } else { "td" });
        if let Some(align) = ctx.directives.table_alignment() {
            cell = cell.with_attr("valign", align);
        }
        vec![cell.with_children(self.visit_children(node, ctx)).into()]
    }

    fn visit_text(
        &self,
        _node: &Node,
        text: &str,
        escape: bool,
        _ctx: &mut RenderContext<'_>,
    ) -> Vec<XmlNode> {
        if escape {
            vec![XmlNode::Text(text.to_owned())]
        } else {
            vec![XmlNode::CData(text.to_owned())]
        }
    }

    fn visit_code(
        &self,
        _node: &Node,
        text: &str,
        language: Option<&str>,
        _ctx: &mut RenderContext<'_>,
    ) -> Vec<XmlNode> {
        vec![with_language(cdata("programlisting", text), language).into()]
    }

    fn visit_inline_code(
        &self,
        _node: &Node,
        text: &str,
        language: Option<&str>,
        _ctx: &mut RenderContext<'_>,
    ) -> Vec<XmlNode> {
        vec![with_language(XmlElement::new("code").with_text(text), language).into()]
    }

    fn visit_nowiki(&self, _node: &Node, text: &str, _ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        vec![cdata("programlisting", text).into()]
    }

    fn visit_inline_nowiki(
        &self,
        _node: &Node,
        text: &str,
        _ctx: &mut RenderContext<'_>,
    ) -> Vec<XmlNode> {
        vec![cdata("literal", text).into()]
    }

    fn visit_horizontal_rule(&self, _node: &Node, _ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        vec![XmlElement::new("bridgehead").with_attr("role", "separator").into()]
    }

    fn visit_linebreak(&self, _node: &Node, _ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        vec![XmlElement::new("sbr").into()]
    }

    fn visit_anchor(&self, _node: &Node, id: &str, _ctx: &mut RenderContext<'_>) -> Vec<XmlNode> {
        vec![XmlElement::new("anchor").with_attr("xml:id", id).into()]
    }

    fn visit_link(
        &self,
        _node: &Node,
        link: &LinkNode,
        ctx: &mut RenderContext<'_>,
    ) -> Vec<XmlNode> {
        let href = Self::href(link, ctx);
        vec![
            XmlElement::new("link")
                .with_attr("xl:href", href)
                .with_text(link.title.as_str())
                .into(),
        ]
    }

    fn visit_image(
        &self,
        _node: &Node,
        image: &LinkNode,
        ctx: &mut RenderContext<'_>,
    ) -> Vec<XmlNode> {
        let fileref = Self::href(image, ctx);
        let title = XmlElement::new("title").with_text(image.title.as_str());
        vec![
            XmlElement::new("imageobject")
                .with_children(vec![
                    XmlElement::new("info").with_children(vec![title.into()]).into(),
                    XmlElement::new("imagedata").with_attr("fileref", fileref).into(),
                ])
                .into(),
        ]
    }

    fn visit_macro(
        &self,
        _node: &Node,
        invocation: &MacroInvocation,
        _ctx: &mut RenderContext<'_>,
    ) -> Vec<XmlNode> {
        let source = invocation.source_text();
        if invocation.block {
            vec![cdata("programlisting", &source).into()]
        } else {
            vec![XmlElement::new("code").with_text(source).into()]
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::links::IdentityFilter;
    use crate::parser::test_support::{page, parser};

    fn article(markup: &str) -> XmlElement {
        let tree = parser().parse(&page(), markup);
        DocbookRenderer::new().render(&tree, &IdentityFilter)
    }

    fn first<'a>(element: &'a XmlElement, name: &'a str) -> &'a XmlElement {
        element
            .elements(name)
            .next()
            .unwrap_or_else(|| panic!("no <{name}> in {element:?}"))
    }

    #[test]
    fn test_article_attributes() {
        let doc = DocbookRenderer::new()
            .with_lang("de")
            .render(&Node::page(Vec::new()), &IdentityFilter);
        assert_eq!(doc.attr("xmlns"), Some(DOCBOOK_NAMESPACE));
        assert_eq!(doc.attr("xmlns:xl"), Some(XLINK_NAMESPACE));
        assert_eq!(doc.attr("version"), Some("5.0"));
        assert_eq!(doc.attr("xml:lang"), Some("de"));
        assert!(doc.children.is_empty());
    }

    #[test]
    fn test_heading_sections() {
        let doc = article("= A =\ntext\n== B ==\n= C =");
        let sections: Vec<&XmlElement> = doc.elements("section").collect();
        assert_eq!(sections.len(), 2);

        let title = first(first(sections[0], "info"), "title");
        assert_eq!(title.text_content(), "A");
        assert_eq!(first(sections[0], "para").text_content(), "text");
        assert_eq!(sections[0].elements("section").count(), 1);
    }

    #[test]
    fn test_emphasis_roles() {
        let doc = article("**b** //i// --s--");
        let para = first(first(&doc, "section"), "para");
        let roles: Vec<Option<&str>> =
            para.elements("emphasis").map(|e| e.attr("role")).collect();
        assert_eq!(roles, vec![Some("bold"), None, Some("strike")]);
    }

    #[test]
    fn test_code_is_cdata() {
        let doc = article("[<rust>]\na < b\n[</rust>]");
        let listing = first(first(&doc, "section"), "programlisting");
        assert_eq!(listing.attr("language"), Some("rust"));
        assert_eq!(listing.children, vec![XmlNode::CData("a < b".to_owned())]);
    }

    #[test]
    fn test_link_and_image() {
        let doc = article("[[FrontPage|Home]] {{logo.png|Logo}} [[nowhere:X|Bad]]");
        let para = first(first(&doc, "section"), "para");

        let links: Vec<&XmlElement> = para.elements("link").collect();
        assert_eq!(links[0].attr("xl:href"), Some("/pages/FrontPage"));
        assert_eq!(links[0].text_content(), "Home");
        assert_eq!(links[1].attr("xl:href"), Some("nowhere:X"));

        let image = first(para, "imageobject");
        assert_eq!(
            first(image, "imagedata").attr("fileref"),
            Some("/pages/Current/attachments/logo.png")
        );
        assert_eq!(first(first(image, "info"), "title").text_content(), "Logo");
    }

    #[test]
    fn test_cell_alignment() {
        let doc = article("<<+table-alignment:middle>>\n|=h|c|");
        let row = first(first(first(&doc, "section"), "table"), "tr");
        assert_eq!(first(row, "th").attr("valign"), Some("middle"));
        assert_eq!(first(row, "td").attr("valign"), Some("middle"));
    }

    #[test]
    fn test_directive_before_heading_opens_no_section() {
        let doc = article("<<+table-alignment:top>>\n= Title =");
        assert_eq!(doc.elements("section").count(), 1);
    }

    #[test]
    fn test_blockquote_section() {
        let doc = article("> quoted");
        let quote = first(first(&doc, "section"), "section");
        assert_eq!(quote.attr("role"), Some("blockquote"));
        assert_eq!(first(quote, "para").text_content(), "quoted");
    }

    #[test]
    fn test_headingless_blockquote_keeps_blocks_flat() {
        let doc = article("> one\n>\n> two");
        let quote = first(first(&doc, "section"), "section");
        assert_eq!(quote.elements("section").count(), 0);
        let paras: Vec<String> = quote.elements("para").map(XmlElement::text_content).collect();
        assert_eq!(paras, vec!["one".to_owned(), "two".to_owned()]);
    }

    #[test]
    fn test_blockquote_with_heading_is_sectioned() {
        let doc = article("> intro\n> = Inner =\n> body");
        let quote = first(first(&doc, "section"), "section");
        assert_eq!(quote.elements("para").count(), 0);
        assert_eq!(quote.elements("section").count(), 2);
    }

    #[test]
    fn test_serialized_document() {
        let tree = parser().parse(&page(), "= T =\n{{{\nx ]]> y\n}}}");
        let xml = DocbookRenderer::new()
            .render_to_string(&tree, &IdentityFilter)
            .unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<article xmlns="http://docbook.org/ns/docbook""#));
        assert!(xml.contains("<![CDATA[x ]]]]><![CDATA[> y]]>"));
    }
}
