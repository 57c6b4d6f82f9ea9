//! HTML fragment renderer.
//!
//! Every structural element carries the configured CSS marker class.
//! Childless elements (rules, line breaks, bare anchors) are self-closing.

use std::fmt::Write;

use crate::ast::{LinkNode, MacroInvocation, Node};
use crate::links::UrlOutputFilter;
use crate::util::escape_html;
use crate::visitor::{AstVisitor, RenderContext};

/// CSS class used when none is configured.
pub const DEFAULT_CSS_CLASS: &str = "wiki-content";

/// Renders a tree to an HTML fragment string.
///
/// # Example
///
/// ```
/// use wiki_renderer::{HtmlRenderer, IdentityFilter, Node, NodeKind};
///
/// let tree = Node::page(vec![Node::new(NodeKind::Paragraph, vec![Node::text("a < b")])]);
/// let html = HtmlRenderer::new().render(&tree, &IdentityFilter);
/// assert_eq!(html, "<p class='wiki-content'>a &lt; b</p>");
/// ```
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    class: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_css_class(DEFAULT_CSS_CLASS)
    }

    /// Create a renderer marking elements with `css_class`.
    #[must_use]
    pub fn with_css_class(css_class: &str) -> Self {
        Self {
            class: escape_html(css_class),
        }
    }

    /// Render a tree with fresh directive state.
    #[must_use]
    pub fn render(&self, root: &Node, filter: &dyn UrlOutputFilter) -> String {
        let mut ctx = RenderContext::new(filter);
        self.visit(root, &mut ctx)
    }

    fn wrap(&self, tag: &str, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        let inner = self.visit_children(node, ctx);
        format!("<{tag} class='{}'>{inner}</{tag}>", self.class)
    }

    fn empty(&self, tag: &str) -> String {
        format!("<{tag} class='{}' />", self.class)
    }

    fn pre(&self, content: &str) -> String {
        format!("<pre class='{}'>{}</pre>", self.class, escape_html(content))
    }

    /// Render a link or image through its handler, falling back to plain text.
    /// Handler output for a link or image, or `fallback` applied to the escaped title.
    fn linked(
        &self,
        link: &LinkNode,
        ctx: &RenderContext<'_>,
        fallback: impl FnOnce(String) -> String,
    ) -> String {
        let content = escape_html(&link.title);
        match link
            .handler
            .handle(&link.page, &content, &link.parts, ctx.filter)
        {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!(target_ref = %link.target, error = %e, "Link resolution failed");
                fallback(content)
            }
        }
    }
}

impl AstVisitor for HtmlRenderer {
    type Output = String;

    fn identity(&self) -> String {
        String::new()
    }

    fn combine(&self, mut left: String, right: String) -> String {
        left.push_str(&right);
        left
    }

    fn visit_paragraph(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("p", node, ctx)
    }

    fn visit_heading(&self, node: &Node, level: u8, ctx: &mut RenderContext<'_>) -> String {
        self.wrap(&format!("h{level}"), node, ctx)
    }

    fn visit_blockquote(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("blockquote", node, ctx)
    }

    fn visit_bold(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("strong", node, ctx)
    }

    fn visit_italic(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("em", node, ctx)
    }

    fn visit_strikethrough(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("strike", node, ctx)
    }

    fn visit_ordered_list(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("ol", node, ctx)
    }

    fn visit_unordered_list(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("ul", node, ctx)
    }

    fn visit_list_item(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("li", node, ctx)
    }

    fn visit_table(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("table", node, ctx)
    }

    fn visit_table_row(&self, node: &Node, ctx: &mut RenderContext<'_>) -> String {
        self.wrap("tr", node, ctx)
    }

    fn visit_table_cell(&self, node: &Node, header: bool, ctx: &mut RenderContext<'_>) -> String {
        let tag = if header { "th" } else { "td" };
        let mut open = format!("<{tag} class='{}'", self.class);
        if let Some(align) = ctx.directives.table_alignment() {
            let _ = write!(open, " style='vertical-align:{}'", escape_html(align));
        }
        let inner = self.visit_children(node, ctx);
        format!("{open}>{inner}</{tag}>")
    }

    fn visit_text(
        &self,
        _node: &Node,
        text: &str,
        escape: bool,
        _ctx: &mut RenderContext<'_>,
    ) -> String {
        if escape {
            escape_html(text)
        } else {
            text.to_owned()
        }
    }

    fn visit_code(
        &self,
        _node: &Node,
        text: &str,
        language: Option<&str>,
        _ctx: &mut RenderContext<'_>,
    ) -> String {
        match language {
            Some(language) => format!(
                "<pre class='{}'><code class='{}'>{}</code></pre>",
                self.class,
                escape_html(language),
                escape_html(text)
            ),
            None => self.pre(text),
        }
    }

    fn visit_inline_code(
        &self,
        _node: &Node,
        text: &str,
        language: Option<&str>,
        _ctx: &mut RenderContext<'_>,
    ) -> String {
        let mut class = format!("{} inline", self.class);
        if let Some(language) = language {
            class.push(' ');
            class.push_str(&escape_html(language));
        }
        format!("<code class='{class}'>{}</code>", escape_html(text))
    }

    fn visit_nowiki(&self, _node: &Node, text: &str, _ctx: &mut RenderContext<'_>) -> String {
        self.pre(text)
    }

    fn visit_inline_nowiki(
        &self,
        _node: &Node,
        text: &str,
        _ctx: &mut RenderContext<'_>,
    ) -> String {
        format!("<code class='{}'>{}</code>", self.class, escape_html(text))
    }

    fn visit_horizontal_rule(&self, _node: &Node, _ctx: &mut RenderContext<'_>) -> String {
        self.empty("hr")
    }

    fn visit_linebreak(&self, _node: &Node, _ctx: &mut RenderContext<'_>) -> String {
        self.empty("br")
    }

    fn visit_anchor(&self, _node: &Node, id: &str, _ctx: &mut RenderContext<'_>) -> String {
        format!("<a class='{}' id='{}' />", self.class, escape_html(id))
    }

    fn visit_link(&self, _node: &Node, link: &LinkNode, ctx: &mut RenderContext<'_>) -> String {
        // Unresolvable mail addresses still get a bare anchor.
        self.linked(link, ctx, |content| {
            let target = link.target.trim();
            if target.starts_with("mailto:") {
                format!("<a href='{}'>{content}</a>", escape_html(target))
            } else {
                content
            }
        })
    }

    fn visit_image(&self, _node: &Node, image: &LinkNode, ctx: &mut RenderContext<'_>) -> String {
        self.linked(image, ctx, |alt| alt)
    }

    fn visit_macro(
        &self,
        _node: &Node,
        invocation: &MacroInvocation,
        _ctx: &mut RenderContext<'_>,
    ) -> String {
        let source = invocation.source_text();
        if invocation.block {
            self.pre(&source)
        } else {
            format!("<code class='{}'>{}</code>", self.class, escape_html(&source))
        }
    }
}
