//! Generic depth-first traversal over the syntax tree.
//!
//! A renderer implements [`AstVisitor`] by choosing an output type, an
//! identity value and a left-to-right combine operation, then overriding the
//! hooks for the node kinds it renders specially. Every hook defaults to
//! combining the outputs of the node's children.
//!
//! Directive nodes are handled by [`AstVisitor::visit`] itself: they update
//! the [`RenderContext`] and contribute the identity value. Because the
//! context is threaded through one traversal in document order, a directive
//! affects exactly the nodes that follow it.

use crate::ast::{LinkNode, MacroInvocation, Node, NodeKind};
use crate::directive::Directives;
use crate::links::UrlOutputFilter;

/// Mutable per-render state.
pub struct RenderContext<'a> {
    /// Directives active at the current traversal position.
    pub directives: Directives,
    /// Filter applied to every URL the render embeds.
    pub filter: &'a dyn UrlOutputFilter,
}

impl<'a> RenderContext<'a> {
    /// Fresh state for one render call.
    #[must_use]
    pub fn new(filter: &'a dyn UrlOutputFilter) -> Self {
        Self {
            directives: Directives::new(),
            filter,
        }
    }
}

/// Render visitor parameterized by its output type.
pub trait AstVisitor {
    type Output;

    /// Output of a node that renders nothing.
    fn identity(&self) -> Self::Output;

    /// Append `right` to `left`.
    fn combine(&self, left: Self::Output, right: Self::Output) -> Self::Output;

    /// Dispatch a node to its hook.
    fn visit(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        match node.kind() {
            NodeKind::Page => self.visit_page(node, ctx),
            NodeKind::Paragraph => self.visit_paragraph(node, ctx),
            NodeKind::Heading(level) => self.visit_heading(node, *level, ctx),
            NodeKind::Blockquote => self.visit_blockquote(node, ctx),
            NodeKind::Bold => self.visit_bold(node, ctx),
            NodeKind::Italic => self.visit_italic(node, ctx),
            NodeKind::Strikethrough => self.visit_strikethrough(node, ctx),
            NodeKind::OrderedList => self.visit_ordered_list(node, ctx),
            NodeKind::UnorderedList => self.visit_unordered_list(node, ctx),
            NodeKind::ListItem => self.visit_list_item(node, ctx),
            NodeKind::Table => self.visit_table(node, ctx),
            NodeKind::TableRow => self.visit_table_row(node, ctx),
            NodeKind::TableCell => self.visit_table_cell(node, false, ctx),
            NodeKind::TableHeaderCell => self.visit_table_cell(node, true, ctx),
            NodeKind::Text { text, escape } => self.visit_text(node, text, *escape, ctx),
            NodeKind::Code { text, language } => {
                self.visit_code(node, text, language.as_deref(), ctx)
            }
            NodeKind::InlineCode { text, language } => {
                self.visit_inline_code(node, text, language.as_deref(), ctx)
            }
            NodeKind::Nowiki(text) => self.visit_nowiki(node, text, ctx),
            NodeKind::InlineNowiki(text) => self.visit_inline_nowiki(node, text, ctx),
            NodeKind::HorizontalRule => self.visit_horizontal_rule(node, ctx),
            NodeKind::Linebreak => self.visit_linebreak(node, ctx),
            NodeKind::Anchor(id) => self.visit_anchor(node, id, ctx),
            NodeKind::Link(link) => self.visit_link(node, link, ctx),
            NodeKind::Image(image) => self.visit_image(node, image, ctx),
            NodeKind::Macro(invocation) => self.visit_macro(node, invocation, ctx),
            NodeKind::Directive(directive) => {
                ctx.directives.apply(directive);
                self.identity()
            }
        }
    }

    /// Visit children left to right and combine their outputs.
    fn visit_children(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        node.children().iter().fold(self.identity(), |acc, child| {
            let out = self.visit(child, ctx);
            self.combine(acc, out)
        })
    }

    fn visit_page(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_paragraph(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_heading(&self, node: &Node, _level: u8, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_blockquote(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_bold(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_italic(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_strikethrough(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_ordered_list(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_unordered_list(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_list_item(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_table(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_table_row(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_table_cell(
        &self,
        node: &Node,
        _header: bool,
        ctx: &mut RenderContext<'_>,
    ) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_text(
        &self,
        node: &Node,
        _text: &str,
        _escape: bool,
        ctx: &mut RenderContext<'_>,
    ) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_code(
        &self,
        node: &Node,
        _text: &str,
        _language: Option<&str>,
        ctx: &mut RenderContext<'_>,
    ) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_inline_code(
        &self,
        node: &Node,
        _text: &str,
        _language: Option<&str>,
        ctx: &mut RenderContext<'_>,
    ) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_nowiki(&self, node: &Node, _text: &str, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_inline_nowiki(
        &self,
        node: &Node,
        _text: &str,
        ctx: &mut RenderContext<'_>,
    ) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_horizontal_rule(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_linebreak(&self, node: &Node, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_anchor(&self, node: &Node, _id: &str, ctx: &mut RenderContext<'_>) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_link(
        &self,
        node: &Node,
        _link: &LinkNode,
        ctx: &mut RenderContext<'_>,
    ) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_image(
        &self,
        node: &Node,
        _image: &LinkNode,
        ctx: &mut RenderContext<'_>,
    ) -> Self::Output {
        self.visit_children(node, ctx)
    }

    fn visit_macro(
        &self,
        node: &Node,
        _invocation: &MacroInvocation,
        ctx: &mut RenderContext<'_>,
    ) -> Self::Output {
        self.visit_children(node, ctx)
    }
}
