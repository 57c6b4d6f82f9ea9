//! Immutable syntax tree produced by the parser.
//!
//! Every node is a [`NodeKind`] plus an ordered list of children. Leaves have
//! no children. Trees are built once and never mutated: transformations such
//! as macro expansion build new nodes with [`Node::with_children`].

use wiki_storage::PageReference;

use crate::links::{HandlerRef, LinkParts};

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    children: Vec<Node>,
}

/// Node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Document root.
    Page,
    Paragraph,
    /// Heading with level 1-6.
    Heading(u8),
    Blockquote,
    Bold,
    Italic,
    Strikethrough,
    OrderedList,
    UnorderedList,
    ListItem,
    Table,
    TableRow,
    TableCell,
    TableHeaderCell,
    /// Text run. `escape` is false for verbatim content that must be emitted as-is.
    Text { text: String, escape: bool },
    /// Block of source code.
    Code {
        text: String,
        language: Option<String>,
    },
    /// Inline source code.
    InlineCode {
        text: String,
        language: Option<String>,
    },
    /// Verbatim block; inner markup is not interpreted.
    Nowiki(String),
    /// Verbatim inline span.
    InlineNowiki(String),
    HorizontalRule,
    Linebreak,
    /// Named anchor target.
    Anchor(String),
    Link(Box<LinkNode>),
    Image(Box<LinkNode>),
    /// Macro invocation awaiting expansion.
    Macro(MacroInvocation),
    /// Rendering-option toggle; produces no output.
    Directive(Directive),
}

/// Link or image payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkNode {
    /// Target exactly as written.
    pub target: String,
    /// Display title (the target itself when no title was given).
    pub title: String,
    /// Parsed pieces of the target.
    pub parts: LinkParts,
    /// Page the link appears on.
    pub page: PageReference,
    /// Handler responsible for resolving and rendering the target.
    pub handler: HandlerRef,
}

/// A `<<name:args>>` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroInvocation {
    pub name: String,
    /// Raw argument text after the colon (empty when absent).
    pub args: String,
    /// Whether the invocation stands alone as a block.
    pub block: bool,
}

impl MacroInvocation {
    /// Invocation as it appeared in the source.
    #[must_use]
    pub fn source_text(&self) -> String {
        if self.args.is_empty() {
            format!("<<{}>>", self.name)
        } else {
            format!("<<{}:{}>>", self.name, self.args)
        }
    }
}

/// A `<<+name:args>>` or `<<-name>>` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub enabled: bool,
    pub args: Vec<String>,
}

impl Directive {
    /// Build a directive from its raw comma-separated argument text.
    #[must_use]
    pub fn parse_args(name: impl Into<String>, enabled: bool, args: Option<&str>) -> Self {
        let args = args
            .map(|raw| raw.split(',').map(|a| a.trim().to_owned()).collect())
            .unwrap_or_default();
        Self {
            name: name.into(),
            enabled,
            args,
        }
    }
}

impl Node {
    /// Create a node with children.
    #[must_use]
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    /// Create a childless node.
    #[must_use]
    pub fn leaf(kind: NodeKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Create a document root.
    #[must_use]
    pub fn page(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Page, children)
    }

    /// Create a text node whose content is escaped on output.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Text {
            text: text.into(),
            escape: true,
        })
    }

    /// Create a text node emitted verbatim.
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Text {
            text: text.into(),
            escape: false,
        })
    }

    /// Create a heading, clamping the level to 1-6.
    #[must_use]
    pub fn heading(level: usize, children: Vec<Node>) -> Self {
        let level = u8::try_from(level.clamp(1, 6)).unwrap_or(6);
        Self::new(NodeKind::Heading(level), children)
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Copy of this node with its children replaced.
    #[must_use]
    pub fn with_children(&self, children: Vec<Node>) -> Self {
        Self::new(self.kind.clone(), children)
    }

    /// Text carried by text-like leaves.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text, .. }
            | NodeKind::Code { text, .. }
            | NodeKind::InlineCode { text, .. }
            | NodeKind::Nowiki(text)
            | NodeKind::InlineNowiki(text) => Some(text),
            _ => None,
        }
    }

    /// Copy of a text-like leaf with its text replaced.
    ///
    /// Returns `None` for nodes that carry no text.
    #[must_use]
    pub fn with_text(&self, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let kind = match &self.kind {
            NodeKind::Text { escape, .. } => NodeKind::Text {
                text,
                escape: *escape,
            },
            NodeKind::Code { language, .. } => NodeKind::Code {
                text,
                language: language.clone(),
            },
            NodeKind::InlineCode { language, .. } => NodeKind::InlineCode {
                text,
                language: language.clone(),
            },
            NodeKind::Nowiki(_) => NodeKind::Nowiki(text),
            NodeKind::InlineNowiki(_) => NodeKind::InlineNowiki(text),
            _ => return None,
        };
        Some(Self::leaf(kind))
    }

    /// Whether the node is a heading; returns its level.
    #[must_use]
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            NodeKind::Heading(level) => Some(level),
            _ => None,
        }
    }

    /// Whether any node in this subtree is a macro invocation.
    #[must_use]
    pub fn contains_macros(&self) -> bool {
        matches!(self.kind, NodeKind::Macro(_)) || self.children.iter().any(Node::contains_macros)
    }

    /// Concatenated text of every text-like leaf in document order.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = self.text_content() {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// Append text to a node list, merging with a preceding text node of the same escaping mode.
pub(crate) fn push_text(nodes: &mut Vec<Node>, text: &str, escape: bool) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = nodes.last_mut()
        && let NodeKind::Text {
            text: existing,
            escape: last_escape,
        } = &last.kind
        && *last_escape == escape
    {
        let merged = format!("{existing}{text}");
        if let Some(node) = last.with_text(merged) {
            *last = node;
        }
        return;
    }
    nodes.push(if escape {
        Node::text(text)
    } else {
        Node::raw(text)
    });
}

/// Append a node, coalescing adjacent text nodes.
pub(crate) fn push_node(nodes: &mut Vec<Node>, node: Node) {
    if let NodeKind::Text { text, escape } = &node.kind {
        push_text(nodes, text, *escape);
    } else {
        nodes.push(node);
    }
}
