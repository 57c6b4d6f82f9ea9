//! Macro registry and the expansion pass.
//!
//! Expansion replaces each macro invocation with the nodes produced by the
//! first registered macro that recognizes it. Produced nodes are expanded
//! again, up to a fixed depth. Invocations nobody recognizes, failed
//! expansions and invocations past the depth limit stay in the tree and
//! render as their literal source text.

use std::fmt;
use std::sync::Arc;

use wiki_storage::PageReference;

use crate::ast::{MacroInvocation, Node, NodeKind, push_node};
use crate::parser::CreoleParser;

/// Default bound on nested expansions.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Error produced by a macro.
#[derive(Debug, thiserror::Error)]
pub enum MacroError {
    /// The arguments could not be understood.
    #[error("invalid arguments for macro '{name}': {message}")]
    InvalidArguments { name: String, message: String },
    /// The macro failed while producing output.
    #[error("macro '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

/// What a macro expands to.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroOutput {
    /// Ready-made nodes, spliced as-is.
    Nodes(Vec<Node>),
    /// Wiki markup, parsed in place of the invocation.
    Wiki(String),
    /// HTML emitted without escaping.
    Html(String),
    /// Plain text, escaped on output.
    Text(String),
}

/// A named markup extension.
///
/// # Example
///
/// ```
/// use wiki_renderer::{Macro, MacroError, MacroInvocation, MacroOutput};
/// use wiki_storage::PageReference;
///
/// struct Shout;
///
/// impl Macro for Shout {
///     fn name(&self) -> &str {
///         "shout"
///     }
///
///     fn expand(&self, _page: &PageReference, args: &str) -> Result<MacroOutput, MacroError> {
///         Ok(MacroOutput::Wiki(format!("**{}**", args.to_uppercase())))
///     }
/// }
///
/// let invocation = MacroInvocation { name: "shout".into(), args: "hi".into(), block: false };
/// assert!(Shout.recognizes(&invocation));
/// ```
pub trait Macro: Send + Sync {
    /// Name used in `<<name>>`.
    fn name(&self) -> &str;

    /// Whether this macro handles the invocation. Defaults to name equality.
    fn recognizes(&self, invocation: &MacroInvocation) -> bool {
        invocation.name == self.name()
    }

    /// Expand the invocation's raw argument text.
    ///
    /// # Errors
    ///
    /// Returns a `MacroError` when the arguments are invalid or expansion fails;
    /// the invocation is then left unexpanded.
    fn expand(&self, page: &PageReference, args: &str) -> Result<MacroOutput, MacroError>;
}

/// Macro backed by a closure.
pub struct FnMacro<F> {
    name: String,
    expand: F,
}

impl<F> FnMacro<F>
where
    F: Fn(&PageReference, &str) -> Result<MacroOutput, MacroError> + Send + Sync,
{
    #[must_use]
    pub fn new(name: impl Into<String>, expand: F) -> Self {
        Self {
            name: name.into(),
            expand,
        }
    }
}

impl<F> Macro for FnMacro<F>
where
    F: Fn(&PageReference, &str) -> Result<MacroOutput, MacroError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn expand(&self, page: &PageReference, args: &str) -> Result<MacroOutput, MacroError> {
        (self.expand)(page, args)
    }
}

/// Ordered list of macros; the first one recognizing an invocation wins.
#[derive(Clone, Default)]
pub struct MacroRegistry {
    macros: Vec<Arc<dyn Macro>>,
}

impl MacroRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a macro.
    #[must_use]
    pub fn with_macro(mut self, m: impl Macro + 'static) -> Self {
        self.register(Arc::new(m));
        self
    }

    /// Append an already shared macro.
    pub fn register(&mut self, m: Arc<dyn Macro>) {
        self.macros.push(m);
    }

    /// First macro recognizing the invocation.
    #[must_use]
    pub fn find(&self, invocation: &MacroInvocation) -> Option<&dyn Macro> {
        self.macros
            .iter()
            .find(|m| m.recognizes(invocation))
            .map(|m| &**m)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.macros.len()
    }
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.macros.iter().map(|m| m.name()))
            .finish()
    }
}

/// Tree-rewriting pass replacing macro invocations with their expansions.
pub struct MacroExpander<'a> {
    registry: &'a MacroRegistry,
    parser: &'a CreoleParser,
    max_depth: usize,
}

impl<'a> MacroExpander<'a> {
    /// Create an expander; `parser` parses [`MacroOutput::Wiki`] results.
    #[must_use]
    pub fn new(registry: &'a MacroRegistry, parser: &'a CreoleParser) -> Self {
        Self {
            registry,
            parser,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the bound on nested expansions.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand every macro invocation in the tree.
    ///
    /// A tree without invocations is returned unchanged.
    #[must_use]
    pub fn expand(&self, page: &PageReference, root: &Node) -> Node {
        if !root.contains_macros() {
            return root.clone();
        }
        let mut expanded = self.expand_node(page, root, 0);
        match expanded.len() {
            1 => expanded.remove(0),
            _ => Node::page(expanded),
        }
    }

    /// Expand one node into the nodes replacing it.
    fn expand_node(&self, page: &PageReference, node: &Node, depth: usize) -> Vec<Node> {
        if let NodeKind::Macro(invocation) = node.kind() {
            return self.expand_invocation(page, node, invocation, depth);
        }
        if !node.contains_macros() {
            return vec![node.clone()];
        }
        let mut children = Vec::new();
        for child in node.children() {
            for expanded in self.expand_node(page, child, depth) {
                push_node(&mut children, expanded);
            }
        }
        vec![node.with_children(children)]
    }

    fn expand_invocation(
        &self,
        page: &PageReference,
        node: &Node,
        invocation: &MacroInvocation,
        depth: usize,
    ) -> Vec<Node> {
        let Some(m) = self.registry.find(invocation) else {
            return vec![node.clone()];
        };

        if depth >= self.max_depth {
            tracing::warn!(
                macro_name = %invocation.name,
                max_depth = self.max_depth,
                "Macro expansion depth exceeded"
            );
            return vec![node.clone()];
        }

        let output = match m.expand(page, &invocation.args) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(macro_name = %invocation.name, error = %e, "Macro expansion failed");
                return vec![node.clone()];
            }
        };

        let produced = match output {
            MacroOutput::Nodes(nodes) => nodes,
            MacroOutput::Wiki(markup) if invocation.block => self.parser.parse_blocks(page, &markup),
            MacroOutput::Wiki(markup) => self.parser.parse_inline(page, &markup),
            MacroOutput::Html(html) => vec![Node::raw(html)],
            MacroOutput::Text(text) => vec![Node::text(text)],
        };

        let mut nodes = Vec::new();
        for child in &produced {
            for expanded in self.expand_node(page, child, depth + 1) {
                push_node(&mut nodes, expanded);
            }
        }
        nodes
    }
}
