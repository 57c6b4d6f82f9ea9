//! Rendering facade bundling parser, macros and output formats.

use std::sync::Arc;

use wiki_config::Config;
use wiki_storage::{PageInfo, PageReference, PageStore};

use crate::ast::Node;
use crate::docbook::DocbookRenderer;
use crate::error::RenderError;
use crate::html::{DEFAULT_CSS_CLASS, HtmlRenderer};
use crate::links::{
    HandlerRef, LinkResolutionContext, SimpleAnchors, SimpleImages, UrlOutputFilter,
};
use crate::macros::{DEFAULT_MAX_DEPTH, MacroExpander, MacroRegistry};
use crate::parser::CreoleParser;

/// An output format a parsed page can be rendered to.
pub trait OutputFormat {
    /// Rendered document type.
    type Output;

    /// MIME type attached to rendered output.
    const CONTENT_TYPE: &'static str;

    /// Render a tree with fresh per-render state.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if the output document cannot be built.
    fn render_tree(
        &self,
        root: &Node,
        filter: &dyn UrlOutputFilter,
    ) -> Result<Self::Output, RenderError>;
}

impl OutputFormat for HtmlRenderer {
    type Output = String;

    const CONTENT_TYPE: &'static str = "text/html; charset=utf-8";

    fn render_tree(
        &self,
        root: &Node,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, RenderError> {
        Ok(self.render(root, filter))
    }
}

impl OutputFormat for DocbookRenderer {
    type Output = String;

    const CONTENT_TYPE: &'static str = "text/xml; charset=utf-8";

    fn render_tree(
        &self,
        root: &Node,
        filter: &dyn UrlOutputFilter,
    ) -> Result<String, RenderError> {
        self.render_to_string(root, filter)
    }
}

/// Rendered output tagged with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered<T> {
    pub content_type: &'static str,
    pub body: T,
}

/// Options shared by the output formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// CSS marker class for HTML output.
    pub css_class: String,
    /// Bound on nested macro expansions.
    pub max_macro_depth: usize,
    /// `xml:lang` of Docbook articles.
    pub docbook_lang: String,
    /// Indent width of serialized Docbook.
    pub docbook_indent: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            css_class: DEFAULT_CSS_CLASS.to_owned(),
            max_macro_depth: DEFAULT_MAX_DEPTH,
            docbook_lang: "en".to_owned(),
            docbook_indent: 2,
        }
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            css_class: config.render.css_class.clone(),
            max_macro_depth: config.render.max_macro_depth,
            docbook_lang: config.docbook.lang.clone(),
            docbook_indent: config.docbook.indent,
        }
    }
}

/// Parses, expands and renders wiki pages.
///
/// A renderer holds no per-render state and can be shared between threads;
/// every render call starts from fresh directive and section state.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use wiki_renderer::{IdentityFilter, WikiRenderer};
/// use wiki_storage::{MockPageStore, PageInfo, PageReference};
///
/// let store = Arc::new(MockPageStore::new().with_page("Other", "x"));
/// let renderer = WikiRenderer::from_config(&Default::default(), store);
///
/// let page = PageInfo::new(PageReference::local("Home"), "See [[Other]].");
/// let rendered = renderer.render_html(&page, &IdentityFilter);
/// assert_eq!(rendered.content_type, "text/html; charset=utf-8");
/// assert_eq!(
///     rendered.body,
///     "<p class='wiki-content'>See <a class='existing-page' href='/pages/Other'>Other</a>.</p>"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct WikiRenderer {
    parser: CreoleParser,
    macros: MacroRegistry,
    options: RenderOptions,
    html: HtmlRenderer,
    docbook: DocbookRenderer,
}

impl WikiRenderer {
    /// Create a renderer around a parser, with no macros and default options.
    #[must_use]
    pub fn new(parser: CreoleParser) -> Self {
        Self {
            parser,
            macros: MacroRegistry::new(),
            options: RenderOptions::default(),
            html: HtmlRenderer::new(),
            docbook: DocbookRenderer::new(),
        }
    }

    /// Create a renderer using the built-in link and image handlers.
    #[must_use]
    pub fn from_context(context: Arc<LinkResolutionContext>) -> Self {
        Self::new(CreoleParser::with_context(context))
    }

    /// Create a renderer from configuration over a page store.
    #[must_use]
    pub fn from_config(config: &Config, store: Arc<dyn PageStore>) -> Self {
        let context = Arc::new(LinkResolutionContext::from_config(&config.links, store));
        let images =
            SimpleImages::new(Arc::clone(&context)).with_css_class(&config.render.css_class);
        let parser = CreoleParser::new(
            HandlerRef::new(SimpleAnchors::new(context)),
            HandlerRef::new(images),
        );
        Self::new(parser).with_options(RenderOptions::from(config))
    }

    /// Set the macro registry.
    #[must_use]
    pub fn with_macros(mut self, macros: MacroRegistry) -> Self {
        self.macros = macros;
        self
    }

    /// Set rendering options.
    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.html = HtmlRenderer::with_css_class(&options.css_class);
        self.docbook = DocbookRenderer::new()
            .with_lang(options.docbook_lang.as_str())
            .with_indent(options.docbook_indent);
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    #[must_use]
    pub fn parser(&self) -> &CreoleParser {
        &self.parser
    }

    /// Parse a page and expand its macros.
    #[must_use]
    pub fn parse(&self, page: &PageInfo) -> Node {
        let tree = self.parser.parse(&page.reference, &page.content);
        MacroExpander::new(&self.macros, &self.parser)
            .with_max_depth(self.options.max_macro_depth)
            .expand(&page.reference, &tree)
    }

    /// Render a page in the given format.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if the format cannot build its output document.
    pub fn render<F: OutputFormat>(
        &self,
        format: &F,
        page: &PageInfo,
        filter: &dyn UrlOutputFilter,
    ) -> Result<Rendered<F::Output>, RenderError> {
        tracing::debug!(page = %page.reference, content_type = F::CONTENT_TYPE, "Rendering page");
        let tree = self.parse(page);
        let body = format.render_tree(&tree, filter)?;
        Ok(Rendered {
            content_type: F::CONTENT_TYPE,
            body,
        })
    }

    /// Render a page to an HTML fragment.
    #[must_use]
    pub fn render_html(&self, page: &PageInfo, filter: &dyn UrlOutputFilter) -> Rendered<String> {
        let tree = self.parse(page);
        Rendered {
            content_type: HtmlRenderer::CONTENT_TYPE,
            body: self.html.render(&tree, filter),
        }
    }

    /// Render a page to a serialized Docbook document.
    ///
    /// Construction failures produce an `error: ...` body instead of an error.
    #[must_use]
    pub fn render_docbook(
        &self,
        page: &PageInfo,
        filter: &dyn UrlOutputFilter,
    ) -> Rendered<String> {
        match self.render(&self.docbook, page, filter) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(page = %page.reference, error = %e, "Docbook rendering failed");
                Rendered {
                    content_type: DocbookRenderer::CONTENT_TYPE,
                    body: format!("error: {e}"),
                }
            }
        }
    }

    /// Fetch the latest revision of a page and render it.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Storage` if the page cannot be fetched, or the
    /// format's error if rendering fails.
    pub fn render_reference<F: OutputFormat>(
        &self,
        store: &dyn PageStore,
        reference: &PageReference,
        format: &F,
        filter: &dyn UrlOutputFilter,
    ) -> Result<Rendered<F::Output>, RenderError> {
        let page = store.get(reference, None)?;
        self.render(format, &page, filter)
    }

    /// The configured HTML format.
    #[must_use]
    pub fn html(&self) -> &HtmlRenderer {
        &self.html
    }

    /// The configured Docbook format.
    #[must_use]
    pub fn docbook(&self) -> &DocbookRenderer {
        &self.docbook
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wiki_storage::{MockPageStore, StorageErrorKind};

    use super::*;
    use crate::links::IdentityFilter;
    use crate::macros::{FnMacro, MacroOutput};

    fn store() -> Arc<MockPageStore> {
        Arc::new(
            MockPageStore::new()
                .with_page("FrontPage", "= Front =\n**hello**")
                .with_page("Other", "x"),
        )
    }

    fn renderer() -> WikiRenderer {
        WikiRenderer::from_config(&Config::default(), store())
    }

    fn page(content: &str) -> PageInfo {
        PageInfo::new(PageReference::local("Current"), content)
    }

    #[test]
    fn test_renderer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WikiRenderer>();
    }

    #[test]
    fn test_render_html_content_type() {
        let rendered = renderer().render_html(&page("a"), &IdentityFilter);
        assert_eq!(rendered.content_type, "text/html; charset=utf-8");
        assert_eq!(rendered.body, "<p class='wiki-content'>a</p>");
    }

    #[test]
    fn test_render_docbook_content_type() {
        let rendered = renderer().render_docbook(&page("= T =\na"), &IdentityFilter);
        assert_eq!(rendered.content_type, "text/xml; charset=utf-8");
        assert!(rendered.body.starts_with("<?xml"));
        assert!(rendered.body.contains(r#"xml:lang="en""#));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.render.css_class = "wiki".to_owned();
        config.docbook.lang = "fr".to_owned();
        let renderer = WikiRenderer::from_config(&config, store());

        assert_eq!(renderer.options().css_class, "wiki");
        let html = renderer.render_html(&page("----"), &IdentityFilter);
        assert_eq!(html.body, "<hr class='wiki' />");
        let xml = renderer.render_docbook(&page("a"), &IdentityFilter);
        assert!(xml.body.contains(r#"xml:lang="fr""#));
    }

    #[test]
    fn test_url_filter_applied() {
        let filter = |url: &str| format!("https://wiki.example.com{url}");
        let rendered = renderer().render_html(&page("[[Other]]"), &filter);
        assert_eq!(
            rendered.body,
            "<p class='wiki-content'><a class='existing-page' \
             href='https://wiki.example.com/pages/Other'>Other</a></p>"
        );
    }

    #[test]
    fn test_macros_expanded_before_render() {
        let macros = MacroRegistry::new().with_macro(FnMacro::new(
            "greet",
            |_: &PageReference, args: &str| Ok(MacroOutput::Wiki(format!("**{args}**"))),
        ));
        let renderer = renderer().with_macros(macros);
        let rendered = renderer.render_html(&page("Hi <<greet:you>>!"), &IdentityFilter);
        assert_eq!(
            rendered.body,
            "<p class='wiki-content'>Hi <strong class='wiki-content'>you</strong>!</p>"
        );
    }

    #[test]
    fn test_render_reference() {
        let renderer = renderer();
        let store = store();
        let rendered = renderer
            .render_reference(
                store.as_ref(),
                &PageReference::local("FrontPage"),
                renderer.html(),
                &IdentityFilter,
            )
            .unwrap();
        assert_eq!(
            rendered.body,
            "<h1 class='wiki-content'>Front</h1>\
             <p class='wiki-content'><strong class='wiki-content'>hello</strong></p>"
        );
    }

    #[test]
    fn test_render_reference_missing_page() {
        let renderer = renderer();
        let store = store();
        let err = renderer
            .render_reference(
                store.as_ref(),
                &PageReference::local("Nope"),
                renderer.docbook(),
                &IdentityFilter,
            )
            .unwrap_err();
        match err {
            RenderError::Storage(e) => assert_eq!(e.kind, StorageErrorKind::NotFound),
            RenderError::Xml(message) => panic!("unexpected XML error: {message}"),
        }
    }
}
