//! Inline markup: emphasis, links, images, verbatim spans, macros and directives.
//!
//! Scanning is leftmost-first. Paired spans (`**`, `//`, `--`) close at the
//! first matching delimiter that is not inside a verbatim span, link, image,
//! macro, escape or raw URL, so the earliest-opening, shortest span wins.
//! Unterminated or empty spans are emitted as literal delimiter text.

use std::sync::LazyLock;

use regex::Regex;
use wiki_storage::PageReference;

use super::CreoleParser;
use crate::ast::{Directive, LinkNode, MacroInvocation, Node, NodeKind, push_node, push_text};
use crate::links::{HandlerRef, LinkParts};

/// Opening tag of an inline code span.
static CODE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[<([A-Za-z0-9_+#.-]+)>\]").expect("invalid code regex"));

/// URL recognized without link brackets.
static RAW_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:(?:https?|ftp)://|mailto:)[^\s<>"|\[\]{}]+"#).expect("invalid URL regex")
});

/// Macro and directive names.
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]*$").expect("invalid name regex"));

/// Characters not treated as part of a trailing raw URL.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Outcome of scanning at one position.
enum Scan {
    /// A node spanning the given number of bytes.
    Node(Node, usize),
    /// Literal text spanning the given number of source bytes.
    Literal(String, usize),
}

pub(super) struct InlineParser<'a> {
    parser: &'a CreoleParser,
    page: &'a PageReference,
}

impl<'a> InlineParser<'a> {
    pub(super) fn new(parser: &'a CreoleParser, page: &'a PageReference) -> Self {
        Self { parser, page }
    }

    pub(super) fn parse(&self, text: &str) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < text.len() {
            match self.scan(text, i) {
                Scan::Node(node, len) => {
                    push_text(&mut nodes, &literal, true);
                    literal.clear();
                    push_node(&mut nodes, node);
                    i += len;
                }
                Scan::Literal(s, len) => {
                    literal.push_str(&s);
                    i += len;
                }
            }
        }

        push_text(&mut nodes, &literal, true);
        nodes
    }

    fn scan(&self, text: &str, i: usize) -> Scan {
        let rest = &text[i..];

        if let Some(len) = raw_url_len(text, i) {
            let url = &rest[..len];
            return Scan::Node(self.link(url, url, self.parser.link_handler()), len);
        }

        if rest.starts_with('~') {
            return match rest[1..].chars().next() {
                Some(c) if !c.is_whitespace() => Scan::Literal(c.to_string(), 1 + c.len_utf8()),
                _ => Scan::Literal("~".to_owned(), 1),
            };
        }

        if rest.starts_with("{{{") {
            return match nowiki_end(text, i + 3) {
                Some((content_end, end)) => Scan::Node(
                    Node::leaf(NodeKind::InlineNowiki(text[i + 3..content_end].to_owned())),
                    end - i,
                ),
                None => Scan::Literal("{{{".to_owned(), 3),
            };
        }

        if rest.starts_with("{{") {
            return match closed_len(rest, "{{", "}}") {
                Some(len) => self
                    .image_or_anchor(&rest[2..len - 2])
                    .map_or_else(|| Scan::Literal("{{".to_owned(), 2), |node| Scan::Node(node, len)),
                None => Scan::Literal("{{".to_owned(), 2),
            };
        }

        if rest.starts_with("[[") {
            return match closed_len(rest, "[[", "]]") {
                Some(len) => self
                    .link_token(&rest[2..len - 2])
                    .map_or_else(|| Scan::Literal("[[".to_owned(), 2), |node| Scan::Node(node, len)),
                None => Scan::Literal("[[".to_owned(), 2),
            };
        }

        if let Some((language, content_start, content_end, end)) = inline_code(rest) {
            let node = Node::leaf(NodeKind::InlineCode {
                text: rest[content_start..content_end].to_owned(),
                language: Some(language.to_owned()),
            });
            return Scan::Node(node, end);
        }

        if rest.starts_with("<<") {
            return match closed_len(rest, "<<", ">>") {
                Some(len) => macro_or_directive(&rest[2..len - 2])
                    .map_or_else(|| Scan::Literal("<<".to_owned(), 2), |node| Scan::Node(node, len)),
                None => Scan::Literal("<<".to_owned(), 2),
            };
        }

        if rest.starts_with("\\\\") {
            return Scan::Node(Node::leaf(NodeKind::Linebreak), 2);
        }

        for (delim, kind) in [
            ("**", NodeKind::Bold),
            ("//", NodeKind::Italic),
            ("--", NodeKind::Strikethrough),
        ] {
            if rest.starts_with(delim) {
                return self.span(text, i, delim, kind);
            }
        }

        let c = rest.chars().next().unwrap_or_default();
        Scan::Literal(c.to_string(), c.len_utf8().max(1))
    }

    fn span(&self, text: &str, i: usize, delim: &str, kind: NodeKind) -> Scan {
        let start = i + delim.len();
        match find_closing(text, start, delim) {
            Some(end) if end > start => {
                let children = self.parse(&text[start..end]);
                Scan::Node(Node::new(kind, children), end + delim.len() - i)
            }
            _ => Scan::Literal(delim.to_owned(), delim.len()),
        }
    }

    fn link_token(&self, body: &str) -> Option<Node> {
        let (target, title) = split_title(body);
        if target.is_empty() {
            return None;
        }
        Some(self.link(target, title.unwrap_or(target), self.parser.link_handler()))
    }

    fn image_or_anchor(&self, body: &str) -> Option<Node> {
        if let Some(id) = body.strip_prefix('#') {
            let id = id.trim();
            return (!id.is_empty()).then(|| Node::leaf(NodeKind::Anchor(id.to_owned())));
        }
        let (target, alt) = split_title(body);
        if target.is_empty() {
            return None;
        }
        Some(self.image(target, alt.unwrap_or(target)))
    }

    fn link(&self, target: &str, title: &str, handler: &HandlerRef) -> Node {
        Node::leaf(NodeKind::Link(Box::new(self.link_node(target, title, handler))))
    }

    fn image(&self, target: &str, alt: &str) -> Node {
        Node::leaf(NodeKind::Image(Box::new(self.link_node(
            target,
            alt,
            self.parser.image_handler(),
        ))))
    }

    fn link_node(&self, target: &str, title: &str, handler: &HandlerRef) -> LinkNode {
        LinkNode {
            target: target.to_owned(),
            title: title.to_owned(),
            parts: LinkParts::parse(target, title),
            page: self.page.clone(),
            handler: handler.clone(),
        }
    }
}

/// Split `target|title`, trimming both.
fn split_title(body: &str) -> (&str, Option<&str>) {
    match body.split_once('|') {
        Some((target, title)) => {
            let title = title.trim();
            (target.trim(), (!title.is_empty()).then_some(title))
        }
        None => (body.trim(), None),
    }
}

/// Parse `<<...>>` content as a directive (`+name`, `-name`) or macro.
fn macro_or_directive(body: &str) -> Option<Node> {
    let (sign, body) = if let Some(rest) = body.strip_prefix('+') {
        (Some(true), rest)
    } else if let Some(rest) = body.strip_prefix('-') {
        (Some(false), rest)
    } else {
        (None, body)
    };

    let (name, args) = match body.split_once(':') {
        Some((name, args)) => (name, Some(args)),
        None => (body, None),
    };
    if !NAME.is_match(name) {
        return None;
    }

    let kind = match sign {
        Some(enabled) => NodeKind::Directive(Directive::parse_args(name, enabled, args)),
        None => NodeKind::Macro(MacroInvocation {
            name: name.to_owned(),
            args: args.map(str::trim).unwrap_or_default().to_owned(),
            block: false,
        }),
    };
    Some(Node::leaf(kind))
}

/// Length of a token opened by `open` and closed by the first following `close`.
fn closed_len(rest: &str, open: &str, close: &str) -> Option<usize> {
    rest[open.len()..]
        .find(close)
        .map(|pos| open.len() + pos + close.len())
}

/// End of an inline nowiki span whose content starts at `from`.
///
/// Returns the content end and the token end; extra `}` before the closing
/// `}}}` belong to the content.
fn nowiki_end(text: &str, from: usize) -> Option<(usize, usize)> {
    let close = from + text[from..].find("}}}")?;
    let mut end = close + 3;
    while text[end..].starts_with('}') {
        end += 1;
    }
    Some((end - 3, end))
}

/// Inline code span at the start of `rest`.
///
/// Returns the language, the content range and the token length.
fn inline_code(rest: &str) -> Option<(&str, usize, usize, usize)> {
    let caps = CODE_OPEN.captures(rest)?;
    let open = caps.get(0)?;
    let language = caps.get(1)?.as_str();
    let close = format!("[</{language}>]");
    let content_end = open.end() + rest[open.end()..].find(&close)?;
    Some((language, open.end(), content_end, content_end + close.len()))
}

/// Length of a raw URL starting at `i`, if one starts there at a word boundary.
fn raw_url_len(text: &str, i: usize) -> Option<usize> {
    let at_word_start = text[..i]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphanumeric());
    if !at_word_start {
        return None;
    }
    let found = RAW_URL.find(&text[i..])?;
    let url = found.as_str().trim_end_matches(URL_TRAILING);
    RAW_URL
        .find(url)
        .filter(|m| m.end() == url.len())
        .map(|_| url.len())
}

/// Length of a construct at `j` that a closing delimiter cannot appear inside.
fn atomic_len(text: &str, j: usize) -> Option<usize> {
    let rest = &text[j..];
    if let Some(after) = rest.strip_prefix('~') {
        return after
            .chars()
            .next()
            .filter(|c| !c.is_whitespace())
            .map(|c| 1 + c.len_utf8());
    }
    if rest.starts_with("{{{") {
        return nowiki_end(text, j + 3).map(|(_, end)| end - j);
    }
    if rest.starts_with("{{") {
        return closed_len(rest, "{{", "}}");
    }
    if rest.starts_with("[[") {
        return closed_len(rest, "[[", "]]");
    }
    if rest.starts_with("<<") {
        return closed_len(rest, "<<", ">>");
    }
    if let Some((_, _, _, end)) = inline_code(rest) {
        return Some(end);
    }
    raw_url_len(text, j)
}

/// Position of the first `delim` at or after `from` outside atomic constructs.
fn find_closing(text: &str, from: usize, delim: &str) -> Option<usize> {
    let mut j = from;
    while j < text.len() {
        let rest = &text[j..];
        if rest.starts_with(delim) {
            return Some(j);
        }
        if let Some(len) = atomic_len(text, j) {
            j += len;
            continue;
        }
        j += rest.chars().next().map_or(1, char::len_utf8);
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::test_support::{page, parser};
    use super::*;

    fn inline(text: &str) -> Vec<Node> {
        parser().parse_inline(&page(), text)
    }

    fn styled(kind: NodeKind, children: Vec<Node>) -> Node {
        Node::new(kind, children)
    }

    #[test]
    fn test_plain_text_is_single_node() {
        assert_eq!(inline("just text"), vec![Node::text("just text")]);
    }

    #[test]
    fn test_bold_italic_strike() {
        assert_eq!(
            inline("a **b** //c// --d--"),
            vec![
                Node::text("a "),
                styled(NodeKind::Bold, vec![Node::text("b")]),
                Node::text(" "),
                styled(NodeKind::Italic, vec![Node::text("c")]),
                Node::text(" "),
                styled(NodeKind::Strikethrough, vec![Node::text("d")]),
            ]
        );
    }

    #[test]
    fn test_nested_spans() {
        assert_eq!(
            inline("**bold //both//**"),
            vec![styled(
                NodeKind::Bold,
                vec![
                    Node::text("bold "),
                    styled(NodeKind::Italic, vec![Node::text("both")]),
                ]
            )]
        );
    }

    #[test]
    fn test_unterminated_bold_is_literal() {
        assert_eq!(inline("a **b c"), vec![Node::text("a **b c")]);
    }

    #[test]
    fn test_overlap_resolves_leftmost_first() {
        assert_eq!(
            inline("**a //b** c//"),
            vec![
                styled(NodeKind::Bold, vec![Node::text("a //b")]),
                Node::text(" c//"),
            ]
        );
    }

    #[test]
    fn test_empty_span_is_literal() {
        assert_eq!(inline("****"), vec![Node::text("****")]);
    }

    #[test]
    fn test_escape() {
        assert_eq!(inline("~**not bold~**"), vec![Node::text("**not bold**")]);
        assert_eq!(inline("~ tilde"), vec![Node::text("~ tilde")]);
    }

    #[test]
    fn test_inline_nowiki_suppresses_markup() {
        assert_eq!(
            inline("x {{{**raw**}}}} y"),
            vec![
                Node::text("x "),
                Node::leaf(NodeKind::InlineNowiki("**raw**}".to_owned())),
                Node::text(" y"),
            ]
        );
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            inline("run [<sh>]ls **[</sh>] now"),
            vec![
                Node::text("run "),
                Node::leaf(NodeKind::InlineCode {
                    text: "ls **".to_owned(),
                    language: Some("sh".to_owned()),
                }),
                Node::text(" now"),
            ]
        );
    }

    #[test]
    fn test_link_with_title() {
        let nodes = inline("see [[FrontPage|the front]]");
        assert_eq!(nodes.len(), 2);
        let NodeKind::Link(link) = nodes[1].kind() else {
            panic!("expected link, got {:?}", nodes[1]);
        };
        assert_eq!(link.target, "FrontPage");
        assert_eq!(link.title, "the front");
        assert_eq!(link.parts.page_name.as_deref(), Some("FrontPage"));
        assert_eq!(link.page, page());
    }

    #[test]
    fn test_link_title_defaults_to_target() {
        let nodes = inline("[[FrontPage]]");
        let NodeKind::Link(link) = nodes[0].kind() else {
            panic!("expected link");
        };
        assert_eq!(link.title, "FrontPage");
    }

    #[test]
    fn test_bold_does_not_close_inside_link() {
        let nodes = inline("**a [[x|b**c]] d**");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), &NodeKind::Bold);
        assert_eq!(nodes[0].children().len(), 3);
    }

    #[test]
    fn test_image_and_anchor() {
        let nodes = inline("{{logo.png|Logo}}{{#top}}");
        let NodeKind::Image(image) = nodes[0].kind() else {
            panic!("expected image");
        };
        assert_eq!(image.target, "logo.png");
        assert_eq!(image.title, "Logo");
        assert_eq!(nodes[1].kind(), &NodeKind::Anchor("top".to_owned()));
    }

    #[test]
    fn test_raw_url() {
        let nodes = inline("visit https://example.com/a, then //rest//");
        let NodeKind::Link(link) = nodes[1].kind() else {
            panic!("expected link, got {nodes:?}");
        };
        assert_eq!(link.target, "https://example.com/a");
        assert!(link.parts.is_uri());
        assert_eq!(nodes[2], Node::text(", then "));
        assert_eq!(nodes[3].kind(), &NodeKind::Italic);
    }

    #[test]
    fn test_url_inside_word_is_text() {
        assert_eq!(inline("xhttp://a"), vec![Node::text("xhttp://a")]);
    }

    #[test]
    fn test_italic_skips_url() {
        let nodes = inline("//see http://a.org now//");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), &NodeKind::Italic);
    }

    #[test]
    fn test_linebreak() {
        assert_eq!(
            inline("a\\\\b"),
            vec![
                Node::text("a"),
                Node::leaf(NodeKind::Linebreak),
                Node::text("b")
            ]
        );
    }

    #[test]
    fn test_directive_and_macro() {
        assert_eq!(
            inline("<<+table-alignment:top>><<-table-alignment>><<toc:depth=2>>"),
            vec![
                Node::leaf(NodeKind::Directive(Directive::parse_args(
                    "table-alignment",
                    true,
                    Some("top")
                ))),
                Node::leaf(NodeKind::Directive(Directive::parse_args(
                    "table-alignment",
                    false,
                    None
                ))),
                Node::leaf(NodeKind::Macro(MacroInvocation {
                    name: "toc".to_owned(),
                    args: "depth=2".to_owned(),
                    block: false,
                })),
            ]
        );
    }

    #[test]
    fn test_invalid_macro_is_literal() {
        assert_eq!(inline("a << b >> c"), vec![Node::text("a << b >> c")]);
        assert_eq!(inline("<<unclosed"), vec![Node::text("<<unclosed")]);
    }
}
