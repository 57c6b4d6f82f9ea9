//! Block structure: headings, paragraphs, lists, tables, quotes and verbatim blocks.

use std::sync::LazyLock;

use regex::Regex;
use wiki_storage::PageReference;

use super::CreoleParser;
use super::inline::InlineParser;
use crate::ast::{MacroInvocation, Node, NodeKind};

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(=+)\s*(.*?)\s*=*\s*$").expect("invalid heading regex")
});

static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-{4,}\s*$").expect("invalid rule regex"));

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([*#]+)\s*(.*)$").expect("invalid list regex"));

static CODE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[<([A-Za-z0-9_+#.-]+)>\]\s*$").expect("invalid code tag regex")
});

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*```\s*([A-Za-z0-9_+#.-]*)\s*$").expect("invalid code fence regex")
});

/// Deepest blockquote or list nesting; deeper markers are kept as text or clamped.
const MAX_NESTING: usize = 32;

/// One line of a list.
struct ListLine {
    depth: usize,
    ordered: bool,
    text: String,
}

pub(super) struct BlockParser<'a> {
    parser: &'a CreoleParser,
    page: &'a PageReference,
    quote_depth: usize,
}

impl<'a> BlockParser<'a> {
    pub(super) fn new(parser: &'a CreoleParser, page: &'a PageReference) -> Self {
        Self {
            parser,
            page,
            quote_depth: 0,
        }
    }

    pub(super) fn parse(&self, text: &str) -> Vec<Node> {
        let lines: Vec<&str> = text.lines().collect();
        let mut blocks = Vec::new();
        let mut paragraph: Vec<&str> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            if line.trim().is_empty() {
                self.flush_paragraph(&mut paragraph, &mut blocks);
                i += 1;
                continue;
            }
            if let Some((nodes, next)) = self.block_at(&lines, i) {
                self.flush_paragraph(&mut paragraph, &mut blocks);
                blocks.extend(nodes);
                i = next;
                continue;
            }
            paragraph.push(line);
            i += 1;
        }

        self.flush_paragraph(&mut paragraph, &mut blocks);
        blocks
    }

    fn inline(&self, text: &str) -> Vec<Node> {
        InlineParser::new(self.parser, self.page).parse(text)
    }

    /// Try every block construct starting at line `i`.
    ///
    /// Returns the produced nodes and the index of the first unconsumed line.
    fn block_at(&self, lines: &[&str], i: usize) -> Option<(Vec<Node>, usize)> {
        let line = lines[i];

        if line.trim() == "{{{" {
            return nowiki_block(lines, i).map(|(node, next)| (vec![node], next));
        }
        if let Some(caps) = CODE_TAG.captures(line) {
            let language = &caps[1];
            let close = format!("[</{language}>]");
            return verbatim_until(lines, i, |l| l.trim() == close)
                .map(|(text, next)| (vec![code(text, Some(language))], next));
        }
        if let Some(caps) = CODE_FENCE.captures(line) {
            let language = caps.get(1).map(|m| m.as_str()).filter(|l| !l.is_empty());
            return verbatim_until(lines, i, |l| l.trim() == "```")
                .map(|(text, next)| (vec![code(text, language)], next));
        }
        if let Some(caps) = HEADING.captures(line) {
            let level = caps[1].len();
            return Some((vec![Node::heading(level, self.inline(&caps[2]))], i + 1));
        }
        if RULE.is_match(line) {
            return Some((vec![Node::leaf(NodeKind::HorizontalRule)], i + 1));
        }
        if line.trim_start().starts_with('|') {
            return Some(self.table(lines, i));
        }
        if self.starts_quote(line) {
            return Some(self.blockquote(lines, i));
        }
        if starts_list(line) {
            return Some(self.list(lines, i));
        }
        None
    }

    /// Whether line `i` would end a list, without parsing the block it opens.
    fn starts_block(&self, lines: &[&str], i: usize) -> bool {
        let line = lines[i];
        if line.trim() == "{{{" {
            return verbatim_until(lines, i, |l| l.trim_end() == "}}}").is_some();
        }
        if let Some(caps) = CODE_TAG.captures(line) {
            let close = format!("[</{}>]", &caps[1]);
            return verbatim_until(lines, i, |l| l.trim() == close).is_some();
        }
        if CODE_FENCE.is_match(line) {
            return verbatim_until(lines, i, |l| l.trim() == "```").is_some();
        }
        HEADING.is_match(line)
            || RULE.is_match(line)
            || line.trim_start().starts_with('|')
            || self.starts_quote(line)
            || starts_list(line)
    }

    fn starts_quote(&self, line: &str) -> bool {
        line.starts_with('>') && self.quote_depth < MAX_NESTING
    }

    fn flush_paragraph(&self, lines: &mut Vec<&str>, blocks: &mut Vec<Node>) {
        if lines.is_empty() {
            return;
        }
        let text = lines.join("\n");
        lines.clear();
        blocks.extend(self.paragraph(text.trim()));
    }

    /// A paragraph, or a block macro or bare directives when that is all it holds.
    fn paragraph(&self, text: &str) -> Vec<Node> {
        let inline = self.inline(text);
        let significant: Vec<&Node> = inline.iter().filter(|n| !is_blank_text(n)).collect();

        if let [single] = significant.as_slice()
            && let NodeKind::Macro(invocation) = single.kind()
        {
            return vec![Node::leaf(NodeKind::Macro(MacroInvocation {
                block: true,
                ..invocation.clone()
            }))];
        }

        if !significant.is_empty()
            && significant
                .iter()
                .all(|n| matches!(n.kind(), NodeKind::Directive(_)))
        {
            return significant.into_iter().cloned().collect();
        }

        vec![Node::new(NodeKind::Paragraph, inline)]
    }

    fn table(&self, lines: &[&str], start: usize) -> (Vec<Node>, usize) {
        let mut rows = Vec::new();
        let mut i = start;
        while i < lines.len() && lines[i].trim_start().starts_with('|') {
            let cells = split_cells(lines[i].trim())
                .into_iter()
                .map(|cell| {
                    let cell = cell.trim();
                    match cell.strip_prefix('=') {
                        Some(header) => {
                            Node::new(NodeKind::TableHeaderCell, self.inline(header.trim()))
                        }
                        None => Node::new(NodeKind::TableCell, self.inline(cell)),
                    }
                })
                .collect();
            rows.push(Node::new(NodeKind::TableRow, cells));
            i += 1;
        }
        (vec![Node::new(NodeKind::Table, rows)], i)
    }

    fn blockquote(&self, lines: &[&str], start: usize) -> (Vec<Node>, usize) {
        let mut quoted = Vec::new();
        let mut i = start;
        while i < lines.len()
            && let Some(rest) = lines[i].strip_prefix('>')
        {
            quoted.push(rest.strip_prefix(' ').unwrap_or(rest));
            i += 1;
        }
        let nested = BlockParser {
            quote_depth: self.quote_depth + 1,
            ..*self
        };
        let children = nested.parse(&quoted.join("\n"));
        (vec![Node::new(NodeKind::Blockquote, children)], i)
    }

    fn list(&self, lines: &[&str], start: usize) -> (Vec<Node>, usize) {
        let mut items: Vec<ListLine> = Vec::new();
        let mut i = start;

        while i < lines.len() {
            let line = lines[i];
            if line.trim().is_empty() {
                break;
            }
            if let Some(caps) = LIST_ITEM.captures(line) {
                let marker = &caps[2];
                items.push(ListLine {
                    depth: (marker.len() + caps[1].chars().count() / 2).min(MAX_NESTING),
                    ordered: marker.ends_with('#'),
                    text: caps[3].to_owned(),
                });
                i += 1;
                continue;
            }
            if self.starts_block(lines, i) {
                break;
            }
            // Continuation of the previous item.
            if let Some(last) = items.last_mut() {
                last.text.push('\n');
                last.text.push_str(line.trim());
            }
            i += 1;
        }

        let mut lists = Vec::new();
        let mut pos = 0;
        while pos < items.len() {
            lists.push(self.build_list(&items, &mut pos));
        }
        (lists, i)
    }

    /// Build one list from `items[*pos..]`, nesting deeper items under the preceding entry.
    fn build_list(&self, items: &[ListLine], pos: &mut usize) -> Node {
        let depth = items[*pos].depth;
        let ordered = items[*pos].ordered;
        let mut entries: Vec<Vec<Node>> = Vec::new();

        while *pos < items.len() {
            let item = &items[*pos];
            if item.depth < depth {
                break;
            }
            if item.depth > depth {
                let nested = self.build_list(items, pos);
                match entries.last_mut() {
                    Some(entry) => entry.push(nested),
                    None => entries.push(vec![nested]),
                }
                continue;
            }
            if item.ordered != ordered && !entries.is_empty() {
                break;
            }
            entries.push(self.inline(item.text.trim()));
            *pos += 1;
        }

        let kind = if ordered {
            NodeKind::OrderedList
        } else {
            NodeKind::UnorderedList
        };
        Node::new(
            kind,
            entries
                .into_iter()
                .map(|children| Node::new(NodeKind::ListItem, children))
                .collect(),
        )
    }
}

fn code(text: String, language: Option<&str>) -> Node {
    Node::leaf(NodeKind::Code {
        text,
        language: language.map(str::to_owned),
    })
}

/// Whether a line opens a new list outside of one.
fn starts_list(line: &str) -> bool {
    LIST_ITEM
        .captures(line)
        .is_some_and(|caps| caps[2].len() == 1)
}

fn is_blank_text(node: &Node) -> bool {
    matches!(node.kind(), NodeKind::Text { text, .. } if text.trim().is_empty())
}

/// Collect lines after `start` up to the closing line matched by `is_close`.
///
/// Returns `None` when the block is never closed.
fn verbatim_until(
    lines: &[&str],
    start: usize,
    is_close: impl Fn(&str) -> bool,
) -> Option<(String, usize)> {
    let close = lines[start + 1..].iter().position(|l| is_close(l))? + start + 1;
    Some((lines[start + 1..close].join("\n"), close + 1))
}

/// A `{{{` ... `}}}` block; a line ` }}}` inside stands for a literal `}}}`.
fn nowiki_block(lines: &[&str], start: usize) -> Option<(Node, usize)> {
    let (text, next) = verbatim_until(lines, start, |l| l.trim_end() == "}}}")?;
    let text = text
        .lines()
        .map(|l| {
            let mut chars = l.chars();
            if l.trim() == "}}}" && chars.next().is_some_and(char::is_whitespace) {
                chars.as_str()
            } else {
                l
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some((Node::leaf(NodeKind::Nowiki(text)), next))
}

/// Split a table row into raw cell texts.
///
/// `|` inside links, images, nowiki spans, macros and after `~` do not separate cells.
/// A trailing `|` is optional.
fn split_cells(row: &str) -> Vec<&str> {
    let row = row.strip_prefix('|').unwrap_or(row);
    let mut cells = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < row.len() {
        let rest = &row[i..];
        let skip = [("{{{", "}}}"), ("[[", "]]"), ("{{", "}}"), ("<<", ">>")]
            .iter()
            .find(|(open, _)| rest.starts_with(open))
            .and_then(|(open, close)| {
                rest[open.len()..]
                    .find(close)
                    .map(|pos| open.len() + pos + close.len())
            });
        if let Some(len) = skip {
            i += len;
            continue;
        }
        if rest.starts_with('~') {
            i += 1 + rest[1..].chars().next().map_or(0, char::len_utf8);
            continue;
        }
        if rest.starts_with('|') {
            cells.push(&row[start..i]);
            start = i + 1;
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }

    let last = &row[start..];
    if !last.trim().is_empty() {
        cells.push(last);
    }
    cells
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::test_support::{page, parser};
    use super::*;
    use crate::ast::Directive;

    fn blocks(text: &str) -> Vec<Node> {
        parser().parse_blocks(&page(), text)
    }

    fn kinds(nodes: &[Node]) -> Vec<&NodeKind> {
        nodes.iter().map(Node::kind).collect()
    }

    fn paragraph(text: &str) -> Node {
        Node::new(NodeKind::Paragraph, vec![Node::text(text)])
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        assert_eq!(
            blocks("one\ntwo\n\nthree"),
            vec![paragraph("one\ntwo"), paragraph("three")]
        );
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            blocks("= One =\n=== Three\n======== Deep ="),
            vec![
                Node::heading(1, vec![Node::text("One")]),
                Node::heading(3, vec![Node::text("Three")]),
                Node::heading(6, vec![Node::text("Deep")]),
            ]
        );
    }

    #[test]
    fn test_heading_interrupts_paragraph() {
        assert_eq!(
            blocks("text\n== Next =="),
            vec![paragraph("text"), Node::heading(2, vec![Node::text("Next")])]
        );
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(
            kinds(&blocks("a\n----\nb")),
            vec![
                &NodeKind::Paragraph,
                &NodeKind::HorizontalRule,
                &NodeKind::Paragraph
            ]
        );
        assert_eq!(kinds(&blocks("---")), vec![&NodeKind::Paragraph]);
    }

    #[test]
    fn test_nested_list() {
        let nodes = blocks("* a\n** b\n** c\n* d\n");
        assert_eq!(nodes.len(), 1);
        let list = &nodes[0];
        assert_eq!(list.kind(), &NodeKind::UnorderedList);
        assert_eq!(list.children().len(), 2);

        let first = &list.children()[0];
        assert_eq!(first.children()[0], Node::text("a"));
        let nested = &first.children()[1];
        assert_eq!(nested.kind(), &NodeKind::UnorderedList);
        assert_eq!(nested.children().len(), 2);
    }

    #[test]
    fn test_mixed_list_types() {
        let nodes = blocks("# one\n#* sub\n# two");
        let list = &nodes[0];
        assert_eq!(list.kind(), &NodeKind::OrderedList);
        assert_eq!(list.children().len(), 2);
        assert_eq!(
            list.children()[0].children()[1].kind(),
            &NodeKind::UnorderedList
        );
    }

    #[test]
    fn test_indentation_nests() {
        let nodes = blocks("* a\n  * b");
        let nested = &nodes[0].children()[0].children()[1];
        assert_eq!(nested.kind(), &NodeKind::UnorderedList);
    }

    #[test]
    fn test_list_continuation_line() {
        let nodes = blocks("* first\ncontinued\n* second");
        assert_eq!(nodes[0].children()[0].children(), &[Node::text("first\ncontinued")]);
    }

    #[test]
    fn test_bold_line_is_not_a_list() {
        let nodes = blocks("**bold** start");
        assert_eq!(kinds(&nodes), vec![&NodeKind::Paragraph]);
        assert_eq!(nodes[0].children()[0].kind(), &NodeKind::Bold);
    }

    #[test]
    fn test_table() {
        let nodes = blocks("|=A|=B|\n|1|[[x|y]]|\n|2|3");
        let table = &nodes[0];
        assert_eq!(table.kind(), &NodeKind::Table);
        assert_eq!(table.children().len(), 3);

        let header = &table.children()[0];
        assert_eq!(
            kinds(header.children()),
            vec![&NodeKind::TableHeaderCell, &NodeKind::TableHeaderCell]
        );
        assert_eq!(header.children()[0].children(), &[Node::text("A")]);

        let second = &table.children()[1];
        assert_eq!(second.children().len(), 2);
        assert!(matches!(
            second.children()[1].children()[0].kind(),
            NodeKind::Link(_)
        ));
        assert_eq!(table.children()[2].children().len(), 2);
    }

    #[test]
    fn test_split_cells_empty_cell() {
        assert_eq!(split_cells("|a||b|"), vec!["a", "", "b"]);
        assert_eq!(split_cells("|a~|b|"), vec!["a~|b"]);
    }

    #[test]
    fn test_blockquote_is_recursive() {
        let nodes = blocks("> = Quoted =\n> text\n>> deeper");
        assert_eq!(kinds(&nodes), vec![&NodeKind::Blockquote]);
        let inner = nodes[0].children();
        assert_eq!(
            kinds(inner),
            vec![
                &NodeKind::Heading(1),
                &NodeKind::Paragraph,
                &NodeKind::Blockquote
            ]
        );
    }

    #[test]
    fn test_nowiki_block() {
        assert_eq!(
            blocks("{{{\n**raw**\n }}}\n}}}"),
            vec![Node::leaf(NodeKind::Nowiki("**raw**\n}}}".to_owned()))]
        );
    }

    #[test]
    fn test_unclosed_nowiki_is_text() {
        let nodes = blocks("{{{\nnever closed");
        assert_eq!(kinds(&nodes), vec![&NodeKind::Paragraph]);
    }

    #[test]
    fn test_code_blocks() {
        assert_eq!(
            blocks("[<rust>]\nfn main() {}\n[</rust>]\n```\nplain\n```"),
            vec![
                code("fn main() {}".to_owned(), Some("rust")),
                code("plain".to_owned(), None),
            ]
        );
        assert_eq!(
            blocks("```python\nprint(1)\n```"),
            vec![code("print(1)".to_owned(), Some("python"))]
        );
    }

    #[test]
    fn test_block_macro() {
        assert_eq!(
            blocks("<<toc>>"),
            vec![Node::leaf(NodeKind::Macro(MacroInvocation {
                name: "toc".to_owned(),
                args: String::new(),
                block: true,
            }))]
        );
    }

    #[test]
    fn test_inline_macro_stays_in_paragraph() {
        let nodes = blocks("see <<toc>> here");
        assert_eq!(kinds(&nodes), vec![&NodeKind::Paragraph]);
    }

    #[test]
    fn test_directive_paragraph_yields_bare_directives() {
        assert_eq!(
            blocks("<<+table-alignment:top>>\n|a|"),
            vec![
                Node::leaf(NodeKind::Directive(Directive::parse_args(
                    "table-alignment",
                    true,
                    Some("top")
                ))),
                Node::new(
                    NodeKind::Table,
                    vec![Node::new(
                        NodeKind::TableRow,
                        vec![Node::new(NodeKind::TableCell, vec![Node::text("a")])]
                    )]
                ),
            ]
        );
    }

    #[test]
    fn test_nowiki_escaped_close_after_multibyte_whitespace() {
        assert_eq!(
            blocks("{{{\n\u{a0}}}}\n}}}"),
            vec![Node::leaf(NodeKind::Nowiki("}}}".to_owned()))]
        );
        assert_eq!(
            blocks("{{{\n\u{3000}}}}\n  }}}\n}}}"),
            vec![Node::leaf(NodeKind::Nowiki("}}}\n }}}".to_owned()))]
        );
    }

    #[test]
    fn test_quote_nesting_is_bounded() {
        let text = format!("{}x", ">".repeat(1000));
        let nodes = blocks(&text);

        let mut depth = 0;
        let mut current = nodes.as_slice();
        while let [node] = current
            && node.kind() == &NodeKind::Blockquote
        {
            depth += 1;
            current = node.children();
        }
        assert_eq!(depth, MAX_NESTING);
        assert_eq!(kinds(current), vec![&NodeKind::Paragraph]);
        assert_eq!(
            current[0].plain_text(),
            format!("{}x", ">".repeat(1000 - MAX_NESTING))
        );
    }

    #[test]
    fn test_list_depth_is_clamped() {
        let text = format!("* a\n{} b", "*".repeat(500));
        let nodes = blocks(&text);
        assert_eq!(kinds(&nodes), vec![&NodeKind::UnorderedList]);
        let nested = &nodes[0].children()[0].children()[1];
        assert_eq!(nested.kind(), &NodeKind::UnorderedList);
        assert_eq!(nested.children()[0].children(), &[Node::text("b")]);
    }

    #[test]
    fn test_list_ends_at_following_block() {
        assert_eq!(
            kinds(&blocks("* a\n|b|")),
            vec![&NodeKind::UnorderedList, &NodeKind::Table]
        );
        assert_eq!(
            kinds(&blocks("* a\n> quoted\n> more")),
            vec![&NodeKind::UnorderedList, &NodeKind::Blockquote]
        );
        assert_eq!(
            kinds(&blocks("* a\n{{{\nraw\n}}}")),
            vec![&NodeKind::UnorderedList, &NodeKind::Nowiki("raw".to_owned())]
        );
    }

    #[test]
    fn test_unclosed_verbatim_continues_list_item() {
        let nodes = blocks("* a\n```\nb");
        assert_eq!(kinds(&nodes), vec![&NodeKind::UnorderedList]);
        assert_eq!(nodes[0].children().len(), 1);
    }
}
