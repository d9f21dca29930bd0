//! Wiki-link syntax and resolution against a permalink set.
//!
//! Notes reference each other with `[[target]]` or `[[target|alias]]`.
//! When publishing, a link whose target is itself published becomes a
//! regular markdown link; a link to an unpublished note degrades to its
//! alias text so the output never contains a broken href.

use crate::ast::{Block, Document, Inline, ListItem, TableRow};
use std::collections::HashSet;

/// Divider between target and alias inside a wiki link.
pub const DEFAULT_ALIAS_DIVIDER: char = '|';

/// A wiki-style link between notes, addressed by permalink rather than path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// The permalink identifier the link points at. May be empty.
    pub target: String,
    /// Optional display text. When absent the target doubles as the alias.
    pub alias: Option<String>,
}

impl WikiLink {
    /// Split raw bracket content into target and alias at the first divider.
    pub fn from_content(content: &str, divider: char) -> Self {
        match content.split_once(divider) {
            Some((target, alias)) => Self {
                target: target.to_string(),
                alias: Some(alias.to_string()),
            },
            None => Self {
                target: content.to_string(),
                alias: None,
            },
        }
    }

    /// The display text: the alias when one was given, the target otherwise.
    pub fn alias_or_target(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }

    /// Re-render the link in its source form, e.g. `[[target|alias]]`.
    pub fn to_raw(&self, divider: char) -> String {
        match &self.alias {
            Some(alias) => format!("[[{}{}{}]]", self.target, divider, alias),
            None => format!("[[{}]]", self.target),
        }
    }
}

/// A run of text split around embedded wiki links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Literal text between links.
    Text(String),
    /// A recognized `[[...]]` occurrence.
    WikiLink(WikiLink),
}

/// Scan a text value for `[[...]]` occurrences.
///
/// An opening `[[` without a matching `]]` stays literal text. Empty
/// targets and aliases are preserved as-is; lookup policy is the
/// resolver's concern.
pub(crate) fn split_segments(value: &str, divider: char) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = value;

    loop {
        let Some(open) = rest.find("[[") else { break };
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("]]") else {
            break;
        };

        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        segments.push(Segment::WikiLink(WikiLink::from_content(
            &after_open[..close],
            divider,
        )));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    segments
}

/// Maps a permalink target to the href written into resolved links.
pub trait HrefTemplate {
    /// Render the destination path for a known target.
    fn href(&self, target: &str) -> String;
}

impl<F> HrefTemplate for F
where
    F: Fn(&str) -> String,
{
    fn href(&self, target: &str) -> String {
        (self)(target)
    }
}

/// Default href convention: `/posts/<target>/`.
pub fn default_href_template() -> Box<dyn HrefTemplate + Send + Sync> {
    Box::new(|target: &str| format!("/posts/{target}/"))
}

/// Resolver configuration for one transform call.
pub struct ResolverOptions {
    /// Maps a known target to its destination path.
    pub href_template: Box<dyn HrefTemplate + Send + Sync>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            href_template: default_href_template(),
        }
    }
}

/// Rewrite every wiki link in the document.
///
/// Targets found in `permalinks` become regular links whose visible text
/// is the alias and whose destination comes from the href template.
/// Unknown targets (including the empty target) degrade to plain alias
/// text. The walk covers every block kind that can carry inline
/// children: paragraphs, headings, list items, table cells, blockquotes
/// and footnote definitions.
pub fn resolve_wiki_links(
    doc: &mut Document,
    permalinks: &HashSet<String>,
    options: &ResolverOptions,
) {
    resolve_blocks(&mut doc.blocks, permalinks, options);
}

fn resolve_blocks(blocks: &mut [Block], permalinks: &HashSet<String>, options: &ResolverOptions) {
    for block in blocks {
        match block {
            Block::Paragraph { children } | Block::Heading { children, .. } => {
                resolve_inlines(children, permalinks, options);
            }
            Block::Blockquote { children } | Block::FootnoteDefinition { children, .. } => {
                resolve_blocks(children, permalinks, options);
            }
            Block::List { items, .. } => {
                for ListItem { children, .. } in items {
                    resolve_blocks(children, permalinks, options);
                }
            }
            Block::Table { rows, .. } => {
                for TableRow { cells } in rows {
                    for cell in cells {
                        resolve_inlines(cell, permalinks, options);
                    }
                }
            }
            Block::Frontmatter { .. }
            | Block::Code { .. }
            | Block::ThematicBreak
            | Block::Definition { .. } => {}
        }
    }
}

fn resolve_inlines(
    inlines: &mut Vec<Inline>,
    permalinks: &HashSet<String>,
    options: &ResolverOptions,
) {
    let resolved = std::mem::take(inlines)
        .into_iter()
        .filter_map(|inline| resolve_inline(inline, permalinks, options));
    *inlines = merge_adjacent_text(resolved);
}

fn resolve_inline(
    inline: Inline,
    permalinks: &HashSet<String>,
    options: &ResolverOptions,
) -> Option<Inline> {
    match inline {
        Inline::WikiLink(link) => {
            if permalinks.contains(&link.target) {
                let alias = link.alias_or_target();
                let children = if alias.is_empty() {
                    Vec::new()
                } else {
                    vec![Inline::Text(alias.to_string())]
                };
                Some(Inline::Link {
                    url: options.href_template.href(&link.target),
                    title: None,
                    children,
                })
            } else {
                let alias = link.alias_or_target();
                if alias.is_empty() {
                    None
                } else {
                    Some(Inline::Text(alias.to_string()))
                }
            }
        }
        Inline::Link {
            url,
            title,
            mut children,
        } => {
            resolve_inlines(&mut children, permalinks, options);
            Some(Inline::Link {
                url,
                title,
                children,
            })
        }
        Inline::LinkReference {
            identifier,
            label,
            reference_kind,
            mut children,
        } => {
            resolve_inlines(&mut children, permalinks, options);
            Some(Inline::LinkReference {
                identifier,
                label,
                reference_kind,
                children,
            })
        }
        Inline::Emphasis { mut children } => {
            resolve_inlines(&mut children, permalinks, options);
            Some(Inline::Emphasis { children })
        }
        Inline::Strong { mut children } => {
            resolve_inlines(&mut children, permalinks, options);
            Some(Inline::Strong { children })
        }
        Inline::Delete { mut children } => {
            resolve_inlines(&mut children, permalinks, options);
            Some(Inline::Delete { children })
        }
        other @ (Inline::Text(_)
        | Inline::Image { .. }
        | Inline::ImageReference { .. }
        | Inline::InlineCode(_)
        | Inline::Break
        | Inline::FootnoteReference { .. }) => Some(other),
    }
}

/// Join consecutive text nodes left behind by degraded links.
fn merge_adjacent_text(inlines: impl Iterator<Item = Inline>) -> Vec<Inline> {
    let mut merged: Vec<Inline> = Vec::new();
    for inline in inlines {
        match (merged.last_mut(), inline) {
            (Some(Inline::Text(prev)), Inline::Text(next)) => prev.push_str(&next),
            (_, inline) => merged.push(inline),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_target_and_alias_at_first_divider() {
        let link = WikiLink::from_content("career|my favorite|topic", '|');
        assert_eq!(link.target, "career");
        assert_eq!(link.alias.as_deref(), Some("my favorite|topic"));
        assert_eq!(link.alias_or_target(), "my favorite|topic");
    }

    #[test]
    fn alias_defaults_to_target() {
        let link = WikiLink::from_content("career", '|');
        assert_eq!(link.alias, None);
        assert_eq!(link.alias_or_target(), "career");
    }

    #[test]
    fn empty_target_is_preserved() {
        let link = WikiLink::from_content("|shown anyway", '|');
        assert_eq!(link.target, "");
        assert_eq!(link.alias_or_target(), "shown anyway");
    }

    #[test]
    fn scans_multiple_links_in_one_text_run() {
        let segments = split_segments("Tags: [[career]], [[programming]]", '|');
        assert_eq!(
            segments,
            vec![
                Segment::Text("Tags: ".to_string()),
                Segment::WikiLink(WikiLink {
                    target: "career".to_string(),
                    alias: None,
                }),
                Segment::Text(", ".to_string()),
                Segment::WikiLink(WikiLink {
                    target: "programming".to_string(),
                    alias: None,
                }),
            ]
        );
    }

    #[test]
    fn unterminated_brackets_stay_literal() {
        let segments = split_segments("open [[never closed", '|');
        assert_eq!(
            segments,
            vec![Segment::Text("open [[never closed".to_string())]
        );
    }

    #[test]
    fn text_without_links_is_a_single_segment() {
        let segments = split_segments("plain text", '|');
        assert_eq!(segments, vec![Segment::Text("plain text".to_string())]);
    }

    #[test]
    fn known_target_becomes_link() {
        let permalinks = HashSet::from(["known".to_string()]);
        let mut doc = Document {
            blocks: vec![Block::Paragraph {
                children: vec![Inline::WikiLink(WikiLink {
                    target: "known".to_string(),
                    alias: Some("Display".to_string()),
                })],
            }],
        };
        resolve_wiki_links(&mut doc, &permalinks, &ResolverOptions::default());
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph {
                children: vec![Inline::Link {
                    url: "/posts/known/".to_string(),
                    title: None,
                    children: vec![Inline::Text("Display".to_string())],
                }],
            }]
        );
    }

    #[test]
    fn unknown_target_degrades_to_alias_text() {
        let permalinks = HashSet::new();
        let mut doc = Document {
            blocks: vec![Block::Paragraph {
                children: vec![
                    Inline::Text("see ".to_string()),
                    Inline::WikiLink(WikiLink {
                        target: "missing".to_string(),
                        alias: Some("Display".to_string()),
                    }),
                    Inline::Text(" for more".to_string()),
                ],
            }],
        };
        resolve_wiki_links(&mut doc, &permalinks, &ResolverOptions::default());
        // Degraded text merges with its neighbors.
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph {
                children: vec![Inline::Text("see Display for more".to_string())],
            }]
        );
    }

    #[test]
    fn resolves_inside_list_items_and_table_cells() {
        let permalinks = HashSet::from(["known".to_string()]);
        let mut doc = Document {
            blocks: vec![
                Block::List {
                    ordered: false,
                    start: None,
                    spread: false,
                    items: vec![ListItem {
                        checked: None,
                        spread: false,
                        children: vec![Block::Paragraph {
                            children: vec![Inline::WikiLink(WikiLink {
                                target: "known".to_string(),
                                alias: None,
                            })],
                        }],
                    }],
                },
                Block::Table {
                    align: vec![markdown::mdast::AlignKind::None],
                    rows: vec![TableRow {
                        cells: vec![vec![Inline::WikiLink(WikiLink {
                            target: "known".to_string(),
                            alias: None,
                        })]],
                    }],
                },
            ],
        };
        resolve_wiki_links(&mut doc, &permalinks, &ResolverOptions::default());

        let expected_link = Inline::Link {
            url: "/posts/known/".to_string(),
            title: None,
            children: vec![Inline::Text("known".to_string())],
        };
        match &doc.blocks[0] {
            Block::List { items, .. } => match &items[0].children[0] {
                Block::Paragraph { children } => assert_eq!(children[0], expected_link),
                other => panic!("expected paragraph, got {other:?}"),
            },
            other => panic!("expected list, got {other:?}"),
        }
        match &doc.blocks[1] {
            Block::Table { rows, .. } => assert_eq!(rows[0].cells[0][0], expected_link),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn empty_target_is_an_ordinary_lookup() {
        // Permalinks come from file stems so the empty string is never in
        // the set in practice; the lookup itself has no special case.
        let permalinks = HashSet::from(["".to_string()]);
        let mut doc = Document {
            blocks: vec![Block::Paragraph {
                children: vec![Inline::WikiLink(WikiLink {
                    target: "".to_string(),
                    alias: Some("shown".to_string()),
                })],
            }],
        };
        resolve_wiki_links(&mut doc, &permalinks, &ResolverOptions::default());
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph {
                children: vec![Inline::Link {
                    url: "/posts//".to_string(),
                    title: None,
                    children: vec![Inline::Text("shown".to_string())],
                }],
            }]
        );
    }

    #[test]
    fn custom_href_template_is_used() {
        let permalinks = HashSet::from(["note".to_string()]);
        let options = ResolverOptions {
            href_template: Box::new(|target: &str| format!("/garden/{target}.html")),
        };
        let mut doc = Document {
            blocks: vec![Block::Paragraph {
                children: vec![Inline::WikiLink(WikiLink {
                    target: "note".to_string(),
                    alias: None,
                })],
            }],
        };
        resolve_wiki_links(&mut doc, &permalinks, &options);
        match &doc.blocks[0] {
            Block::Paragraph { children } => match &children[0] {
                Inline::Link { url, .. } => assert_eq!(url, "/garden/note.html"),
                other => panic!("expected link, got {other:?}"),
            },
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn raw_form_round_trips_divider() {
        let link = WikiLink::from_content("career|Jobs", '|');
        assert_eq!(link.to_raw('|'), "[[career|Jobs]]");
        let bare = WikiLink::from_content("career", '|');
        assert_eq!(bare.to_raw('|'), "[[career]]");
    }
}
