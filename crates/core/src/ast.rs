//! The document tree the pipeline stages operate on.
//!
//! The model is a closed pair of sum types (`Block`, `Inline`) so that
//! every stage matches exhaustively: adding a node kind forces each
//! stage to declare how it is handled. Trees are built from markdown-rs
//! MDAST output; wiki links are first-class inline nodes, recognized
//! while converting text runs, never left as literal bracket text.

use crate::error::NotemillError;
use crate::wikilink::{Segment, WikiLink, split_segments};
use markdown::mdast;

pub use markdown::mdast::{AlignKind, ReferenceKind};

/// A parsed note: an ordered sequence of top-level blocks.
///
/// Invariant: at most one [`Block::Frontmatter`], and when present it is
/// the first block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Top-level blocks in source order.
    pub blocks: Vec<Block>,
}

impl Document {
    /// The raw text of the leading frontmatter block, if any.
    pub fn frontmatter_raw(&self) -> Option<&str> {
        match self.blocks.first() {
            Some(Block::Frontmatter { value }) => Some(value),
            _ => None,
        }
    }
}

/// A top-level (or nested flow) node.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// YAML metadata block delimited by `---` fences at the very start.
    Frontmatter {
        /// Raw YAML text between the fences, without a trailing newline.
        value: String,
    },
    /// A paragraph of inline content.
    Paragraph {
        /// Inline children.
        children: Vec<Inline>,
    },
    /// An ATX or setext heading.
    Heading {
        /// Heading depth, 1 through 6.
        depth: u8,
        /// Inline children.
        children: Vec<Inline>,
    },
    /// A `>` quoted group of blocks.
    Blockquote {
        /// Quoted blocks.
        children: Vec<Block>,
    },
    /// An ordered or unordered list.
    List {
        /// Whether the list is numbered.
        ordered: bool,
        /// Starting number for ordered lists.
        start: Option<u32>,
        /// Whether items are separated by blank lines.
        spread: bool,
        /// The list items.
        items: Vec<ListItem>,
    },
    /// A GFM table.
    Table {
        /// Per-column alignment.
        align: Vec<AlignKind>,
        /// Rows, the first being the header.
        rows: Vec<TableRow>,
    },
    /// A fenced or indented code block.
    Code {
        /// Info-string language, if any.
        lang: Option<String>,
        /// Remainder of the info string.
        meta: Option<String>,
        /// Literal code text.
        value: String,
    },
    /// A horizontal rule.
    ThematicBreak,
    /// A link reference definition, e.g. `[label]: /url`.
    Definition {
        /// Normalized identifier.
        identifier: String,
        /// Original label text.
        label: Option<String>,
        /// Destination URL.
        url: String,
        /// Optional title.
        title: Option<String>,
    },
    /// A GFM footnote definition, e.g. `[^note]: ...`.
    FootnoteDefinition {
        /// Normalized identifier.
        identifier: String,
        /// Original label text.
        label: Option<String>,
        /// Body blocks.
        children: Vec<Block>,
    },
}

/// One item of a [`Block::List`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    /// GFM task list state; `None` for a plain item.
    pub checked: Option<bool>,
    /// Whether the item's blocks are separated by blank lines.
    pub spread: bool,
    /// The item's blocks.
    pub children: Vec<Block>,
}

/// One row of a [`Block::Table`]; each cell holds inline content.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// The row's cells.
    pub cells: Vec<Vec<Inline>>,
}

/// An inline (phrasing) node.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Literal text.
    Text(String),
    /// A `[[target|alias]]` note reference.
    WikiLink(WikiLink),
    /// A standard markdown link.
    Link {
        /// Destination URL.
        url: String,
        /// Optional title.
        title: Option<String>,
        /// Visible children.
        children: Vec<Inline>,
    },
    /// A reference-style link, e.g. `[text][label]`.
    LinkReference {
        /// Normalized identifier.
        identifier: String,
        /// Original label text.
        label: Option<String>,
        /// Reference style.
        reference_kind: ReferenceKind,
        /// Visible children.
        children: Vec<Inline>,
    },
    /// An inline image.
    Image {
        /// Source URL.
        url: String,
        /// Optional title.
        title: Option<String>,
        /// Alt text.
        alt: String,
    },
    /// A reference-style image.
    ImageReference {
        /// Normalized identifier.
        identifier: String,
        /// Original label text.
        label: Option<String>,
        /// Reference style.
        reference_kind: ReferenceKind,
        /// Alt text.
        alt: String,
    },
    /// Emphasized (`*...*`) content.
    Emphasis {
        /// Inline children.
        children: Vec<Inline>,
    },
    /// Strong (`**...**`) content.
    Strong {
        /// Inline children.
        children: Vec<Inline>,
    },
    /// GFM strikethrough content.
    Delete {
        /// Inline children.
        children: Vec<Inline>,
    },
    /// Inline code span.
    InlineCode(String),
    /// Hard line break.
    Break,
    /// A GFM footnote reference, e.g. `[^note]`.
    FootnoteReference {
        /// Normalized identifier.
        identifier: String,
        /// Original label text.
        label: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// MDAST -> Document
// ---------------------------------------------------------------------------

/// Build a [`Document`] from a parsed MDAST root.
///
/// `alias_divider` is the character splitting target from alias inside
/// wiki links; text runs are segmented here so the rest of the pipeline
/// sees [`Inline::WikiLink`] nodes.
pub(crate) fn document_from_mdast(
    root: mdast::Node,
    alias_divider: char,
) -> Result<Document, NotemillError> {
    let mdast::Node::Root(root) = root else {
        return Err(NotemillError::UnsupportedConstruct("non-root tree"));
    };

    let mut blocks = Vec::with_capacity(root.children.len());
    for (index, child) in root.children.into_iter().enumerate() {
        match child {
            // The frontmatter construct only matches at the very start of
            // the source, so a yaml node is always the first child.
            mdast::Node::Yaml(yaml) if index == 0 => {
                blocks.push(Block::Frontmatter { value: yaml.value });
            }
            mdast::Node::Yaml(_) => {
                return Err(NotemillError::UnsupportedConstruct(
                    "frontmatter after first block",
                ));
            }
            other => blocks.push(block_from_mdast(other, alias_divider)?),
        }
    }
    Ok(Document { blocks })
}

fn blocks_from_mdast(
    children: Vec<mdast::Node>,
    alias_divider: char,
) -> Result<Vec<Block>, NotemillError> {
    children
        .into_iter()
        .map(|child| block_from_mdast(child, alias_divider))
        .collect()
}

fn block_from_mdast(node: mdast::Node, alias_divider: char) -> Result<Block, NotemillError> {
    match node {
        mdast::Node::Paragraph(paragraph) => Ok(Block::Paragraph {
            children: inlines_from_mdast(paragraph.children, alias_divider)?,
        }),
        mdast::Node::Heading(heading) => Ok(Block::Heading {
            depth: heading.depth,
            children: inlines_from_mdast(heading.children, alias_divider)?,
        }),
        mdast::Node::Blockquote(quote) => Ok(Block::Blockquote {
            children: blocks_from_mdast(quote.children, alias_divider)?,
        }),
        mdast::Node::List(list) => {
            let mut items = Vec::with_capacity(list.children.len());
            for child in list.children {
                let mdast::Node::ListItem(item) = child else {
                    return Err(NotemillError::UnsupportedConstruct("non-item list child"));
                };
                items.push(ListItem {
                    checked: item.checked,
                    spread: item.spread,
                    children: blocks_from_mdast(item.children, alias_divider)?,
                });
            }
            Ok(Block::List {
                ordered: list.ordered,
                start: list.start,
                spread: list.spread,
                items,
            })
        }
        mdast::Node::Table(table) => {
            let mut rows = Vec::with_capacity(table.children.len());
            for child in table.children {
                let mdast::Node::TableRow(row) = child else {
                    return Err(NotemillError::UnsupportedConstruct("non-row table child"));
                };
                let mut cells = Vec::with_capacity(row.children.len());
                for cell in row.children {
                    let mdast::Node::TableCell(cell) = cell else {
                        return Err(NotemillError::UnsupportedConstruct("non-cell row child"));
                    };
                    cells.push(inlines_from_mdast(cell.children, alias_divider)?);
                }
                rows.push(TableRow { cells });
            }
            Ok(Block::Table {
                align: table.align,
                rows,
            })
        }
        mdast::Node::Code(code) => Ok(Block::Code {
            lang: code.lang,
            meta: code.meta,
            value: code.value,
        }),
        mdast::Node::ThematicBreak(_) => Ok(Block::ThematicBreak),
        mdast::Node::Definition(definition) => Ok(Block::Definition {
            identifier: definition.identifier,
            label: definition.label,
            url: definition.url,
            title: definition.title,
        }),
        mdast::Node::FootnoteDefinition(definition) => Ok(Block::FootnoteDefinition {
            identifier: definition.identifier,
            label: definition.label,
            children: blocks_from_mdast(definition.children, alias_divider)?,
        }),
        unsupported => Err(NotemillError::UnsupportedConstruct(kind_name(&unsupported))),
    }
}

fn inlines_from_mdast(
    children: Vec<mdast::Node>,
    alias_divider: char,
) -> Result<Vec<Inline>, NotemillError> {
    let mut inlines = Vec::with_capacity(children.len());
    for child in children {
        match child {
            mdast::Node::Text(text) => {
                for segment in split_segments(&text.value, alias_divider) {
                    match segment {
                        Segment::Text(value) => inlines.push(Inline::Text(value)),
                        Segment::WikiLink(link) => inlines.push(Inline::WikiLink(link)),
                    }
                }
            }
            mdast::Node::Link(link) => inlines.push(Inline::Link {
                url: link.url,
                title: link.title,
                children: inlines_from_mdast(link.children, alias_divider)?,
            }),
            mdast::Node::LinkReference(reference) => inlines.push(Inline::LinkReference {
                identifier: reference.identifier,
                label: reference.label,
                reference_kind: reference.reference_kind,
                children: inlines_from_mdast(reference.children, alias_divider)?,
            }),
            mdast::Node::Image(image) => inlines.push(Inline::Image {
                url: image.url,
                title: image.title,
                alt: image.alt,
            }),
            mdast::Node::ImageReference(reference) => inlines.push(Inline::ImageReference {
                identifier: reference.identifier,
                label: reference.label,
                reference_kind: reference.reference_kind,
                alt: reference.alt,
            }),
            mdast::Node::Emphasis(emphasis) => inlines.push(Inline::Emphasis {
                children: inlines_from_mdast(emphasis.children, alias_divider)?,
            }),
            mdast::Node::Strong(strong) => inlines.push(Inline::Strong {
                children: inlines_from_mdast(strong.children, alias_divider)?,
            }),
            mdast::Node::Delete(delete) => inlines.push(Inline::Delete {
                children: inlines_from_mdast(delete.children, alias_divider)?,
            }),
            mdast::Node::InlineCode(code) => inlines.push(Inline::InlineCode(code.value)),
            mdast::Node::Break(_) => inlines.push(Inline::Break),
            mdast::Node::FootnoteReference(reference) => {
                inlines.push(Inline::FootnoteReference {
                    identifier: reference.identifier,
                    label: reference.label,
                });
            }
            unsupported => {
                return Err(NotemillError::UnsupportedConstruct(kind_name(&unsupported)));
            }
        }
    }
    Ok(inlines)
}

/// Stable name for an MDAST node kind, for error messages.
fn kind_name(node: &mdast::Node) -> &'static str {
    match node {
        mdast::Node::Root(_) => "root",
        mdast::Node::Blockquote(_) => "blockquote",
        mdast::Node::FootnoteDefinition(_) => "footnote definition",
        mdast::Node::List(_) => "list",
        mdast::Node::ListItem(_) => "list item",
        mdast::Node::Yaml(_) => "yaml frontmatter",
        mdast::Node::Toml(_) => "toml frontmatter",
        mdast::Node::Break(_) => "break",
        mdast::Node::InlineCode(_) => "inline code",
        mdast::Node::InlineMath(_) => "inline math",
        mdast::Node::Delete(_) => "strikethrough",
        mdast::Node::Emphasis(_) => "emphasis",
        mdast::Node::FootnoteReference(_) => "footnote reference",
        mdast::Node::Html(_) => "html",
        mdast::Node::Image(_) => "image",
        mdast::Node::ImageReference(_) => "image reference",
        mdast::Node::Link(_) => "link",
        mdast::Node::LinkReference(_) => "link reference",
        mdast::Node::Strong(_) => "strong",
        mdast::Node::Text(_) => "text",
        mdast::Node::Code(_) => "code",
        mdast::Node::Math(_) => "math",
        mdast::Node::Heading(_) => "heading",
        mdast::Node::Table(_) => "table",
        mdast::Node::TableRow(_) => "table row",
        mdast::Node::TableCell(_) => "table cell",
        mdast::Node::ThematicBreak(_) => "thematic break",
        mdast::Node::Definition(_) => "definition",
        mdast::Node::Paragraph(_) => "paragraph",
        mdast::Node::MdxJsxFlowElement(_)
        | mdast::Node::MdxJsxTextElement(_)
        | mdast::Node::MdxFlowExpression(_)
        | mdast::Node::MdxTextExpression(_)
        | mdast::Node::MdxjsEsm(_) => "mdx",
    }
}
