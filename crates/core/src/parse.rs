//! Markdown parsing into the pipeline's document tree.

use crate::ast::{self, Document};
use crate::error::{NotemillError, SourceLocation};
use crate::wikilink::DEFAULT_ALIAS_DIVIDER;
use markdown::message::{Message, Place};

/// Parser options for building markdown-rs parse options.
#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Enable YAML frontmatter parsing.
    pub frontmatter: bool,
    /// Enable indented code blocks.
    pub code_indented: bool,
    /// Divider between target and alias inside wiki links.
    pub alias_divider: char,
}

impl ParseOptions {
    /// Defaults for note sources: frontmatter, GFM, `|` alias divider.
    pub const fn notes() -> Self {
        Self {
            gfm: true,
            frontmatter: true,
            code_indented: true,
            alias_divider: DEFAULT_ALIAS_DIVIDER,
        }
    }

    /// Convert to markdown-rs `ParseOptions`.
    fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            frontmatter: self.frontmatter,
            code_indented: self.code_indented,
            // Raw HTML stays literal text; the tree has no HTML node.
            html_flow: false,
            html_text: false,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        markdown::ParseOptions {
            constructs,
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::notes()
    }
}

/// Parse one note's source text into a [`Document`].
///
/// A parse failure is a hard error for this document only; callers
/// processing many notes keep going with the rest.
pub fn parse_document(input: &str, options: &ParseOptions) -> Result<Document, NotemillError> {
    let root =
        markdown::to_mdast(input, &options.to_markdown()).map_err(|err| NotemillError::Parse {
            message: err.to_string(),
            location: message_location(&err),
        })?;
    ast::document_from_mdast(root, options.alias_divider)
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}
