//! Extraction of the note-taking "Tags:" paragraph into frontmatter.
//!
//! Notes declare their tags as a paragraph of wiki links, e.g.
//! `Tags: [[career]], [[programming]]`. Publishing turns that convention
//! into a structured `tags` list in the frontmatter and drops the
//! paragraph from the body.

use crate::ast::{Block, Document, Inline};
use crate::frontmatter::{self, FrontmatterError};
use serde_yaml::Value;
use std::collections::HashSet;

/// Case-insensitive prefix that marks a paragraph as the tag declaration.
pub const TAG_PREFIX: &str = "tags:";

/// Frontmatter key the extracted tag list is written under.
pub const TAGS_KEY: &str = "tags";

/// Move the first top-level `Tags:` paragraph into the frontmatter.
///
/// The paragraph's wiki-link children become the `tags` list, in order,
/// duplicates preserved, minus anything in `blacklist`; everything else
/// in the paragraph (the label, punctuation) is discarded with it.
/// Returns `true` when a paragraph was extracted.
///
/// No-ops, in order of checking: the document has no frontmatter block
/// (the paragraph is retained, no `tags` key is invented), or no
/// paragraph matches. Malformed frontmatter is surfaced as an error
/// before anything is removed, so the document is never left half
/// mutated.
pub fn extract_tag_paragraph(
    doc: &mut Document,
    blacklist: &HashSet<String>,
) -> Result<bool, FrontmatterError> {
    if doc.frontmatter_raw().is_none() {
        return Ok(false);
    }

    let Some((index, tags)) = doc.blocks.iter().enumerate().find_map(|(index, block)| {
        tag_paragraph_children(block).map(|children| (index, collect_tags(children, blacklist)))
    }) else {
        return Ok(false);
    };

    let written = frontmatter::set_key(doc, TAGS_KEY, Value::Sequence(tags))?;
    if !written {
        return Ok(false);
    }

    doc.blocks.remove(index);
    Ok(true)
}

/// A tag paragraph's first inline child is text starting with `Tags:`,
/// compared ASCII case-insensitively. Only top-level paragraphs count.
fn tag_paragraph_children(block: &Block) -> Option<&[Inline]> {
    let Block::Paragraph { children } = block else {
        return None;
    };
    let Some(Inline::Text(value)) = children.first() else {
        return None;
    };
    value
        .get(..TAG_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(TAG_PREFIX))
        .then_some(children)
}

fn collect_tags(children: &[Inline], blacklist: &HashSet<String>) -> Vec<Value> {
    children
        .iter()
        .filter_map(|inline| match inline {
            Inline::WikiLink(link) => Some(link.target.clone()),
            _ => None,
        })
        .filter(|target| !blacklist.contains(target))
        .map(Value::String)
        .collect()
}
