//! The fixed-order transformation pipeline from note source to post text.

use crate::ast::Document;
use crate::error::NotemillError;
use crate::frontmatter;
use crate::parse::{ParseOptions, parse_document};
use crate::serialize::{SerializeOptions, serialize_document};
use crate::tags::extract_tag_paragraph;
use crate::wikilink::{DEFAULT_ALIAS_DIVIDER, ResolverOptions, resolve_wiki_links};
use serde_yaml::Value;
use std::collections::HashSet;

/// Layout the publishing target expects on every post.
pub const DEFAULT_LAYOUT: &str = "../../layouts/BlogLayout.astro";

/// Frontmatter key the layout is written under.
pub const LAYOUT_KEY: &str = "layout";

/// Configuration for one transformation pipeline.
pub struct TransformOptions {
    /// Value injected under the `layout` frontmatter key; `None` skips
    /// the injection stage.
    pub layout: Option<String>,
    /// Divider between target and alias inside wiki links.
    pub alias_divider: char,
    /// Wiki-link resolution configuration.
    pub resolver: ResolverOptions,
    /// Tags dropped from extracted tag lists.
    pub tag_blacklist: HashSet<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            layout: Some(DEFAULT_LAYOUT.to_string()),
            alias_divider: DEFAULT_ALIAS_DIVIDER,
            resolver: ResolverOptions::default(),
            tag_blacklist: HashSet::new(),
        }
    }
}

/// Transform one note's source text into publish-ready post text.
///
/// Equivalent to parse, [`transform_document`], serialize. `permalinks`
/// is the set of note identifiers that are themselves being published;
/// it is read-only for the duration of the call, and the transform
/// holds no other shared state, so concurrent calls over different
/// documents are independent.
pub fn transform(
    source: &str,
    permalinks: &HashSet<String>,
    options: &TransformOptions,
) -> Result<String, NotemillError> {
    let parse_options = ParseOptions {
        alias_divider: options.alias_divider,
        ..ParseOptions::notes()
    };
    let mut doc = parse_document(source, &parse_options)?;
    transform_document(&mut doc, permalinks, options);
    let serialize_options = SerializeOptions {
        alias_divider: options.alias_divider,
        ..SerializeOptions::posts()
    };
    Ok(serialize_document(&doc, &serialize_options))
}

/// Run the pipeline stages over an already parsed document, in their
/// fixed order:
///
/// 1. frontmatter layout injection,
/// 2. tag paragraph extraction,
/// 3. wiki-link resolution.
///
/// Tag extraction runs before link resolution so it reads the original
/// wiki-link target identifiers; resolution would have rewritten the tag
/// paragraph's links into plain link or text nodes and lost the targets
/// of unpublished tags. Callers must not reorder the stages.
///
/// A malformed frontmatter block downgrades stages 1 and 2 to logged
/// no-ops; it never fails the document.
pub fn transform_document(
    doc: &mut Document,
    permalinks: &HashSet<String>,
    options: &TransformOptions,
) {
    if let Some(layout) = &options.layout {
        if let Err(err) =
            frontmatter::set_key(doc, LAYOUT_KEY, Value::String(layout.clone()))
        {
            log::warn!("skipping layout injection: {err}");
        }
    }

    if let Err(err) = extract_tag_paragraph(doc, &options.tag_blacklist) {
        log::warn!("skipping tag extraction: {err}");
    }

    resolve_wiki_links(doc, permalinks, &options.resolver);
}
