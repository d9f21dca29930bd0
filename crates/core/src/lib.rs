#![deny(missing_docs)]
//! Notemill core: the markdown transformation pipeline that turns a
//! vault note into a publish-ready blog post.
//!
//! One call to [`transform`] parses a note's source text, injects the
//! publishing layout into its frontmatter, moves the `Tags:` paragraph
//! into a structured `tags` list, resolves `[[wiki links]]` against the
//! set of notes being published, and serializes the result with stable
//! formatting. File discovery and writing live in the CLI crate; this
//! crate is text in, text out.

/// The document tree and its construction from MDAST.
pub mod ast;
/// Core error types.
pub mod error;
/// Frontmatter get/set/delete operations.
pub mod frontmatter;
/// Markdown parsing into the document tree.
pub mod parse;
/// Markdown serialization out of the document tree.
pub mod serialize;
/// Tag paragraph extraction into frontmatter.
pub mod tags;
/// The fixed-order transformation pipeline.
pub mod transform;
/// Wiki-link syntax and resolution.
pub mod wikilink;

pub use ast::{Block, Document, Inline};
pub use error::{NotemillError, SourceLocation};
pub use frontmatter::FrontmatterError;
pub use parse::{ParseOptions, parse_document};
pub use serialize::{SerializeOptions, serialize_document};
pub use tags::extract_tag_paragraph;
pub use transform::{DEFAULT_LAYOUT, TransformOptions, transform, transform_document};
pub use wikilink::{
    DEFAULT_ALIAS_DIVIDER, HrefTemplate, ResolverOptions, WikiLink, resolve_wiki_links,
};
