//! Structured get/set/delete over a document's YAML frontmatter.
//!
//! Mutations never touch the raw text directly: the block is parsed
//! into an order-preserving mapping, mutated, and re-rendered, so value
//! types (strings, dates, booleans, sequences) survive unrelated edits
//! and existing keys keep their relative order.

use crate::ast::{Block, Document};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Errors emitted while reading or rewriting a frontmatter block.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// The block's YAML failed to parse.
    #[error("Frontmatter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("Frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
    /// The mutated mapping failed to re-render.
    #[error("Frontmatter render error: {0}")]
    Render(String),
}

/// Parse the document's frontmatter into a key-ordered mapping.
///
/// Returns `Ok(None)` when the document has no frontmatter block; an
/// empty or blank block is an empty mapping.
pub fn mapping(doc: &Document) -> Result<Option<Mapping>, FrontmatterError> {
    match doc.frontmatter_raw() {
        Some(raw) => parse_mapping(raw).map(Some),
        None => Ok(None),
    }
}

/// Read a single key from the frontmatter.
pub fn get_key(doc: &Document, key: &str) -> Result<Option<Value>, FrontmatterError> {
    Ok(mapping(doc)?.and_then(|m| m.get(key).cloned()))
}

/// Insert or overwrite a key, preserving the relative order of all
/// other keys. Returns `false` (a no-op, not an error) when the
/// document has no frontmatter block.
pub fn set_key(doc: &mut Document, key: &str, value: Value) -> Result<bool, FrontmatterError> {
    with_mapping(doc, |m| {
        m.insert(Value::String(key.to_string()), value);
    })
}

/// Remove a key if present. Absence of the key or of the whole block is
/// not an error and leaves the raw text untouched; returns `true` only
/// when the block was rewritten.
pub fn delete_key(doc: &mut Document, key: &str) -> Result<bool, FrontmatterError> {
    let Some(Block::Frontmatter { value }) = doc.blocks.first_mut() else {
        return Ok(false);
    };
    let mut mapping = parse_mapping(value)?;
    if mapping.shift_remove(key).is_none() {
        return Ok(false);
    }
    *value = render_mapping(&mapping)?;
    Ok(true)
}

fn with_mapping(
    doc: &mut Document,
    mutate: impl FnOnce(&mut Mapping),
) -> Result<bool, FrontmatterError> {
    let Some(Block::Frontmatter { value }) = doc.blocks.first_mut() else {
        return Ok(false);
    };
    let mut mapping = parse_mapping(value)?;
    mutate(&mut mapping);
    *value = render_mapping(&mapping)?;
    Ok(true)
}

fn parse_mapping(raw: &str) -> Result<Mapping, FrontmatterError> {
    if raw.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let value: Value =
        serde_yaml::from_str(raw).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

fn render_mapping(mapping: &Mapping) -> Result<String, FrontmatterError> {
    let rendered =
        serde_yaml::to_string(mapping).map_err(|err| FrontmatterError::Render(err.to_string()))?;
    Ok(rendered.trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_frontmatter(raw: &str) -> Document {
        Document {
            blocks: vec![Block::Frontmatter {
                value: raw.to_string(),
            }],
        }
    }

    #[test]
    fn set_key_appends_and_preserves_order() {
        let mut doc = doc_with_frontmatter("title: T\ndate: 2024-04-17\npublish: true");
        let applied = set_key(
            &mut doc,
            "layout",
            Value::String("../../layouts/BlogLayout.astro".to_string()),
        )
        .unwrap();
        assert!(applied);
        assert_eq!(
            doc.frontmatter_raw().unwrap(),
            "title: T\ndate: 2024-04-17\npublish: true\nlayout: ../../layouts/BlogLayout.astro"
        );
    }

    #[test]
    fn set_key_overwrites_in_place() {
        let mut doc = doc_with_frontmatter("a: 1\nlayout: old\nz: 26");
        set_key(&mut doc, "layout", Value::String("new".to_string())).unwrap();
        assert_eq!(doc.frontmatter_raw().unwrap(), "a: 1\nlayout: new\nz: 26");
    }

    #[test]
    fn set_key_without_frontmatter_is_a_noop() {
        let mut doc = Document {
            blocks: vec![Block::Paragraph {
                children: vec![crate::ast::Inline::Text("body".to_string())],
            }],
        };
        let applied = set_key(&mut doc, "layout", Value::String("x".to_string())).unwrap();
        assert!(!applied);
        assert!(doc.frontmatter_raw().is_none());
    }

    #[test]
    fn delete_key_preserves_order_of_remaining_keys() {
        let mut doc = doc_with_frontmatter("title: T\npublic: true\ndate: 2024-04-17");
        let removed = delete_key(&mut doc, "public").unwrap();
        assert!(removed);
        assert_eq!(doc.frontmatter_raw().unwrap(), "title: T\ndate: 2024-04-17");
    }

    #[test]
    fn delete_missing_key_is_not_an_error() {
        let mut doc = doc_with_frontmatter("title: T");
        let removed = delete_key(&mut doc, "public").unwrap();
        assert!(!removed);
        assert_eq!(doc.frontmatter_raw().unwrap(), "title: T");
    }

    #[test]
    fn delete_missing_key_never_reformats_the_block() {
        // A no-op delete must not re-render: quoting and an empty block
        // stay byte-identical.
        let mut doc = doc_with_frontmatter("title: \"T\"");
        assert!(!delete_key(&mut doc, "public").unwrap());
        assert_eq!(doc.frontmatter_raw().unwrap(), "title: \"T\"");

        let mut empty = doc_with_frontmatter("");
        assert!(!delete_key(&mut empty, "public").unwrap());
        assert_eq!(empty.frontmatter_raw().unwrap(), "");
    }

    #[test]
    fn value_types_survive_mutation() {
        let mut doc = doc_with_frontmatter("publish: true\ncount: 3\ndate: 2024-04-17");
        set_key(&mut doc, "layout", Value::String("l".to_string())).unwrap();
        let m = mapping(&doc).unwrap().unwrap();
        assert_eq!(m.get("publish"), Some(&Value::Bool(true)));
        assert_eq!(m.get("count"), Some(&Value::Number(3.into())));
        assert_eq!(
            m.get("date"),
            Some(&Value::String("2024-04-17".to_string()))
        );
    }

    #[test]
    fn empty_block_is_an_empty_mapping() {
        let doc = doc_with_frontmatter("");
        assert_eq!(mapping(&doc).unwrap(), Some(Mapping::new()));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let mut doc = doc_with_frontmatter("invalid: [unterminated");
        let err = set_key(&mut doc, "layout", Value::String("x".to_string())).unwrap_err();
        assert!(matches!(err, FrontmatterError::Parse(_)), "{err:?}");
        // The raw block is untouched on error.
        assert_eq!(doc.frontmatter_raw().unwrap(), "invalid: [unterminated");
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        let doc = doc_with_frontmatter("- just\n- a\n- list");
        let err = mapping(&doc).unwrap_err();
        assert!(matches!(err, FrontmatterError::InvalidRootType));
    }

    #[test]
    fn get_key_reads_scalars() {
        let doc = doc_with_frontmatter("publish: true");
        assert_eq!(get_key(&doc, "publish").unwrap(), Some(Value::Bool(true)));
        assert_eq!(get_key(&doc, "missing").unwrap(), None);
    }
}
