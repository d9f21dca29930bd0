//! Discovery of publishable notes in the vault.

use anyhow::{Context, Result};
use notemill_core::{ParseOptions, frontmatter, parse_document};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Frontmatter key marking a note for publication.
pub const PUBLISH_KEY: &str = "publish";

/// One markdown file found in the vault.
#[derive(Debug)]
pub struct Note {
    /// Full path to the source file.
    pub path: PathBuf,
    /// File name with extension; also the output file name.
    pub base: String,
    /// File name without extension; the note's permalink identifier.
    pub stem: String,
    /// Full source text.
    pub source: String,
    /// Whether the frontmatter carries `publish: true`.
    pub publish: bool,
}

/// Walk `dir` recursively and read every markdown note.
///
/// Files that cannot be read abort the run; files that merely fail to
/// parse are kept with `publish: false` so one broken note never hides
/// the rest of the vault.
pub fn discover_notes(dir: &Path) -> Result<Vec<Note>> {
    let mut notes = Vec::new();
    for entry in jwalk::WalkDir::new(dir).sort(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }
        let source = fs::read_to_string(&path)
            .with_context(|| format!("reading note {}", path.display()))?;
        let base = file_name_string(&path)?;
        // Only the final extension; `a.md.md` keeps the stem `a.md`.
        let stem = base.strip_suffix(".md").unwrap_or(&base).to_string();
        let publish = is_published(&source, &path);
        notes.push(Note {
            path,
            base,
            stem,
            source,
            publish,
        });
    }
    Ok(notes)
}

fn file_name_string(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("non-unicode file name: {}", path.display()))
}

/// A note is published only when its frontmatter says `publish: true`.
/// Unparseable notes and unparseable frontmatter are unpublished.
fn is_published(source: &str, path: &Path) -> bool {
    let doc = match parse_document(source, &ParseOptions::notes()) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("not publishing {}: {err}", path.display());
            return false;
        }
    };
    match frontmatter::get_key(&doc, PUBLISH_KEY) {
        Ok(Some(Value::Bool(true))) => true,
        Ok(_) => false,
        Err(err) => {
            log::warn!("not publishing {}: {err}", path.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn finds_markdown_files_recursively() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "---\npublish: true\n---\nA");
        fs::create_dir(dir.path().join("sub")).unwrap();
        write(&dir.path().join("sub"), "b.md", "---\npublish: true\n---\nB");
        write(dir.path(), "ignored.txt", "not a note");

        let notes = discover_notes(dir.path()).unwrap();
        let mut bases: Vec<_> = notes.iter().map(|n| n.base.as_str()).collect();
        bases.sort_unstable();
        assert_eq!(bases, vec!["a.md", "b.md"]);
        assert_eq!(notes.iter().filter(|n| n.publish).count(), 2);
    }

    #[test]
    fn permalink_is_the_file_stem() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "my-note.md", "---\npublish: true\n---\nhi");
        let notes = discover_notes(dir.path()).unwrap();
        assert_eq!(notes[0].stem, "my-note");
        assert_eq!(notes[0].base, "my-note.md");
    }

    #[test]
    fn stem_strips_only_the_final_extension() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md.md", "---\npublish: true\n---\nx");
        let notes = discover_notes(dir.path()).unwrap();
        assert_eq!(notes[0].base, "a.md.md");
        assert_eq!(notes[0].stem, "a.md");
    }

    #[test]
    fn publish_flag_must_be_boolean_true() {
        assert!(is_published(
            "---\npublish: true\n---\nx",
            Path::new("a.md")
        ));
        assert!(!is_published(
            "---\npublish: false\n---\nx",
            Path::new("a.md")
        ));
        assert!(!is_published(
            "---\npublish: \"true\"\n---\nx",
            Path::new("a.md")
        ));
        assert!(!is_published("---\ntitle: T\n---\nx", Path::new("a.md")));
        assert!(!is_published("no frontmatter at all", Path::new("a.md")));
    }

    #[test]
    fn malformed_frontmatter_is_unpublished() {
        assert!(!is_published(
            "---\nbroken: [oops\n---\nx",
            Path::new("a.md")
        ));
    }
}
