//! Output directory maintenance: finding and deleting stale posts.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Asks whether a stale output file may be deleted.
///
/// Injected so the deletion flow can run under tests (and under
/// `--yes`) without a terminal.
pub trait Confirm {
    /// Return `true` to allow deleting the named file.
    fn confirm(&mut self, name: &str) -> io::Result<bool>;
}

/// Interactive confirmation on stdin; accepts `y` or `yes`, any case.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, name: &str) -> io::Result<bool> {
        print!("delete {name}? ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// Non-interactive confirmation for `--yes` runs.
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _name: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Markdown files in `out_dir` that this run did not produce.
pub fn stale_outputs(out_dir: &Path, produced: &HashSet<String>) -> Result<Vec<PathBuf>> {
    let mut stale = Vec::new();
    for entry in jwalk::WalkDir::new(out_dir).sort(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !produced.contains(name) {
            stale.push(path);
        }
    }
    Ok(stale)
}

/// Delete each stale file the confirmer approves. Returns the number of
/// files removed (or, in a dry run, the number that would have been).
pub fn delete_stale(paths: &[PathBuf], confirm: &mut dyn Confirm, dry_run: bool) -> Result<usize> {
    let mut deleted = 0;
    for path in paths {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !confirm.confirm(name)? {
            continue;
        }
        if !dry_run {
            fs::remove_file(path).with_context(|| format!("deleting {}", path.display()))?;
        }
        deleted += 1;
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Replays a fixed list of answers.
    struct ScriptedConfirm {
        answers: Vec<bool>,
        asked: Vec<String>,
    }

    impl ScriptedConfirm {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.to_vec(),
                asked: Vec::new(),
            }
        }
    }

    impl Confirm for ScriptedConfirm {
        fn confirm(&mut self, name: &str) -> io::Result<bool> {
            self.asked.push(name.to_string());
            Ok(self.answers.remove(0))
        }
    }

    fn produced(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn outputs_not_in_the_produced_set_are_stale() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("kept.md"), "x").unwrap();
        fs::write(dir.path().join("stale.md"), "x").unwrap();
        fs::write(dir.path().join("unrelated.css"), "x").unwrap();

        let stale = stale_outputs(dir.path(), &produced(&["kept.md"])).unwrap();
        let names: Vec<_> = stale
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["stale.md"]);
    }

    #[test]
    fn nothing_is_stale_when_all_outputs_were_produced() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "x").unwrap();
        let stale = stale_outputs(dir.path(), &produced(&["a.md"])).unwrap();
        assert!(stale.is_empty());
    }

    #[test]
    fn only_confirmed_files_are_deleted() {
        let dir = TempDir::new().unwrap();
        let keep = dir.path().join("keep.md");
        let drop = dir.path().join("drop.md");
        fs::write(&keep, "x").unwrap();
        fs::write(&drop, "x").unwrap();

        let mut confirm = ScriptedConfirm::new(&[false, true]);
        let deleted = delete_stale(&[keep.clone(), drop.clone()], &mut confirm, false).unwrap();
        assert_eq!(deleted, 1);
        assert!(keep.exists());
        assert!(!drop.exists());
        assert_eq!(confirm.asked, vec!["keep.md", "drop.md"]);
    }

    #[test]
    fn dry_run_deletes_nothing() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("stale.md");
        fs::write(&stale, "x").unwrap();

        let mut confirm = AlwaysConfirm;
        let deleted = delete_stale(&[stale.clone()], &mut confirm, true).unwrap();
        assert_eq!(deleted, 1);
        assert!(stale.exists());
    }
}
