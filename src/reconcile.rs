use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{GenerateError, Result};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
    /// Ignored entries, relative to the cleared root.
    pub kept: Vec<String>,
}

/// True when `relative` (a `/`-separated path below the cleared root) is on
/// the ignore list.
pub fn is_ignored(relative: &str, ignored: &BTreeSet<String>) -> bool {
    ignored.contains(relative)
}

/// Empties `root`, keeping every entry whose relative path is in `ignored`
/// along with everything beneath it. Directories left empty are removed;
/// `root` itself never is. A missing `root` counts as already clear.
///
/// Errors abort immediately. Running again on a partially cleared tree
/// converges to the same result.
pub fn clear_directory(root: &Path, ignored: &BTreeSet<String>) -> Result<ClearReport> {
    let mut report = ClearReport::default();
    if !root.exists() {
        tracing::debug!(root = %root.display(), "output directory does not exist yet");
        return Ok(report);
    }
    if !root.is_dir() {
        return Err(GenerateError::config(format!(
            "output path is not a directory: {}",
            root.display()
        )));
    }

    clear_children(root, "", ignored, &mut report)?;
    tracing::info!(
        root = %root.display(),
        files = report.files_removed,
        dirs = report.dirs_removed,
        kept = report.kept.len(),
        "cleared output directory"
    );
    Ok(report)
}

fn clear_children(
    dir: &Path,
    prefix: &str,
    ignored: &BTreeSet<String>,
    report: &mut ClearReport,
) -> Result<()> {
    for path in sorted_entries(dir)? {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        if is_ignored(&relative, ignored) {
            report.kept.push(relative);
            continue;
        }

        let file_type = fs::symlink_metadata(&path)
            .map_err(|err| GenerateError::fs(&path, err))?
            .file_type();

        if file_type.is_dir() {
            clear_children(&path, &relative, ignored, report)?;
            if is_empty_dir(&path)? {
                fs::remove_dir(&path).map_err(|err| GenerateError::fs(&path, err))?;
                report.dirs_removed += 1;
            }
        } else {
            fs::remove_file(&path).map_err(|err| GenerateError::fs(&path, err))?;
            report.files_removed += 1;
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| GenerateError::fs(dir, err))? {
        let entry = entry.map_err(|err| GenerateError::fs(dir, err))?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(dir).map_err(|err| GenerateError::fs(dir, err))?;
    Ok(entries.next().is_none())
}
