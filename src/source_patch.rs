use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::{GenerateError, Result};

/// A literal find/replace applied to one generated file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SourcePatch {
    /// Path relative to the output directory.
    pub file: String,
    pub search: String,
    pub replace: String,
}

/// Applies `patches` in order. A patch whose search text is missing from the
/// file fails the run; the generated code has drifted from what the patch
/// was written against.
pub fn apply_source_patches(output_dir: &Path, patches: &[SourcePatch]) -> Result<Vec<PathBuf>> {
    let mut changed: Vec<PathBuf> = Vec::new();

    for patch in patches {
        let path = patch_target(output_dir, &patch.file)?;
        if patch.search.is_empty() {
            return Err(GenerateError::config(format!(
                "source patch for {} has an empty search string",
                patch.file
            )));
        }

        let contents = fs::read_to_string(&path).map_err(|err| GenerateError::fs(&path, err))?;
        if !contents.contains(&patch.search) {
            return Err(GenerateError::mismatch(
                &path,
                format!("search text not found: {:?}", patch.search),
            ));
        }

        let updated = contents.replace(&patch.search, &patch.replace);
        fs::write(&path, updated).map_err(|err| GenerateError::fs(&path, err))?;
        tracing::info!(file = %patch.file, "applied source patch");

        if !changed.contains(&path) {
            changed.push(path);
        }
    }

    Ok(changed)
}

fn patch_target(output_dir: &Path, file: &str) -> Result<PathBuf> {
    let rel = Path::new(file);
    let escapes = rel
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if file.trim().is_empty() || escapes {
        return Err(GenerateError::config(format!(
            "source patch file must be a relative path inside the output directory: {file}"
        )));
    }
    Ok(output_dir.join(rel))
}
