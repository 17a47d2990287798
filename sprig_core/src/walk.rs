//! Working directory enumeration.

use crate::error::Result;
use crate::hash::Hash;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Metadata directory at the repository root.
pub const METADATA_DIR: &str = ".sprig";

/// Ignore marker file at the repository root.
pub const IGNORE_FILE: &str = ".sprigignore";

/// Names never treated as working-directory files.
pub const EXCLUDED_NAMES: [&str; 2] = [METADATA_DIR, IGNORE_FILE];

/// Whether a top-level name belongs to the fixed exclusion set.
pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_NAMES.contains(&name)
}

/// List the top-level regular files of `root`, sorted by name.
///
/// Subdirectories are not descended into and the excluded names are
/// skipped. No ignore files are consulted.
pub fn working_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();

    let walker = ignore::WalkBuilder::new(root)
        .max_depth(Some(1)) // Only immediate children
        .standard_filters(false) // Fixed exclusion set only
        .build();

    for entry in walker {
        let entry = entry?;
        let entry_path = entry.path();

        // Skip the directory itself
        if entry_path == root {
            continue;
        }

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let Some(name) = entry_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if is_excluded(name) {
            continue;
        }

        files.push((name.to_string(), entry_path.to_path_buf()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Hash every working-directory file.
///
/// Always reads from disk; nothing is cached between calls.
pub fn current_file_digests(root: &Path) -> Result<BTreeMap<String, Hash>> {
    let mut digests = BTreeMap::new();
    for (name, path) in working_files(root)? {
        digests.insert(name, Hash::hash_file(&path)?);
    }
    Ok(digests)
}
