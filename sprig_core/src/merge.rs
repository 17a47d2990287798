//! Take-theirs merge.
//!
//! This is not a content merge. The merge commit's tree is the source tip's
//! tree verbatim: files only present on the current branch are dropped, and
//! there is no conflict detection.

use crate::commit::{Commit, CommitStore};
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::state::RepoState;
use crate::worktree::WorkingTree;
use chrono::{DateTime, FixedOffset};
use tracing::info;

/// Message recorded on merge commits.
pub fn merge_message(source: &str, current: &str) -> String {
    format!("Merge branch '{}' into '{}'", source, current)
}

/// Merge branch `name` into the current branch.
///
/// Checks, in order: the branch exists, the working directory has no
/// uncommitted changes, it is not the current branch, and it has commits.
/// Then writes the merge commit, advances the current branch and rewrites the
/// working directory to the merged tree.
pub fn merge(
    tree: &WorkingTree<'_>,
    commits: &CommitStore,
    state: &mut RepoState,
    name: &str,
    timestamp: DateTime<FixedOffset>,
) -> Result<Hash> {
    let source_tip = state.branch_tip(name)?;

    tree.ensure_clean(state)?;

    let current = state.current_branch.clone();
    if name == current {
        return Err(Error::self_merge(name));
    }

    let source_tip = source_tip.ok_or_else(|| Error::empty_source_branch(name))?;
    let source = commits.read(&source_tip)?;

    let current_tip = state.tip();
    let tracked = commits.files_at(current_tip)?;

    let record = Commit {
        timestamp,
        message: merge_message(name, &current),
        files: source.files,
        parent: current_tip,
        merge_parent: Some(source_tip),
    };
    let hash = commits.write(&record)?;

    state.set_tip(hash);
    tree.restore(&tracked, &record.files)?;

    info!(
        commit = %hash.short(),
        source = %name,
        into = %current,
        "merged branch"
    );

    Ok(hash)
}
