//! Commit records and the commit graph.
//!
//! A commit is stored as JSON under `commits/<hex>`, where the name is the
//! SHA-1 of exactly those bytes. The timestamp is part of the hashed record,
//! so two commits of the same files get different names.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::state::RepoState;
use crate::store::write_atomic;
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// An immutable snapshot of the tracked files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Wall-clock time the commit was made.
    pub timestamp: DateTime<FixedOffset>,
    /// Commit message.
    pub message: String,
    /// Full path to blob hash mapping of the snapshot.
    pub files: BTreeMap<String, Hash>,
    /// Previous tip of the branch, `None` for a root commit.
    pub parent: Option<Hash>,
    /// Source tip for merge commits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_parent: Option<Hash>,
}

impl Commit {
    /// Whether this commit was produced by a merge.
    pub fn is_merge(&self) -> bool {
        self.merge_parent.is_some()
    }
}

/// Current local time, the timestamp source for new commits.
pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Store of serialized commit records.
#[derive(Debug, Clone)]
pub struct CommitStore {
    dir: PathBuf,
}

impl CommitStore {
    /// Create a store rooted at the given `commits` directory.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the path to a commit record.
    pub fn commit_path(&self, hash: &Hash) -> PathBuf {
        self.dir.join(hash.to_hex())
    }

    /// Serialize and store a commit, returning its hash.
    pub fn write(&self, commit: &Commit) -> Result<Hash> {
        let payload = serde_json::to_vec(commit)?;
        let hash = Hash::hash_bytes(&payload);

        let path = self.commit_path(&hash);
        if !path.exists() {
            write_atomic(&self.dir, &path, &payload)?;
        }

        Ok(hash)
    }

    /// Load a commit record by hash.
    pub fn read(&self, hash: &Hash) -> Result<Commit> {
        let path = self.commit_path(hash);

        if !path.exists() {
            return Err(Error::object_not_found(hash.to_hex()));
        }

        let payload = fs::read(&path)?;

        let computed_hash = Hash::hash_bytes(&payload);
        if computed_hash != *hash {
            return Err(Error::corrupted_object(
                &path,
                format!(
                    "Hash mismatch: expected {}, got {}",
                    hash.to_hex(),
                    computed_hash.to_hex()
                ),
            ));
        }

        serde_json::from_slice(&payload)
            .map_err(|e| Error::corrupted_object(&path, format!("Invalid commit record: {}", e)))
    }

    /// Files of a commit, or an empty map for "no commit".
    pub fn files_at(&self, hash: Option<Hash>) -> Result<BTreeMap<String, Hash>> {
        match hash {
            Some(hash) => Ok(self.read(&hash)?.files),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Walk history from `start` along first parents.
    pub fn history(&self, start: Option<Hash>) -> History<'_> {
        History {
            commits: self,
            next: start,
        }
    }
}

/// Commit the staged files on the current branch.
///
/// The new commit's `files` is exactly the staged set: entries committed
/// earlier but not staged again are not carried over. Staging is cleared and
/// the current branch advanced.
pub fn commit(
    commits: &CommitStore,
    state: &mut RepoState,
    message: &str,
    timestamp: DateTime<FixedOffset>,
) -> Result<Hash> {
    if state.staged.is_empty() {
        return Err(Error::NothingStaged);
    }

    let record = Commit {
        timestamp,
        message: message.to_string(),
        files: state.staged.clone(),
        parent: state.tip(),
        merge_parent: None,
    };

    let hash = commits.write(&record)?;

    state.set_tip(hash);
    state.staged.clear();

    info!(
        commit = %hash.short(),
        branch = %state.current_branch,
        files = record.files.len(),
        "committed"
    );

    Ok(hash)
}

/// History of the current branch, newest first.
pub fn log<'a>(commits: &'a CommitStore, state: &RepoState) -> History<'a> {
    commits.history(state.tip())
}

/// Lazy newest-first walk over `parent` links.
///
/// Reflects the graph at the time it was created; build a new one after
/// committing or switching branches.
#[derive(Debug)]
pub struct History<'a> {
    commits: &'a CommitStore,
    next: Option<Hash>,
}

impl Iterator for History<'_> {
    type Item = Result<(Hash, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.next.take()?;
        match self.commits.read(&hash) {
            Ok(commit) => {
                self.next = commit.parent;
                Some(Ok((hash, commit)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
