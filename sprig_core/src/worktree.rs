//! Working directory synchronization: status, checkout and restore.

use crate::commit::CommitStore;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::state::RepoState;
use crate::store::ObjectStore;
use crate::walk::current_file_digests;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Difference between the working directory, staging and the last commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Checked-out branch.
    pub branch: String,
    /// Paths in the staging area.
    pub staged: Vec<String>,
    /// Committed paths whose content changed and is not staged as-is.
    pub modified: Vec<String>,
    /// Paths neither committed nor staged.
    pub untracked: Vec<String>,
}

impl Status {
    /// Nothing staged, modified or untracked.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.modified.is_empty() && self.untracked.is_empty()
    }

    /// Staged or modified files exist that a checkout or merge would lose.
    pub fn has_uncommitted_changes(&self) -> bool {
        !self.staged.is_empty() || !self.modified.is_empty()
    }
}

/// Result of a successful checkout call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Working directory and HEAD now reflect the target branch.
    Switched,
    /// Target was the current branch; nothing changed.
    AlreadyOnBranch,
}

/// View of a working directory backed by the repository's stores.
#[derive(Debug, Clone, Copy)]
pub struct WorkingTree<'a> {
    root: &'a Path,
    objects: &'a ObjectStore,
    commits: &'a CommitStore,
}

impl<'a> WorkingTree<'a> {
    /// Create a view over `root`.
    pub fn new(root: &'a Path, objects: &'a ObjectStore, commits: &'a CommitStore) -> Self {
        Self {
            root,
            objects,
            commits,
        }
    }

    /// Compute the status of the working directory against `state`.
    pub fn status(&self, state: &RepoState) -> Result<Status> {
        let committed = self.commits.files_at(state.tip())?;
        let current = current_file_digests(self.root)?;

        let modified = current
            .iter()
            .filter(|(path, current_hash)| {
                let changed = committed
                    .get(*path)
                    .is_some_and(|committed_hash| committed_hash != *current_hash);
                let staged_as_is = state.staged.get(*path) == Some(*current_hash);
                changed && !staged_as_is
            })
            .map(|(path, _)| path.clone())
            .collect();

        let untracked = current
            .keys()
            .filter(|path| !committed.contains_key(*path) && !state.staged.contains_key(*path))
            .cloned()
            .collect();

        Ok(Status {
            branch: state.current_branch.clone(),
            staged: state.staged.keys().cloned().collect(),
            modified,
            untracked,
        })
    }

    /// Fail with [`Error::UncommittedChanges`] if staged or modified files exist.
    pub fn ensure_clean(&self, state: &RepoState) -> Result<()> {
        let status = self.status(state)?;
        if status.has_uncommitted_changes() {
            warn!(
                staged = status.staged.len(),
                modified = status.modified.len(),
                "refusing to overwrite uncommitted changes"
            );
            return Err(Error::UncommittedChanges {
                staged: status.staged.len(),
                modified: status.modified.len(),
            });
        }
        Ok(())
    }

    /// Rewrite the working directory from `tracked` to `target`.
    ///
    /// Files in `tracked` but not in `target` are deleted, every file in
    /// `target` is written from the object store. All target content is read
    /// before the first file is touched, so a missing object leaves the
    /// directory unchanged.
    pub fn restore(
        &self,
        tracked: &BTreeMap<String, Hash>,
        target: &BTreeMap<String, Hash>,
    ) -> Result<()> {
        let contents = target
            .iter()
            .map(|(path, hash)| self.objects.read(hash).map(|content| (path, content)))
            .collect::<Result<Vec<_>>>()?;

        for path in tracked.keys().filter(|path| !target.contains_key(*path)) {
            let file = self.root.join(path);
            if file.is_file() {
                debug!(path = %path, "removing file");
                fs::remove_file(&file)?;
            }
        }

        for (path, content) in contents {
            debug!(path = %path, "writing file");
            fs::write(self.root.join(path), content)?;
        }

        Ok(())
    }

    /// Switch to another branch and rewrite the working directory to its tip.
    ///
    /// Refuses before touching anything if there are uncommitted changes.
    pub fn checkout(&self, state: &mut RepoState, name: &str) -> Result<CheckoutOutcome> {
        let target_tip = state.branch_tip(name)?;

        if name == state.current_branch {
            return Ok(CheckoutOutcome::AlreadyOnBranch);
        }

        self.ensure_clean(state)?;

        let tracked = self.commits.files_at(state.tip())?;
        let target = self.commits.files_at(target_tip)?;
        self.restore(&tracked, &target)?;

        state.switch_to(name)?;
        info!(branch = %name, "switched branch");

        Ok(CheckoutOutcome::Switched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        root: std::path::PathBuf,
        objects: ObjectStore,
        commits: CommitStore,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let root = temp_dir.path().join("work");
            fs::create_dir(&root).unwrap();
            let objects = ObjectStore::new(temp_dir.path().join("objects"));
            let commits = CommitStore::new(temp_dir.path().join("commits"));
            Self {
                _temp_dir: temp_dir,
                root,
                objects,
                commits,
            }
        }

        fn tree(&self) -> WorkingTree<'_> {
            WorkingTree::new(&self.root, &self.objects, &self.commits)
        }

        fn write(&self, name: &str, content: &str) {
            fs::write(self.root.join(name), content).unwrap();
        }

        fn read(&self, name: &str) -> String {
            fs::read_to_string(self.root.join(name)).unwrap()
        }

        fn stage(&self, state: &mut RepoState, name: &str) {
            let content = fs::read(self.root.join(name)).unwrap();
            let hash = self.objects.write(&content).unwrap();
            state.staged.insert(name.to_string(), hash);
        }

        fn commit(&self, state: &mut RepoState, message: &str) -> Hash {
            commit::commit(&self.commits, state, message, commit::now()).unwrap()
        }
    }

    #[test]
    fn test_status_empty_repository() {
        let fx = Fixture::new();
        let state = RepoState::new();

        let status = fx.tree().status(&state).unwrap();
        assert_eq!(status.branch, "main");
        assert!(status.is_clean());
    }

    #[test]
    fn test_status_untracked_staged_modified() {
        let fx = Fixture::new();
        let mut state = RepoState::new();

        fx.write("committed.txt", "v1");
        fx.stage(&mut state, "committed.txt");
        fx.commit(&mut state, "first");

        fx.write("committed.txt", "v2");
        fx.write("new.txt", "new");
        fx.write("staged.txt", "staged");
        fx.stage(&mut state, "staged.txt");

        let status = fx.tree().status(&state).unwrap();
        assert_eq!(status.staged, vec!["staged.txt"]);
        assert_eq!(status.modified, vec!["committed.txt"]);
        assert_eq!(status.untracked, vec!["new.txt"]);
        assert!(status.has_uncommitted_changes());
    }

    #[test]
    fn test_status_modified_but_staged_as_is() {
        let fx = Fixture::new();
        let mut state = RepoState::new();

        fx.write("f.txt", "v1");
        fx.stage(&mut state, "f.txt");
        fx.commit(&mut state, "first");

        fx.write("f.txt", "v2");
        fx.stage(&mut state, "f.txt");

        let status = fx.tree().status(&state).unwrap();
        assert!(status.modified.is_empty());
        assert_eq!(status.staged, vec!["f.txt"]);

        // Edited again after staging: modified once more.
        fx.write("f.txt", "v3");
        let status = fx.tree().status(&state).unwrap();
        assert_eq!(status.modified, vec!["f.txt"]);
    }

    #[test]
    fn test_status_deleted_committed_file_is_not_reported() {
        let fx = Fixture::new();
        let mut state = RepoState::new();

        fx.write("gone.txt", "x");
        fx.stage(&mut state, "gone.txt");
        fx.commit(&mut state, "first");
        fs::remove_file(fx.root.join("gone.txt")).unwrap();

        let status = fx.tree().status(&state).unwrap();
        assert!(status.is_clean());
    }

    #[test]
    fn test_checkout_unknown_branch() {
        let fx = Fixture::new();
        let mut state = RepoState::new();

        let result = fx.tree().checkout(&mut state, "nope");
        assert!(matches!(result, Err(Error::BranchNotFound { .. })));
    }

    #[test]
    fn test_checkout_current_branch_is_noop() {
        let fx = Fixture::new();
        let mut state = RepoState::new();
        fx.write("dirty.txt", "x");
        fx.stage(&mut state, "dirty.txt");

        let outcome = fx.tree().checkout(&mut state, "main").unwrap();
        assert_eq!(outcome, CheckoutOutcome::AlreadyOnBranch);
        assert_eq!(state.staged.len(), 1);
    }

    #[test]
    fn test_checkout_switches_and_rewrites_files() {
        let fx = Fixture::new();
        let mut state = RepoState::new();

        fx.write("shared.txt", "main");
        fx.write("main_only.txt", "m");
        fx.stage(&mut state, "shared.txt");
        fx.stage(&mut state, "main_only.txt");
        let main_tip = fx.commit(&mut state, "main commit");

        state.branches.insert("feature".to_string(), Some(main_tip));
        fx.tree().checkout(&mut state, "feature").unwrap();

        fx.write("shared.txt", "feature");
        fx.stage(&mut state, "shared.txt");
        let feature_tip = fx.commit(&mut state, "feature commit");

        let outcome = fx.tree().checkout(&mut state, "main").unwrap();
        assert_eq!(outcome, CheckoutOutcome::Switched);
        assert_eq!(state.current_branch, "main");
        assert_eq!(state.head, Some(main_tip));
        assert_eq!(fx.read("shared.txt"), "main");
        assert_eq!(fx.read("main_only.txt"), "m");

        fx.tree().checkout(&mut state, "feature").unwrap();
        assert_eq!(state.head, Some(feature_tip));
        assert_eq!(fx.read("shared.txt"), "feature");
        // The feature commit only contains shared.txt.
        assert!(!fx.root.join("main_only.txt").exists());
    }

    #[test]
    fn test_checkout_keeps_untracked_files() {
        let fx = Fixture::new();
        let mut state = RepoState::new();

        fx.write("a.txt", "a");
        fx.stage(&mut state, "a.txt");
        let tip = fx.commit(&mut state, "first");
        state.branches.insert("other".to_string(), Some(tip));

        fx.write("scratch.txt", "notes");
        fx.tree().checkout(&mut state, "other").unwrap();

        assert_eq!(fx.read("scratch.txt"), "notes");
    }

    #[test]
    fn test_checkout_refuses_with_staged_changes() {
        let fx = Fixture::new();
        let mut state = RepoState::new();

        fx.write("a.txt", "a");
        fx.stage(&mut state, "a.txt");
        let tip = fx.commit(&mut state, "first");
        state.branches.insert("other".to_string(), Some(tip));

        fx.write("b.txt", "b");
        fx.stage(&mut state, "b.txt");
        let before = state.clone();

        let result = fx.tree().checkout(&mut state, "other");
        assert!(matches!(
            result,
            Err(Error::UncommittedChanges {
                staged: 1,
                modified: 0
            })
        ));
        assert_eq!(state, before);
        assert_eq!(fx.read("a.txt"), "a");
        assert_eq!(fx.read("b.txt"), "b");
    }

    #[test]
    fn test_checkout_refuses_with_modified_file() {
        let fx = Fixture::new();
        let mut state = RepoState::new();

        fx.write("a.txt", "a");
        fx.stage(&mut state, "a.txt");
        let tip = fx.commit(&mut state, "first");
        state.branches.insert("other".to_string(), Some(tip));

        fx.write("a.txt", "edited");
        let result = fx.tree().checkout(&mut state, "other");
        assert!(matches!(result, Err(Error::UncommittedChanges { .. })));
        assert_eq!(fx.read("a.txt"), "edited");
        assert_eq!(state.current_branch, "main");
    }

    #[test]
    fn test_restore_missing_object_touches_nothing() {
        let fx = Fixture::new();

        fx.write("keep.txt", "keep");
        let mut tracked = BTreeMap::new();
        tracked.insert("keep.txt".to_string(), Hash::hash_bytes(b"keep"));
        let mut target = BTreeMap::new();
        target.insert("new.txt".to_string(), Hash::hash_bytes(b"not stored"));

        let result = fx.tree().restore(&tracked, &target);
        assert!(matches!(result, Err(Error::ObjectNotFound { .. })));
        assert_eq!(fx.read("keep.txt"), "keep");
        assert!(!fx.root.join("new.txt").exists());
    }
}
