//! Persisted repository state: staging area, branches and HEAD.
//!
//! The state lives in a single JSON file and is always read and written as a
//! whole. Older repositories wrote a file without `branches` and
//! `current_branch`; [`RepoState::load`] upgrades that shape once, so the rest
//! of the crate only ever sees the canonical struct.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::store::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Current on-disk state format version.
pub const STATE_VERSION: u32 = 1;

/// Branch created by `init` and synthesized for legacy state.
pub const DEFAULT_BRANCH: &str = "main";

/// The mutable record of staged entries, branch tips and the active branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoState {
    /// Format version written by this crate.
    pub version: u32,
    /// Path to blob hash for the next commit.
    pub staged: BTreeMap<String, Hash>,
    /// Mirror of `branches[current_branch]`.
    pub head: Option<Hash>,
    /// Branch name to tip commit (`None` before the first commit).
    pub branches: BTreeMap<String, Option<Hash>>,
    /// Checked-out branch, always a key of `branches`.
    pub current_branch: String,
}

/// Every shape the state file has been written in.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawState {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    staged: BTreeMap<String, Hash>,
    #[serde(default)]
    head: Option<Hash>,
    #[serde(default)]
    branches: Option<BTreeMap<String, Option<Hash>>>,
    #[serde(default)]
    current_branch: Option<String>,
}

impl Default for RepoState {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoState {
    /// Fresh state for an empty repository.
    pub fn new() -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(DEFAULT_BRANCH.to_string(), None);
        Self {
            version: STATE_VERSION,
            staged: BTreeMap::new(),
            head: None,
            branches,
            current_branch: DEFAULT_BRANCH.to_string(),
        }
    }

    /// Load state from disk, upgrading older formats.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read(path)?;
        let raw: RawState = serde_json::from_slice(&content)
            .map_err(|e| Error::corrupted_state(path, e.to_string()))?;
        Self::from_raw(raw, path)
    }

    fn from_raw(raw: RawState, path: &Path) -> Result<Self> {
        if let Some(version) = raw.version
            && version > STATE_VERSION
        {
            return Err(Error::corrupted_state(
                path,
                format!("Unsupported state version: {}", version),
            ));
        }

        let (branches, current_branch) = match (raw.branches, raw.current_branch) {
            (Some(branches), Some(current)) => (branches, current),
            (None, _) => {
                debug!("upgrading legacy state without branches");
                let mut branches = BTreeMap::new();
                branches.insert(DEFAULT_BRANCH.to_string(), raw.head);
                (branches, DEFAULT_BRANCH.to_string())
            }
            (Some(_), None) => {
                return Err(Error::corrupted_state(
                    path,
                    "branches present without current_branch",
                ));
            }
        };

        if !branches.contains_key(&current_branch) {
            return Err(Error::corrupted_state(
                path,
                format!("current branch '{}' is not a branch", current_branch),
            ));
        }

        let head = branches.get(&current_branch).copied().flatten();

        Ok(Self {
            version: STATE_VERSION,
            staged: raw.staged,
            head,
            branches,
            current_branch,
        })
    }

    /// Write the whole state to disk atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_vec_pretty(self)?;
        let dir = path
            .parent()
            .ok_or_else(|| Error::corrupted_state(path, "state file has no parent directory"))?;
        write_atomic(dir, path, &content)
    }

    /// Tip commit of the current branch.
    pub fn tip(&self) -> Option<Hash> {
        self.branches.get(&self.current_branch).copied().flatten()
    }

    /// Tip commit of a named branch.
    pub fn branch_tip(&self, name: &str) -> Result<Option<Hash>> {
        self.branches
            .get(name)
            .copied()
            .ok_or_else(|| Error::branch_not_found(name))
    }

    /// Advance the current branch (and HEAD) to a commit.
    pub fn set_tip(&mut self, hash: Hash) {
        let branch = self.current_branch.clone();
        self.branches.insert(branch, Some(hash));
        self.head = Some(hash);
    }

    /// Make another existing branch current.
    pub fn switch_to(&mut self, name: &str) -> Result<()> {
        let tip = self.branch_tip(name)?;
        self.current_branch = name.to_string();
        self.head = tip;
        Ok(())
    }
}
