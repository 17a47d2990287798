//! Branch pointer management.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::state::RepoState;
use serde::Serialize;
use tracing::info;

/// A branch and where it points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    pub name: String,
    /// Tip commit, `None` if the branch has no commits yet.
    pub tip: Option<Hash>,
    /// Whether this is the checked-out branch.
    pub current: bool,
}

/// A parsed `branch` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchCommand {
    List,
    Create(String),
    Delete(String),
    Rename { old: String, new: String },
}

impl BranchCommand {
    /// Parse the argument forms `[]`, `[name]`, `[-d, name]` and `[-m, old, new]`.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        match args.as_slice() {
            [] => Ok(BranchCommand::List),
            [flag] if *flag == "-d" || *flag == "-m" => Err(Error::invalid_arguments(format!(
                "'{}' requires a branch name",
                flag
            ))),
            [name] => Ok(BranchCommand::Create(name.to_string())),
            ["-d", name] => Ok(BranchCommand::Delete(name.to_string())),
            ["-m", old, new] => Ok(BranchCommand::Rename {
                old: old.to_string(),
                new: new.to_string(),
            }),
            _ => Err(Error::invalid_arguments(format!(
                "Invalid branch command usage: {}",
                args.join(" ")
            ))),
        }
    }
}

/// Outcome of a [`BranchCommand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    Listed(Vec<BranchInfo>),
    Created { name: String, tip: Option<Hash> },
    Deleted { name: String },
    Renamed { old: String, new: String },
}

/// Create, delete, rename and list branches of a state.
pub struct BranchManager<'a> {
    state: &'a mut RepoState,
}

impl<'a> BranchManager<'a> {
    /// Create a manager over the given state.
    pub fn new(state: &'a mut RepoState) -> Self {
        Self { state }
    }

    /// Run a parsed command.
    pub fn run(&mut self, command: BranchCommand) -> Result<BranchOutcome> {
        match command {
            BranchCommand::List => Ok(BranchOutcome::Listed(self.list())),
            BranchCommand::Create(name) => {
                let tip = self.create(&name)?;
                Ok(BranchOutcome::Created { name, tip })
            }
            BranchCommand::Delete(name) => {
                self.delete(&name)?;
                Ok(BranchOutcome::Deleted { name })
            }
            BranchCommand::Rename { old, new } => {
                self.rename(&old, &new)?;
                Ok(BranchOutcome::Renamed { old, new })
            }
        }
    }

    /// All branches sorted by name, the current one flagged.
    pub fn list(&self) -> Vec<BranchInfo> {
        list(self.state)
    }

    /// Create a branch at the current tip.
    pub fn create(&mut self, name: &str) -> Result<Option<Hash>> {
        validate_name(name)?;

        if self.state.branches.contains_key(name) {
            return Err(Error::branch_exists(name));
        }

        let tip = self.state.tip();
        self.state.branches.insert(name.to_string(), tip);
        info!(branch = %name, "created branch");

        Ok(tip)
    }

    /// Delete a branch other than the current one.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        if !self.state.branches.contains_key(name) {
            return Err(Error::branch_not_found(name));
        }

        if name == self.state.current_branch {
            return Err(Error::cannot_delete_current(name));
        }

        self.state.branches.remove(name);
        info!(branch = %name, "deleted branch");

        Ok(())
    }

    /// Rename a branch, following it if it is current.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let tip = self.state.branch_tip(old)?;

        if self.state.branches.contains_key(new) {
            return Err(Error::branch_exists(new));
        }
        validate_name(new)?;

        self.state.branches.remove(old);
        self.state.branches.insert(new.to_string(), tip);

        if self.state.current_branch == old {
            self.state.current_branch = new.to_string();
        }
        info!(from = %old, to = %new, "renamed branch");

        Ok(())
    }
}

/// All branches of a state sorted by name.
pub fn list(state: &RepoState) -> Vec<BranchInfo> {
    state
        .branches
        .iter()
        .map(|(name, tip)| BranchInfo {
            name: name.clone(),
            tip: *tip,
            current: *name == state.current_branch,
        })
        .collect()
}

/// Reject names that cannot be used as branch keys.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_branch_name(name, "name cannot be empty"));
    }

    if name.starts_with('-') {
        return Err(Error::invalid_branch_name(
            name,
            "name cannot start with '-'",
        ));
    }

    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(Error::invalid_branch_name(
            name,
            "name must not contain .. or path separators",
        ));
    }

    if name.chars().any(char::is_whitespace) {
        return Err(Error::invalid_branch_name(
            name,
            "name cannot contain whitespace",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_tip() -> (RepoState, Hash) {
        let mut state = RepoState::new();
        let tip = Hash::hash_bytes(b"tip");
        state.set_tip(tip);
        (state, tip)
    }

    #[test]
    fn test_parse_forms() {
        let empty: [&str; 0] = [];
        assert_eq!(BranchCommand::parse(&empty).unwrap(), BranchCommand::List);
        assert_eq!(
            BranchCommand::parse(&["feature"]).unwrap(),
            BranchCommand::Create("feature".to_string())
        );
        assert_eq!(
            BranchCommand::parse(&["-d", "feature"]).unwrap(),
            BranchCommand::Delete("feature".to_string())
        );
        assert_eq!(
            BranchCommand::parse(&["-m", "old", "new"]).unwrap(),
            BranchCommand::Rename {
                old: "old".to_string(),
                new: "new".to_string()
            }
        );
    }

    #[test]
    fn test_parse_malformed() {
        for args in [
            vec!["-d"],
            vec!["-m"],
            vec!["-m", "only-old"],
            vec!["a", "b"],
            vec!["-x", "name"],
            vec!["-d", "a", "b"],
        ] {
            assert!(
                matches!(
                    BranchCommand::parse(&args),
                    Err(Error::InvalidArguments { .. })
                ),
                "{:?} should be rejected",
                args
            );
        }
    }

    #[test]
    fn test_create_points_at_current_tip() {
        let (mut state, tip) = state_with_tip();

        let created = BranchManager::new(&mut state).create("feature").unwrap();
        assert_eq!(created, Some(tip));
        assert_eq!(state.branches["feature"], Some(tip));
        assert_eq!(state.current_branch, "main");
    }

    #[test]
    fn test_create_before_first_commit() {
        let mut state = RepoState::new();
        BranchManager::new(&mut state).create("feature").unwrap();
        assert_eq!(state.branches["feature"], None);
    }

    #[test]
    fn test_create_existing() {
        let (mut state, _) = state_with_tip();
        let result = BranchManager::new(&mut state).create("main");
        assert!(matches!(result, Err(Error::BranchExists { .. })));
    }

    #[test]
    fn test_create_invalid_names() {
        let (mut state, _) = state_with_tip();
        let mut branches = BranchManager::new(&mut state);
        for name in ["", "-d", "../evil", "a/b", "has space"] {
            assert!(matches!(
                branches.create(name),
                Err(Error::InvalidBranchName { .. })
            ));
        }
    }

    #[test]
    fn test_delete() {
        let (mut state, _) = state_with_tip();
        let mut branches = BranchManager::new(&mut state);
        branches.create("feature").unwrap();

        branches.delete("feature").unwrap();
        assert!(!state.branches.contains_key("feature"));
    }

    #[test]
    fn test_delete_errors() {
        let (mut state, _) = state_with_tip();
        let mut branches = BranchManager::new(&mut state);

        assert!(matches!(
            branches.delete("missing"),
            Err(Error::BranchNotFound { .. })
        ));
        assert!(matches!(
            branches.delete("main"),
            Err(Error::CannotDeleteCurrent { .. })
        ));
    }

    #[test]
    fn test_rename_current_branch() {
        let (mut state, tip) = state_with_tip();
        BranchManager::new(&mut state).rename("main", "trunk").unwrap();

        assert_eq!(state.current_branch, "trunk");
        assert_eq!(state.branches["trunk"], Some(tip));
        assert!(!state.branches.contains_key("main"));
        assert_eq!(state.tip(), Some(tip));
    }

    #[test]
    fn test_rename_other_branch() {
        let (mut state, _) = state_with_tip();
        let mut branches = BranchManager::new(&mut state);
        branches.create("feature").unwrap();
        branches.rename("feature", "topic").unwrap();

        assert_eq!(state.current_branch, "main");
        assert!(state.branches.contains_key("topic"));
        assert!(!state.branches.contains_key("feature"));
    }

    #[test]
    fn test_rename_errors() {
        let (mut state, _) = state_with_tip();
        let mut branches = BranchManager::new(&mut state);
        branches.create("feature").unwrap();

        assert!(matches!(
            branches.rename("missing", "x"),
            Err(Error::BranchNotFound { .. })
        ));
        assert!(matches!(
            branches.rename("feature", "main"),
            Err(Error::BranchExists { .. })
        ));
    }

    #[test]
    fn test_list_sorted_with_current_flag() {
        let (mut state, tip) = state_with_tip();
        let mut branches = BranchManager::new(&mut state);
        branches.create("zeta").unwrap();
        branches.create("alpha").unwrap();

        let listed = branches.list();
        let names: Vec<&str> = listed.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "main", "zeta"]);
        assert!(listed.iter().all(|b| b.tip == Some(tip)));
        assert_eq!(
            listed.iter().filter(|b| b.current).count(),
            1,
            "exactly one current branch"
        );
        assert!(listed[1].current);
    }

    #[test]
    fn test_run_dispatches() {
        let (mut state, tip) = state_with_tip();
        let mut branches = BranchManager::new(&mut state);

        let outcome = branches
            .run(BranchCommand::parse(&["feature"]).unwrap())
            .unwrap();
        assert_eq!(
            outcome,
            BranchOutcome::Created {
                name: "feature".to_string(),
                tip: Some(tip)
            }
        );

        let outcome = branches
            .run(BranchCommand::parse(&["-d", "feature"]).unwrap())
            .unwrap();
        assert_eq!(
            outcome,
            BranchOutcome::Deleted {
                name: "feature".to_string()
            }
        );
    }
}
