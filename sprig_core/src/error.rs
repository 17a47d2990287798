//! Error types for sprig_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using sprig_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during repository operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// State or commit record could not be (de)serialized.
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// The metadata directory is absent.
    #[error("Not a sprig repository: {path} (run 'init' first)")]
    NotARepository { path: PathBuf },

    /// The metadata directory already exists.
    #[error("Repository already exists at {path}")]
    AlreadyInitialized { path: PathBuf },

    /// Object or commit not found in the store.
    #[error("Object not found: {hash}")]
    ObjectNotFound { hash: String },

    /// Stored content does not hash to its name.
    #[error("Corrupted object at {path}: {reason}")]
    CorruptedObject { path: PathBuf, reason: String },

    /// Persisted repository state has an unknown or inconsistent shape.
    #[error("Corrupted repository state at {path}: {reason}")]
    CorruptedState { path: PathBuf, reason: String },

    /// Invalid hash format or encoding.
    #[error("Invalid hash: {reason}")]
    InvalidHash { reason: String },

    /// Commit requested with an empty staging area.
    #[error("Nothing to commit!")]
    NothingStaged,

    /// Branch not found.
    #[error("Branch '{name}' does not exist!")]
    BranchNotFound { name: String },

    /// Branch name already taken.
    #[error("Branch '{name}' already exists!")]
    BranchExists { name: String },

    /// Branch name cannot be used as a key.
    #[error("Invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// Attempt to delete the checked-out branch.
    #[error("Cannot delete the current branch '{name}'!")]
    CannotDeleteCurrent { name: String },

    /// Attempt to merge a branch into itself.
    #[error("Cannot merge branch '{name}' with itself!")]
    SelfMerge { name: String },

    /// Merge source has no commits.
    #[error("Branch '{name}' has no commits to merge!")]
    EmptySourceBranch { name: String },

    /// Staged or modified files would be lost.
    #[error(
        "You have uncommitted changes ({staged} staged, {modified} modified). Please commit them first."
    )]
    UncommittedChanges { staged: usize, modified: usize },

    /// Malformed command arguments.
    #[error("Invalid arguments: {reason}")]
    InvalidArguments { reason: String },

    /// Path is not a top-level file of the working directory.
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Another process holds the repository lock.
    #[error("Repository at {path} is locked by another process")]
    Locked { path: PathBuf },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },
}

impl Error {
    /// Create a NotARepository error.
    pub fn not_a_repository(path: impl Into<PathBuf>) -> Self {
        Error::NotARepository { path: path.into() }
    }

    /// Create an AlreadyInitialized error.
    pub fn already_initialized(path: impl Into<PathBuf>) -> Self {
        Error::AlreadyInitialized { path: path.into() }
    }

    /// Create an ObjectNotFound error.
    pub fn object_not_found(hash: impl Into<String>) -> Self {
        Error::ObjectNotFound { hash: hash.into() }
    }

    /// Create a CorruptedObject error.
    pub fn corrupted_object(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedObject {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a CorruptedState error.
    pub fn corrupted_state(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedState {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(reason: impl Into<String>) -> Self {
        Error::InvalidHash {
            reason: reason.into(),
        }
    }

    /// Create a BranchNotFound error.
    pub fn branch_not_found(name: impl Into<String>) -> Self {
        Error::BranchNotFound { name: name.into() }
    }

    /// Create a BranchExists error.
    pub fn branch_exists(name: impl Into<String>) -> Self {
        Error::BranchExists { name: name.into() }
    }

    /// Create an InvalidBranchName error.
    pub fn invalid_branch_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidBranchName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a CannotDeleteCurrent error.
    pub fn cannot_delete_current(name: impl Into<String>) -> Self {
        Error::CannotDeleteCurrent { name: name.into() }
    }

    /// Create a SelfMerge error.
    pub fn self_merge(name: impl Into<String>) -> Self {
        Error::SelfMerge { name: name.into() }
    }

    /// Create an EmptySourceBranch error.
    pub fn empty_source_branch(name: impl Into<String>) -> Self {
        Error::EmptySourceBranch { name: name.into() }
    }

    /// Create an InvalidArguments error.
    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Error::InvalidArguments {
            reason: reason.into(),
        }
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Locked error.
    pub fn locked(path: impl Into<PathBuf>) -> Self {
        Error::Locked { path: path.into() }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path error
        match err.io_error() {
            Some(io_err) => Error::Io {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Io {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
