//! # Sprig Core
//!
//! A minimal local version-control engine for the top-level files of a
//! directory.
//!
//! File content is stored in a write-once content-addressed object store
//! keyed by SHA-1. A staging area collects path to blob mappings, commits
//! snapshot the staged set and link to their parent, and branches are named
//! pointers into the commit graph. Checkout and merge rewrite the working
//! directory from stored content.
//!
//! ## Features
//!
//! - Content-addressed blobs: identical content stored once
//! - Whole-state transactions with an exclusive lock and atomic writes
//! - Branch create/delete/rename and checkout with an uncommitted-changes guard
//! - Take-theirs merge commits with two parents
//! - Transparent upgrade of state files written before branches existed
//!
//! ## Example
//!
//! ```no_run
//! use sprig_core::{AddTarget, BranchCommand, Repository};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Initialize a repository in the current directory
//! let repo = Repository::init(".")?;
//!
//! // Stage every file and commit
//! repo.add(&AddTarget::All)?;
//! let hash = repo.commit("first")?;
//! println!("Committed: {}", hash.short());
//!
//! // Branch off and switch to it
//! repo.branch(BranchCommand::Create("feature".to_string()))?;
//! repo.checkout("feature")?;
//!
//! // Walk history newest-first
//! for entry in repo.log()? {
//!     let (hash, commit) = entry?;
//!     println!("{} {}", hash.short(), commit.message);
//! }
//! # Ok(())
//! # }
//! ```

mod branch;
mod commit;
mod error;
mod hash;
mod lock;
mod merge;
mod repo;
mod state;
mod store;
mod walk;
mod worktree;

pub use branch::{BranchCommand, BranchInfo, BranchManager, BranchOutcome};
pub use commit::{Commit, CommitStore, History};
pub use error::{Error, Result};
pub use hash::{Algorithm, HASH_SIZE, Hash, SHORT_HASH_LEN};
pub use lock::StateLock;
pub use merge::merge_message;
pub use repo::{AddTarget, Repository};
pub use state::{DEFAULT_BRANCH, RepoState, STATE_VERSION};
pub use store::ObjectStore;
pub use walk::{EXCLUDED_NAMES, IGNORE_FILE, METADATA_DIR, current_file_digests};
pub use worktree::{CheckoutOutcome, Status, WorkingTree};
