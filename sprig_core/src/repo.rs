//! Repository layout, configuration and the public operation set.

use crate::branch::{self, BranchCommand, BranchInfo, BranchManager, BranchOutcome};
use crate::commit::{self, CommitStore, History};
use crate::error::{Error, Result};
use crate::hash::{Algorithm, Hash};
use crate::lock::StateLock;
use crate::merge;
use crate::state::RepoState;
use crate::store::ObjectStore;
use crate::walk::{self, IGNORE_FILE, METADATA_DIR};
use crate::worktree::{CheckoutOutcome, Status, WorkingTree};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Config format version written by `init`.
const CONFIG_VERSION: &str = "1";

/// What `add` should stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTarget {
    /// Every working-directory file.
    All,
    /// A single top-level file.
    Path(PathBuf),
}

impl AddTarget {
    /// Interpret a command-line argument; `.` means every file.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "." {
            AddTarget::All
        } else {
            AddTarget::Path(PathBuf::from(arg))
        }
    }
}

/// A repository rooted at a working directory.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    algorithm: Algorithm,
    objects: ObjectStore,
    commits: CommitStore,
}

impl Repository {
    /// Initialize a new repository in `root`.
    ///
    /// Creates the layout:
    /// - `.sprig/objects/` for file content
    /// - `.sprig/commits/` for commit records
    /// - `.sprig/index.json` with an empty `main` branch
    /// - `.sprig/config` with version and algorithm
    /// - `.sprigignore` listing the metadata directory, unless present
    pub fn init<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let meta = root.join(METADATA_DIR);

        if meta.exists() {
            return Err(Error::already_initialized(&root));
        }

        let algorithm = Algorithm::Sha1;

        fs::create_dir_all(meta.join("objects"))?;
        fs::create_dir_all(meta.join("commits"))?;

        let config_content = format!("version={}\nalgo={}\n", CONFIG_VERSION, algorithm.as_str());
        fs::write(meta.join("config"), config_content)?;

        RepoState::new().save(&meta.join("index.json"))?;

        let ignore_path = root.join(IGNORE_FILE);
        if !ignore_path.exists() {
            fs::write(&ignore_path, format!("{}\n", METADATA_DIR))?;
        }

        info!(root = %root.display(), "initialized repository");

        Ok(Self::at(root, algorithm))
    }

    /// Open an existing repository at `root`.
    ///
    /// A repository without a config file predates it and uses SHA-1.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let meta = root.join(METADATA_DIR);

        if !meta.is_dir() {
            return Err(Error::not_a_repository(&root));
        }

        let config_path = meta.join("config");
        let algorithm = if config_path.exists() {
            let config_content = fs::read_to_string(&config_path)?;
            Self::parse_config(&config_content)?
        } else {
            debug!("no config file, assuming sha1");
            Algorithm::Sha1
        };

        Ok(Self::at(root, algorithm))
    }

    fn at(root: PathBuf, algorithm: Algorithm) -> Self {
        let meta = root.join(METADATA_DIR);
        Self {
            objects: ObjectStore::new(meta.join("objects")),
            commits: CommitStore::new(meta.join("commits")),
            root,
            algorithm,
        }
    }

    /// Parse the config file to extract the algorithm.
    fn parse_config(content: &str) -> Result<Algorithm> {
        let mut version = None;
        let mut algo = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "version" => version = Some(value.trim()),
                    "algo" => algo = Some(value.trim()),
                    _ => {}
                }
            }
        }

        if version != Some(CONFIG_VERSION) {
            return Err(Error::unsupported_algorithm(format!(
                "unsupported config version: {:?}",
                version
            )));
        }

        let algo_str = algo.ok_or_else(|| Error::unsupported_algorithm("missing algo in config"))?;
        Algorithm::parse(algo_str)
    }

    /// Working directory root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Metadata directory.
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    /// Path of the persisted state.
    pub fn state_path(&self) -> PathBuf {
        self.meta_dir().join("index.json")
    }

    /// Algorithm used by this repository.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Blob store.
    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// Commit store.
    pub fn commits(&self) -> &CommitStore {
        &self.commits
    }

    fn working_tree(&self) -> WorkingTree<'_> {
        WorkingTree::new(&self.root, &self.objects, &self.commits)
    }

    /// Load the current state without locking.
    pub fn state(&self) -> Result<RepoState> {
        self.ensure_repository()?;
        RepoState::load(&self.state_path())
    }

    fn ensure_repository(&self) -> Result<()> {
        if !self.meta_dir().is_dir() {
            return Err(Error::not_a_repository(&self.root));
        }
        Ok(())
    }

    /// Run `f` as a whole-state transaction.
    ///
    /// Takes the repository lock, loads the state, applies `f` and saves the
    /// state only if `f` succeeded. Every mutating operation goes through here.
    pub fn transaction<T>(&self, f: impl FnOnce(&mut RepoState) -> Result<T>) -> Result<T> {
        self.ensure_repository()?;
        let _lock = StateLock::acquire(&self.meta_dir().join("lock"))?;

        let path = self.state_path();
        let mut state = RepoState::load(&path)?;
        let value = f(&mut state)?;
        state.save(&path)?;

        Ok(value)
    }

    /// Stage one file or every working-directory file.
    ///
    /// Returns the staged entries. Excluded names are skipped silently.
    pub fn add(&self, target: &AddTarget) -> Result<Vec<(String, Hash)>> {
        let files = match target {
            AddTarget::All => walk::working_files(&self.root)?,
            AddTarget::Path(path) => match self.resolve_file(path)? {
                Some(file) => vec![file],
                None => Vec::new(),
            },
        };

        self.transaction(|state| {
            let mut added = Vec::with_capacity(files.len());
            for (name, path) in files {
                let content = fs::read(&path)?;
                let hash = self.objects.write(&content)?;
                state.staged.insert(name.clone(), hash);
                debug!(path = %name, hash = %hash.short(), "staged");
                added.push((name, hash));
            }
            Ok(added)
        })
    }

    /// Map a user path to a top-level working-directory file.
    fn resolve_file(&self, path: &Path) -> Result<Option<(String, PathBuf)>> {
        let relative = if path.is_absolute() {
            self.relative_to_root(path)?
        } else {
            path.to_path_buf()
        };

        let mut components = relative
            .components()
            .filter(|c| !matches!(c, Component::CurDir));
        let name = match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => name
                .to_str()
                .ok_or_else(|| Error::invalid_path(path, "file name is not valid UTF-8"))?,
            _ => return Err(Error::invalid_path(path, "only top-level files can be staged")),
        };

        if walk::is_excluded(name) {
            return Ok(None);
        }

        // Symlinks are not followed, matching the working-directory walk
        let file = self.root.join(name);
        let metadata = match fs::symlink_metadata(&file) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::Io {
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("File {} does not exist!", path.display()),
                    ),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.file_type().is_file() {
            return Err(Error::invalid_path(path, "not a regular file"));
        }

        Ok(Some((name.to_string(), file)))
    }

    /// Express an absolute path relative to the root.
    ///
    /// Only the parent directory is canonicalized so a symlinked file name is
    /// kept as-is.
    fn relative_to_root(&self, path: &Path) -> Result<PathBuf> {
        let outside = || Error::invalid_path(path, "outside the repository");

        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(outside());
        };

        let root = fs::canonicalize(&self.root)?;
        let parent = fs::canonicalize(parent).map_err(|_| outside())?;
        let relative = parent.strip_prefix(&root).map_err(|_| outside())?;

        Ok(relative.join(name))
    }

    /// Commit the staged files on the current branch.
    pub fn commit(&self, message: &str) -> Result<Hash> {
        self.transaction(|state| commit::commit(&self.commits, state, message, commit::now()))
    }

    /// History of the current branch, newest first.
    pub fn log(&self) -> Result<History<'_>> {
        let state = self.state()?;
        Ok(commit::log(&self.commits, &state))
    }

    /// Status of the working directory.
    pub fn status(&self) -> Result<Status> {
        let state = self.state()?;
        self.working_tree().status(&state)
    }

    /// Run a branch command; listing does not take the lock.
    pub fn branch(&self, command: BranchCommand) -> Result<BranchOutcome> {
        match command {
            BranchCommand::List => Ok(BranchOutcome::Listed(self.branches()?)),
            command => self.transaction(|state| BranchManager::new(state).run(command)),
        }
    }

    /// All branches sorted by name.
    pub fn branches(&self) -> Result<Vec<BranchInfo>> {
        Ok(branch::list(&self.state()?))
    }

    /// Switch branches, rewriting the working directory.
    pub fn checkout(&self, name: &str) -> Result<CheckoutOutcome> {
        self.transaction(|state| self.working_tree().checkout(state, name))
    }

    /// Take-theirs merge of `name` into the current branch.
    pub fn merge(&self, name: &str) -> Result<Hash> {
        self.transaction(|state| {
            merge::merge(
                &self.working_tree(),
                &self.commits,
                state,
                name,
                commit::now(),
            )
        })
    }
}
