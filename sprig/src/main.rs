mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use output::{
    AddOutput, BranchData, BranchOutput, CheckoutOutput, CommitOutput, InitOutput, LogEntry,
    LogOutput, MergeOutput, OutputWriter, StagedFile, StatusOutput,
};
use sprig_core::{AddTarget, BranchCommand, BranchOutcome, CheckoutOutcome, Repository};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sprig - A minimal local version-control engine
#[derive(Parser)]
#[command(name = "sprig")]
#[command(about = "Snapshot the top-level files of a directory", long_about = None)]
#[command(version)]
struct Cli {
    /// Repository root (defaults to SPRIG_ROOT env var or the current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new repository
    Init,

    /// Add a file, or every file with '.', to the staging area
    Add {
        /// File to stage, or '.' for all files
        path: String,
    },

    /// Commit staged changes
    Commit {
        /// Commit message (multiple words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Show commit history of the current branch
    Log,

    /// Show working directory status
    Status,

    /// List, create (<name>), delete (-d <name>) or rename (-m <old> <new>) branches
    Branch {
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Switch to a branch
    Checkout {
        /// Branch name
        name: String,
    },

    /// Merge a branch into the current one, taking its files
    Merge {
        /// Branch name
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("Failed to set up logging: {}", e);
    }

    // Determine repository root: CLI arg > SPRIG_ROOT env var > current directory
    let root = cli
        .root
        .or_else(|| std::env::var("SPRIG_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    debug!(root = %root.display(), "using repository root");

    let result = match cli.command {
        Commands::Init => cmd_init(&root, &output),
        Commands::Add { path } => cmd_add(&root, &path, &output),
        Commands::Commit { message } => cmd_commit(&root, &message.join(" "), &output),
        Commands::Log => cmd_log(&root, &output),
        Commands::Status => cmd_status(&root, &output),
        Commands::Branch { args } => cmd_branch(&root, &args, &output),
        Commands::Checkout { name } => cmd_checkout(&root, &name, &output),
        Commands::Merge { name } => cmd_merge(&root, &name, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = result_code(&e);
            output.write_error(&e, code);
            ExitCode::from(code)
        }
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Logs go to stderr so stdout stays parseable in --json mode
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()?;

    Ok(())
}

/// Map a failure to the process exit / JSON result code.
fn result_code(error: &anyhow::Error) -> u8 {
    use sprig_core::Error;

    match error.downcast_ref::<Error>() {
        Some(Error::NotARepository { .. }) => 2,
        Some(Error::UncommittedChanges { .. }) => 3,
        Some(Error::NothingStaged) => 4,
        Some(Error::BranchNotFound { .. })
        | Some(Error::BranchExists { .. })
        | Some(Error::InvalidBranchName { .. })
        | Some(Error::CannotDeleteCurrent { .. })
        | Some(Error::SelfMerge { .. })
        | Some(Error::EmptySourceBranch { .. }) => 5,
        Some(Error::InvalidArguments { .. }) | Some(Error::InvalidPath { .. }) => 64,
        Some(Error::Locked { .. }) => 75,
        _ => 1,
    }
}

fn open(root: &Path) -> Result<Repository> {
    Repository::open(root)
        .with_context(|| format!("Failed to open repository at {}", root.display()))
}

fn cmd_init(root: &Path, output: &OutputWriter) -> Result<()> {
    let repo = Repository::init(root)
        .with_context(|| format!("Failed to initialize repository at {}", root.display()))?;

    let data = InitOutput {
        success: true,
        result_code: 0,
        root: repo.root().display().to_string(),
        algorithm: repo.algorithm().as_str().to_string(),
    };
    output.write(&data, || "Initialized empty sprig repository\n".to_string())
}

fn cmd_add(root: &Path, path: &str, output: &OutputWriter) -> Result<()> {
    let repo = open(root)?;
    let target = AddTarget::from_arg(path);

    let staged = repo
        .add(&target)
        .with_context(|| format!("Failed to add {}", path))?;

    let data = AddOutput {
        success: true,
        result_code: 0,
        staged: staged
            .iter()
            .map(|(path, hash)| StagedFile {
                path: path.clone(),
                hash: *hash,
            })
            .collect(),
    };
    output.write(&data, || {
        if staged.is_empty() {
            return match target {
                AddTarget::All => "No files to add\n".to_string(),
                AddTarget::Path(_) => String::new(),
            };
        }
        let mut text = String::new();
        for (path, _) in &staged {
            let _ = writeln!(text, "Added {} to staging area", path);
        }
        text
    })
}

fn cmd_commit(root: &Path, message: &str, output: &OutputWriter) -> Result<()> {
    let repo = open(root)?;

    let hash = repo.commit(message).context("Failed to commit")?;
    let branch = repo.state()?.current_branch;

    let data = CommitOutput {
        success: true,
        result_code: 0,
        hash,
        branch,
        message: message.to_string(),
    };
    output.write(&data, || {
        format!("Committed: {} {}\n", hash.short(), message)
    })
}

fn cmd_log(root: &Path, output: &OutputWriter) -> Result<()> {
    let repo = open(root)?;

    let mut commits = Vec::new();
    for entry in repo.log()? {
        let (hash, commit) = entry.context("Failed to read history")?;
        commits.push(LogEntry {
            hash,
            timestamp: commit.timestamp,
            message: commit.message,
            parent: commit.parent,
            merge_parent: commit.merge_parent,
        });
    }

    let data = LogOutput {
        success: true,
        result_code: 0,
        commits,
    };
    output.write(&data, || log_text(&data.commits))
}

/// Text rendering of `log`: one block per commit, dates as stored.
fn log_text(commits: &[LogEntry]) -> String {
    let mut text = String::new();
    for entry in commits {
        let _ = writeln!(text, "commit {}", entry.hash.short());
        if let (Some(parent), Some(merge_parent)) = (entry.parent, entry.merge_parent) {
            let _ = writeln!(text, "Merge: {} {}", parent.short(), merge_parent.short());
        }
        let _ = writeln!(text, "Date: {}", entry.timestamp.to_rfc3339());
        let _ = writeln!(text, "    {}\n", entry.message);
    }
    text
}

fn cmd_status(root: &Path, output: &OutputWriter) -> Result<()> {
    let repo = open(root)?;
    let status = repo.status().context("Failed to compute status")?;

    let data = StatusOutput {
        success: true,
        result_code: 0,
        status,
    };
    output.write(&data, || {
        let status = &data.status;
        let mut text = String::new();
        let _ = writeln!(text, "On branch {}", status.branch);

        if !status.staged.is_empty() {
            text.push_str("Changes staged for commit:\n  (use 'commit' to commit these changes)\n");
            for path in &status.staged {
                let _ = writeln!(text, "    staged: {}", path);
            }
            text.push('\n');
        }

        if !status.modified.is_empty() {
            text.push_str("Changes not staged for commit:\n  (use 'add' to stage these changes)\n");
            for path in &status.modified {
                let _ = writeln!(text, "    modified: {}", path);
            }
            text.push('\n');
        }

        if !status.untracked.is_empty() {
            text.push_str("Untracked files:\n  (use 'add' to track these files)\n");
            for path in &status.untracked {
                let _ = writeln!(text, "    {}", path);
            }
            text.push('\n');
        }

        if status.is_clean() {
            text.push_str("Nothing to commit, working directory clean\n");
        }
        text
    })
}

fn cmd_branch(root: &Path, args: &[String], output: &OutputWriter) -> Result<()> {
    let repo = open(root)?;
    let command = BranchCommand::parse(args)?;

    let outcome = repo.branch(command).context("Branch command failed")?;

    let data = BranchOutput {
        success: true,
        result_code: 0,
        data: match outcome {
            BranchOutcome::Listed(branches) => BranchData::List { branches },
            BranchOutcome::Created { name, tip } => BranchData::Created { name, tip },
            BranchOutcome::Deleted { name } => BranchData::Deleted { name },
            BranchOutcome::Renamed { old, new } => BranchData::Renamed { old, new },
        },
    };
    output.write(&data, || match &data.data {
        BranchData::List { branches } => {
            let mut text = String::new();
            for branch in branches {
                let prefix = if branch.current { "*" } else { " " };
                let tip = branch
                    .tip
                    .map(|hash| hash.short())
                    .unwrap_or_else(|| "no commits".to_string());
                let _ = writeln!(text, "{} {} ({})", prefix, branch.name, tip);
            }
            text
        }
        BranchData::Created { name, .. } => format!("Created branch '{}'\n", name),
        BranchData::Deleted { name } => format!("Deleted branch '{}'\n", name),
        BranchData::Renamed { old, new } => format!("Renamed branch '{}' to '{}'\n", old, new),
    })
}

fn cmd_checkout(root: &Path, name: &str, output: &OutputWriter) -> Result<()> {
    let repo = open(root)?;

    let outcome = repo
        .checkout(name)
        .with_context(|| format!("Failed to check out '{}'", name))?;

    let data = CheckoutOutput {
        success: true,
        result_code: 0,
        branch: name.to_string(),
        switched: outcome == CheckoutOutcome::Switched,
    };
    output.write(&data, || match outcome {
        CheckoutOutcome::Switched => format!("Switched to branch '{}'\n", name),
        CheckoutOutcome::AlreadyOnBranch => format!("Already on branch '{}'\n", name),
    })
}

fn cmd_merge(root: &Path, name: &str, output: &OutputWriter) -> Result<()> {
    let repo = open(root)?;
    let into = repo.state()?.current_branch;

    let hash = repo
        .merge(name)
        .with_context(|| format!("Failed to merge '{}'", name))?;

    let data = MergeOutput {
        success: true,
        result_code: 0,
        hash,
        source: name.to_string(),
        into: into.clone(),
    };
    output.write(&data, || {
        format!("Merged '{}' into '{}' ({})\n", name, into, hash.short())
    })
}
