//! Output formatting for CLI commands.
//!
//! Provides abstraction layer for outputting results in text or JSON format.

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use sprig_core::{BranchInfo, Hash};
use std::io::{self, Write};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
    stdout: io::Stdout,
}

impl OutputWriter {
    /// Create a new OutputWriter.
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            stdout: io::stdout(),
        }
    }

    /// Write output using the configured format.
    ///
    /// The `data` parameter must be a serializable struct that includes
    /// `success: bool` and `result_code: u8` fields.
    ///
    /// The `text_fn` closure is called only in text mode to generate the
    /// human-readable output.
    pub fn write<T: Serialize>(
        &self,
        data: &T,
        text_fn: impl FnOnce() -> String,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                writeln!(&self.stdout, "{}", json)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(&self.stdout, "{}", text)?;
                }
            }
        }
        Ok(())
    }

    /// Write an error message to stderr.
    ///
    /// In JSON mode, writes a JSON error object with success=false.
    /// In text mode, writes the error message directly.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        match self.format {
            OutputFormat::Json => {
                let error_output = ErrorOutput {
                    success: false,
                    result_code,
                    error: format!("{:#}", error),
                };
                if let Ok(json) = serde_json::to_string_pretty(&error_output) {
                    let _ = writeln!(io::stderr(), "{}", json);
                }
            }
            OutputFormat::Text => {
                let _ = writeln!(io::stderr(), "Error: {:#}", error);
            }
        }
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

/// Error output structure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Output for `init` command.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub result_code: u8,
    pub root: String,
    pub algorithm: String,
}

/// File staged during `add` command.
#[derive(Debug, Clone, Serialize)]
pub struct StagedFile {
    pub path: String,
    pub hash: Hash,
}

/// Output for `add` command.
#[derive(Debug, Serialize)]
pub struct AddOutput {
    pub success: bool,
    pub result_code: u8,
    pub staged: Vec<StagedFile>,
}

/// Output for `commit` command.
#[derive(Debug, Serialize)]
pub struct CommitOutput {
    pub success: bool,
    pub result_code: u8,
    pub hash: Hash,
    pub branch: String,
    pub message: String,
}

/// One commit in `log` output.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub hash: Hash,
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Hash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_parent: Option<Hash>,
}

/// Output for `log` command.
#[derive(Debug, Serialize)]
pub struct LogOutput {
    pub success: bool,
    pub result_code: u8,
    pub commits: Vec<LogEntry>,
}

/// Output for `status` command.
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub success: bool,
    pub result_code: u8,
    #[serde(flatten)]
    pub status: sprig_core::Status,
}

/// Data variants for `branch` command.
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BranchData {
    List { branches: Vec<BranchInfo> },
    Created { name: String, tip: Option<Hash> },
    Deleted { name: String },
    Renamed { old: String, new: String },
}

/// Output for `branch` command.
#[derive(Debug, Serialize)]
pub struct BranchOutput {
    pub success: bool,
    pub result_code: u8,
    #[serde(flatten)]
    pub data: BranchData,
}

/// Output for `checkout` command.
#[derive(Debug, Serialize)]
pub struct CheckoutOutput {
    pub success: bool,
    pub result_code: u8,
    pub branch: String,
    pub switched: bool,
}

/// Output for `merge` command.
#[derive(Debug, Serialize)]
pub struct MergeOutput {
    pub success: bool,
    pub result_code: u8,
    pub hash: Hash,
    pub source: String,
    pub into: String,
}
