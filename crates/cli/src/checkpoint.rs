#![forbid(unsafe_code)]

use std::process::Command;

/// Recorded in the undo log when no real checkpoint could be created.
pub const CHECKPOINT_SENTINEL: &str = "0000000";

/// Result of a best-effort checkpoint attempt. The caller decides what a
/// `Skipped` means; the workflow substitutes the sentinel and proceeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointOutcome {
    Committed(String),
    Skipped(String),
}

pub trait Checkpointer {
    fn checkpoint(&mut self, message: &str) -> CheckpointOutcome;
}

/// Snapshots the working tree by staging everything and committing, then
/// reads back the commit hash. Any failure (git missing, not a repository,
/// nothing to commit, commit rejected) becomes a `Skipped` with the reason.
/// Calls block with no timeout.
pub struct GitCheckpointer;

impl Checkpointer for GitCheckpointer {
    fn checkpoint(&mut self, message: &str) -> CheckpointOutcome {
        match commit_and_read_head(message) {
            Ok(hash) => CheckpointOutcome::Committed(hash),
            Err(reason) => CheckpointOutcome::Skipped(reason),
        }
    }
}

fn run_git(args: &[&str]) -> Result<std::process::Output, String> {
    let output = Command::new("git")
        .args(args)
        .output()
        .map_err(|err| format!("failed to run git {}: {err}", args.join(" ")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git {} failed: {}", args.join(" "), stderr.trim()));
    }
    Ok(output)
}

fn commit_and_read_head(message: &str) -> Result<String, String> {
    run_git(&["add", "-A"])?;
    run_git(&["commit", "-m", message])?;
    let output = run_git(&["rev-parse", "HEAD"])?;
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if hash.is_empty() {
        return Err("git rev-parse HEAD produced no output".to_string());
    }
    Ok(hash)
}
