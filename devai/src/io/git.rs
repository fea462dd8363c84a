//! Git adapter for devai commands.
//!
//! Every repository interaction goes through a small, explicit wrapper around
//! `git` subprocess calls. Failures are mapped onto [`DevaiError`] kinds so the
//! user sees what to do next.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use crate::error::DevaiError;

/// Repository operations the commit workflow needs.
pub trait VersionControl {
    fn is_repository(&self) -> Result<bool>;
    /// Staged diff text, possibly empty.
    fn staged_diff(&self) -> Result<String>;
    fn branch_name(&self) -> Result<String>;
    fn commit(&self, message: &str) -> Result<()>;
    /// Stage every change in the worktree (respects .gitignore).
    fn stage_all(&self) -> Result<()>;
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Absolute path of the repository's `.git` directory.
    pub fn git_dir(&self) -> Result<PathBuf> {
        let out = self.run_capture(
            &["rev-parse", "--git-dir"],
            "Failed to locate .git directory",
        )?;
        let dir = PathBuf::from(out.trim());
        Ok(if dir.is_absolute() {
            dir
        } else {
            self.workdir.join(dir)
        })
    }

    fn head_short_sha(&self) -> Result<String> {
        let out = self.run_capture(
            &["rev-parse", "--short", "HEAD"],
            "Failed to get branch name",
        )?;
        Ok(out.trim().to_string())
    }

    fn run_capture(&self, args: &[&str], failure: &str) -> Result<String> {
        let output = self.run_checked(args, failure)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str], failure: &str) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(args = %args.join(" "), code = ?output.status.code(), "git command failed");
            return Err(classify_failure(&stdout, &stderr, failure).into());
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        match Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
        {
            Ok(output) => Ok(output),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(DevaiError::service(
                "Git not found",
                "Install Git: https://git-scm.com/downloads",
            )
            .into()),
            Err(err) => {
                Err::<Output, _>(err).with_context(|| format!("spawn git {}", args.join(" ")))
            }
        }
    }
}

impl VersionControl for Git {
    fn is_repository(&self) -> Result<bool> {
        let output = self.run(&["rev-parse", "--is-inside-work-tree"])?;
        let inside = output.status.success()
            && String::from_utf8_lossy(&output.stdout).trim() == "true";
        debug!(inside, workdir = %self.workdir.display(), "repository check");
        Ok(inside)
    }

    #[instrument(skip_all)]
    fn staged_diff(&self) -> Result<String> {
        let diff = self.run_capture(&["diff", "--cached"], "Failed to get staged diff")?;
        debug!(bytes = diff.len(), "read staged diff");
        Ok(diff)
    }

    /// Current branch, or `HEAD-<sha>` on a detached HEAD.
    #[instrument(skip_all)]
    fn branch_name(&self) -> Result<String> {
        let name = self
            .run(&["branch", "--show-current"])
            .ok()
            .filter(|output| output.status.success())
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .unwrap_or_default();
        if !name.is_empty() {
            debug!(branch = %name, "current branch");
            return Ok(name);
        }
        let fallback = format!("HEAD-{}", self.head_short_sha()?);
        debug!(branch = %fallback, "detached HEAD, using short sha");
        Ok(fallback)
    }

    #[instrument(skip_all)]
    fn commit(&self, message: &str) -> Result<()> {
        if message.trim().is_empty() {
            return Err(DevaiError::user(
                "Commit message cannot be empty",
                "Provide a valid commit message",
            )
            .into());
        }
        self.run_checked(&["commit", "-m", message], "Failed to commit changes")?;
        debug!("commit created");
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        self.run_checked(&["add", "-A"], "Failed to stage changes")?;
        Ok(())
    }
}

/// Map git's output on failure to the matching error kind.
fn classify_failure(stdout: &str, stderr: &str, failure: &str) -> DevaiError {
    let combined = format!("{stderr}\n{stdout}");
    if combined.contains("not a git repository") || combined.contains("not in a git repository")
    {
        return DevaiError::user("Not a git repository", "Initialize with: git init");
    }
    if combined.contains("command not found") {
        return DevaiError::service("Git not found", "Install Git: https://git-scm.com/downloads");
    }
    if combined.contains("nothing to commit")
        || combined.contains("no changes added to commit")
        || combined.contains("no staged changes")
    {
        return DevaiError::user("No staged changes", "Stage changes with: git add <files>");
    }
    let detail = match stderr.trim() {
        "" => stdout.trim(),
        trimmed => trimmed,
    };
    DevaiError::service(failure, detail)
}
