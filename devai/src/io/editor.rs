//! Hand-editing of commit messages in the user's `$EDITOR`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::error::DevaiError;

/// File name of the seed file, created inside the repository's `.git` dir.
pub const EDIT_FILE_NAME: &str = "COMMIT_EDITMSG_DEVAI";

const FALLBACK_EDITOR: &str = "nano";

/// Opens text for interactive editing and returns the result.
pub trait Editor {
    fn edit(&self, initial: &str) -> Result<String>;
}

/// Runs the configured editor through `sh -c` on a seed file.
#[derive(Debug, Clone)]
pub struct ShellEditor {
    git_dir: PathBuf,
    command: String,
}

impl ShellEditor {
    /// Editor command from `$EDITOR`, falling back to `nano`.
    pub fn from_env(git_dir: impl Into<PathBuf>) -> Self {
        let command = std::env::var("EDITOR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_EDITOR.to_string());
        Self::with_command(git_dir, command)
    }

    pub fn with_command(git_dir: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            git_dir: git_dir.into(),
            command: command.into(),
        }
    }

    pub fn edit_path(&self) -> PathBuf {
        self.git_dir.join(EDIT_FILE_NAME)
    }

    fn spawn(&self, path: &Path) -> Result<ExitStatus> {
        // The path travels as `$1`, outside the script text.
        let script = format!("{} \"$1\"", self.command);
        Command::new("sh")
            .arg("-c")
            .arg(&script)
            .arg("sh")
            .arg(path)
            .status()
            .map_err(|err| {
                warn!(error = %err, command = %self.command, "editor spawn failed");
                spawn_failure().into()
            })
    }
}

impl Editor for ShellEditor {
    #[instrument(skip_all, fields(command = %self.command))]
    fn edit(&self, initial: &str) -> Result<String> {
        let path = self.edit_path();
        fs::write(&path, initial).map_err(|err| {
            warn!(error = %err, path = %path.display(), "write editor seed file");
            DevaiError::service(
                "Failed to create temporary file for editor",
                "Check .git directory exists and is writable",
            )
        })?;

        let outcome = self.spawn(&path).and_then(|status| {
            if let Some(err) = exit_error(status.code()) {
                return Err(err.into());
            }
            fs::read_to_string(&path).map_err(|err| {
                warn!(error = %err, path = %path.display(), "read edited file");
                DevaiError::service(
                    "Failed to read edited content from temporary file",
                    "Check file permissions and disk space",
                )
                .into()
            })
        });

        if let Err(err) = fs::remove_file(&path) {
            debug!(error = %err, path = %path.display(), "editor file cleanup skipped");
        }
        outcome
    }
}

fn spawn_failure() -> DevaiError {
    DevaiError::service(
        "Failed to spawn editor: command not found",
        "Check that $EDITOR is valid or nano is installed",
    )
}

/// Error for an editor exit status; `None` code means killed by a signal.
fn exit_error(code: Option<i32>) -> Option<DevaiError> {
    match code {
        Some(0) => None,
        None => Some(DevaiError::user(
            "Editor was terminated by signal",
            "Try running the command again",
        )),
        Some(130) => Some(DevaiError::user(
            "Editor cancelled by user",
            "No changes were made",
        )),
        Some(127) => Some(spawn_failure()),
        Some(code) => Some(DevaiError::service(
            format!("Editor exited with non-zero code: {code}"),
            "Check editor configuration and try again",
        )),
    }
}
