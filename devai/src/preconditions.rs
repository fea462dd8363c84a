//! Fail-fast checks that must pass before a commit message is generated.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::types::CommitContext;
use crate::error::DevaiError;
use crate::io::git::VersionControl;
use crate::io::ollama::GenerationService;

/// Check, in order: daemon reachable, inside a repository, staged changes
/// present, branch resolvable. The first failure stops the chain.
#[instrument(skip_all)]
pub fn validate_preconditions<V, S>(git: &V, service: &S) -> Result<CommitContext>
where
    V: VersionControl + ?Sized,
    S: GenerationService + ?Sized,
{
    if !service.check_connection()? {
        return Err(DevaiError::service(
            "Ollama daemon is not running or accessible",
            "Start the Ollama daemon and ensure it is accepting connections",
        )
        .into());
    }

    if !git.is_repository()? {
        return Err(DevaiError::user(
            "Current directory is not a git repository",
            "Navigate to a git repository or initialize one with `git init`",
        )
        .into());
    }

    let diff = git.staged_diff()?;
    if diff.trim().is_empty() {
        return Err(DevaiError::user(
            "No staged changes found",
            "Stage changes using `git add <files>` or `git add .` before running this command",
        )
        .into());
    }

    let branch = git.branch_name()?;
    debug!(%branch, diff_bytes = diff.len(), "preconditions satisfied");
    Ok(CommitContext { diff, branch })
}
