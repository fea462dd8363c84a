//! Commit orchestration: preconditions, type selection, generation, and the
//! approve / edit / regenerate / cancel decision.

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::types::{CommitAction, GenerationOptions, GenerationRequest, ValidationOutcome};
use crate::core::validator::validate_message;
use crate::error::{DevaiError, into_domain_error};
use crate::generate::CommitGenerator;
use crate::io::editor::Editor;
use crate::io::git::VersionControl;
use crate::io::ollama::GenerationService;
use crate::io::terminal::CommitUi;
use crate::preconditions::validate_preconditions;

/// Flags for one `devai-cli commit` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Stage every change before each cycle.
    pub stage_all: bool,
    /// Guidance rendered into the prompt.
    pub user_context: Option<String>,
}

/// How the workflow ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The message that was committed.
    Committed(String),
    Cancelled,
}

/// Collaborators needed by [`CommitWorkflow`].
pub struct CommitWorkflow<'a, V: ?Sized, S: ?Sized, E: ?Sized> {
    git: &'a V,
    service: &'a S,
    editor: &'a E,
    generation: GenerationOptions,
    options: CommitOptions,
}

impl<'a, V, S, E> CommitWorkflow<'a, V, S, E>
where
    V: VersionControl + ?Sized,
    S: GenerationService + ?Sized,
    E: Editor + ?Sized,
{
    pub fn new(
        git: &'a V,
        service: &'a S,
        editor: &'a E,
        generation: GenerationOptions,
        options: CommitOptions,
    ) -> Self {
        Self {
            git,
            service,
            editor,
            generation,
            options,
        }
    }

    /// Run cycles until the user commits or cancels.
    ///
    /// Errors that do not already carry a [`DevaiError`] become a
    /// service-level error with the original text as remediation detail.
    pub fn run<U: CommitUi + ?Sized>(&self, ui: &mut U) -> Result<CommitOutcome, DevaiError> {
        self.run_cycles(ui)
            .map_err(|err| into_domain_error(err, unclassified))
    }

    #[instrument(skip_all, fields(stage_all = self.options.stage_all))]
    fn run_cycles<U: CommitUi + ?Sized>(&self, ui: &mut U) -> Result<CommitOutcome> {
        let mut cycle = 0u32;
        loop {
            cycle += 1;
            debug!(cycle, "starting commit cycle");
            let message = self.generate_once(ui)?;
            ui.preview_message(&message)?;

            match ui.select_action()? {
                CommitAction::Approve => {
                    self.git.commit(&message)?;
                    info!(cycle, "committed generated message");
                    return Ok(CommitOutcome::Committed(message));
                }
                CommitAction::Edit => {
                    let edited = self.editor.edit(&message)?;
                    warn_on_format(&edited);
                    self.git.commit(&edited)?;
                    info!(cycle, "committed edited message");
                    return Ok(CommitOutcome::Committed(edited));
                }
                CommitAction::Regenerate => {
                    debug!(cycle, "regenerate requested");
                }
                CommitAction::Cancel => {
                    info!(cycle, "commit cancelled");
                    return Ok(CommitOutcome::Cancelled);
                }
            }
        }
    }

    fn generate_once<U: CommitUi + ?Sized>(&self, ui: &mut U) -> Result<String> {
        if self.options.stage_all {
            self.git.stage_all()?;
        }
        let context = validate_preconditions(self.git, self.service)?;
        let commit_type = ui.select_commit_type()?;

        let user_context = self
            .options
            .user_context
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty());
        ui.start_thinking(if user_context.is_some() {
            "Generating commit message with your context..."
        } else {
            "Generating commit message..."
        });

        let request = GenerationRequest {
            commit_type: commit_type.as_str().to_string(),
            diff: context.diff,
            status: context.branch,
            user_context: user_context.map(str::to_string),
        };
        let result =
            CommitGenerator::with_options(self.service, self.generation.clone()).execute(&request);
        ui.stop_thinking();
        result
    }
}

fn unclassified(detail: String) -> DevaiError {
    let detail = if detail.trim().is_empty() {
        "No error details available".to_string()
    } else {
        detail
    };
    DevaiError::service("Unexpected error occurred", detail)
}

/// Edited text is committed as-is; format problems are only reported.
fn warn_on_format(edited: &str) {
    let subject = edited.lines().next().unwrap_or_default();
    if let ValidationOutcome::Invalid(reason) = validate_message(subject) {
        warn!(%reason, "edited commit message does not follow conventional format");
    }
}
