//! Terminal interaction.
//!
//! [`CommitUi`] and [`SetupUi`] are the seams the workflows talk to. Menus
//! use `dialoguer`; everything else is written to a generic writer so tests
//! can capture it in memory.

use std::io::Write;

use anyhow::{Context, Result};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;

use crate::core::types::{CommitAction, CommitType, ProgressEvent, SetupStage};
use crate::error::DevaiError;
use crate::io::config::ModelConfig;

/// Interaction needed by the commit workflow.
pub trait CommitUi {
    fn select_commit_type(&mut self) -> Result<CommitType>;
    /// Announce a long-running step. Paired with [`CommitUi::stop_thinking`].
    fn start_thinking(&mut self, message: &str);
    fn stop_thinking(&mut self);
    fn preview_message(&mut self, message: &str) -> Result<()>;
    fn select_action(&mut self) -> Result<CommitAction>;
}

/// Notifications emitted by the setup workflow. Purely informational.
pub trait SetupUi {
    fn show_intro(&mut self);
    fn on_stage_start(&mut self, stage: SetupStage, detail: &str);
    fn on_progress(&mut self, event: &ProgressEvent);
    fn on_stage_success(&mut self, stage: SetupStage, detail: &str);
    fn on_stage_failure(&mut self, stage: SetupStage, error: &DevaiError);
    fn show_outro(&mut self, config: &ModelConfig);
}

/// Commit decision menu, in display order.
const ACTIONS: [(CommitAction, &str); 4] = [
    (CommitAction::Approve, "Approve and commit"),
    (CommitAction::Edit, "Edit in $EDITOR, then commit"),
    (CommitAction::Regenerate, "Regenerate"),
    (CommitAction::Cancel, "Cancel"),
];

/// Interactive prompts on the controlling terminal via `dialoguer`.
///
/// Menus render on stderr; previews and status lines go to `output`.
pub struct TerminalUi<W> {
    output: W,
    theme: ColorfulTheme,
}

impl<W: Write> TerminalUi<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            theme: ColorfulTheme::default(),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<W: Write> CommitUi for TerminalUi<W> {
    fn select_commit_type(&mut self) -> Result<CommitType> {
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Select commit type")
            .items(&commit_type_items())
            .default(0)
            .interact_opt()
            .context("read commit type selection")?;
        chosen(choice, CommitType::ALL.as_slice())
    }

    fn start_thinking(&mut self, message: &str) {
        let _ = writeln!(self.output, "… {message}");
        let _ = self.output.flush();
    }

    fn stop_thinking(&mut self) {
        let _ = self.output.flush();
    }

    fn preview_message(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "\nGenerated commit message:\n").context("write preview")?;
        for line in message.lines() {
            writeln!(self.output, "    {line}").context("write preview")?;
        }
        writeln!(self.output).context("write preview")?;
        self.output.flush().context("flush preview")?;
        Ok(())
    }

    fn select_action(&mut self) -> Result<CommitAction> {
        let labels: Vec<&str> = ACTIONS.iter().map(|(_, label)| *label).collect();
        let choice = Select::with_theme(&self.theme)
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact_opt()
            .context("read commit action selection")?;
        let actions: Vec<CommitAction> = ACTIONS.iter().map(|(action, _)| *action).collect();
        chosen(choice, actions.as_slice())
    }
}

/// Menu labels: type name padded, then its description.
fn commit_type_items() -> Vec<String> {
    CommitType::ALL
        .iter()
        .map(|kind| format!("{:<9} {}", kind.as_str(), kind.description()))
        .collect()
}

/// Map a menu selection back to its value. Escape (`None`) cancels.
fn chosen<T: Copy>(choice: Option<usize>, options: &[T]) -> Result<T> {
    choice
        .and_then(|index| options.get(index).copied())
        .ok_or_else(|| {
            DevaiError::user(
                "Operation cancelled",
                "Run the command again when you are ready",
            )
            .into()
        })
}

/// Plain-text renderer for `devai-cli setup`.
pub struct ConsoleSetupRenderer<W> {
    output: W,
    last_status: Option<String>,
    last_percent: Option<u8>,
}

impl<W: Write> ConsoleSetupRenderer<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            last_status: None,
            last_percent: None,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<W: Write> SetupUi for ConsoleSetupRenderer<W> {
    fn show_intro(&mut self) {
        let _ = writeln!(self.output, "devai-cli setup\n");
    }

    fn on_stage_start(&mut self, stage: SetupStage, detail: &str) {
        self.last_status = None;
        self.last_percent = None;
        let _ = writeln!(self.output, "[{stage}] {detail}");
    }

    fn on_progress(&mut self, event: &ProgressEvent) {
        let percent = event.percent();
        let same_status = self.last_status.as_deref() == Some(event.status.as_str());
        if same_status && percent == self.last_percent {
            return;
        }
        let _ = match percent {
            Some(pct) => writeln!(self.output, "    {} {pct:>3}%", event.status),
            None => writeln!(self.output, "    {}", event.status),
        };
        self.last_status = Some(event.status.clone());
        self.last_percent = percent;
    }

    fn on_stage_success(&mut self, stage: SetupStage, detail: &str) {
        let _ = writeln!(self.output, "[{stage}] ✓ {detail}");
    }

    fn on_stage_failure(&mut self, stage: SetupStage, error: &DevaiError) {
        let _ = writeln!(self.output, "[{stage}] ✗ {}", error.message());
    }

    fn show_outro(&mut self, config: &ModelConfig) {
        let _ = writeln!(
            self.output,
            "\nSetup complete.\n  base model:   {}\n  commit model: {}\n\nRun `devai-cli commit` in a repository with staged changes.",
            config.base_model, config.name
        );
    }
}
