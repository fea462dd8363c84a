//! Test-only fakes for the collaborator traits, plus a throwaway git repository.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::core::types::{
    CommitAction, CommitType, GenerationOptions, ModelDefinition, ProgressEvent, SetupStage,
};
use crate::error::DevaiError;
use crate::io::config::ModelConfig;
use crate::io::editor::Editor;
use crate::io::git::{Git, VersionControl};
use crate::io::ollama::{GenerationService, ProgressStream};
use crate::io::terminal::{CommitUi, SetupUi};

/// Build a progress event.
pub fn progress(status: &str, current: Option<u64>, total: Option<u64>) -> ProgressEvent {
    ProgressEvent {
        status: status.to_string(),
        current,
        total,
    }
}

fn cancelled() -> anyhow::Error {
    DevaiError::user("Operation cancelled", "Run the command again when you are ready").into()
}

#[derive(Default)]
struct ServiceState {
    replies: VecDeque<String>,
    generate_failure: Option<anyhow::Error>,
    connection_failure: Option<anyhow::Error>,
    model_check_failure: Option<anyhow::Error>,
    models: Vec<String>,
    pull_events: Option<Vec<Result<ProgressEvent>>>,
    create_events: Option<Vec<Result<ProgressEvent>>>,
    calls: Vec<String>,
    prompts: Vec<String>,
    last_options: Option<GenerationOptions>,
    created: Vec<ModelDefinition>,
}

/// Scripted [`GenerationService`]: connected, no models installed, and
/// replying from a queue.
///
/// Pull and create streams default to a single `success` event.
pub struct ScriptedGenerationService {
    connected: bool,
    state: RefCell<ServiceState>,
}

impl Default for ScriptedGenerationService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGenerationService {
    pub fn new() -> Self {
        Self {
            connected: true,
            state: RefCell::new(ServiceState::default()),
        }
    }

    /// Replies returned by `generate`, in order.
    pub fn replies<I, T>(replies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let service = Self::new();
        service.state.borrow_mut().replies = replies.into_iter().map(Into::into).collect();
        service
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    /// `check_connection` fails once with `err`.
    pub fn with_connection_failure(self, err: anyhow::Error) -> Self {
        self.state.borrow_mut().connection_failure = Some(err);
        self
    }

    /// `model_exists` fails once with `err`.
    pub fn with_model_check_failure(self, err: anyhow::Error) -> Self {
        self.state.borrow_mut().model_check_failure = Some(err);
        self
    }

    /// Models reported as installed.
    pub fn with_models<I, T>(self, models: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.state
            .borrow_mut()
            .models
            .extend(models.into_iter().map(Into::into));
        self
    }

    pub fn with_pull_events(self, events: Vec<Result<ProgressEvent>>) -> Self {
        self.state.borrow_mut().pull_events = Some(events);
        self
    }

    pub fn with_create_events(self, events: Vec<Result<ProgressEvent>>) -> Self {
        self.state.borrow_mut().create_events = Some(events);
        self
    }

    /// The next `generate` call fails with `err`.
    pub fn with_generate_error(self, err: DevaiError) -> Self {
        self.with_generate_failure(err.into())
    }

    pub fn with_generate_failure(self, err: anyhow::Error) -> Self {
        self.state.borrow_mut().generate_failure = Some(err);
        self
    }

    /// Every call in order, e.g. `model_exists:<name>`, `pull:<name>`.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn generate_calls(&self) -> usize {
        self.count_calls("generate")
    }

    pub fn pull_calls(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.starts_with("pull:"))
            .count()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.borrow().prompts.clone()
    }

    pub fn last_options(&self) -> Option<GenerationOptions> {
        self.state.borrow().last_options.clone()
    }

    pub fn created_models(&self) -> Vec<ModelDefinition> {
        self.state.borrow().created.clone()
    }

    fn count_calls(&self, name: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| *call == name)
            .count()
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }
}

fn scripted_stream(events: Option<Vec<Result<ProgressEvent>>>) -> ProgressStream<'static> {
    let events = events.unwrap_or_else(|| vec![Ok(progress("success", None, None))]);
    Box::new(events.into_iter())
}

impl GenerationService for ScriptedGenerationService {
    fn check_connection(&self) -> Result<bool> {
        self.record("check_connection".to_string());
        if let Some(err) = self.state.borrow_mut().connection_failure.take() {
            return Err(err);
        }
        Ok(self.connected)
    }

    fn model_exists(&self, name: &str) -> Result<bool> {
        self.record(format!("model_exists:{name}"));
        if let Some(err) = self.state.borrow_mut().model_check_failure.take() {
            return Err(err);
        }
        Ok(self.state.borrow().models.iter().any(|model| model == name))
    }

    fn pull_model(&self, name: &str) -> Result<ProgressStream<'_>> {
        self.record(format!("pull:{name}"));
        let mut state = self.state.borrow_mut();
        state.models.push(name.to_string());
        Ok(scripted_stream(state.pull_events.take()))
    }

    fn create_model(&self, definition: &ModelDefinition) -> Result<ProgressStream<'_>> {
        self.record(format!("create:{}", definition.name));
        let mut state = self.state.borrow_mut();
        state.created.push(definition.clone());
        state.models.push(definition.name.clone());
        Ok(scripted_stream(state.create_events.take()))
    }

    fn delete_model(&self, name: &str) -> Result<()> {
        self.record(format!("delete:{name}"));
        self.state.borrow_mut().models.retain(|model| model != name);
        Ok(())
    }

    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        self.record("generate".to_string());
        let mut state = self.state.borrow_mut();
        state.prompts.push(prompt.to_string());
        state.last_options = Some(options.clone());
        if let Some(err) = state.generate_failure.take() {
            return Err(err);
        }
        state
            .replies
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted reply left"))
    }
}

/// In-memory [`VersionControl`]: inside a repository on `main`.
pub struct FakeVersionControl {
    in_repository: bool,
    diff: String,
    branch: String,
    calls: RefCell<Vec<&'static str>>,
    commits: RefCell<Vec<String>>,
}

impl FakeVersionControl {
    pub fn with_diff(diff: &str) -> Self {
        Self {
            in_repository: true,
            diff: diff.to_string(),
            branch: "main".to_string(),
            calls: RefCell::new(Vec::new()),
            commits: RefCell::new(Vec::new()),
        }
    }

    pub fn outside_repository(mut self) -> Self {
        self.in_repository = false;
        self
    }

    pub fn on_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    /// Messages committed so far.
    pub fn commits(&self) -> Vec<String> {
        self.commits.borrow().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }
}

impl VersionControl for FakeVersionControl {
    fn is_repository(&self) -> Result<bool> {
        self.record("is_repository");
        Ok(self.in_repository)
    }

    fn staged_diff(&self) -> Result<String> {
        self.record("staged_diff");
        Ok(self.diff.clone())
    }

    fn branch_name(&self) -> Result<String> {
        self.record("branch_name");
        Ok(self.branch.clone())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.record("commit");
        if message.trim().is_empty() {
            return Err(DevaiError::user(
                "Commit message cannot be empty",
                "Provide a valid commit message",
            )
            .into());
        }
        self.commits.borrow_mut().push(message.to_string());
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        self.record("stage_all");
        Ok(())
    }
}

/// [`Editor`] that returns fixed text (or fails once) and records its seeds.
pub struct ScriptedEditor {
    text: String,
    failure: RefCell<Option<anyhow::Error>>,
    seeds: RefCell<Vec<String>>,
}

impl ScriptedEditor {
    pub fn returning(text: &str) -> Self {
        Self {
            text: text.to_string(),
            failure: RefCell::new(None),
            seeds: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(err: anyhow::Error) -> Self {
        let editor = Self::returning("");
        *editor.failure.borrow_mut() = Some(err);
        editor
    }

    pub fn seeds(&self) -> Vec<String> {
        self.seeds.borrow().clone()
    }
}

impl Editor for ScriptedEditor {
    fn edit(&self, initial: &str) -> Result<String> {
        self.seeds.borrow_mut().push(initial.to_string());
        if let Some(err) = self.failure.borrow_mut().take() {
            return Err(err);
        }
        Ok(self.text.clone())
    }
}

/// [`CommitUi`] answering from queues. An empty queue behaves like closed
/// input.
#[derive(Debug, Default)]
pub struct ScriptedCommitUi {
    types: VecDeque<CommitType>,
    actions: VecDeque<CommitAction>,
    pub previews: Vec<String>,
    pub thinking: Vec<String>,
    pub thinking_stopped: usize,
}

impl ScriptedCommitUi {
    pub fn new(
        types: impl IntoIterator<Item = CommitType>,
        actions: impl IntoIterator<Item = CommitAction>,
    ) -> Self {
        Self {
            types: types.into_iter().collect(),
            actions: actions.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl CommitUi for ScriptedCommitUi {
    fn select_commit_type(&mut self) -> Result<CommitType> {
        self.types.pop_front().ok_or_else(cancelled)
    }

    fn start_thinking(&mut self, message: &str) {
        self.thinking.push(message.to_string());
    }

    fn stop_thinking(&mut self) {
        self.thinking_stopped += 1;
    }

    fn preview_message(&mut self, message: &str) -> Result<()> {
        self.previews.push(message.to_string());
        Ok(())
    }

    fn select_action(&mut self) -> Result<CommitAction> {
        self.actions.pop_front().ok_or_else(cancelled)
    }
}

/// [`SetupUi`] that records notifications as `kind:stage:detail` strings.
#[derive(Debug, Default)]
pub struct RecordingSetupUi {
    pub events: Vec<String>,
    pub progress: Vec<ProgressEvent>,
}

impl SetupUi for RecordingSetupUi {
    fn show_intro(&mut self) {
        self.events.push("intro".to_string());
    }

    fn on_stage_start(&mut self, stage: SetupStage, detail: &str) {
        self.events.push(format!("start:{stage}:{detail}"));
    }

    fn on_progress(&mut self, event: &ProgressEvent) {
        self.progress.push(event.clone());
    }

    fn on_stage_success(&mut self, stage: SetupStage, detail: &str) {
        self.events.push(format!("success:{stage}:{detail}"));
    }

    fn on_stage_failure(&mut self, stage: SetupStage, error: &DevaiError) {
        self.events
            .push(format!("failure:{stage}:{}", error.message()));
    }

    fn show_outro(&mut self, _config: &ModelConfig) {
        self.events.push("outro".to_string());
    }
}

/// A real git repository in a temporary directory, with a committer
/// identity and one initial commit.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Self { dir };
        repo.git(&["init"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "user.name", "test"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.write("README.md", "hi\n");
        repo.git(&["add", "README.md"]);
        repo.git(&["commit", "-m", "chore: init"]);
        repo
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn adapter(&self) -> Git {
        Git::new(self.root())
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn stage(&self, relative: &str) {
        self.git(&["add", relative]);
    }

    /// Subject of the latest commit.
    pub fn head_subject(&self) -> String {
        self.git(&["log", "-1", "--format=%s"]).trim().to_string()
    }

    /// Run git in the repository, panicking on failure; returns stdout.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.root())
            .output()
            .expect("spawn git");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
