//! End-to-end commit workflow tests: scripted model, real git repository.

use devai::commit::{CommitOptions, CommitOutcome, CommitWorkflow};
use devai::core::types::{CommitAction, CommitType, GenerationOptions};
use devai::error::ErrorKind;
use devai::test_support::{ScriptedCommitUi, ScriptedEditor, ScriptedGenerationService, TestRepo};

fn generation() -> GenerationOptions {
    GenerationOptions::for_model("devai-cli-commit:latest")
}

#[test]
fn approved_message_lands_in_history() {
    let repo = TestRepo::new();
    repo.write("src/auth.rs", "pub fn login() {}\n");
    repo.stage("src/auth.rs");
    let git = repo.adapter();
    let service =
        ScriptedGenerationService::replies(["Here's the commit message: fix: add login handler"]);
    let editor = ScriptedEditor::returning("unused");
    let mut ui = ScriptedCommitUi::new([CommitType::Feat], [CommitAction::Approve]);

    let outcome = CommitWorkflow::new(&git, &service, &editor, generation(), CommitOptions::default())
        .run(&mut ui)
        .expect("commit");

    assert_eq!(
        outcome,
        CommitOutcome::Committed("feat: add login handler".to_string())
    );
    assert_eq!(repo.head_subject(), "feat: add login handler");
    let prompt = &service.prompts()[0];
    assert!(prompt.contains("Commit Type: feat"));
    assert!(prompt.contains("Current Status: main"));
    assert!(prompt.contains("+pub fn login() {}"));
}

#[test]
fn stage_all_commits_unstaged_work() {
    let repo = TestRepo::new();
    repo.write("CHANGELOG.md", "## 0.1.0\n");
    let git = repo.adapter();
    let service = ScriptedGenerationService::replies(["docs: start changelog"]);
    let editor = ScriptedEditor::returning("unused");
    let mut ui = ScriptedCommitUi::new([CommitType::Docs], [CommitAction::Approve]);
    let options = CommitOptions {
        stage_all: true,
        user_context: None,
    };

    CommitWorkflow::new(&git, &service, &editor, generation(), options)
        .run(&mut ui)
        .expect("commit");
    assert_eq!(repo.head_subject(), "docs: start changelog");
}

#[test]
fn edited_message_is_committed_verbatim() {
    let repo = TestRepo::new();
    repo.write("a.txt", "a\n");
    repo.stage("a.txt");
    let git = repo.adapter();
    let service = ScriptedGenerationService::replies(["chore: add a"]);
    let editor = ScriptedEditor::returning("chore: add placeholder file\n\nNeeded by the fixture loader.\n");
    let mut ui = ScriptedCommitUi::new([CommitType::Chore], [CommitAction::Edit]);

    CommitWorkflow::new(&git, &service, &editor, generation(), CommitOptions::default())
        .run(&mut ui)
        .expect("commit");
    assert_eq!(repo.head_subject(), "chore: add placeholder file");
    assert_eq!(editor.seeds(), vec!["chore: add a"]);
}

#[test]
fn nothing_staged_stops_before_generation() {
    let repo = TestRepo::new();
    let git = repo.adapter();
    let service = ScriptedGenerationService::replies(["feat: x"]);
    let editor = ScriptedEditor::returning("unused");
    let mut ui = ScriptedCommitUi::new([CommitType::Feat], [CommitAction::Approve]);

    let err = CommitWorkflow::new(&git, &service, &editor, generation(), CommitOptions::default())
        .run(&mut ui)
        .expect_err("nothing staged");
    assert_eq!(err.kind(), ErrorKind::UserActionable);
    assert_eq!(err.message(), "No staged changes found");
    assert_eq!(service.generate_calls(), 0);
    assert_eq!(repo.head_subject(), "chore: init");
}

#[test]
fn unreachable_daemon_is_service_unavailable() {
    let repo = TestRepo::new();
    repo.write("a.txt", "a\n");
    repo.stage("a.txt");
    let git = repo.adapter();
    let service = ScriptedGenerationService::new().disconnected();
    let editor = ScriptedEditor::returning("unused");
    let mut ui = ScriptedCommitUi::new([CommitType::Feat], [CommitAction::Approve]);

    let err = CommitWorkflow::new(&git, &service, &editor, generation(), CommitOptions::default())
        .run(&mut ui)
        .expect_err("daemon down");
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert!(ui.previews.is_empty());
}

#[test]
fn regenerate_then_cancel_leaves_history_untouched() {
    let repo = TestRepo::new();
    repo.write("a.txt", "a\n");
    repo.stage("a.txt");
    let git = repo.adapter();
    let service = ScriptedGenerationService::replies(["feat: one", "feat: two"]);
    let editor = ScriptedEditor::returning("unused");
    let mut ui = ScriptedCommitUi::new(
        [CommitType::Feat, CommitType::Perf],
        [CommitAction::Regenerate, CommitAction::Cancel],
    );

    let outcome = CommitWorkflow::new(&git, &service, &editor, generation(), CommitOptions::default())
        .run(&mut ui)
        .expect("cancel");
    assert_eq!(outcome, CommitOutcome::Cancelled);
    assert_eq!(ui.previews, vec!["feat: one", "perf: two"]);
    assert_eq!(repo.head_subject(), "chore: init");
}
