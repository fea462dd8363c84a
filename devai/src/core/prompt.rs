//! User prompt assembly for commit generation.

use minijinja::{Environment, context};

const COMMIT_TEMPLATE: &str = include_str!("prompts/commit.md");

/// Built-in system prompt baked into the custom model.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("prompts/system.md");

/// Inputs for [`build_user_prompt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptParams<'a> {
    pub commit_type: &'a str,
    pub diff: &'a str,
    pub status: &'a str,
    /// Reason the previous attempt was rejected.
    pub retry_error: Option<&'a str>,
    pub user_context: Option<&'a str>,
}

/// Render the generation prompt. The diff is embedded verbatim.
pub fn build_user_prompt(params: &PromptParams<'_>) -> String {
    let mut env = Environment::new();
    env.add_template("commit", COMMIT_TEMPLATE)
        .expect("commit template should be valid");
    let template = env
        .get_template("commit")
        .expect("commit template should be registered");
    template
        .render(context! {
            commit_type => params.commit_type,
            status => params.status,
            diff => params.diff,
            retry_error => params.retry_error.map(str::trim).filter(|s| !s.is_empty()),
            user_context => params.user_context.map(str::trim).filter(|s| !s.is_empty()),
        })
        .expect("commit template rendering should not fail")
}
