//! Generation engine: prompt, call the model, clean and validate the reply,
//! and retry rejected replies within a fixed budget.

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::normalizer::normalize_format;
use crate::core::prompt::{PromptParams, build_user_prompt};
use crate::core::response::clean_response;
use crate::core::type_enforcer::enforce_type;
use crate::core::types::{GenerationOptions, GenerationRequest, ValidationOutcome};
use crate::core::validator::validate_structure;
use crate::error::DevaiError;
use crate::io::ollama::GenerationService;

/// Generation attempts per invocation before giving up.
pub const MAX_ATTEMPTS: u32 = 5;

const EMPTY_RESPONSE: &str = "Empty response received from LLM";
const NEXT_STEP: &str = "Run the command again to regenerate, or commit manually with `git commit`";

/// What a single attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attempt {
    /// Final, normalized message.
    Accepted(String),
    /// Structural failure; the reason feeds the next prompt.
    Rejected(String),
}

/// Turns a [`GenerationRequest`] into a validated conventional commit message.
pub struct CommitGenerator<'a, S: ?Sized> {
    service: &'a S,
    options: GenerationOptions,
}

impl<'a, S: GenerationService + ?Sized> CommitGenerator<'a, S> {
    /// Engine defaults (temperature 0.3, context 10000) for `model`.
    pub fn new(service: &'a S, model: impl Into<String>) -> Self {
        Self::with_options(service, GenerationOptions::for_model(model))
    }

    pub fn with_options(service: &'a S, options: GenerationOptions) -> Self {
        Self { service, options }
    }

    /// Generate a message, retrying structurally invalid replies.
    ///
    /// Empty input fails immediately. Errors from the generation service are
    /// returned unchanged and never consume an attempt.
    #[instrument(skip_all, fields(commit_type = %request.commit_type, model = %self.options.model))]
    pub fn execute(&self, request: &GenerationRequest) -> Result<String> {
        validate_request(request)?;

        let mut last_rejection: Option<String> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            debug!(attempt, "requesting commit message");
            match self.attempt(request, last_rejection.as_deref())? {
                Attempt::Accepted(message) => {
                    info!(attempt, "commit message accepted");
                    return Ok(message);
                }
                Attempt::Rejected(reason) => {
                    warn!(attempt, %reason, "generated message rejected");
                    last_rejection = Some(reason);
                }
            }
        }

        Err(DevaiError::validation(
            "Failed to generate valid commit message after maximum attempts",
            Some(NEXT_STEP),
        )
        .into())
    }

    fn attempt(&self, request: &GenerationRequest, retry_error: Option<&str>) -> Result<Attempt> {
        let prompt = build_user_prompt(&PromptParams {
            commit_type: &request.commit_type,
            diff: &request.diff,
            status: &request.status,
            retry_error,
            user_context: request.user_context.as_deref(),
        });
        let raw = self.service.generate(&prompt, &self.options)?;
        Ok(evaluate_reply(&raw, &request.commit_type))
    }
}

fn validate_request(request: &GenerationRequest) -> Result<()> {
    if request.commit_type.trim().is_empty() {
        return Err(DevaiError::validation("Commit type cannot be empty", Some(NEXT_STEP)).into());
    }
    if request.diff.trim().is_empty() {
        return Err(DevaiError::validation("Git diff cannot be empty", Some(NEXT_STEP)).into());
    }
    Ok(())
}

/// Clean, validate, retype and normalize one raw model reply.
fn evaluate_reply(raw: &str, commit_type: &str) -> Attempt {
    let Some(cleaned) = clean_response(raw) else {
        return Attempt::Rejected(EMPTY_RESPONSE.to_string());
    };
    match validate_structure(&cleaned) {
        ValidationOutcome::Valid => {
            Attempt::Accepted(normalize_format(&enforce_type(&cleaned, commit_type)))
        }
        ValidationOutcome::Invalid(reason) => Attempt::Rejected(reason),
    }
}
