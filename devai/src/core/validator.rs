//! Commit message format checks.
//!
//! Two validators with different strictness:
//! - [`validate_structure`] is the minimal `type: description` gate the
//!   generation engine retries on.
//! - [`validate_message`] additionally bounds the type alphabet and the
//!   description length, and is applied to hand-edited messages.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::ValidationOutcome;

/// Longest description accepted by [`validate_message`], in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 100;

static STRUCTURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+: [^\r\n\x{2028}\x{2029}]+$").expect("structure regex")
});

static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("type regex"));

/// Check that `message` has the shape `<word-chars>: <text>`.
pub fn validate_structure(message: &str) -> ValidationOutcome {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return ValidationOutcome::invalid("Message must be a non-empty string");
    }
    if !STRUCTURE_RE.is_match(trimmed) {
        return ValidationOutcome::invalid("Message must follow format: type: description");
    }
    ValidationOutcome::Valid
}

/// Stricter check: word-character type and a 1..=100 character description.
pub fn validate_message(message: &str) -> ValidationOutcome {
    let Some((kind, description)) = message.trim().split_once(':') else {
        return ValidationOutcome::invalid(
            "Commit message must follow conventional commit format: type: description",
        );
    };

    let kind = kind.trim();
    if !TYPE_RE.is_match(kind) {
        return ValidationOutcome::invalid("Commit type must contain only word characters");
    }

    let description = description.trim();
    if description.is_empty() {
        return ValidationOutcome::invalid("Commit description cannot be empty");
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return ValidationOutcome::invalid("Commit description must be 100 characters or less");
    }
    ValidationOutcome::Valid
}
