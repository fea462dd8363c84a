//! Cleanup of raw model output before validation.

use std::sync::LazyLock;

use regex::Regex;

static CONVERSATIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(here is|here's) (the )?commit message:?\s*").expect("preamble regex")
});
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^commit message:?\s*").expect("label regex"));
static OPEN_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```\w*\s*").expect("open fence regex"));
static CLOSE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\s*$").expect("close fence regex"));

/// Reduce a model reply to its first line, minus chatty preambles and code
/// fences. Returns `None` when nothing usable is left.
pub fn clean_response(raw: &str) -> Option<String> {
    let first_line = raw.trim().split('\n').next().unwrap_or_default().trim();
    if first_line.is_empty() {
        return None;
    }

    let mut line = CONVERSATIONAL_RE.replace(first_line, "").into_owned();
    line = LABEL_RE.replace(&line, "").into_owned();
    line = OPEN_FENCE_RE.replace(&line, "").into_owned();
    line = CLOSE_FENCE_RE.replace(&line, "").into_owned();

    let line = line.trim();
    (!line.is_empty()).then(|| line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_preamble_and_trailing_fence() {
        assert_eq!(
            clean_response("Here is the commit message: feat: add x```").as_deref(),
            Some("feat: add x")
        );
    }

    #[test]
    fn preamble_match_ignores_case() {
        assert_eq!(
            clean_response("HERE'S COMMIT MESSAGE fix: typo").as_deref(),
            Some("fix: typo")
        );
        assert_eq!(
            clean_response("commit message: docs: readme").as_deref(),
            Some("docs: readme")
        );
    }

    #[test]
    fn keeps_only_first_line() {
        assert_eq!(
            clean_response("\n\n  feat: add x  \n\nbody text\n").as_deref(),
            Some("feat: add x")
        );
    }

    #[test]
    fn strips_opening_fence_with_language() {
        assert_eq!(
            clean_response("```text feat: add x```").as_deref(),
            Some("feat: add x")
        );
    }

    #[test]
    fn fence_only_reply_is_empty() {
        assert_eq!(clean_response("```\nfeat: add x\n```"), None);
    }

    #[test]
    fn blank_reply_is_empty() {
        assert_eq!(clean_response(""), None);
        assert_eq!(clean_response(" \n\t"), None);
        assert_eq!(clean_response("Commit message:"), None);
    }
}
