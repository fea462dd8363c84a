//! Canonical spacing for commit messages.

/// Rewrite `message` as `type: subject`, optionally followed by a blank line
/// and body paragraphs separated by exactly one blank line.
///
/// Blank lines are dropped and every line is trimmed. Input without a colon
/// comes back trimmed and otherwise untouched.
pub fn normalize_format(message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        return String::new();
    }

    let Some((kind, rest)) = message.split_once(':') else {
        return message.to_string();
    };
    let kind = kind.trim();

    let mut lines = rest
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let Some(subject) = lines.next() else {
        return kind.to_string();
    };

    let body: Vec<&str> = lines.collect();
    if body.is_empty() {
        format!("{kind}: {subject}")
    } else {
        format!("{kind}: {subject}\n\n{}", body.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_blank_lines_between_paragraphs() {
        assert_eq!(
            normalize_format("feat: add feature\n\n\nbody line 1\n\nbody line 2"),
            "feat: add feature\n\nbody line 1\n\nbody line 2"
        );
    }

    #[test]
    fn separates_adjacent_body_lines() {
        assert_eq!(
            normalize_format("fix: crash\nfirst\nsecond"),
            "fix: crash\n\nfirst\n\nsecond"
        );
    }

    #[test]
    fn trims_each_line() {
        assert_eq!(
            normalize_format("  feat  :   add x   \n   detail  \r\n"),
            "feat: add x\n\ndetail"
        );
    }

    #[test]
    fn subject_may_start_on_next_line() {
        assert_eq!(normalize_format("feat:\n\nadd x"), "feat: add x");
    }

    #[test]
    fn empty_rest_returns_bare_type() {
        assert_eq!(normalize_format("feat:"), "feat");
        assert_eq!(normalize_format("feat:  \n \n"), "feat");
    }

    #[test]
    fn no_colon_returns_trimmed_input() {
        assert_eq!(normalize_format("  just words\n\nhere "), "just words\n\nhere");
    }

    #[test]
    fn blank_input_returns_empty() {
        assert_eq!(normalize_format(""), "");
        assert_eq!(normalize_format(" \n\t "), "");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let inputs = [
            "feat: add feature\n\n\nbody line 1\n\nbody line 2",
            "fix:crash\nfirst\n  second",
            "feat:",
            "no colon at all",
            ": orphan description",
            "docs: a: b\n\n\nc: d",
            "",
            "   ",
        ];
        for input in inputs {
            let once = normalize_format(input);
            assert_eq!(normalize_format(&once), once, "{input:?}");
        }
    }
}
