//! Overwrite the type prefix of a commit message.

/// Replace whatever type prefix `message` carries with `commit_type`.
///
/// The description is everything after the first colon, so descriptions that
/// contain further colons survive intact. A message with no colon is treated
/// as a bare description. A whitespace-only message yields `"<type>: "`.
pub fn enforce_type(message: &str, commit_type: &str) -> String {
    if message.is_empty() {
        return String::new();
    }

    let commit_type = commit_type.trim();
    if commit_type.is_empty() {
        return message.trim().to_string();
    }

    let message = message.trim();
    if message.is_empty() {
        return format!("{commit_type}: ");
    }

    match message.split_once(':') {
        None => format!("{commit_type}: {message}"),
        Some((_, description)) => {
            let description = description.trim();
            if description.is_empty() {
                commit_type.to_string()
            } else {
                format!("{commit_type}: {description}")
            }
        }
    }
}
