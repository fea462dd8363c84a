//! Stable exit codes for devai-cli commands.

/// Command succeeded, or the user cancelled at the decision prompt.
pub const OK: i32 = 0;
/// Invalid usage or configuration.
pub const INVALID: i32 = 1;
/// User-actionable problem (not a repository, nothing staged, editor cancelled).
pub const USER: i32 = 2;
/// Ollama, git or the editor is unavailable or misbehaving.
pub const SERVICE: i32 = 3;
/// No valid commit message could be generated.
pub const VALIDATION: i32 = 4;
/// Unclassified failure; details are written to the debug log.
pub const UNEXPECTED: i32 = 5;
