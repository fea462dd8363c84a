//! Conventional commit messages from staged changes, generated by a local
//! Ollama model.
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (message transforms, prompt
//!   building, shared types). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (git, Ollama HTTP, editor, terminal,
//!   configuration) behind traits so tests can substitute fakes.
//!
//! Orchestration modules ([`generate`], [`preconditions`], [`commit`],
//! [`setup`]) coordinate core logic with I/O to implement CLI commands.

pub mod commit;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod generate;
pub mod io;
pub mod logging;
pub mod preconditions;
pub mod setup;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
