//! Pure commit-message logic.
//!
//! Nothing in here touches the network, the filesystem or subprocesses. Every
//! function is deterministic and safe to call with malformed input: failures
//! are reported as values (empty strings, [`types::ValidationOutcome`]), never
//! as errors.

pub mod normalizer;
pub mod prompt;
pub mod response;
pub mod type_enforcer;
pub mod types;
pub mod validator;
