//! Adapters for the outside world: git, Ollama, editor, terminal, config.

pub mod config;
pub mod editor;
pub mod git;
pub mod ollama;
pub mod terminal;
