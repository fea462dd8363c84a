//! Shared value types for commit generation and model provisioning.
//!
//! Nothing here performs I/O; adapters and use cases exchange these types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Conventional commit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
    Revert,
}

impl CommitType {
    /// Every supported type, in menu order.
    pub const ALL: [CommitType; 11] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Build,
        CommitType::Ci,
        CommitType::Chore,
        CommitType::Revert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Build => "build",
            CommitType::Ci => "ci",
            CommitType::Chore => "chore",
            CommitType::Revert => "revert",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CommitType::Feat => "A new feature",
            CommitType::Fix => "A bug fix",
            CommitType::Docs => "Documentation only changes",
            CommitType::Style => {
                "Changes that do not affect the meaning of the code (white-space, formatting, missing semi-colons, etc)"
            }
            CommitType::Refactor => "A code change that neither fixes a bug nor adds a feature",
            CommitType::Perf => "A code change that improves performance",
            CommitType::Test => "Adding missing tests or correcting existing tests",
            CommitType::Build => "Changes that affect the build system or external dependencies",
            CommitType::Ci => "Changes to our CI configuration files and scripts",
            CommitType::Chore => "Other changes that don't modify src or test files",
            CommitType::Revert => "Reverts a previous commit",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        CommitType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| format!("unknown commit type '{}'", s.trim()))
    }
}

/// Decision taken after previewing a generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAction {
    Approve,
    Edit,
    Regenerate,
    Cancel,
}

/// Result of a structural check: a failure always carries its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(String),
}

impl ValidationOutcome {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ValidationOutcome::Invalid(reason.into())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid(reason) => Some(reason),
        }
    }
}

/// Input to one run of the generation engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationRequest {
    pub commit_type: String,
    pub diff: String,
    /// Repository status shown to the model (the branch name).
    pub status: String,
    /// Free-form guidance typed by the user.
    pub user_context: Option<String>,
}

/// Options passed through to the generation capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<u64>,
}

impl GenerationOptions {
    /// Defaults used by the engine: temperature 0.3, context window 10000.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: Some(0.3),
            num_ctx: Some(10_000),
            keep_alive: None,
        }
    }
}

/// Repository facts gathered by the precondition chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitContext {
    pub diff: String,
    pub branch: String,
}

/// Outcome of the base-model stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseModelResult {
    pub existed: bool,
    pub pulled: Option<bool>,
}

/// Outcome of the custom-model stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomModelResult {
    pub existed: bool,
    pub created: Option<bool>,
}

/// One progress update from a streamed model operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressEvent {
    pub status: String,
    pub current: Option<u64>,
    pub total: Option<u64>,
}

impl ProgressEvent {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Self::default()
        }
    }

    /// Whole-number percentage when both counters are known.
    pub fn percent(&self) -> Option<u8> {
        match (self.current, self.total) {
            (Some(current), Some(total)) if total > 0 => {
                let pct = current.min(total).saturating_mul(100) / total;
                Some(pct as u8)
            }
            _ => None,
        }
    }
}

/// Named stage of the setup workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    Daemon,
    BaseModel,
    CustomModel,
}

impl SetupStage {
    pub fn as_str(self) -> &'static str {
        match self {
            SetupStage::Daemon => "daemon",
            SetupStage::BaseModel => "base-model",
            SetupStage::CustomModel => "custom-model",
        }
    }
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters baked into the custom model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelParameters {
    pub temperature: f32,
    pub num_ctx: u32,
}

/// Everything needed to derive the custom model from its base.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    pub name: String,
    pub from: String,
    pub system: String,
    pub parameters: ModelParameters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_type_parses_case_insensitively() {
        assert_eq!("FEAT".parse::<CommitType>(), Ok(CommitType::Feat));
        assert_eq!(" ci ".parse::<CommitType>(), Ok(CommitType::Ci));
        assert!("feature".parse::<CommitType>().is_err());
    }

    #[test]
    fn commit_type_menu_covers_all_types() {
        let names: Vec<&str> = CommitType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci",
                "chore", "revert"
            ]
        );
    }

    #[test]
    fn invalid_outcome_always_has_reason() {
        let outcome = ValidationOutcome::invalid("bad");
        assert!(!outcome.is_valid());
        assert_eq!(outcome.failure_reason(), Some("bad"));
        assert_eq!(ValidationOutcome::Valid.failure_reason(), None);
    }

    #[test]
    fn percent_needs_both_counters() {
        let event = ProgressEvent {
            status: "downloading".to_string(),
            current: Some(50),
            total: Some(200),
        };
        assert_eq!(event.percent(), Some(25));
        assert_eq!(ProgressEvent::status("verifying").percent(), None);
    }

    #[test]
    fn engine_defaults_use_caller_model() {
        let options = GenerationOptions::for_model("custom:latest");
        assert_eq!(options.model, "custom:latest");
        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.num_ctx, Some(10_000));
    }
}
