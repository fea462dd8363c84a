//! Typed error kinds surfaced to the user.
//!
//! Collaborators and use cases return `anyhow::Result`; a [`DevaiError`] rides
//! inside the `anyhow::Error` and is recovered at the orchestration boundary
//! with [`into_domain_error`].

use thiserror::Error;

use crate::exit_codes;

/// The four error kinds the CLI distinguishes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DevaiError {
    /// Caused by the user's environment or input. Safe to show as-is.
    #[error("{message}")]
    UserActionable { message: String, remediation: String },

    /// The generation service or a required binary is unreachable or misconfigured.
    #[error("{message}")]
    ServiceUnavailable { message: String, remediation: String },

    /// Generated text (or engine input) failed format rules.
    #[error("{message}")]
    Validation {
        message: String,
        remediation: Option<String>,
    },

    /// Anything not classified above.
    #[error("{message}: {detail}")]
    Unexpected { message: String, detail: String },
}

/// Coarse classification of a [`DevaiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserActionable,
    ServiceUnavailable,
    Validation,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UserActionable => "user_actionable",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Validation => "validation",
            ErrorKind::Unexpected => "unexpected",
        }
    }
}

impl DevaiError {
    pub fn user(message: impl Into<String>, remediation: impl Into<String>) -> Self {
        DevaiError::UserActionable {
            message: message.into(),
            remediation: remediation.into(),
        }
    }

    pub fn service(message: impl Into<String>, remediation: impl Into<String>) -> Self {
        DevaiError::ServiceUnavailable {
            message: message.into(),
            remediation: remediation.into(),
        }
    }

    pub fn validation(message: impl Into<String>, remediation: Option<&str>) -> Self {
        DevaiError::Validation {
            message: message.into(),
            remediation: remediation.map(str::to_string),
        }
    }

    pub fn unexpected(message: impl Into<String>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        DevaiError::Unexpected {
            message: message.into(),
            detail: if detail.trim().is_empty() {
                "No error details available".to_string()
            } else {
                detail
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DevaiError::UserActionable { .. } => ErrorKind::UserActionable,
            DevaiError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            DevaiError::Validation { .. } => ErrorKind::Validation,
            DevaiError::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// The headline message without detail.
    pub fn message(&self) -> &str {
        match self {
            DevaiError::UserActionable { message, .. }
            | DevaiError::ServiceUnavailable { message, .. }
            | DevaiError::Validation { message, .. }
            | DevaiError::Unexpected { message, .. } => message,
        }
    }

    pub fn remediation(&self) -> Option<&str> {
        match self {
            DevaiError::UserActionable { remediation, .. }
            | DevaiError::ServiceUnavailable { remediation, .. } => Some(remediation),
            DevaiError::Validation { remediation, .. } => remediation.as_deref(),
            DevaiError::Unexpected { .. } => None,
        }
    }

    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, DevaiError::ServiceUnavailable { .. })
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::UserActionable => exit_codes::USER,
            ErrorKind::ServiceUnavailable => exit_codes::SERVICE,
            ErrorKind::Validation => exit_codes::VALIDATION,
            ErrorKind::Unexpected => exit_codes::UNEXPECTED,
        }
    }
}

/// Recover the [`DevaiError`] carried by `err`, or build one with `fallback`
/// from the error's rendered text.
pub fn into_domain_error(
    err: anyhow::Error,
    fallback: impl FnOnce(String) -> DevaiError,
) -> DevaiError {
    match err.downcast::<DevaiError>() {
        Ok(domain) => domain,
        Err(other) => fallback(format!("{other:#}")),
    }
}

/// Borrowing variant of [`into_domain_error`] for inspection.
pub fn domain_error(err: &anyhow::Error) -> Option<&DevaiError> {
    err.downcast_ref::<DevaiError>()
}
