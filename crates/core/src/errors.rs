use thiserror::Error;

use crate::domain::quote::QuoteStatus;
use crate::pipeline::registry::QuoteAction;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown quote status `{0}`")]
    UnknownStatus(String),
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("action {action:?} is not permitted for quotes in status {status:?}")]
    ActionNotPermitted { status: QuoteStatus, action: QuoteAction },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
}

impl ApplicationError {
    /// Short classification used in operator-facing payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain",
            Self::Persistence(_) => "persistence",
            Self::Integration(_) => "integration",
        }
    }
}
