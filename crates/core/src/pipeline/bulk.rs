//! Bulk actions over a selection of quotes.
//!
//! The dispatcher hands the whole selection to a caller-supplied executor in
//! a single call and reports one aggregate outcome. It never retries and never
//! inspects which ids inside the batch succeeded; atomicity across the batch
//! belongs to the executor.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::quote::QuoteId;
use crate::errors::{ApplicationError, DomainError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Send,
    Export,
    Duplicate,
    Accept,
    Reject,
    Archive,
    Delete,
}

impl BulkAction {
    pub const ALL: [BulkAction; 7] = [
        Self::Send,
        Self::Export,
        Self::Duplicate,
        Self::Accept,
        Self::Reject,
        Self::Archive,
        Self::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Export => "export",
            Self::Duplicate => "duplicate",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Archive => "archive",
            Self::Delete => "delete",
        }
    }

    /// Past-tense label used in the completion notification.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Send => "verzonden",
            Self::Export => "geëxporteerd",
            Self::Duplicate => "gedupliceerd",
            Self::Accept => "geaccepteerd",
            Self::Reject => "afgewezen",
            Self::Archive => "gearchiveerd",
            Self::Delete => "verwijderd",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkAction {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownAction(value.to_string()))
    }
}

#[async_trait]
pub trait BulkActionExecutor: Send + Sync {
    async fn execute(&self, action: BulkAction, ids: &[QuoteId]) -> Result<(), ApplicationError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub action: BulkAction,
    pub label: &'static str,
    /// Number of selected ids handed to the executor; callers de-duplicate.
    pub affected: usize,
}

impl BulkOutcome {
    pub fn message(&self) -> String {
        let noun = if self.affected == 1 { "offerte" } else { "offertes" };
        format!("{} {noun} {}", self.affected, self.label)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BulkActionError {
    #[error("bulk action `{action}` failed for {selected} selected quotes: {source}")]
    ExecutorFailed {
        action: BulkAction,
        selected: usize,
        #[source]
        source: ApplicationError,
    },
}

impl BulkActionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ExecutorFailed { .. } => "Er is iets misgegaan. Probeer het opnieuw.",
        }
    }
}

pub async fn apply_bulk_action<E>(
    action: BulkAction,
    ids: &[QuoteId],
    executor: &E,
) -> Result<BulkOutcome, BulkActionError>
where
    E: BulkActionExecutor + ?Sized,
{
    match executor.execute(action, ids).await {
        Ok(()) => {
            tracing::info!(
                event_name = "pipeline.bulk_action.applied",
                action = action.as_str(),
                selected = ids.len(),
                "bulk action applied"
            );
            Ok(BulkOutcome { action, label: action.label(), affected: ids.len() })
        }
        Err(source) => {
            tracing::warn!(
                event_name = "pipeline.bulk_action.failed",
                action = action.as_str(),
                selected = ids.len(),
                error = %source,
                "bulk action failed"
            );
            Err(BulkActionError::ExecutorFailed { action, selected: ids.len(), source })
        }
    }
}

pub async fn apply_bulk_action_with_audit<E, S>(
    action: BulkAction,
    ids: &[QuoteId],
    executor: &E,
    sink: &S,
    audit: &AuditContext,
) -> Result<BulkOutcome, BulkActionError>
where
    E: BulkActionExecutor + ?Sized,
    S: AuditSink + ?Sized,
{
    let result = apply_bulk_action(action, ids, executor).await;
    let quote_ids = ids.iter().map(QuoteId::as_str).collect::<Vec<_>>().join(",");
    match &result {
        Ok(outcome) => {
            sink.emit(
                AuditEvent::new(
                    audit,
                    "pipeline.bulk_action_applied",
                    AuditCategory::BulkAction,
                    AuditOutcome::Success,
                )
                .with_metadata("action", action.as_str())
                .with_metadata("affected", outcome.affected.to_string())
                .with_metadata("quote_ids", quote_ids),
            );
        }
        Err(error) => {
            sink.emit(
                AuditEvent::new(
                    audit,
                    "pipeline.bulk_action_failed",
                    AuditCategory::BulkAction,
                    AuditOutcome::Failed,
                )
                .with_metadata("action", action.as_str())
                .with_metadata("quote_ids", quote_ids)
                .with_metadata("error", error.to_string()),
            );
        }
    }
    result
}
