//! Status registry for the offerte pipeline.
//!
//! Constant, enum-keyed configuration: display label, default win
//! probability, permitted follow-up actions and reminder cadence per status.
//! There is no mutation API; every lookup is an exhaustive `match`.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::quote::{Quote, QuoteId, QuoteStatus};
use crate::errors::{ApplicationError, DomainError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Neutral,
    Info,
    Warning,
    Success,
    Danger,
}

/// Follow-up a user can take on a single quote from the pipeline view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteAction {
    Edit,
    Send,
    Duplicate,
    FollowUp,
    Resend,
    Call,
    Revise,
    ScheduleMeeting,
    MarkAccepted,
    MarkLost,
}

impl QuoteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Send => "send",
            Self::Duplicate => "duplicate",
            Self::FollowUp => "follow_up",
            Self::Resend => "resend",
            Self::Call => "call",
            Self::Revise => "revise",
            Self::ScheduleMeeting => "schedule_meeting",
            Self::MarkAccepted => "mark_accepted",
            Self::MarkLost => "mark_lost",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Edit => "Bewerken",
            Self::Send => "Versturen",
            Self::Duplicate => "Dupliceren",
            Self::FollowUp => "Opvolgen",
            Self::Resend => "Opnieuw versturen",
            Self::Call => "Bellen",
            Self::Revise => "Herzien",
            Self::ScheduleMeeting => "Afspraak plannen",
            Self::MarkAccepted => "Markeer als geaccepteerd",
            Self::MarkLost => "Markeer als verloren",
        }
    }
}

impl fmt::Display for QuoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteAction {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let action = match value.trim().to_ascii_lowercase().as_str() {
            "edit" => Self::Edit,
            "send" => Self::Send,
            "duplicate" => Self::Duplicate,
            "follow_up" => Self::FollowUp,
            "resend" => Self::Resend,
            "call" => Self::Call,
            "revise" => Self::Revise,
            "schedule_meeting" => Self::ScheduleMeeting,
            "mark_accepted" => Self::MarkAccepted,
            "mark_lost" => Self::MarkLost,
            _ => return Err(DomainError::UnknownAction(value.to_string())),
        };
        Ok(action)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NextAction {
    pub action: QuoteAction,
    pub priority: ActionPriority,
}

const fn next(action: QuoteAction, priority: ActionPriority) -> NextAction {
    NextAction { action, priority }
}

const NO_ACTIONS: &[NextAction] = &[];

const CONCEPT_ACTIONS: &[NextAction] = &[
    next(QuoteAction::Send, ActionPriority::High),
    next(QuoteAction::Edit, ActionPriority::Medium),
    next(QuoteAction::Duplicate, ActionPriority::Low),
];

const SENT_ACTIONS: &[NextAction] = &[
    next(QuoteAction::FollowUp, ActionPriority::High),
    next(QuoteAction::Resend, ActionPriority::Medium),
    next(QuoteAction::MarkAccepted, ActionPriority::Low),
];

const VIEWED_ACTIONS: &[NextAction] = &[
    next(QuoteAction::Call, ActionPriority::High),
    next(QuoteAction::FollowUp, ActionPriority::Medium),
    next(QuoteAction::MarkAccepted, ActionPriority::Medium),
];

const NEGOTIATING_ACTIONS: &[NextAction] = &[
    next(QuoteAction::Revise, ActionPriority::High),
    next(QuoteAction::ScheduleMeeting, ActionPriority::High),
    next(QuoteAction::MarkAccepted, ActionPriority::Medium),
    next(QuoteAction::MarkLost, ActionPriority::Low),
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusConfig {
    pub status: QuoteStatus,
    pub label: &'static str,
    pub tone: StatusTone,
    /// Historical likelihood in [0, 1] that a quote in this status converts.
    pub default_probability: Decimal,
    pub terminal: bool,
    pub next_actions: &'static [NextAction],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_reminder_days: Option<u32>,
}

impl StatusConfig {
    pub fn permits(&self, action: QuoteAction) -> bool {
        self.next_actions.iter().any(|next| next.action == action)
    }
}

pub fn lookup(status: QuoteStatus) -> StatusConfig {
    let (label, tone, probability_pct, next_actions, auto_reminder_days) = match status {
        QuoteStatus::Concept => ("Concept", StatusTone::Neutral, 10, CONCEPT_ACTIONS, None),
        QuoteStatus::Sent => ("Verzonden", StatusTone::Info, 30, SENT_ACTIONS, Some(3)),
        QuoteStatus::Viewed => ("Bekeken", StatusTone::Info, 50, VIEWED_ACTIONS, Some(2)),
        QuoteStatus::Negotiating => {
            ("In onderhandeling", StatusTone::Warning, 80, NEGOTIATING_ACTIONS, Some(5))
        }
        QuoteStatus::Accepted => ("Geaccepteerd", StatusTone::Success, 100, NO_ACTIONS, None),
        QuoteStatus::Rejected => ("Afgewezen", StatusTone::Danger, 0, NO_ACTIONS, None),
        QuoteStatus::Lost => ("Verloren", StatusTone::Danger, 0, NO_ACTIONS, None),
        QuoteStatus::Expired => ("Verlopen", StatusTone::Neutral, 0, NO_ACTIONS, None),
    };

    StatusConfig {
        status,
        label,
        tone,
        default_probability: Decimal::new(probability_pct, 2),
        terminal: status.is_terminal(),
        next_actions,
        auto_reminder_days,
    }
}

/// Every status configuration, in lifecycle order.
pub fn registry() -> Vec<StatusConfig> {
    QuoteStatus::ALL.into_iter().map(lookup).collect()
}

pub fn is_action_permitted(status: QuoteStatus, action: QuoteAction) -> bool {
    lookup(status).permits(action)
}

/// Executes single-quote follow-ups on behalf of the surrounding application.
#[async_trait]
pub trait NextActionHandler: Send + Sync {
    async fn handle(&self, action: QuoteAction, quote_id: &QuoteId)
        -> Result<(), ApplicationError>;
}

pub async fn dispatch_next_action<H>(
    quote: &Quote,
    action: QuoteAction,
    handler: &H,
) -> Result<(), ApplicationError>
where
    H: NextActionHandler + ?Sized,
{
    if !is_action_permitted(quote.status, action) {
        tracing::warn!(
            event_name = "pipeline.next_action.rejected",
            quote_id = %quote.id,
            status = quote.status.as_str(),
            action = action.as_str(),
            "action not permitted for quote status"
        );
        return Err(DomainError::ActionNotPermitted { status: quote.status, action }.into());
    }

    handler.handle(action, &quote.id).await?;
    tracing::debug!(
        event_name = "pipeline.next_action.applied",
        quote_id = %quote.id,
        action = action.as_str(),
        "next action handled"
    );
    Ok(())
}

/// Same contract as [`dispatch_next_action`], plus one audit event: applied,
/// rejected (action not permitted for the status) or failed (handler error).
pub async fn dispatch_next_action_with_audit<H, S>(
    quote: &Quote,
    action: QuoteAction,
    handler: &H,
    sink: &S,
    audit: &AuditContext,
) -> Result<(), ApplicationError>
where
    H: NextActionHandler + ?Sized,
    S: AuditSink + ?Sized,
{
    let result = dispatch_next_action(quote, action, handler).await;
    let (event_type, outcome) = match &result {
        Ok(()) => ("pipeline.next_action_applied", AuditOutcome::Success),
        Err(ApplicationError::Domain(DomainError::ActionNotPermitted { .. })) => {
            ("pipeline.next_action_rejected", AuditOutcome::Rejected)
        }
        Err(_) => ("pipeline.next_action_failed", AuditOutcome::Failed),
    };

    let mut event = AuditEvent::new(audit, event_type, AuditCategory::Pipeline, outcome)
        .with_metadata("quote_id", quote.id.as_str())
        .with_metadata("status", quote.status.as_str())
        .with_metadata("action", action.as_str());
    if let Err(error) = &result {
        event = event.with_metadata("error", error.to_string());
    }
    sink.emit(event);
    result
}
