use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::quote::{Quote, QuoteId, QuoteStatus};
use crate::pipeline::registry::lookup;

/// An open quote that has sat in its status for at least the registry's
/// reminder cadence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReminderDue {
    pub quote_id: QuoteId,
    pub number: String,
    pub status: QuoteStatus,
    pub days_since_update: i64,
    pub reminder_after_days: u32,
}

impl ReminderDue {
    pub fn overdue_days(&self) -> i64 {
        self.days_since_update - i64::from(self.reminder_after_days)
    }
}

/// Advisory only: nothing is scheduled. Most overdue first.
pub fn due_reminders(quotes: &[Quote], now: DateTime<Utc>) -> Vec<ReminderDue> {
    let mut due: Vec<ReminderDue> = quotes
        .iter()
        .filter_map(|quote| {
            let reminder_after_days = lookup(quote.status).auto_reminder_days?;
            let days_since_update = (now - quote.updated_at).num_days();
            (days_since_update >= i64::from(reminder_after_days)).then(|| ReminderDue {
                quote_id: quote.id.clone(),
                number: quote.number.clone(),
                status: quote.status,
                days_since_update,
                reminder_after_days,
            })
        })
        .collect();

    due.sort_by(|left, right| {
        right
            .overdue_days()
            .cmp(&left.overdue_days())
            .then_with(|| left.quote_id.cmp(&right.quote_id))
    });
    due
}
