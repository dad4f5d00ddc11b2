use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Largest amount a single quote may carry. Keeps pipeline sums far from the
/// `Decimal` range limit.
pub const MAX_QUOTE_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle status of an offerte. The set is closed: every consumer matches
/// exhaustively, so a new status is a compile-time change everywhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Concept,
    Sent,
    Viewed,
    Negotiating,
    Accepted,
    Rejected,
    Lost,
    Expired,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 8] = [
        Self::Concept,
        Self::Sent,
        Self::Viewed,
        Self::Negotiating,
        Self::Accepted,
        Self::Rejected,
        Self::Lost,
        Self::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Sent => "sent",
            Self::Viewed => "viewed",
            Self::Negotiating => "negotiating",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Lost => "lost",
            Self::Expired => "expired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "concept" | "draft" => Some(Self::Concept),
            "sent" => Some(Self::Sent),
            "viewed" => Some(Self::Viewed),
            "negotiating" => Some(Self::Negotiating),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "lost" => Some(Self::Lost),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Terminal statuses leave the pipeline and count towards conversion.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Lost | Self::Expired)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| DomainError::UnknownStatus(value.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub title: String,
    pub status: QuoteStatus,
    pub amount: Decimal,
    /// Percentage 0-100 overriding the status default weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_probability: Option<Decimal>,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub archived: bool,
}

impl Quote {
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Checks the amount is within `0..=MAX_QUOTE_AMOUNT`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.amount < Decimal::ZERO {
            return Err(DomainError::InvariantViolation(format!(
                "quote `{}` has negative amount {}",
                self.id, self.amount
            )));
        }
        if self.amount > MAX_QUOTE_AMOUNT {
            return Err(DomainError::InvariantViolation(format!(
                "quote `{}` amount {} exceeds {MAX_QUOTE_AMOUNT}",
                self.id, self.amount
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{Quote, QuoteId, QuoteStatus, MAX_QUOTE_AMOUNT};
    use crate::errors::DomainError;

    #[test]
    fn status_parse_accepts_wire_names_and_draft_alias() {
        for status in QuoteStatus::ALL {
            assert_eq!(QuoteStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QuoteStatus::parse(" Draft "), Some(QuoteStatus::Concept));
    }

    #[test]
    fn unknown_status_fails_loudly_at_the_boundary() {
        let error = "pending".parse::<QuoteStatus>().expect_err("pending is not a status");
        assert_eq!(error, DomainError::UnknownStatus("pending".to_string()));

        let decoded = serde_json::from_str::<QuoteStatus>("\"pending\"");
        assert!(decoded.is_err());
    }

    #[test]
    fn only_completed_statuses_are_terminal() {
        let terminal: Vec<_> =
            QuoteStatus::ALL.into_iter().filter(QuoteStatus::is_terminal).collect();
        assert_eq!(
            terminal,
            vec![
                QuoteStatus::Accepted,
                QuoteStatus::Rejected,
                QuoteStatus::Lost,
                QuoteStatus::Expired
            ]
        );
    }

    #[test]
    fn quote_decodes_from_snapshot_json_with_defaults() {
        let raw = r#"{
            "id": "Q-1",
            "status": "negotiating",
            "amount": 2000,
            "win_probability": 90,
            "valid_until": "2024-01-05T00:00:00Z",
            "created_at": "2023-12-01T00:00:00Z",
            "updated_at": "2023-12-20T00:00:00Z"
        }"#;

        let quote: Quote = serde_json::from_str(raw).expect("snapshot quote should decode");

        assert_eq!(quote.id, QuoteId("Q-1".to_string()));
        assert_eq!(quote.status, QuoteStatus::Negotiating);
        assert_eq!(quote.amount, Decimal::new(2000, 0));
        assert_eq!(quote.win_probability, Some(Decimal::new(90, 0)));
        assert_eq!(
            quote.valid_until,
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).single().expect("valid date")
        );
        assert!(!quote.archived);
        assert!(quote.is_active());
    }

    #[test]
    fn amounts_outside_the_allowed_range_violate_invariants() {
        let raw = r#"{
            "id": "Q-2",
            "status": "sent",
            "amount": "-5000",
            "valid_until": "2024-01-05T00:00:00Z",
            "created_at": "2023-12-01T00:00:00Z",
            "updated_at": "2023-12-20T00:00:00Z"
        }"#;
        let mut quote: Quote = serde_json::from_str(raw).expect("negative amounts still decode");

        let error = quote.validate().expect_err("negative amount");
        assert!(
            matches!(error, DomainError::InvariantViolation(ref message) if message.contains("Q-2"))
        );

        quote.amount = MAX_QUOTE_AMOUNT + Decimal::ONE;
        assert!(quote.validate().is_err());

        quote.amount = MAX_QUOTE_AMOUNT;
        assert_eq!(quote.validate(), Ok(()));
        assert_eq!(MAX_QUOTE_AMOUNT, Decimal::new(1_000_000_000_000_000, 0));
    }
}
