use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use archon_core::domain::quote::Quote;

use crate::RepositoryError;

/// On-disk form of a quote export: either `{ "quotes": [...] }` or a bare array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub quotes: Vec<Quote>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Wrapped(QuoteSnapshot),
    Bare(Vec<Quote>),
}

pub fn load_snapshot(path: &Path) -> Result<QuoteSnapshot, RepositoryError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| RepositoryError::Io { path: path.to_path_buf(), source })?;
    parse_snapshot(&raw)
}

pub fn parse_snapshot(raw: &str) -> Result<QuoteSnapshot, RepositoryError> {
    let document: SnapshotDocument =
        serde_json::from_str(raw).map_err(|error| RepositoryError::Decode(error.to_string()))?;
    let snapshot = match document {
        SnapshotDocument::Wrapped(snapshot) => snapshot,
        SnapshotDocument::Bare(quotes) => QuoteSnapshot { generated_at: None, quotes },
    };
    for quote in &snapshot.quotes {
        quote.validate().map_err(|error| RepositoryError::Decode(error.to_string()))?;
    }
    Ok(snapshot)
}

pub fn save_snapshot(path: &Path, snapshot: &QuoteSnapshot) -> Result<(), RepositoryError> {
    let encoded = serde_json::to_string_pretty(snapshot)
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;
    fs::write(path, encoded)
        .map_err(|source| RepositoryError::Io { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use archon_core::domain::quote::QuoteStatus;

    use super::{load_snapshot, parse_snapshot, save_snapshot};
    use crate::RepositoryError;

    const BARE: &str = r#"[
        {
            "id": "OFF-2024-001",
            "status": "sent",
            "amount": "1000.00",
            "valid_until": "2024-01-05T00:00:00Z",
            "created_at": "2023-12-01T00:00:00Z",
            "updated_at": "2023-12-01T00:00:00Z"
        }
    ]"#;

    #[test]
    fn bare_arrays_are_accepted() {
        let snapshot = parse_snapshot(BARE).expect("bare snapshot decodes");
        assert_eq!(snapshot.quotes.len(), 1);
        assert_eq!(snapshot.quotes[0].status, QuoteStatus::Sent);
        assert_eq!(snapshot.quotes[0].amount, Decimal::new(100_000, 2));
        assert!(snapshot.generated_at.is_none());
    }

    #[test]
    fn unknown_status_is_a_decode_error() {
        let raw = BARE.replace("\"sent\"", "\"pending\"");
        assert!(matches!(parse_snapshot(&raw), Err(RepositoryError::Decode(_))));
    }

    #[test]
    fn negative_amount_is_a_decode_error() {
        let raw = BARE.replace("\"1000.00\"", "\"-5000\"");

        let error = parse_snapshot(&raw).expect_err("negative amount");
        assert!(matches!(error, RepositoryError::Decode(ref message)
            if message.contains("OFF-2024-001") && message.contains("negative")));
    }

    #[test]
    fn amount_beyond_quote_limit_is_a_decode_error() {
        let raw = BARE.replace("\"1000.00\"", "\"50000000000000000000000000000\"");
        assert!(matches!(parse_snapshot(&raw), Err(RepositoryError::Decode(_))));
    }

    #[test]
    fn saved_snapshot_loads_back() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("quotes.json");
        let snapshot = parse_snapshot(BARE).expect("decode");

        save_snapshot(&path, &snapshot).expect("save snapshot");
        let raw = fs::read_to_string(&path).expect("read back");
        assert!(raw.contains("\"quotes\""));

        assert_eq!(load_snapshot(&path).expect("load snapshot"), snapshot);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.json");

        let error = load_snapshot(&path).expect_err("file is absent");
        assert!(error.to_string().contains("absent.json"));
    }
}
