pub mod memory;
pub mod snapshot;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use archon_core::domain::quote::{Quote, QuoteId};
use archon_core::errors::ApplicationError;

pub use memory::InMemoryQuoteStore;
pub use snapshot::{load_snapshot, parse_snapshot, save_snapshot, QuoteSnapshot};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("quotes not found: {}", join_ids(.0))]
    NotFound(Vec<QuoteId>),
    #[error("snapshot io failure for `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

fn join_ids(ids: &[QuoteId]) -> String {
    ids.iter().map(QuoteId::as_str).collect::<Vec<_>>().join(", ")
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;
    async fn save(&self, quote: Quote) -> Result<(), RepositoryError>;
    async fn list(&self) -> Result<Vec<Quote>, RepositoryError>;
}
