use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use archon_core::domain::quote::{Quote, QuoteId, QuoteStatus};
use archon_core::errors::ApplicationError;
use archon_core::pipeline::bulk::{BulkAction, BulkActionExecutor};

use super::{QuoteRepository, RepositoryError};

/// Snapshot-backed quote store that doubles as the bulk action executor.
///
/// A batch is validated up front and applied under one write lock, so either
/// every selected quote is changed or none is.
pub struct InMemoryQuoteStore {
    quotes: RwLock<Vec<Quote>>,
    exports: RwLock<Vec<Quote>>,
    clock: fn() -> DateTime<Utc>,
}

impl Default for InMemoryQuoteStore {
    fn default() -> Self {
        Self::from_quotes(Vec::new())
    }
}

impl InMemoryQuoteStore {
    pub fn from_quotes(quotes: Vec<Quote>) -> Self {
        Self { quotes: RwLock::new(quotes), exports: RwLock::new(Vec::new()), clock: Utc::now }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Every stored quote, archived ones included, in snapshot order.
    pub async fn snapshot(&self) -> Vec<Quote> {
        self.quotes.read().await.clone()
    }

    /// Quotes visible on the pipeline dashboard.
    pub async fn pipeline(&self) -> Vec<Quote> {
        self.quotes.read().await.iter().filter(|quote| !quote.archived).cloned().collect()
    }

    pub async fn take_exports(&self) -> Vec<Quote> {
        std::mem::take(&mut *self.exports.write().await)
    }

    async fn apply(&self, action: BulkAction, ids: &[QuoteId]) -> Result<(), RepositoryError> {
        let now = (self.clock)();
        let mut quotes = self.quotes.write().await;

        let missing: Vec<QuoteId> = ids
            .iter()
            .filter(|id| !quotes.iter().any(|quote| &quote.id == *id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(RepositoryError::NotFound(missing));
        }

        match action {
            BulkAction::Send => {
                for quote in quotes.iter_mut().filter(|quote| ids.contains(&quote.id)) {
                    if quote.status == QuoteStatus::Concept {
                        quote.status = QuoteStatus::Sent;
                    }
                    quote.updated_at = now;
                }
            }
            BulkAction::Accept | BulkAction::Reject => {
                let status = if action == BulkAction::Accept {
                    QuoteStatus::Accepted
                } else {
                    QuoteStatus::Rejected
                };
                for quote in quotes.iter_mut().filter(|quote| ids.contains(&quote.id)) {
                    quote.status = status;
                    quote.updated_at = now;
                }
            }
            BulkAction::Archive => {
                for quote in quotes.iter_mut().filter(|quote| ids.contains(&quote.id)) {
                    quote.archived = true;
                    quote.updated_at = now;
                }
            }
            BulkAction::Delete => quotes.retain(|quote| !ids.contains(&quote.id)),
            BulkAction::Duplicate => {
                let copies: Vec<Quote> = quotes
                    .iter()
                    .filter(|quote| ids.contains(&quote.id))
                    .map(|quote| duplicate(quote, now))
                    .collect();
                quotes.extend(copies);
            }
            BulkAction::Export => {
                let exported: Vec<Quote> =
                    quotes.iter().filter(|quote| ids.contains(&quote.id)).cloned().collect();
                self.exports.write().await.extend(exported);
            }
        }

        Ok(())
    }
}

fn duplicate(quote: &Quote, now: DateTime<Utc>) -> Quote {
    Quote {
        id: QuoteId(Uuid::new_v4().to_string()),
        number: String::new(),
        title: format!("{} (kopie)", quote.title),
        status: QuoteStatus::Concept,
        win_probability: None,
        created_at: now,
        updated_at: now,
        archived: false,
        ..quote.clone()
    }
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteStore {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.iter().find(|quote| &quote.id == id).cloned())
    }

    async fn save(&self, quote: Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        match quotes.iter_mut().find(|existing| existing.id == quote.id) {
            Some(existing) => *existing = quote,
            None => quotes.push(quote),
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Quote>, RepositoryError> {
        Ok(self.snapshot().await)
    }
}

#[async_trait::async_trait]
impl BulkActionExecutor for InMemoryQuoteStore {
    async fn execute(&self, action: BulkAction, ids: &[QuoteId]) -> Result<(), ApplicationError> {
        self.apply(action, ids).await?;
        tracing::debug!(
            event_name = "store.bulk_action.applied",
            action = action.as_str(),
            selected = ids.len(),
            "store applied bulk action"
        );
        Ok(())
    }
}
