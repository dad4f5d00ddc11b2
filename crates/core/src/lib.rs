pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pipeline;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use domain::quote::{Quote, QuoteId, QuoteStatus};
pub use errors::{ApplicationError, DomainError};
pub use pipeline::{
    apply_bulk_action, compute_kpis, lookup, BulkAction, BulkActionError, BulkActionExecutor,
    BulkOutcome, PipelineAggregator, PipelineKpis, PipelineSettings, QuoteAction, StatusConfig,
};
