pub mod bulk;
pub mod kpi;
pub mod registry;
pub mod reminders;

pub use bulk::{
    apply_bulk_action, apply_bulk_action_with_audit, BulkAction, BulkActionError,
    BulkActionExecutor, BulkOutcome,
};
pub use kpi::{
    compute_kpis, status_breakdown, PipelineAggregator, PipelineKpis, PipelineSettings,
    StatusBucket,
};
pub use registry::{
    dispatch_next_action, dispatch_next_action_with_audit, is_action_permitted, lookup, registry,
    ActionPriority, NextAction, NextActionHandler, QuoteAction, StatusConfig, StatusTone,
};
pub use reminders::{due_reminders, ReminderDue};
