use std::path::Path;

use archon_core::audit::{AuditContext, TracingAuditSink};
use archon_core::domain::quote::{Quote, QuoteId};
use archon_core::pipeline::bulk::{apply_bulk_action_with_audit, BulkAction, BulkActionError};
use archon_store::{save_snapshot, InMemoryQuoteStore, QuoteSnapshot};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::commands::{
    load_config, read_snapshot, CommandResult, EXIT_ACTION, EXIT_INPUT, EXIT_RUNTIME,
};

#[derive(Debug, Serialize)]
struct BulkReport {
    action: BulkAction,
    affected: usize,
    snapshot: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exported: Vec<Quote>,
}

pub fn run(
    input: &Path,
    action: &str,
    raw_ids: &[String],
    output: Option<&Path>,
) -> CommandResult {
    if let Err(result) = load_config("bulk") {
        return result;
    }

    let action = match action.parse::<BulkAction>() {
        Ok(action) => action,
        Err(error) => {
            let expected =
                BulkAction::ALL.iter().map(BulkAction::as_str).collect::<Vec<_>>().join("|");
            return CommandResult::failure(
                "bulk",
                "input",
                format!("{error} (expected {expected})"),
                EXIT_INPUT,
            );
        }
    };
    let snapshot = match read_snapshot("bulk", input) {
        Ok(snapshot) => snapshot,
        Err(result) => return result,
    };
    // Repeated ids collapse to the first occurrence so `affected` counts quotes.
    let mut ids: Vec<QuoteId> = Vec::with_capacity(raw_ids.len());
    for id in raw_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        let id = QuoteId::from(id);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "bulk",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    let store = InMemoryQuoteStore::from_quotes(snapshot.quotes);
    let audit = AuditContext::new(Uuid::new_v4().to_string(), "archon-cli");
    let result = runtime.block_on(async {
        let outcome =
            apply_bulk_action_with_audit(action, &ids, &store, &TracingAuditSink, &audit).await?;
        Ok::<_, BulkActionError>((
            outcome,
            store.snapshot().await,
            store.take_exports().await,
        ))
    });

    let (outcome, quotes, exported) = match result {
        Ok(values) => values,
        Err(error) => {
            return CommandResult::failure(
                "bulk",
                "bulk_action",
                format!("{} ({error})", error.user_message()),
                EXIT_ACTION,
            );
        }
    };

    let target = output.unwrap_or(input);
    let updated = QuoteSnapshot { generated_at: Some(Utc::now()), quotes };
    if let Err(error) = save_snapshot(target, &updated) {
        return CommandResult::failure(
            "bulk",
            "persistence",
            format!("could not write quotes: {error}"),
            EXIT_ACTION,
        );
    }

    CommandResult::with_data(
        "bulk",
        outcome.message(),
        BulkReport {
            action: outcome.action,
            affected: outcome.affected,
            snapshot: target.display().to_string(),
            exported,
        },
    )
}
