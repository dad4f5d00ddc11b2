use std::path::Path;

use archon_core::pipeline::reminders::{due_reminders, ReminderDue};

use crate::commands::{load_config, read_snapshot, resolve_now, CommandResult};

pub fn run(input: &Path, now: Option<&str>) -> CommandResult {
    let config = match load_config("reminders") {
        Ok(config) => config,
        Err(result) => return result,
    };
    if !config.pipeline.reminders_enabled {
        return CommandResult::with_data(
            "reminders",
            "reminders are disabled (pipeline.reminders_enabled = false)",
            Vec::<ReminderDue>::new(),
        );
    }

    let now = match resolve_now("reminders", now) {
        Ok(now) => now,
        Err(result) => return result,
    };
    let snapshot = match read_snapshot("reminders", input) {
        Ok(snapshot) => snapshot,
        Err(result) => return result,
    };

    let quotes: Vec<_> = snapshot.quotes.into_iter().filter(|quote| !quote.archived).collect();
    let due = due_reminders(&quotes, now);
    CommandResult::with_data("reminders", format!("{} reminders due", due.len()), due)
}
