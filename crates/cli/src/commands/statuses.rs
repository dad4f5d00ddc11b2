use archon_core::pipeline::registry::registry;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let statuses = registry();
    CommandResult::with_data("statuses", format!("{} quote statuses", statuses.len()), statuses)
}
