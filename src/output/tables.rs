use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::jobs::{JobStatus, When};

/// Table and cell creation helpers
pub fn create_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .iter()
                .map(|label| Cell::new(*label).fg(TableColor::Cyan))
                .collect::<Vec<_>>(),
        );
    table
}

pub fn status_cell(status: JobStatus) -> Cell {
    let cell = Cell::new(status);
    match status {
        JobStatus::Success => cell.fg(TableColor::Green),
        JobStatus::Failed => cell.fg(TableColor::Red),
        JobStatus::Running | JobStatus::Pending | JobStatus::Preparing => {
            cell.fg(TableColor::Yellow)
        }
        JobStatus::Canceled | JobStatus::Skipped | JobStatus::Unknown => {
            cell.fg(TableColor::DarkGrey)
        }
        _ => cell,
    }
}

pub fn when_cell(when: When) -> Cell {
    match when {
        When::OnSuccess => Cell::new(when).fg(TableColor::DarkGrey),
        When::Manual | When::Delayed => Cell::new(when).fg(TableColor::Yellow),
        _ => Cell::new(when),
    }
}

pub fn allow_failure_cell(allow_failure: bool) -> Cell {
    if allow_failure {
        Cell::new("yes").fg(TableColor::Yellow)
    } else {
        Cell::new("no").fg(TableColor::DarkGrey)
    }
}

/// One name per line, or a dimmed dash when there is nothing to show.
pub fn names_cell<'a, I>(names: I, color: Option<TableColor>) -> Cell
where
    I: IntoIterator<Item = &'a String>,
{
    let text = names
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    match (text.is_empty(), color) {
        (true, _) => Cell::new("-").fg(TableColor::DarkGrey),
        (false, Some(color)) => Cell::new(text).fg(color),
        (false, None) => Cell::new(text),
    }
}
