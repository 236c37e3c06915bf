use console::{style, StyledObject};

use crate::jobs::JobStatus;

/// Styling helpers for terminal output
pub fn bright(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn bright_yellow(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Colors a pipeline or job status the same way the job tables do.
pub fn status(status: JobStatus) -> StyledObject<String> {
    match status {
        JobStatus::Success => bright_green(status),
        JobStatus::Failed => bright_red(status),
        JobStatus::Running | JobStatus::Pending | JobStatus::Preparing => bright_yellow(status),
        JobStatus::Canceled | JobStatus::Skipped | JobStatus::Unknown => dim(status),
        _ => style(status.to_string()),
    }
}
