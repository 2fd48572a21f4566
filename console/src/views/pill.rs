//! Status badge

use colored::{ColoredString, Colorize};

use openapi_client::models::DeploymentStatus;

/// Colour family of a status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Danger,
    Warn,
    Info,
    Neutral,
}

impl Tone {
    pub fn of(status: DeploymentStatus) -> Self {
        match status {
            DeploymentStatus::Completed => Tone::Success,
            DeploymentStatus::Failed => Tone::Danger,
            DeploymentStatus::Processing => Tone::Warn,
            DeploymentStatus::Deploying | DeploymentStatus::Running => Tone::Info,
            DeploymentStatus::Pending | DeploymentStatus::Scheduled => Tone::Neutral,
        }
    }
}

/// Render a status as a coloured badge
pub fn status_pill(status: DeploymentStatus) -> ColoredString {
    let text = format!("[{}]", status);
    match Tone::of(status) {
        Tone::Success => text.green().bold(),
        Tone::Danger => text.red().bold(),
        Tone::Warn => text.yellow(),
        Tone::Info => text.cyan(),
        Tone::Neutral => text.normal(),
    }
}
