//! Run-report composition.

use chrono::{DateTime, Local};
use mirrormail_smtp::{Address, Envelope};

/// Outcome of one folder-mirror run, as reported by the scheduler.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Whether the mirror run completed without errors.
    pub succeeded: bool,
    /// When the run finished.
    pub finished_at: DateTime<Local>,
    /// Source folder of the mirror.
    pub source: String,
    /// Destination folder of the mirror.
    pub destination: String,
    /// Tool output or error text, shown verbatim in the report body.
    pub detail: String,
}

impl RunReport {
    /// Creates a report stamped with the current local time.
    #[must_use]
    pub fn new(
        succeeded: bool,
        source: impl Into<String>,
        destination: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            succeeded,
            finished_at: Local::now(),
            source: source.into(),
            destination: destination.into(),
            detail: detail.into(),
        }
    }

    /// Returns the report subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!(
            "Backup result - {}",
            if self.succeeded { "success" } else { "failure" }
        )
    }

    /// Renders the report body, one entry per line.
    #[must_use]
    pub fn body_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "Result of the scheduled folder mirror run.".to_string(),
            String::new(),
            format!("Finished: {}", self.finished_at.format("%Y-%m-%d %H:%M:%S")),
            format!(
                "Result: {}",
                if self.succeeded { "success" } else { "failure" }
            ),
            format!("Source: {}", self.source),
            format!("Destination: {}", self.destination),
            String::new(),
            "Detail:".to_string(),
        ];
        lines.extend(self.detail.lines().map(ToString::to_string));
        lines
    }

    /// Builds the delivery envelope for this report.
    ///
    /// # Errors
    ///
    /// Returns an error if `sender` or `recipient` is not a usable
    /// envelope address.
    pub fn to_envelope(
        &self,
        sender: &str,
        recipient: &str,
    ) -> mirrormail_smtp::Result<Envelope> {
        Ok(Envelope::new(
            Address::new(sender)?,
            Address::new(recipient)?,
            self.subject(),
            self.body_lines(),
        ))
    }
}
