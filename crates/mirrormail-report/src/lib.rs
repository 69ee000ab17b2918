//! # mirrormail-report
//!
//! The orchestrator-facing layer of mirrormail: composes the email
//! report for a finished folder-mirror run and hands it to
//! [`mirrormail_smtp`] for delivery. Also owns the persisted mail
//! settings (relay, security, mechanism, addresses).
//!
//! Passwords are deliberately not part of [`MailSettings`]: the caller
//! keeps them wherever it keeps secrets and passes them per send.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod report;
pub mod settings;

pub use report::RunReport;
pub use settings::{MailSettings, SettingsError};

use mirrormail_smtp::{Credentials, SendResult};

/// Composes the report envelope and delivers it through the configured
/// relay.
///
/// Returns the delivery outcome; an invalid sender or recipient address
/// in `settings` shows up as a failed [`SendResult`] rather than a
/// panic or an `Err`, matching the delivery path's error reporting.
pub async fn send_report(
    settings: &MailSettings,
    password: &str,
    report: &RunReport,
) -> SendResult {
    let envelope = match report.to_envelope(&settings.sender, &settings.recipient) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!(error = %err, "report envelope rejected");
            return SendResult {
                success: false,
                transcript: Vec::new(),
                failure_reason: Some(err.to_string()),
            };
        }
    };

    tracing::debug!(recipient = %settings.recipient, "sending backup report");
    let config = settings.connection();
    let creds = Credentials::new(settings.username.clone(), password);
    mirrormail_smtp::send(&config, &creds, &envelope).await
}
