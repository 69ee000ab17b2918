//! Credentials and message envelope.

use super::Address;

/// Relay account credentials.
///
/// Both fields are treated as opaque UTF-8 byte strings for hashing and
/// encoding. They never appear in logs, error messages, or the session
/// transcript; `Debug` prints a redaction marker for both.
#[derive(Clone)]
pub struct Credentials {
    /// Account name, usually the sender address.
    pub username: String,
    /// Account password or app-specific password.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One message for one recipient, body pre-rendered by the caller.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Sender address (`MAIL FROM` and the `From` header).
    pub sender: Address,
    /// Recipient address (`RCPT TO` and the `To` header).
    pub recipient: Address,
    /// Subject line; non-ASCII subjects are encoded on the wire.
    pub subject: String,
    /// Body lines, sent verbatim apart from dot-stuffing.
    pub body_lines: Vec<String>,
}

impl Envelope {
    /// Creates an envelope.
    #[must_use]
    pub fn new(
        sender: Address,
        recipient: Address,
        subject: impl Into<String>,
        body_lines: Vec<String>,
    ) -> Self {
        Self {
            sender,
            recipient,
            subject: subject.into(),
            body_lines,
        }
    }
}
