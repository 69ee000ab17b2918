//! Error types for report delivery.

use crate::types::AuthMechanism;
use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Protocol stage at which an exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening the TCP connection.
    Connect,
    /// Waiting for the 220 service greeting.
    Greeting,
    /// EHLO exchange (either side of a TLS upgrade).
    Ehlo,
    /// STARTTLS command and handshake.
    StartTls,
    /// Authentication exchange.
    Auth,
    /// MAIL FROM command.
    MailFrom,
    /// RCPT TO command.
    RcptTo,
    /// DATA command.
    Data,
    /// Message content and terminator.
    Message,
    /// QUIT command.
    Quit,
}

impl Stage {
    /// Returns the stage name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Ehlo => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::Auth => "authentication",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Data => "DATA",
            Self::Message => "message transfer",
            Self::Quit => "QUIT",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SMTP error types. All of them are terminal for the current send.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Could not open the TCP connection (DNS failure, refusal, timeout).
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        /// Relay host.
        host: String,
        /// Relay port.
        port: u16,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// TLS handshake or certificate validation failed.
    #[error("TLS handshake with {host} failed: {message}")]
    Tls {
        /// Hostname used for verification.
        host: String,
        /// Handshake failure description.
        message: String,
    },

    /// I/O error mid-session.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server replied outside the expected status-code class, or
    /// closed the connection mid-reply (`code` is `None` in that case).
    #[error("protocol error during {stage}: {text}")]
    Protocol {
        /// Stage at which the reply arrived.
        stage: Stage,
        /// Status code of the offending reply, if one was parsed.
        code: Option<u16>,
        /// Server text, prefixed with the code when present.
        text: String,
    },

    /// The server rejected the authentication exchange.
    #[error("{mechanism} authentication rejected: {text}")]
    Auth {
        /// Mechanism that was attempted.
        mechanism: AuthMechanism,
        /// Final server reply text.
        text: String,
    },

    /// Malformed server data, such as a non-base64 CRAM-MD5 challenge.
    #[error("malformed server data: {0}")]
    Encoding(String),

    /// A read or write exceeded the per-command deadline.
    #[error("timed out during {stage}")]
    Timeout {
        /// Stage that was in flight.
        stage: Stage,
    },

    /// Invalid envelope address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl Error {
    /// Builds a protocol error from an out-of-class reply.
    #[must_use]
    pub fn unexpected_reply(stage: Stage, code: u16, text: &str) -> Self {
        Self::Protocol {
            stage,
            code: Some(code),
            text: format!("{code} {text}"),
        }
    }

    /// Builds a protocol error for a connection that closed mid-reply.
    #[must_use]
    pub fn truncated_reply(stage: Stage) -> Self {
        Self::Protocol {
            stage,
            code: None,
            text: "connection closed before end of reply".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Greeting.as_str(), "greeting");
        assert_eq!(Stage::StartTls.to_string(), "STARTTLS");
    }

    #[test]
    fn unexpected_reply_keeps_code() {
        let err = Error::unexpected_reply(Stage::MailFrom, 550, "no relay");
        match err {
            Error::Protocol { stage, code, text } => {
                assert_eq!(stage, Stage::MailFrom);
                assert_eq!(code, Some(550));
                assert_eq!(text, "550 no relay");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn truncated_reply_has_no_code() {
        let err = Error::truncated_reply(Stage::Ehlo);
        match err {
            Error::Protocol { code, .. } => assert_eq!(code, None),
            other => panic!("unexpected error: {other}"),
        }
    }
}
