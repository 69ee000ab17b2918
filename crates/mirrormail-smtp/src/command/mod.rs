//! SMTP command builder.

use crate::types::{Address, AuthMechanism};

/// Marker used in transcripts wherever credential material would appear.
pub const AUTH_ELIDED: &str = "<auth data elided>";

/// An SMTP command, or a bare authentication continuation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - extended greeting.
    Ehlo {
        /// Hostname the client announces.
        hostname: String,
    },
    /// STARTTLS - upgrade the connection to TLS.
    StartTls,
    /// AUTH - begin authentication, optionally with an initial response.
    Auth {
        /// Mechanism to use.
        mechanism: AuthMechanism,
        /// SASL initial response (base64), credential-bearing.
        initial_response: Option<String>,
    },
    /// Bare continuation-line payload answering a 334 prompt.
    AuthData {
        /// Base64 payload (may be empty), credential-bearing.
        payload: String,
    },
    /// MAIL FROM - start the mail transaction.
    MailFrom {
        /// Sender address.
        from: Address,
    },
    /// RCPT TO - add the recipient.
    RcptTo {
        /// Recipient address.
        to: Address,
    },
    /// DATA - begin message content.
    Data,
    /// QUIT - close the session.
    Quit,
}

impl Command {
    /// Serializes the command to its CRLF-terminated wire form.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Self::Ehlo { hostname } => {
                buf.extend_from_slice(b"EHLO ");
                buf.extend_from_slice(hostname.as_bytes());
            }
            Self::StartTls => {
                buf.extend_from_slice(b"STARTTLS");
            }
            Self::Auth {
                mechanism,
                initial_response,
            } => {
                buf.extend_from_slice(b"AUTH ");
                buf.extend_from_slice(mechanism.as_str().as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(resp.as_bytes());
                }
            }
            Self::AuthData { payload } => {
                buf.extend_from_slice(payload.as_bytes());
            }
            Self::MailFrom { from } => {
                buf.extend_from_slice(b"MAIL FROM:<");
                buf.extend_from_slice(from.as_str().as_bytes());
                buf.push(b'>');
            }
            Self::RcptTo { to } => {
                buf.extend_from_slice(b"RCPT TO:<");
                buf.extend_from_slice(to.as_str().as_bytes());
                buf.push(b'>');
            }
            Self::Data => {
                buf.extend_from_slice(b"DATA");
            }
            Self::Quit => {
                buf.extend_from_slice(b"QUIT");
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns the transcript form of the command.
    ///
    /// Identical to the wire form minus CRLF, except that credential
    /// payloads are replaced by [`AUTH_ELIDED`].
    #[must_use]
    pub fn transcript_line(&self) -> String {
        match self {
            Self::Auth {
                mechanism,
                initial_response: Some(_),
            } => format!("AUTH {} {AUTH_ELIDED}", mechanism.as_str()),
            Self::AuthData { .. } => AUTH_ELIDED.to_string(),
            other => {
                let wire = other.serialize();
                String::from_utf8_lossy(&wire).trim_end().to_string()
            }
        }
    }
}
