//! # mirrormail-smtp
//!
//! A minimal SMTP client (RFC 5321 subset) built to deliver backup run
//! reports through a single relay, with selectable transport security
//! and authentication mechanism.
//!
//! ## Features
//!
//! - **Transport security**: plaintext, STARTTLS upgrade, or implicit
//!   TLS, all over `rustls`
//! - **Authentication**: CRAM-MD5, LOGIN, PLAIN, and a best-effort
//!   DIGEST-MD5 (see [`types::AuthMechanism`])
//! - **Diagnostics**: every protocol line exchanged is captured in a
//!   transcript, with credential material elided
//! - **Fail fast**: one connection, one message, one recipient; no
//!   retries, no pooling
//!
//! ## Quick Start
//!
//! ```ignore
//! use mirrormail_smtp::{send, Address, ConnectionConfig, Credentials, Envelope};
//! use mirrormail_smtp::types::{AuthMechanism, Security};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ConnectionConfig::new("smtp.example.com", 587)
//!         .security(Security::StartTls)
//!         .auth(AuthMechanism::Login);
//!     let creds = Credentials::new("user@example.com", "secret");
//!     let envelope = Envelope::new(
//!         Address::new("user@example.com").unwrap(),
//!         Address::new("ops@example.com").unwrap(),
//!         "Backup OK",
//!         vec!["Job finished.".to_string()],
//!     );
//!
//!     let result = send(&config, &creds, &envelope).await;
//!     if !result.success {
//!         eprintln!("delivery failed: {:?}", result.failure_reason);
//!         for line in &result.transcript {
//!             eprintln!("{line}");
//!         }
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`auth`]: SASL response encoders
//! - [`command`]: SMTP command builders
//! - [`config`]: Per-send connection configuration
//! - [`connection`]: TCP/TLS stream handling
//! - [`message`]: RFC 5322 header block and dot-stuffing
//! - [`parser`]: Reply parser
//! - [`session`]: The protocol state machine and [`send`] entry point
//! - [`types`]: Core types (addresses, replies, mechanisms)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod command;
pub mod config;
pub mod connection;
mod error;
pub mod message;
pub mod parser;
pub mod session;
pub mod types;

pub use config::ConnectionConfig;
pub use error::{Error, Result, Stage};
pub use session::{SendResult, SessionState, send};
pub use types::{Address, AuthMechanism, Credentials, Envelope, Reply, ReplyCode, Security};
