//! The SMTP session state machine and the [`send`] entry point.
//!
//! One session drives one message to one recipient over one exclusively
//! owned stream. The exchange is strictly forward: greeting, EHLO,
//! optional STARTTLS upgrade with a second EHLO, authentication,
//! envelope, message content, QUIT. There are no retries; any failure
//! is terminal for the send and is reported through [`SendResult`],
//! with QUIT still attempted and the transport released on every path.

use crate::auth;
use crate::command::Command;
use crate::config::ConnectionConfig;
use crate::connection::{self, SmtpStream};
use crate::error::{Error, Result, Stage};
use crate::message;
use crate::parser;
use crate::types::{AuthMechanism, Credentials, Envelope, Reply, ReplyCode, Security};
use chrono::Utc;
use rustls::pki_types::CertificateDer;
use std::time::Duration;

/// Cap on the best-effort QUIT exchange so a wedged server cannot hold
/// the session open after the outcome is already decided.
const QUIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Stream opened, greeting not yet read.
    Connecting,
    /// 220 greeting consumed.
    Greeted,
    /// EHLO accepted (either side of a TLS upgrade).
    EhloSent,
    /// STARTTLS accepted, handshake in progress.
    TlsNegotiating,
    /// AUTH exchange in progress.
    Authenticating,
    /// Envelope and message transfer in progress.
    Sending,
    /// Message accepted.
    Completed,
    /// Terminal failure; transport released.
    Failed,
}

/// Outcome of one send: terminal status plus the line-level transcript.
#[derive(Debug, Clone)]
pub struct SendResult {
    /// Whether the relay accepted the message.
    pub success: bool,
    /// One entry per protocol line exchanged, direction-tagged
    /// (`C:`/`S:`). Credential payloads are elided, message content is
    /// summarized.
    pub transcript: Vec<String>,
    /// Human-readable failure description when `success` is false.
    pub failure_reason: Option<String>,
}

/// Delivers one message described by `envelope` through the relay in
/// `config`, authenticating with `creds`.
///
/// Never returns an error: every failure mode lands in
/// [`SendResult::failure_reason`] together with the transcript gathered
/// up to that point. The transport is closed before this returns,
/// whatever the outcome.
pub async fn send(
    config: &ConnectionConfig,
    creds: &Credentials,
    envelope: &Envelope,
) -> SendResult {
    let mut transcript = Vec::new();
    match deliver(config, creds, envelope, &mut transcript).await {
        Ok(()) => {
            tracing::info!(host = %config.host, port = config.port, "report delivered");
            SendResult {
                success: true,
                transcript,
                failure_reason: None,
            }
        }
        Err(err) => {
            tracing::warn!(host = %config.host, port = config.port, error = %err, "delivery failed");
            SendResult {
                success: false,
                transcript,
                failure_reason: Some(err.to_string()),
            }
        }
    }
}

async fn deliver(
    config: &ConnectionConfig,
    creds: &Credentials,
    envelope: &Envelope,
    transcript: &mut Vec<String>,
) -> Result<()> {
    let stream = match config.security {
        Security::Implicit => {
            connection::connect_tls(
                &config.host,
                config.port,
                config.connect_timeout,
                &config.extra_roots,
            )
            .await?
        }
        Security::StartTls | Security::None => {
            connection::connect(&config.host, config.port, config.connect_timeout).await?
        }
    };

    let mut session = Session {
        stream,
        state: SessionState::Connecting,
        command_timeout: config.command_timeout,
        transcript,
    };
    let outcome = session.run(config, creds, envelope).await;
    session.finish(outcome.is_ok()).await;
    outcome
}

struct Session<'a> {
    stream: SmtpStream,
    state: SessionState,
    command_timeout: Duration,
    transcript: &'a mut Vec<String>,
}

impl Session<'_> {
    async fn run(
        &mut self,
        config: &ConnectionConfig,
        creds: &Credentials,
        envelope: &Envelope,
    ) -> Result<()> {
        let greeting = self.read_reply(Stage::Greeting).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(Error::unexpected_reply(
                Stage::Greeting,
                greeting.code.as_u16(),
                &greeting.text(),
            ));
        }
        self.advance(SessionState::Greeted);

        let capabilities = self.ehlo(&config.ehlo_hostname).await?;

        if config.security == Security::StartTls {
            if !advertises_starttls(&capabilities) {
                return Err(Error::Protocol {
                    stage: Stage::StartTls,
                    code: None,
                    text: "server does not advertise STARTTLS".to_string(),
                });
            }

            let reply = self.exchange(&Command::StartTls, Stage::StartTls).await?;
            if reply.code != ReplyCode::SERVICE_READY {
                return Err(Error::unexpected_reply(
                    Stage::StartTls,
                    reply.code.as_u16(),
                    &reply.text(),
                ));
            }

            self.advance(SessionState::TlsNegotiating);
            self.upgrade_tls(&config.host, &config.extra_roots).await?;
            // Plaintext capabilities no longer apply; greet again.
            self.ehlo(&config.ehlo_hostname).await?;
        }

        self.advance(SessionState::Authenticating);
        self.authenticate(config.auth, creds).await?;

        self.advance(SessionState::Sending);
        self.expect_completed(
            &Command::MailFrom {
                from: envelope.sender.clone(),
            },
            Stage::MailFrom,
        )
        .await?;
        self.expect_completed(
            &Command::RcptTo {
                to: envelope.recipient.clone(),
            },
            Stage::RcptTo,
        )
        .await?;

        let reply = self.exchange(&Command::Data, Stage::Data).await?;
        if !reply.is_intermediate() {
            return Err(Error::unexpected_reply(
                Stage::Data,
                reply.code.as_u16(),
                &reply.text(),
            ));
        }

        self.write_message(envelope).await?;
        let reply = self.read_reply(Stage::Message).await?;
        if !reply.is_completed() {
            return Err(Error::unexpected_reply(
                Stage::Message,
                reply.code.as_u16(),
                &reply.text(),
            ));
        }

        self.advance(SessionState::Completed);
        Ok(())
    }

    /// Sends EHLO and returns the capability reply.
    async fn ehlo(&mut self, hostname: &str) -> Result<Reply> {
        let reply = self
            .exchange(
                &Command::Ehlo {
                    hostname: hostname.to_string(),
                },
                Stage::Ehlo,
            )
            .await?;
        if !reply.is_completed() {
            return Err(Error::unexpected_reply(
                Stage::Ehlo,
                reply.code.as_u16(),
                &reply.text(),
            ));
        }
        self.advance(SessionState::EhloSent);
        Ok(reply)
    }

    async fn authenticate(&mut self, mechanism: AuthMechanism, creds: &Credentials) -> Result<()> {
        if !mechanism.is_fully_implemented() {
            tracing::warn!(%mechanism, "mechanism support is incomplete, attempting anyway");
        }

        let final_reply = match mechanism {
            AuthMechanism::Plain => {
                let initial = auth::plain_initial(&creds.username, &creds.password);
                self.exchange(
                    &Command::Auth {
                        mechanism,
                        initial_response: Some(initial),
                    },
                    Stage::Auth,
                )
                .await?
            }
            AuthMechanism::Login => {
                let prompt = self.begin_auth(mechanism).await?;
                let prompt = self
                    .continue_auth(mechanism, &prompt, auth::login_leg(&creds.username))
                    .await?;
                self.continue_auth(mechanism, &prompt, auth::login_leg(&creds.password))
                    .await?
            }
            AuthMechanism::CramMd5 => {
                let prompt = self.begin_auth(mechanism).await?;
                expect_continue(mechanism, &prompt)?;
                let challenge = prompt.lines.first().map_or("", String::as_str);
                let response =
                    auth::cram_md5_response(&creds.username, &creds.password, challenge)?;
                self.exchange(&Command::AuthData { payload: response }, Stage::Auth)
                    .await?
            }
            AuthMechanism::DigestMd5 => {
                let prompt = self.begin_auth(mechanism).await?;
                expect_continue(mechanism, &prompt)?;
                self.exchange(
                    &Command::AuthData {
                        payload: auth::digest_md5_placeholder(),
                    },
                    Stage::Auth,
                )
                .await?
            }
        };

        if final_reply.code == ReplyCode::AUTH_OK {
            tracing::debug!(%mechanism, "authenticated");
            Ok(())
        } else {
            Err(auth_rejected(mechanism, &final_reply))
        }
    }

    async fn begin_auth(&mut self, mechanism: AuthMechanism) -> Result<Reply> {
        self.exchange(
            &Command::Auth {
                mechanism,
                initial_response: None,
            },
            Stage::Auth,
        )
        .await
    }

    async fn continue_auth(
        &mut self,
        mechanism: AuthMechanism,
        prompt: &Reply,
        payload: String,
    ) -> Result<Reply> {
        expect_continue(mechanism, prompt)?;
        self.exchange(&Command::AuthData { payload }, Stage::Auth)
            .await
    }

    /// Writes the header block, dot-stuffed body, and terminator.
    async fn write_message(&mut self, envelope: &Envelope) -> Result<()> {
        let mut content = Vec::new();
        for header in message::render_headers(envelope, Utc::now()) {
            content.extend_from_slice(header.as_bytes());
            content.extend_from_slice(b"\r\n");
        }
        content.extend_from_slice(b"\r\n");
        for line in &envelope.body_lines {
            content.extend_from_slice(message::dot_stuff(line).as_bytes());
            content.extend_from_slice(b"\r\n");
        }

        self.transcript.push(format!(
            "C: <message content, {} body lines>",
            envelope.body_lines.len()
        ));
        self.write_with_timeout(&content, Stage::Message).await?;

        self.transcript.push("C: .".to_string());
        self.write_with_timeout(b".\r\n", Stage::Message).await
    }

    async fn exchange(&mut self, cmd: &Command, stage: Stage) -> Result<Reply> {
        self.transcript.push(format!("C: {}", cmd.transcript_line()));
        self.write_with_timeout(&cmd.serialize(), stage).await?;
        self.read_reply(stage).await
    }

    /// Runs an exchange that must end in a 2xx reply.
    async fn expect_completed(&mut self, cmd: &Command, stage: Stage) -> Result<()> {
        let reply = self.exchange(cmd, stage).await?;
        if reply.is_completed() {
            Ok(())
        } else {
            Err(Error::unexpected_reply(
                stage,
                reply.code.as_u16(),
                &reply.text(),
            ))
        }
    }

    /// Reads lines until the continuation rule says the reply is done.
    async fn read_reply(&mut self, stage: Stage) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = timed(self.command_timeout, stage, self.stream.read_line(stage)).await?;
            if line.is_empty() {
                // No SMTP reply line is blank; bail rather than resync.
                return Err(Error::Protocol {
                    stage,
                    code: None,
                    text: "empty reply line".to_string(),
                });
            }

            self.transcript.push(format!("S: {line}"));
            let is_final = parser::is_final_line(&line);
            lines.push(line);
            if is_final {
                break;
            }
        }

        parser::parse_reply(&lines)
    }

    async fn write_with_timeout(&mut self, data: &[u8], stage: Stage) -> Result<()> {
        timed(self.command_timeout, stage, self.stream.write_all(data)).await
    }

    async fn upgrade_tls(
        &mut self,
        host: &str,
        extra_roots: &[CertificateDer<'static>],
    ) -> Result<()> {
        let plain = std::mem::replace(&mut self.stream, SmtpStream::Closed);
        self.stream = timed(
            self.command_timeout,
            Stage::StartTls,
            plain.upgrade_to_tls(host, extra_roots),
        )
        .await?;
        tracing::debug!(host, "connection upgraded to TLS");
        Ok(())
    }

    /// Sends QUIT best-effort and releases the transport.
    async fn finish(&mut self, delivered: bool) {
        self.quit_best_effort().await;
        self.state = if delivered {
            SessionState::Completed
        } else {
            SessionState::Failed
        };
        self.stream = SmtpStream::Closed;
    }

    async fn quit_best_effort(&mut self) {
        if self.stream.is_closed() {
            return;
        }

        let cmd = Command::Quit;
        self.transcript.push(format!("C: {}", cmd.transcript_line()));
        if timed(QUIT_TIMEOUT, Stage::Quit, self.stream.write_all(&cmd.serialize()))
            .await
            .is_err()
        {
            return;
        }
        // The reply is informational only.
        if let Ok(line) = timed(
            QUIT_TIMEOUT,
            Stage::Quit,
            self.stream.read_line(Stage::Quit),
        )
        .await
        {
            self.transcript.push(format!("S: {line}"));
        }
    }

    fn advance(&mut self, next: SessionState) {
        tracing::trace!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }
}

fn advertises_starttls(capabilities: &Reply) -> bool {
    capabilities.lines.iter().skip(1).any(|line| {
        line.split_whitespace()
            .next()
            .is_some_and(|word| word.eq_ignore_ascii_case("STARTTLS"))
    })
}

fn expect_continue(mechanism: AuthMechanism, reply: &Reply) -> Result<()> {
    if reply.code == ReplyCode::AUTH_CONTINUE {
        Ok(())
    } else {
        Err(auth_rejected(mechanism, reply))
    }
}

fn auth_rejected(mechanism: AuthMechanism, reply: &Reply) -> Error {
    Error::Auth {
        mechanism,
        text: format!("{} {}", reply.code, reply.text()),
    }
}

async fn timed<T>(
    limit: Duration,
    stage: Stage,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout { stage }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reply(code: u16, lines: &[&str]) -> Reply {
        Reply::new(
            ReplyCode::new(code),
            lines.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn starttls_detection_skips_greeting_line() {
        let capabilities = reply(250, &["relay greets you STARTTLS", "AUTH PLAIN"]);
        assert!(!advertises_starttls(&capabilities));

        let capabilities = reply(250, &["relay greets you", "STARTTLS", "AUTH PLAIN"]);
        assert!(advertises_starttls(&capabilities));
    }

    #[test]
    fn starttls_detection_is_case_insensitive() {
        let capabilities = reply(250, &["relay", "starttls"]);
        assert!(advertises_starttls(&capabilities));
    }

    #[test]
    fn continue_check_accepts_only_334() {
        assert!(expect_continue(AuthMechanism::Login, &reply(334, &["VXNlcm5hbWU6"])).is_ok());
        let err = expect_continue(AuthMechanism::Login, &reply(503, &["bad sequence"]));
        assert!(matches!(
            err,
            Err(Error::Auth {
                mechanism: AuthMechanism::Login,
                ..
            })
        ));
    }

    #[test]
    fn auth_rejection_carries_code_and_text() {
        let err = auth_rejected(AuthMechanism::CramMd5, &reply(535, &["bad credentials"]));
        assert_eq!(
            err.to_string(),
            "CRAM-MD5 authentication rejected: 535 bad credentials"
        );
    }
}
