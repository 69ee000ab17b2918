//! Per-send connection configuration.

use crate::types::{AuthMechanism, Security};
use rustls::pki_types::CertificateDer;
use std::time::Duration;

/// Default deadline for opening the TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for each command/reply exchange.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Immutable configuration for one send.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Relay hostname or IP address.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Transport security mode.
    pub security: Security,
    /// Authentication mechanism.
    pub auth: AuthMechanism,
    /// Hostname announced in EHLO.
    pub ehlo_hostname: String,
    /// Deadline for the TCP connect (and implicit TLS handshake).
    pub connect_timeout: Duration,
    /// Deadline for each subsequent read or write.
    pub command_timeout: Duration,
    /// Additional trust anchors, for relays with private CAs and for
    /// tests. Appended to the webpki root set.
    pub extra_roots: Vec<CertificateDer<'static>>,
}

impl ConnectionConfig {
    /// Creates a configuration with default security (`None`), default
    /// mechanism (`Plain`), and default timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            security: Security::None,
            auth: AuthMechanism::Plain,
            ehlo_hostname: "localhost".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            extra_roots: Vec::new(),
        }
    }

    /// Sets the transport security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets the authentication mechanism.
    #[must_use]
    pub const fn auth(mut self, auth: AuthMechanism) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the hostname announced in EHLO.
    #[must_use]
    pub fn ehlo_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.ehlo_hostname = hostname.into();
        self
    }

    /// Sets the connect deadline.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-command deadline.
    #[must_use]
    pub const fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Adds a trust anchor to the TLS root set.
    #[must_use]
    pub fn add_root_certificate(mut self, cert: CertificateDer<'static>) -> Self {
        self.extra_roots.push(cert);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConnectionConfig::new("smtp.example.com", 587);
        assert_eq!(config.security, Security::None);
        assert_eq!(config.auth, AuthMechanism::Plain);
        assert_eq!(config.ehlo_hostname, "localhost");
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.command_timeout, DEFAULT_COMMAND_TIMEOUT);
        assert!(config.extra_roots.is_empty());
    }

    #[test]
    fn builder_overrides() {
        let config = ConnectionConfig::new("relay.lan", 465)
            .security(Security::Implicit)
            .auth(AuthMechanism::CramMd5)
            .ehlo_hostname("backup-host")
            .connect_timeout(Duration::from_secs(3))
            .command_timeout(Duration::from_secs(30));
        assert_eq!(config.security, Security::Implicit);
        assert_eq!(config.auth, AuthMechanism::CramMd5);
        assert_eq!(config.ehlo_hostname, "backup-host");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.command_timeout, Duration::from_secs(30));
    }
}
