//! Transport security and authentication mechanism selectors.

/// Transport security for the relay connection.
///
/// Security and authentication mechanism are independent axes: any
/// combination is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plain TCP, never upgraded.
    #[default]
    None,
    /// Plain TCP, upgraded in-band via STARTTLS after the first EHLO.
    StartTls,
    /// TLS handshake immediately on connect, before any protocol byte.
    Implicit,
}

impl Security {
    /// Returns the canonical configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StartTls => "starttls",
            Self::Implicit => "implicit",
        }
    }

    /// Parses a configuration name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "plain" => Some(Self::None),
            "starttls" => Some(Self::StartTls),
            "implicit" | "ssl" | "tls" => Some(Self::Implicit),
            _ => None,
        }
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// CRAM-MD5 challenge-response (keyed MD5 hash over a server nonce).
    CramMd5,
    /// LOGIN, username and password base64-encoded one prompt at a time.
    Login,
    /// PLAIN, single base64-encoded `\0user\0password` command.
    Plain,
    /// DIGEST-MD5, best-effort only: the client answers the challenge
    /// with an empty response instead of an RFC 2831 digest. Works only
    /// against relays that accept that shortcut. See
    /// [`Self::is_fully_implemented`].
    DigestMd5,
}

impl AuthMechanism {
    /// Returns the mechanism name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CramMd5 => "CRAM-MD5",
            Self::Login => "LOGIN",
            Self::Plain => "PLAIN",
            Self::DigestMd5 => "DIGEST-MD5",
        }
    }

    /// Parses a mechanism name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CRAM-MD5" => Some(Self::CramMd5),
            "LOGIN" => Some(Self::Login),
            "PLAIN" => Some(Self::Plain),
            "DIGEST-MD5" => Some(Self::DigestMd5),
            _ => None,
        }
    }

    /// Returns false for mechanisms carried over in incomplete form.
    ///
    /// DIGEST-MD5 is the only such mechanism; callers offering it in a
    /// UI should mark it accordingly.
    #[must_use]
    pub const fn is_fully_implemented(self) -> bool {
        !matches!(self, Self::DigestMd5)
    }
}

impl std::fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
