//! SMTP reply types.

/// A complete SMTP reply, possibly assembled from multiple lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Status code from the final line.
    pub code: ReplyCode,
    /// Text of each reply line, code and separator stripped.
    pub lines: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    pub const fn new(code: ReplyCode, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// Returns true if the reply completed the request (2xx).
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.code.is_completed()
    }

    /// Returns true if the reply asks for more input (3xx).
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code.is_intermediate()
    }

    /// Returns the reply text as a single line, for error messages.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join(" / ")
    }
}

/// Three-digit SMTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// 2xx: requested action completed.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// 3xx: server expects further input.
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// 4xx: transient failure.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// 5xx: permanent failure.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Codes the session checks by exact value.
impl ReplyCode {
    /// 220 Service ready (greeting and STARTTLS go-ahead).
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel.
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded.
    pub const AUTH_OK: Self = Self(235);
    /// 250 Requested mail action okay, completed.
    pub const OK: Self = Self(250);
    /// 334 Server challenge, continue authentication.
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input.
    pub const START_DATA: Self = Self(354);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn code_classes() {
        assert!(ReplyCode::OK.is_completed());
        assert!(ReplyCode::AUTH_OK.is_completed());
        assert!(ReplyCode::AUTH_CONTINUE.is_intermediate());
        assert!(ReplyCode::START_DATA.is_intermediate());
        assert!(ReplyCode::new(451).is_transient());
        assert!(ReplyCode::new(535).is_permanent());
        assert!(!ReplyCode::new(535).is_completed());
    }

    #[test]
    fn display() {
        assert_eq!(ReplyCode::OK.to_string(), "250");
        assert_eq!(ReplyCode::AUTH_OK.to_string(), "235");
    }

    #[test]
    fn reply_text_joins_lines() {
        let reply = Reply::new(
            ReplyCode::OK,
            vec!["first".to_string(), "second".to_string()],
        );
        assert_eq!(reply.text(), "first / second");
        assert!(reply.is_completed());
    }

    #[test]
    fn reply_intermediate() {
        let reply = Reply::new(ReplyCode::START_DATA, vec!["go ahead".to_string()]);
        assert!(reply.is_intermediate());
        assert!(!reply.is_completed());
    }
}
