//! RFC 5322 header block and message framing helpers.

use crate::types::Envelope;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// Renders the header block for an envelope, without the trailing
/// blank line.
///
/// Headers: `From`, `To`, `Subject` (RFC 2047-encoded when needed),
/// `Date`, `MIME-Version`, `Content-Type`, `Content-Transfer-Encoding`.
#[must_use]
pub fn render_headers(envelope: &Envelope, date: DateTime<Utc>) -> Vec<String> {
    vec![
        format!("From: {}", envelope.sender),
        format!("To: {}", envelope.recipient),
        format!("Subject: {}", encode_subject(&envelope.subject)),
        format!("Date: {}", date.to_rfc2822()),
        "MIME-Version: 1.0".to_string(),
        "Content-Type: text/plain; charset=utf-8".to_string(),
        "Content-Transfer-Encoding: 8bit".to_string(),
    ]
}

/// Encodes a subject as an RFC 2047 encoded-word when it contains
/// anything outside printable ASCII; returns it unchanged otherwise.
#[must_use]
pub fn encode_subject(subject: &str) -> Cow<'_, str> {
    let ascii_safe = subject
        .bytes()
        .all(|b| (0x20..0x7f).contains(&b));
    if ascii_safe {
        Cow::Borrowed(subject)
    } else {
        Cow::Owned(format!("=?utf-8?B?{}?=", BASE64.encode(subject.as_bytes())))
    }
}

/// Escapes a body line for the DATA phase.
///
/// A leading `.` is doubled so the line cannot be mistaken for the
/// end-of-message marker (RFC 5321 section 4.5.2).
#[must_use]
pub fn dot_stuff(line: &str) -> Cow<'_, str> {
    if line.starts_with('.') {
        Cow::Owned(format!(".{line}"))
    } else {
        Cow::Borrowed(line)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Address;
    use chrono::TimeZone as _;
    use proptest::prelude::*;

    fn sample_envelope(subject: &str) -> Envelope {
        Envelope::new(
            Address::new("user@example.com").unwrap(),
            Address::new("ops@example.com").unwrap(),
            subject,
            vec!["Job finished.".to_string()],
        )
    }

    #[test]
    fn header_block_layout() {
        let date = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let headers = render_headers(&sample_envelope("Backup OK"), date);
        assert_eq!(headers[0], "From: user@example.com");
        assert_eq!(headers[1], "To: ops@example.com");
        assert_eq!(headers[2], "Subject: Backup OK");
        assert_eq!(headers[3], "Date: Sat, 14 Mar 2026 09:26:53 +0000");
        assert!(headers.contains(&"Content-Type: text/plain; charset=utf-8".to_string()));
    }

    #[test]
    fn ascii_subject_is_untouched() {
        assert_eq!(encode_subject("Backup OK"), "Backup OK");
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let encoded = encode_subject("バックアップ結果").into_owned();
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
        let b64 = &encoded["=?utf-8?B?".len()..encoded.len() - 2];
        let decoded = BASE64.decode(b64).unwrap();
        assert_eq!(decoded, "バックアップ結果".as_bytes());
    }

    #[test]
    fn control_characters_force_encoding() {
        assert!(encode_subject("line\tbreak").starts_with("=?utf-8?B?"));
    }

    #[test]
    fn lone_dot_is_doubled() {
        assert_eq!(dot_stuff("."), "..");
        assert_eq!(dot_stuff(".hidden"), "..hidden");
        assert_eq!(dot_stuff("no dot"), "no dot");
        assert_eq!(dot_stuff(""), "");
    }

    proptest! {
        // A receiver that strips one leading dot from stuffed lines
        // recovers the original line.
        #[test]
        fn dot_stuffing_round_trips(line in "[ -~]{0,80}") {
            let stuffed = dot_stuff(&line);
            let received = stuffed.strip_prefix('.').unwrap_or_else(|| stuffed.as_ref());
            prop_assert_eq!(received, line.as_str());
        }
    }
}
