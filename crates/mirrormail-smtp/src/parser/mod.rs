//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses a complete SMTP reply from its collected lines.
///
/// Replies are single- or multi-line:
/// - Single: `250 OK`
/// - Multi: `250-First`, `250-Second`, `250 Last`
///
/// The final line's code is authoritative.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if any line lacks a three-digit code or
/// the lines carry inconsistent codes.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(last) = lines.last() else {
        return Err(Error::Encoding("empty reply".into()));
    };
    let code = ReplyCode::new(line_code(last)?);

    let mut texts = Vec::with_capacity(lines.len());
    for line in lines {
        if line_code(line)? != code.as_u16() {
            return Err(Error::Encoding(format!(
                "inconsistent codes in multi-line reply: {line}"
            )));
        }
        texts.push(line.get(4..).unwrap_or("").to_string());
    }

    Ok(Reply::new(code, texts))
}

/// Returns true if `line` terminates a reply.
///
/// Continuation lines carry `-` as their fourth character; the final
/// line carries a space, or nothing at all (a bare `250`).
#[must_use]
pub fn is_final_line(line: &str) -> bool {
    match line.as_bytes().get(3) {
        Some(b'-') => false,
        Some(_) | None => true,
    }
}

fn line_code(line: &str) -> Result<u16> {
    let digits = line.get(0..3).unwrap_or("");
    if digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits
            .parse::<u16>()
            .map_err(|_| Error::Encoding(format!("unparseable reply code: {line}")))
    } else {
        Err(Error::Encoding(format!("reply line without code: {line}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parse_single_line() {
        let reply = parse_reply(&lines(&["250 OK"])).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.lines, vec!["OK"]);
        assert!(reply.is_completed());
    }

    #[test]
    fn parse_multi_line() {
        let reply = parse_reply(&lines(&["250-A", "250-B", "250 C"])).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.lines, vec!["A", "B", "C"]);
    }

    #[test]
    fn parse_greeting() {
        let reply = parse_reply(&lines(&["220 smtp.example.com ESMTP ready"])).unwrap();
        assert_eq!(reply.code, ReplyCode::SERVICE_READY);
        assert_eq!(reply.lines, vec!["smtp.example.com ESMTP ready"]);
    }

    #[test]
    fn parse_bare_code() {
        let reply = parse_reply(&lines(&["250"])).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.lines, vec![""]);
    }

    #[test]
    fn final_line_detection() {
        assert!(is_final_line("250 OK"));
        assert!(is_final_line("250"));
        assert!(is_final_line("250 "));
        assert!(!is_final_line("250-Continuing"));
    }

    #[test]
    fn rejects_empty_reply() {
        assert!(parse_reply(&[]).is_err());
    }

    #[test]
    fn rejects_short_line() {
        assert!(parse_reply(&lines(&["25"])).is_err());
    }

    #[test]
    fn rejects_non_numeric_code() {
        assert!(parse_reply(&lines(&["ABC OK"])).is_err());
    }

    #[test]
    fn rejects_inconsistent_codes() {
        assert!(parse_reply(&lines(&["250-A", "550 B"])).is_err());
    }
}
