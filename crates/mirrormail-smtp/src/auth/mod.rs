//! SASL response encoders.
//!
//! Pure functions: each mechanism's challenge/response encoding lives
//! here, the pacing against the server lives in [`crate::session`].
//! Credentials are handled as raw bytes throughout; nothing in this
//! module logs or returns them in the clear.

use crate::error::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use md5::Md5;
use std::fmt::Write as _;

type HmacMd5 = Hmac<Md5>;

/// Encodes the PLAIN initial response: base64 of `\0user\0password`.
#[must_use]
pub fn plain_initial(username: &str, password: &str) -> String {
    let mut raw = Vec::with_capacity(username.len() + password.len() + 2);
    raw.push(0);
    raw.extend_from_slice(username.as_bytes());
    raw.push(0);
    raw.extend_from_slice(password.as_bytes());
    BASE64.encode(raw)
}

/// Encodes one LOGIN leg (username or password) as base64.
#[must_use]
pub fn login_leg(value: &str) -> String {
    BASE64.encode(value.as_bytes())
}

/// Computes the CRAM-MD5 response for a base64 challenge.
///
/// The response, before its own base64 encoding, is
/// `"<username> <hex>"` where `hex` is the lowercase hex HMAC-MD5 of
/// the decoded challenge keyed with the password.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the challenge is not valid base64.
pub fn cram_md5_response(username: &str, password: &str, challenge_b64: &str) -> Result<String> {
    let challenge = BASE64
        .decode(challenge_b64.trim())
        .map_err(|e| Error::Encoding(format!("CRAM-MD5 challenge is not base64: {e}")))?;

    let mut mac = HmacMd5::new_from_slice(password.as_bytes())
        .map_err(|e| Error::Encoding(format!("CRAM-MD5 key setup failed: {e}")))?;
    mac.update(&challenge);
    let digest = mac.finalize().into_bytes();

    let mut response = String::with_capacity(username.len() + 1 + digest.len() * 2);
    response.push_str(username);
    response.push(' ');
    for byte in digest {
        // write! to a String cannot fail
        let _ = write!(response, "{byte:02x}");
    }

    Ok(BASE64.encode(response))
}

/// Returns the DIGEST-MD5 continuation payload.
///
/// Deliberately an empty response rather than an RFC 2831 digest; the
/// mechanism is carried in this reduced form and flagged as incomplete
/// via [`crate::types::AuthMechanism::is_fully_implemented`].
#[must_use]
pub const fn digest_md5_placeholder() -> String {
    String::new()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_initial_layout() {
        let encoded = plain_initial("user", "pass");
        let decoded = BASE64.decode(encoded).unwrap();
        assert_eq!(decoded, b"\0user\0pass");
    }

    #[test]
    fn login_leg_is_plain_base64() {
        assert_eq!(login_leg("user@example.com"), "dXNlckBleGFtcGxlLmNvbQ==");
    }

    // RFC 2195 section 2 example: user "tim", password "tanstaaftanstaaf",
    // challenge "<1896.697170952@postoffice.reston.mci.net>".
    #[test]
    fn cram_md5_rfc2195_vector() {
        let challenge =
            BASE64.encode("<1896.697170952@postoffice.reston.mci.net>");
        let response = cram_md5_response("tim", "tanstaaftanstaaf", &challenge).unwrap();
        let decoded = String::from_utf8(BASE64.decode(response).unwrap()).unwrap();
        assert_eq!(decoded, "tim b913a602c7eda7a495b4e6e7334d3890");
    }

    #[test]
    fn cram_md5_hex_is_lowercase() {
        let challenge = BASE64.encode("nonce");
        let response = cram_md5_response("user", "pw", &challenge).unwrap();
        let decoded = String::from_utf8(BASE64.decode(response).unwrap()).unwrap();
        let (name, hex) = decoded.split_once(' ').unwrap();
        assert_eq!(name, "user");
        assert_eq!(hex.len(), 32);
        assert!(hex.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
    }

    #[test]
    fn cram_md5_rejects_bad_challenge() {
        let err = cram_md5_response("user", "pw", "not base64!!").unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn cram_md5_tolerates_surrounding_whitespace() {
        let challenge = format!(" {} ", BASE64.encode("nonce"));
        assert!(cram_md5_response("user", "pw", &challenge).is_ok());
    }

    #[test]
    fn digest_md5_sends_empty_line() {
        assert_eq!(digest_md5_placeholder(), "");
    }
}
