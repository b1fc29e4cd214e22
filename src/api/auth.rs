//! Credential encoding and token shape checks.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign-in rejected: {0}")]
    Rejected(String),
    #[error("token is not a three-segment dot-delimited string")]
    InvalidTokenShape,
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
}

/// `base64(username:password)` for the Basic scheme.
pub fn encode_basic_credentials(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{}:{}", username, password))
}

/// A token is acceptable when splitting on `.` yields exactly three
/// segments. Segments may be empty; no decoding is attempted.
pub fn validate_token_shape(token: &str) -> bool {
    token.split('.').count() == 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_basic_credentials() {
        // RFC 7617's own example pair
        assert_eq!(
            encode_basic_credentials("Aladdin", "open sesame"),
            "QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn test_token_with_three_segments_is_valid() {
        assert!(validate_token_shape("a.b.c"));
    }

    #[test]
    fn test_empty_token_is_invalid() {
        assert!(!validate_token_shape(""));
    }

    #[test]
    fn test_two_segment_token_is_invalid() {
        assert!(!validate_token_shape("a.b"));
    }

    #[test]
    fn test_four_segment_token_is_invalid() {
        assert!(!validate_token_shape("a.b.c.d"));
    }

    #[test]
    fn test_empty_segments_are_tolerated() {
        // Shape only: no decoding, so empty segments pass.
        assert!(validate_token_shape("a..c"));
        assert!(validate_token_shape(".."));
    }
}
