//! Slack webhook signature verification
//!
//! Slack signs each request with `v0=HMAC-SHA256(signing_secret,
//! "v0:{timestamp}:{body}")` in the `x-slack-signature` header. Requests
//! older than the replay window are rejected even with a valid signature.

use ring::hmac;

/// Maximum allowed age of a request timestamp (seconds)
const MAX_TIMESTAMP_AGE: i64 = 300;

/// Outcome of a webhook authentication check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Request is authenticated
    Authenticated,
    /// Request failed authentication
    Rejected {
        /// Human-readable reason for rejection
        reason: String,
    },
}

impl AuthOutcome {
    /// Returns true if the request is authenticated
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated)
    }

    fn rejected(reason: impl Into<String>) -> Self {
        AuthOutcome::Rejected {
            reason: reason.into(),
        }
    }
}

/// Slack webhook signature verifier
pub struct SlackAuth {
    signing_secret: String,
}

impl SlackAuth {
    /// Create a verifier with the app's signing secret
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
        }
    }

    /// Verify an inbound webhook request.
    ///
    /// - `timestamp`: the `x-slack-request-timestamp` header value.
    /// - `signature`: the `x-slack-signature` header value.
    /// - `body`: raw request body bytes.
    /// - `timestamp_now`: current Unix timestamp (seconds) for replay
    ///   protection.
    pub fn verify(
        &self,
        timestamp: &str,
        signature: &str,
        body: &[u8],
        timestamp_now: i64,
    ) -> AuthOutcome {
        // Replay protection
        let ts: i64 = match timestamp.parse() {
            Ok(v) => v,
            Err(_) => return AuthOutcome::rejected("invalid timestamp format"),
        };
        if (timestamp_now - ts).abs() > MAX_TIMESTAMP_AGE {
            return AuthOutcome::rejected("request timestamp too old");
        }

        // HMAC-SHA256 over v0:{timestamp}:{body}
        let body_str = String::from_utf8_lossy(body);
        let sig_basestring = format!("v0:{}:{}", timestamp, body_str);
        let key = hmac::Key::new(hmac::HMAC_SHA256, self.signing_secret.as_bytes());
        let mac = hmac::sign(&key, sig_basestring.as_bytes());
        let computed = format!("v0={}", hex_encode(mac.as_ref()));

        if computed != signature {
            return AuthOutcome::rejected("invalid signature");
        }

        AuthOutcome::Authenticated
    }
}

/// Hex encoding helper (avoids adding a hex crate dependency)
fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_signing_secret";
    const BODY: &[u8] = br#"{"type":"event_callback"}"#;

    fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
        let basestring = format!("v0:{}:{}", timestamp, String::from_utf8_lossy(body));
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let mac = hmac::sign(&key, basestring.as_bytes());
        format!("v0={}", hex_encode(mac.as_ref()))
    }

    #[test]
    fn test_valid_signature_accepted() {
        let auth = SlackAuth::new(SECRET);
        let signature = sign(SECRET, "1700000000", BODY);

        let outcome = auth.verify("1700000000", &signature, BODY, 1_700_000_010);
        assert!(outcome.is_allowed());
    }

    #[test]
    fn test_wrong_signature_rejected() {
        let auth = SlackAuth::new(SECRET);
        let outcome = auth.verify("1700000000", "v0=deadbeef", BODY, 1_700_000_010);
        assert_eq!(
            outcome,
            AuthOutcome::Rejected {
                reason: "invalid signature".to_string()
            }
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let auth = SlackAuth::new(SECRET);
        let signature = sign("other_secret", "1700000000", BODY);

        let outcome = auth.verify("1700000000", &signature, BODY, 1_700_000_010);
        assert!(!outcome.is_allowed());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let auth = SlackAuth::new(SECRET);
        let signature = sign(SECRET, "1700000000", BODY);

        // Valid signature but outside the replay window
        let outcome = auth.verify("1700000000", &signature, BODY, 1_700_000_000 + 301);
        assert_eq!(
            outcome,
            AuthOutcome::Rejected {
                reason: "request timestamp too old".to_string()
            }
        );
    }

    #[test]
    fn test_non_numeric_timestamp_rejected() {
        let auth = SlackAuth::new(SECRET);
        let outcome = auth.verify("not-a-number", "v0=00", BODY, 1_700_000_000);
        assert_eq!(
            outcome,
            AuthOutcome::Rejected {
                reason: "invalid timestamp format".to_string()
            }
        );
    }

    #[test]
    fn test_tampered_body_rejected() {
        let auth = SlackAuth::new(SECRET);
        let signature = sign(SECRET, "1700000000", BODY);

        let outcome = auth.verify("1700000000", &signature, b"tampered", 1_700_000_010);
        assert!(!outcome.is_allowed());
    }
}
