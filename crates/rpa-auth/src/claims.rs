//! Lightweight client-side token claim inspection.
//!
//! The client never checks signatures. It only decodes the payload segment
//! of a compact `header.payload.signature` token and looks at its `type`
//! claim, so a token minted for one surface is not presented on the other.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::Value;
use thiserror::Error;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

/// base64url, padding optional (what JWT issuers emit).
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Standard alphabet, padding optional (what some issuers emit anyway).
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Why a token was not trusted.
///
/// Callers treat both kinds identically; the distinction only shows up in
/// logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenRejection {
    /// The payload segment is missing or does not decode to JSON.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The payload decoded but carries a `type` claim this surface does not accept.
    #[error("token type {0:?} is not accepted here")]
    ForeignType(String),
}

impl TokenRejection {
    /// Short machine-readable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenRejection::Malformed(_) => "malformed",
            TokenRejection::ForeignType(_) => "foreign_type",
        }
    }
}

/// Outcome of [`verify_token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerdict {
    Valid {
        /// The normalized token, ready for an `Authorization` header.
        token: String,
        /// The `type` claim, when the token carried one.
        claim_type: Option<String>,
    },
    Rejected(TokenRejection),
}

impl TokenVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenVerdict::Valid { .. })
    }
}

/// Strip incidental wrapping from a stored or received token.
///
/// Removes surrounding whitespace, a leading and/or trailing double quote
/// (left behind when a token was stored JSON-encoded) and a case-insensitive
/// `Bearer ` prefix.
pub fn normalize_token(raw: &str) -> String {
    let mut token = raw.trim();
    token = token.strip_prefix('"').unwrap_or(token);
    token = token.strip_suffix('"').unwrap_or(token);

    let trimmed = token.trim_start();
    if let Some((scheme, rest)) = trimmed.split_at_checked(6) {
        if scheme.eq_ignore_ascii_case("bearer") && rest.starts_with(char::is_whitespace) {
            token = rest;
        }
    }

    token.trim().to_string()
}

/// Decode the claim set (second segment) of a compact token.
pub fn decode_claims(token: &str) -> Result<Value, TokenRejection> {
    let segment = token
        .split('.')
        .nth(1)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TokenRejection::Malformed("missing payload segment".to_string()))?;

    let bytes = URL_SAFE_LENIENT
        .decode(segment)
        .or_else(|_| STANDARD_LENIENT.decode(segment))
        .map_err(|e| TokenRejection::Malformed(format!("payload is not base64: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| TokenRejection::Malformed(format!("payload is not JSON: {e}")))
}

/// Check a token's `type` claim against `accepted`.
///
/// A missing, `null` or empty `type` is accepted. A string listed in
/// `accepted` is accepted. Anything else is a [`TokenRejection::ForeignType`].
pub fn verify_token(raw: &str, accepted: &[&str]) -> TokenVerdict {
    let token = normalize_token(raw);
    if token.is_empty() {
        return TokenVerdict::Rejected(TokenRejection::Malformed("empty token".to_string()));
    }

    let claims = match decode_claims(&token) {
        Ok(claims) => claims,
        Err(rejection) => return TokenVerdict::Rejected(rejection),
    };

    let claim_type = match claims.get("type") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) if accepted.contains(&s.as_str()) => Some(s.clone()),
        Some(Value::String(s)) => {
            return TokenVerdict::Rejected(TokenRejection::ForeignType(s.clone()));
        }
        Some(other) => {
            return TokenVerdict::Rejected(TokenRejection::ForeignType(other.to_string()));
        }
    };

    TokenVerdict::Valid { token, claim_type }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

    const ADMIN: &[&str] = &["access", "admin_access"];
    const USER: &[&str] = &["access", "user_access"];

    fn token_with(claims: &Value) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.signature",
            URL_SAFE_NO_PAD.encode(claims.to_string())
        )
    }

    #[test]
    fn test_normalize_strips_quotes_and_bearer() {
        assert_eq!(normalize_token("\"Bearer abc.def.ghi\""), "abc.def.ghi");
        assert_eq!(normalize_token("  bearer   abc.def.ghi "), "abc.def.ghi");
        assert_eq!(normalize_token("BEARER\tabc.def.ghi"), "abc.def.ghi");
        assert_eq!(normalize_token("abc.def.ghi"), "abc.def.ghi");
        assert_eq!(normalize_token("\"abc.def.ghi"), "abc.def.ghi");
    }

    #[test]
    fn test_normalize_keeps_tokens_that_merely_start_with_bearer() {
        assert_eq!(normalize_token("bearerish.def.ghi"), "bearerish.def.ghi");
    }

    #[test]
    fn test_user_access_token_from_fixture() {
        let token = "abc.eyJ0eXBlIjoidXNlcl9hY2Nlc3MifQ.sig";

        assert!(matches!(
            verify_token(token, ADMIN),
            TokenVerdict::Rejected(TokenRejection::ForeignType(t)) if t == "user_access"
        ));
        assert_eq!(
            verify_token(token, USER),
            TokenVerdict::Valid {
                token: token.to_string(),
                claim_type: Some("user_access".to_string()),
            }
        );
    }

    #[test]
    fn test_accepted_types() {
        for claim in ["access", "admin_access"] {
            let token = token_with(&serde_json::json!({ "type": claim, "sub": "a1" }));
            assert!(verify_token(&token, ADMIN).is_valid(), "{claim} should pass");
        }
    }

    #[test]
    fn test_absent_null_or_empty_type_is_accepted() {
        for claims in [
            serde_json::json!({ "sub": "a1" }),
            serde_json::json!({ "type": null }),
            serde_json::json!({ "type": "" }),
        ] {
            let verdict = verify_token(&token_with(&claims), ADMIN);
            assert!(
                matches!(verdict, TokenVerdict::Valid { claim_type: None, .. }),
                "{claims} should pass without a claim type"
            );
        }
    }

    #[test]
    fn test_foreign_types_rejected() {
        for claims in [
            serde_json::json!({ "type": "refresh" }),
            serde_json::json!({ "type": "ADMIN_ACCESS" }),
            serde_json::json!({ "type": 7 }),
            serde_json::json!({ "type": ["access"] }),
        ] {
            let verdict = verify_token(&token_with(&claims), ADMIN);
            assert!(
                matches!(verdict, TokenVerdict::Rejected(TokenRejection::ForeignType(_))),
                "{claims} should be foreign"
            );
        }
    }

    #[test]
    fn test_non_object_payload_has_no_type() {
        let token = token_with(&serde_json::json!(42));
        assert!(verify_token(&token, USER).is_valid());
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        for token in ["", "   ", "no-dots", "a..c", "a.!!!.c", "a.bm90IGpzb24.c"] {
            let verdict = verify_token(token, USER);
            assert!(
                matches!(verdict, TokenVerdict::Rejected(TokenRejection::Malformed(_))),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_padded_standard_payload_decodes() {
        let payload = STANDARD.encode(r#"{"type":"access","n":"??>?"}"#);
        assert!(payload.ends_with('='));
        let token = format!("h.{payload}.s");

        assert!(verify_token(&token, USER).is_valid());
    }

    #[test]
    fn test_verify_normalizes_before_decoding() {
        let token = token_with(&serde_json::json!({ "type": "admin_access" }));
        let verdict = verify_token(&format!("\"Bearer {token}\""), ADMIN);

        assert_eq!(
            verdict,
            TokenVerdict::Valid {
                token,
                claim_type: Some("admin_access".to_string()),
            }
        );
    }

    #[test]
    fn test_non_ascii_token_is_rejected_not_sliced() {
        assert_eq!(normalize_token("tokéé.payload.sig"), "tokéé.payload.sig");
        assert_eq!(normalize_token("bearé x"), "bearé x");
        assert!(matches!(
            verify_token("tokéé.payload.sig", USER),
            TokenVerdict::Rejected(TokenRejection::Malformed(_))
        ));
    }

    #[test]
    fn test_rejection_kind_labels() {
        assert_eq!(TokenRejection::Malformed("x".into()).kind(), "malformed");
        assert_eq!(TokenRejection::ForeignType("x".into()).kind(), "foreign_type");
    }
}
