//! Credential decoding.
//!
//! Reads the claims carried by the bearer credential issued at sign-in. The
//! signature is *not* verified: decoded claims only drive what the UI shows,
//! and the server re-checks the credential on every request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer};

use crate::error::DecodeError;

/// Claims read from a credential's payload segment.
///
/// The backend may emit either short JWT claim names or the long
/// identity-framework URIs; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    #[serde(
        alias = "nameid",
        alias = "uid",
        alias = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
        deserialize_with = "crate::models::id_string"
    )]
    pub sub: String,

    #[serde(
        default,
        alias = "unique_name",
        alias = "username",
        alias = "userName",
        alias = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name"
    )]
    pub name: Option<String>,

    #[serde(default, alias = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress")]
    pub email: Option<String>,

    #[serde(
        alias = "roles",
        alias = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
        deserialize_with = "one_or_many"
    )]
    pub role: Vec<String>,

    /// Role-specific identifier (the doctor or patient record id).
    #[serde(
        default,
        rename = "secondaryId",
        alias = "doctorId",
        alias = "patientId",
        alias = "DoctorId",
        alias = "PatientId",
        deserialize_with = "crate::models::optional_id_string"
    )]
    pub secondary_id: Option<String>,

    /// Expiry as a Unix timestamp in seconds.
    pub exp: i64,
}

/// Decode the payload segment of `token` into [`Claims`].
///
/// Pure: no I/O, no clock, no signature check.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_header, payload, _signature] = segments.as_slice() else {
        return Err(DecodeError::MalformedToken(segments.len()));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| DecodeError::InvalidBase64)?;

    serde_json::from_slice(&bytes).map_err(|e| DecodeError::InvalidPayload(e.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(role) => vec![role],
        OneOrMany::Many(roles) => roles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::token_with;

    #[test]
    fn test_decode_short_claim_names() {
        let token = token_with(serde_json::json!({
            "sub": "17",
            "unique_name": "dr.house",
            "email": "house@clinic.test",
            "role": "Doctor",
            "doctorId": 4,
            "exp": 2_000_000_000i64,
        }));

        let claims = decode(&token).unwrap();
        assert_eq!(claims.sub, "17");
        assert_eq!(claims.name.as_deref(), Some("dr.house"));
        assert_eq!(claims.email.as_deref(), Some("house@clinic.test"));
        assert_eq!(claims.role, vec!["Doctor".to_string()]);
        assert_eq!(claims.secondary_id.as_deref(), Some("4"));
        assert_eq!(claims.exp, 2_000_000_000);
    }

    #[test]
    fn test_decode_identity_uris_and_numeric_subject() {
        let token = token_with(serde_json::json!({
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier": 99,
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name": "pat",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress": "pat@clinic.test",
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/role": ["Patient"],
            "exp": 2_000_000_000i64,
        }));

        let claims = decode(&token).unwrap();
        assert_eq!(claims.sub, "99");
        assert_eq!(claims.name.as_deref(), Some("pat"));
        assert_eq!(claims.role, vec!["Patient".to_string()]);
        assert!(claims.secondary_id.is_none());
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(decode("only.two"), Err(DecodeError::MalformedToken(2)));
        assert_eq!(decode("a.b.c.d"), Err(DecodeError::MalformedToken(4)));
        assert_eq!(decode(""), Err(DecodeError::MalformedToken(1)));
    }

    #[test]
    fn test_invalid_base64_payload() {
        assert_eq!(decode("header.@@not-base64@@.sig"), Err(DecodeError::InvalidBase64));
    }

    #[test]
    fn test_invalid_payload_structure() {
        let not_json = URL_SAFE_NO_PAD.encode(b"plain text");
        assert!(matches!(
            decode(&format!("h.{not_json}.s")),
            Err(DecodeError::InvalidPayload(_))
        ));

        let missing_exp = token_with(serde_json::json!({ "sub": "1", "role": "Admin" }));
        assert!(matches!(decode(&missing_exp), Err(DecodeError::InvalidPayload(_))));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let token = token_with(serde_json::json!({ "sub": "1", "role": "Admin", "exp": 1 }));
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        while parts[1].len() % 4 != 0 {
            parts[1].push('=');
        }
        assert!(decode(&parts.join(".")).is_ok());
    }
}
