//! # Session and role
//!
//! A [`Session`] is derived entirely from a credential through
//! [`token::decode`](super::token::decode); nothing else constructs one.
//! [`Role`] is the closed set of account kinds, and [`require_role`] is the
//! single predicate every role check goes through.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token;
use crate::error::DecodeError;

/// Account kind carried by the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Doctor,
    Patient,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "Doctor",
            Role::Patient => "Patient",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            "admin" => Ok(Role::Admin),
            _ => Err(DecodeError::UnknownRole(s.to_string())),
        }
    }
}

/// The live identity of the signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    credential: String,
    pub subject_id: String,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub secondary_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Derive a session from a raw credential.
    ///
    /// The first claimed role this client knows wins; a credential with none
    /// of them is rejected.
    pub fn from_credential(credential: &str) -> Result<Self, DecodeError> {
        let claims = token::decode(credential)?;

        let role = claims
            .role
            .iter()
            .find_map(|r| r.parse::<Role>().ok())
            .ok_or_else(|| DecodeError::UnknownRole(claims.role.join(",")))?;

        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(DecodeError::InvalidExpiry(claims.exp))?;

        let username = claims
            .name
            .or_else(|| claims.email.clone())
            .unwrap_or_else(|| claims.sub.clone());

        Ok(Self {
            credential: credential.to_string(),
            subject_id: claims.sub,
            username,
            email: claims.email,
            role,
            secondary_id: claims.secondary_id,
            expires_at,
        })
    }

    /// The raw bearer credential, for `Authorization` headers.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Live while `now < expires_at`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }

    /// Time remaining before expiry, `None` once expired.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        (self.expires_at - Utc::now()).to_std().ok()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credential", &"<redacted>")
            .field("subject_id", &self.subject_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("secondary_id", &self.secondary_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The only role predicate: does `session` carry exactly `role`?
pub fn require_role(session: &Session, role: Role) -> bool {
    session.role == role
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{session_token, token_with};

    #[test]
    fn test_role_parsing() {
        assert_eq!("Doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert_eq!("patient".parse::<Role>().unwrap(), Role::Patient);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert!(matches!("Nurse".parse::<Role>(), Err(DecodeError::UnknownRole(_))));
    }

    #[test]
    fn test_session_from_credential() {
        let token = session_token("17", Role::Doctor, 3600);
        let session = Session::from_credential(&token).unwrap();
        assert_eq!(session.subject_id, "17");
        assert_eq!(session.role, Role::Doctor);
        assert_eq!(session.credential(), token);
        assert!(session.is_live());
        assert!(session.time_until_expiry().is_some());
        assert!(require_role(&session, Role::Doctor));
        assert!(!require_role(&session, Role::Patient));
    }

    #[test]
    fn test_expiry_boundary() {
        let token = session_token("1", Role::Patient, 60);
        let session = Session::from_credential(&token).unwrap();
        assert!(!session.is_live_at(session.expires_at));
        assert!(session.is_live_at(session.expires_at - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let token = token_with(serde_json::json!({
            "sub": "1", "role": "Nurse", "exp": 2_000_000_000i64,
        }));
        assert!(matches!(
            Session::from_credential(&token),
            Err(DecodeError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_first_known_role_wins() {
        let token = token_with(serde_json::json!({
            "sub": "1", "role": ["Auditor", "Admin"], "exp": 2_000_000_000i64,
        }));
        assert_eq!(Session::from_credential(&token).unwrap().role, Role::Admin);
    }

    #[test]
    fn test_debug_redacts_credential() {
        let token = session_token("1", Role::Admin, 60);
        let session = Session::from_credential(&token).unwrap();
        assert!(!format!("{session:?}").contains(&token));
    }
}
