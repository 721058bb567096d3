//! Credentials sent to the account endpoints.
//!
//! Every field leaves the client as a tagged token; the server decodes them
//! before comparing or hashing.

use serde::{Deserialize, Serialize};

use crate::codec::encode;
use crate::error::{ChatError, Result};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const PHONE_DIGITS: usize = 8;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn to_wire(&self) -> LoginRequest {
        LoginRequest {
            username: encode(&self.username),
            password: encode(&self.password),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
}

impl Registration {
    /// Local checks run before anything is sent.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(ChatError::InvalidRecord("username is required".into()));
        }
        if !self.email.contains('@') {
            return Err(ChatError::InvalidRecord("invalid email address".into()));
        }
        if self.phone.len() != PHONE_DIGITS || !self.phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(ChatError::InvalidRecord(format!(
                "phone number must be {} digits",
                PHONE_DIGITS
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ChatError::InvalidRecord(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    pub fn to_wire(&self) -> RegisterRequest {
        RegisterRequest {
            username: encode(&self.username),
            password: encode(&self.password),
            email: Some(encode(&self.email)),
            phone: Some(encode(&self.phone)),
        }
    }
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Response of `POST /login`: the identity as stored by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, is_tagged};

    fn registration() -> Registration {
        Registration {
            username: "alice".into(),
            password: "hunter22".into(),
            email: "alice@example.com".into(),
            phone: "12345678".into(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn test_registration_rejections() {
        let mut r = registration();
        r.email = "alice.example.com".into();
        assert!(r.validate().is_err());

        let mut r = registration();
        r.phone = "1234567".into();
        assert!(r.validate().is_err());

        let mut r = registration();
        r.phone = "1234567a".into();
        assert!(r.validate().is_err());

        let mut r = registration();
        r.password = "short".into();
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_every_field_is_tagged_on_the_wire() {
        let wire = registration().to_wire();
        assert!(is_tagged(&wire.username));
        assert!(is_tagged(&wire.password));
        assert_eq!(decode(wire.email.as_deref().unwrap()), Some("alice@example.com".into()));
        assert_eq!(decode(wire.phone.as_deref().unwrap()), Some("12345678".into()));

        let login = Credentials::new("bob", "pw").to_wire();
        assert_eq!(decode(&login.username), Some("bob".into()));
    }
}
