//! Contract with the hosted auth service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tokens issued by a successful password sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Provider-side token expiry. Informational; the session-age rule is
    /// applied independently of it.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("auth service unreachable: {0}")]
    Transport(String),

    #[error("auth service error ({status}): {message}")]
    Provider { status: u16, message: String },
}

impl AuthError {
    /// Only transport failures are worth repeating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Transport(_))
    }

    /// Text shown under the login form.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(message) if !message.trim().is_empty() => message.clone(),
            AuthError::InvalidCredentials(_) => {
                "Login failed. Please check your credentials.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Password sign-in and sign-out against the auth service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

const SESSION_ERROR_CODES: &[&str] = &[
    "PGRST301",
    "PGRST303",
    "refresh_token_not_found",
    "refresh_token_already_used",
    "session_expired",
    "session_not_found",
    "bad_jwt",
];

const SESSION_ERROR_MARKERS: &[&str] = &[
    "refresh token",
    "refresh_token",
    "jwt expired",
    "invalid jwt",
    "session expired",
];

/// Whether a remote error means the login session is no longer usable.
///
/// Callers force a logout on `true` instead of showing the error inline.
pub fn is_session_error(code: Option<&str>, message: &str) -> bool {
    if let Some(code) = code {
        if SESSION_ERROR_CODES.iter().any(|c| c.eq_ignore_ascii_case(code.trim())) {
            return true;
        }
    }
    let message = message.to_ascii_lowercase();
    SESSION_ERROR_MARKERS.iter().any(|m| message.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_token_and_jwt_errors_are_session_errors() {
        assert!(is_session_error(None, "Invalid Refresh Token: Refresh Token Not Found"));
        assert!(is_session_error(Some("PGRST301"), "anything"));
        assert!(is_session_error(Some("bad_jwt"), ""));
        assert!(is_session_error(None, "JWT expired"));
    }

    #[test]
    fn ordinary_failures_are_not_session_errors() {
        assert!(!is_session_error(None, "relation \"invoices\" does not exist"));
        assert!(!is_session_error(Some("42P01"), "undefined table"));
        assert!(!is_session_error(None, ""));
    }

    #[test]
    fn only_transport_errors_retry() {
        assert!(AuthError::Transport("connection reset".into()).is_retryable());
        assert!(!AuthError::InvalidCredentials("Invalid login credentials".into()).is_retryable());
        assert!(
            !AuthError::Provider {
                status: 500,
                message: "boom".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn blank_credential_message_gets_default_text() {
        assert_eq!(
            AuthError::InvalidCredentials(String::new()).user_message(),
            "Login failed. Please check your credentials."
        );
        assert_eq!(
            AuthError::InvalidCredentials("Invalid login credentials".into()).user_message(),
            "Invalid login credentials"
        );
    }
}
