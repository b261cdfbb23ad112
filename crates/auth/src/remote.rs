//! HTTP client for the hosted auth service (password grant).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::{AuthError, AuthGrant, AuthProvider};

/// Auth provider speaking the hosted service's `/auth/v1` REST API.
#[derive(Debug, Clone)]
pub struct RestAuthProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RestAuthProvider {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AuthProvider for RestAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| AuthError::Provider {
            status: status.as_u16(),
            message: format!("unexpected token response: {e}"),
        })?;
        Ok(grant_from_token(token, Utc::now()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), &body))
    }
}

fn grant_from_token(token: TokenResponse, now: DateTime<Utc>) -> AuthGrant {
    let expires_at = token
        .expires_at
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .or_else(|| token.expires_in.map(|secs| now + Duration::seconds(secs)));
    AuthGrant {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
    }
}

fn error_from_response(status: u16, body: &str) -> AuthError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        400 | 401 | 422 => AuthError::InvalidCredentials(message),
        _ => AuthError::Provider { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn absolute_expiry_wins_over_relative() {
        let now = Utc.with_ymd_and_hms(2025, 12, 18, 9, 0, 0).unwrap();
        let token = TokenResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_in: Some(3600),
            expires_at: Some(now.timestamp() + 60),
        };
        assert_eq!(grant_from_token(token, now).expires_at, Some(now + Duration::seconds(60)));

        let token = TokenResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_in: Some(3600),
            expires_at: None,
        };
        assert_eq!(grant_from_token(token, now).expires_at, Some(now + Duration::hours(1)));
    }

    #[test]
    fn rejected_credentials_carry_service_message() {
        let err = error_from_response(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(err, AuthError::InvalidCredentials("Invalid login credentials".into()));
    }

    #[test]
    fn server_errors_keep_status() {
        assert_eq!(
            error_from_response(503, "upstream unavailable"),
            AuthError::Provider {
                status: 503,
                message: "upstream unavailable".into()
            }
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = RestAuthProvider::new("https://auth.example.test/", "anon");
        assert_eq!(provider.base_url(), "https://auth.example.test");
    }
}
