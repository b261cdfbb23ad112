//! The two-step login form: email first, then password.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use crate::provider::{AuthError, AuthProvider};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    CollectingEmail,
    CollectingPassword,
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStep::CollectingEmail => f.write_str("email"),
            LoginStep::CollectingPassword => f.write_str("password"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("login form is collecting the {0}")]
    WrongStep(LoginStep),

    #[error("{0:?} is not a valid email address")]
    InvalidEmail(String),

    #[error("password is required")]
    MissingPassword,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));
    regex.is_match(email)
}

/// Login form state.
///
/// Errors from the last submission are kept as an inline message until the
/// next edit.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    step: LoginStep,
    email: String,
    password: String,
    error: Option<String>,
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginFlow {
    pub fn new() -> Self {
        Self {
            step: LoginStep::CollectingEmail,
            email: String::new(),
            password: String::new(),
            error: None,
        }
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_email(&mut self, email: &str) -> Result<(), LoginError> {
        self.expect_step(LoginStep::CollectingEmail)?;
        self.email = email.trim().to_string();
        self.error = None;
        Ok(())
    }

    pub fn continue_to_password(&mut self) -> Result<(), LoginError> {
        self.expect_step(LoginStep::CollectingEmail)?;
        if !is_valid_email(&self.email) {
            let err = LoginError::InvalidEmail(self.email.clone());
            self.error = Some(err.to_string());
            return Err(err);
        }
        self.step = LoginStep::CollectingPassword;
        self.error = None;
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> Result<(), LoginError> {
        self.expect_step(LoginStep::CollectingPassword)?;
        self.password = password.to_string();
        self.error = None;
        Ok(())
    }

    /// Return to the email step, discarding the password.
    pub fn back(&mut self) {
        self.step = LoginStep::CollectingEmail;
        self.password.clear();
        self.error = None;
    }

    /// Sign in with the collected credentials.
    ///
    /// A transport failure is retried once; credential and provider errors
    /// are not. The password is cleared whatever the outcome.
    pub async fn submit(
        &mut self,
        provider: &dyn AuthProvider,
        now: DateTime<Utc>,
    ) -> Result<Session, LoginError> {
        self.expect_step(LoginStep::CollectingPassword)?;
        if self.password.is_empty() {
            self.error = Some(LoginError::MissingPassword.to_string());
            return Err(LoginError::MissingPassword);
        }
        self.error = None;

        let password = std::mem::take(&mut self.password);
        let mut result = provider.sign_in(&self.email, &password).await;
        if let Err(err) = &result {
            if err.is_retryable() {
                tracing::warn!(email = %self.email, error = %err, "sign-in failed in transit; retrying once");
                result = provider.sign_in(&self.email, &password).await;
            }
        }

        match result {
            Ok(grant) => {
                tracing::info!(email = %self.email, "signed in");
                Ok(Session::from_grant(self.email.clone(), grant, now))
            }
            Err(err) => {
                tracing::error!(email = %self.email, error = %err, "sign-in failed");
                self.error = Some(err.user_message());
                Err(LoginError::Auth(err))
            }
        }
    }

    fn expect_step(&self, expected: LoginStep) -> Result<(), LoginError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(LoginError::WrongStep(self.step))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AuthGrant;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays scripted sign-in results.
    struct ScriptedProvider {
        results: Mutex<VecDeque<Result<AuthGrant, AuthError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedProvider {
        fn new(results: Vec<Result<AuthGrant, AuthError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AuthProvider for ScriptedProvider {
        async fn sign_in(&self, _email: &str, _password: &str) -> Result<AuthGrant, AuthError> {
            *self.calls.lock().unwrap() += 1;
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AuthError::Transport("script exhausted".into())))
        }

        async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
            Ok(())
        }
    }

    fn grant() -> AuthGrant {
        AuthGrant {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at: None,
        }
    }

    fn ready_flow() -> LoginFlow {
        let mut flow = LoginFlow::new();
        flow.set_email("ops@factordesk.test").unwrap();
        flow.continue_to_password().unwrap();
        flow.set_password("hunter2").unwrap();
        flow
    }

    #[test]
    fn invalid_email_stays_on_email_step() {
        let mut flow = LoginFlow::new();
        flow.set_email("not-an-email").unwrap();
        assert!(matches!(flow.continue_to_password(), Err(LoginError::InvalidEmail(_))));
        assert_eq!(flow.step(), LoginStep::CollectingEmail);
        assert!(flow.error().is_some());

        flow.set_email("a@b.co").unwrap();
        assert!(flow.error().is_none());
        flow.continue_to_password().unwrap();
        assert_eq!(flow.step(), LoginStep::CollectingPassword);
    }

    #[test]
    fn steps_guard_their_fields() {
        let mut flow = LoginFlow::new();
        assert_eq!(
            flow.set_password("x"),
            Err(LoginError::WrongStep(LoginStep::CollectingEmail))
        );

        let mut flow = ready_flow();
        assert_eq!(
            flow.set_email("other@b.co"),
            Err(LoginError::WrongStep(LoginStep::CollectingPassword))
        );
        flow.back();
        assert_eq!(flow.step(), LoginStep::CollectingEmail);
        assert_eq!(flow.email(), "ops@factordesk.test");
    }

    #[tokio::test]
    async fn successful_submit_returns_session() {
        let provider = ScriptedProvider::new(vec![Ok(grant())]);
        let mut flow = ready_flow();
        let now = Utc::now();

        let session = flow.submit(&provider, now).await.unwrap();
        assert_eq!(session.email, "ops@factordesk.test");
        assert_eq!(session.access_token, "at");
        assert_eq!(session.login_time, now);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_retried_once() {
        let provider = ScriptedProvider::new(vec![
            Err(AuthError::Transport("reset".into())),
            Ok(grant()),
        ]);
        let mut flow = ready_flow();
        assert!(flow.submit(&provider, Utc::now()).await.is_ok());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn second_transport_failure_is_reported() {
        let provider = ScriptedProvider::new(vec![
            Err(AuthError::Transport("reset".into())),
            Err(AuthError::Transport("reset again".into())),
        ]);
        let mut flow = ready_flow();
        let err = flow.submit(&provider, Utc::now()).await.unwrap_err();
        assert!(matches!(err, LoginError::Auth(AuthError::Transport(_))));
        assert_eq!(provider.calls(), 2);
        assert!(flow.error().unwrap().contains("reset again"));
    }

    #[tokio::test]
    async fn bad_credentials_are_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(AuthError::InvalidCredentials(
            "Invalid login credentials".into(),
        ))]);
        let mut flow = ready_flow();
        assert!(flow.submit(&provider, Utc::now()).await.is_err());
        assert_eq!(provider.calls(), 1);
        assert_eq!(flow.error(), Some("Invalid login credentials"));
        assert_eq!(flow.step(), LoginStep::CollectingPassword);
    }

    #[tokio::test]
    async fn empty_password_never_reaches_provider() {
        let provider = ScriptedProvider::new(vec![]);
        let mut flow = LoginFlow::new();
        flow.set_email("a@b.co").unwrap();
        flow.continue_to_password().unwrap();

        assert_eq!(
            flow.submit(&provider, Utc::now()).await.unwrap_err(),
            LoginError::MissingPassword
        );
        assert_eq!(provider.calls(), 0);
    }
}
