//! Login session value and the session-age rule.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use factordesk_core::ValueObject;
use factordesk_storage::{LocalStorage, StorageError};
use serde::{Deserialize, Serialize};

use crate::provider::AuthGrant;

/// Sessions older than this many hours are logged out.
pub const DEFAULT_MAX_AGE_HOURS: u32 = 2;

const AUTHENTICATED_KEY: &str = "isAuthenticated";
const EMAIL_KEY: &str = "userEmail";
const SESSION_KEY: &str = "session";
const LOGIN_TIMESTAMP_KEY: &str = "loginTimestamp";

/// An authenticated back-office session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub login_time: DateTime<Utc>,
}

impl ValueObject for Session {}

impl Session {
    pub fn from_grant(email: impl Into<String>, grant: AuthGrant, login_time: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            login_time,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, max_age_hours: u32) -> bool {
        is_expired(now, self.login_time, max_age_hours)
    }
}

/// True when more than `max_age_hours` have passed since `login_time`.
///
/// A session exactly at the limit is still valid. A login time in the future
/// (clock skew) never counts as expired.
pub fn is_expired(now: DateTime<Utc>, login_time: DateTime<Utc>, max_age_hours: u32) -> bool {
    now.signed_duration_since(login_time) > Duration::hours(i64::from(max_age_hours))
}

/// Outcome of a session check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Active(Session),
    /// The session was too old and has been cleared.
    Expired,
    Missing,
}

/// Session flags in local storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: Arc<dyn LocalStorage>,
    max_age_hours: u32,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn LocalStorage>, max_age_hours: u32) -> Self {
        Self {
            storage,
            max_age_hours,
        }
    }

    pub fn max_age_hours(&self) -> u32 {
        self.max_age_hours
    }

    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        let json = serde_json::to_string(session).map_err(|e| StorageError::Backend(e.into()))?;
        self.storage.set(AUTHENTICATED_KEY, "true")?;
        self.storage.set(EMAIL_KEY, &session.email)?;
        self.storage.set(SESSION_KEY, &json)?;
        self.storage
            .set(LOGIN_TIMESTAMP_KEY, &session.login_time.to_rfc3339())?;
        tracing::info!(email = %session.email, "session saved");
        Ok(())
    }

    /// Read the stored session, if the flags describe one.
    ///
    /// An unreadable session blob is treated as no session and cleared.
    pub fn load(&self) -> Result<Option<Session>, StorageError> {
        if self.storage.get(AUTHENTICATED_KEY)?.as_deref() != Some("true") {
            return Ok(None);
        }
        let Some(json) = self.storage.get(SESSION_KEY)? else {
            return Ok(None);
        };

        let mut session: Session = match serde_json::from_str(&json) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "stored session is unreadable; clearing it");
                self.clear()?;
                return Ok(None);
            }
        };

        // The separate timestamp key wins when it is readable.
        if let Some(raw) = self.storage.get(LOGIN_TIMESTAMP_KEY)? {
            match DateTime::parse_from_rfc3339(&raw) {
                Ok(ts) => session.login_time = ts.with_timezone(&Utc),
                Err(err) => tracing::warn!(error = %err, "ignoring unreadable login timestamp"),
            }
        }

        Ok(Some(session))
    }

    /// Remove every session key. All keys are attempted; the first failure is
    /// returned.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut first_err = None;
        for key in [AUTHENTICATED_KEY, EMAIL_KEY, SESSION_KEY, LOGIN_TIMESTAMP_KEY] {
            if let Err(err) = self.storage.remove(key) {
                tracing::error!(key, error = %err, "failed to clear session key");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Apply the session-age rule, clearing an expired session.
    pub fn check_session(&self, now: DateTime<Utc>) -> SessionStatus {
        let session = match self.load() {
            Ok(Some(session)) => session,
            Ok(None) => return SessionStatus::Missing,
            Err(err) => {
                tracing::error!(error = %err, "failed to read session");
                return SessionStatus::Missing;
            }
        };

        if session.is_expired(now, self.max_age_hours) {
            tracing::info!(
                email = %session.email,
                login_time = %session.login_time,
                "session older than {}h; logging out",
                self.max_age_hours
            );
            // Logged inside clear; the session is gone from memory either way.
            let _ = self.clear();
            return SessionStatus::Expired;
        }

        SessionStatus::Active(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use factordesk_storage::MemoryStorage;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 18, h, m, s).unwrap()
    }

    fn session(login_time: DateTime<Utc>) -> Session {
        Session::from_grant(
            "ops@factordesk.test",
            AuthGrant {
                access_token: "access".into(),
                refresh_token: "refresh".into(),
                expires_at: None,
            },
            login_time,
        )
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let login = at(9, 0, 0);
        assert!(!is_expired(at(10, 59, 59), login, 2));
        assert!(!is_expired(at(11, 0, 0), login, 2));
        assert!(is_expired(at(11, 0, 1), login, 2));
    }

    #[test]
    fn future_login_time_is_not_expired() {
        assert!(!is_expired(at(9, 0, 0), at(12, 0, 0), 2));
    }

    #[test]
    fn save_writes_flags_and_load_reads_them_back() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone(), DEFAULT_MAX_AGE_HOURS);
        let saved = session(at(9, 0, 0));
        store.save(&saved).unwrap();

        assert_eq!(storage.get("isAuthenticated").unwrap().as_deref(), Some("true"));
        assert_eq!(storage.get("userEmail").unwrap().as_deref(), Some("ops@factordesk.test"));
        assert!(storage.get("loginTimestamp").unwrap().is_some());
        assert_eq!(store.load().unwrap(), Some(saved));
    }

    #[test]
    fn check_session_reports_active_expired_and_missing() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone(), DEFAULT_MAX_AGE_HOURS);
        assert_eq!(store.check_session(at(9, 0, 0)), SessionStatus::Missing);

        store.save(&session(at(9, 0, 0))).unwrap();
        assert!(matches!(store.check_session(at(10, 0, 0)), SessionStatus::Active(_)));

        assert_eq!(store.check_session(at(11, 30, 0)), SessionStatus::Expired);
        assert!(storage.is_empty());
        assert_eq!(store.check_session(at(11, 30, 0)), SessionStatus::Missing);
    }

    #[test]
    fn corrupt_session_blob_is_cleared() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("isAuthenticated", "true").unwrap();
        storage.set("session", "{broken").unwrap();
        let store = SessionStore::new(storage.clone(), DEFAULT_MAX_AGE_HOURS);

        assert_eq!(store.load().unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn login_timestamp_key_overrides_blob() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone(), DEFAULT_MAX_AGE_HOURS);
        store.save(&session(at(9, 0, 0))).unwrap();
        storage.set("loginTimestamp", &at(6, 0, 0).to_rfc3339()).unwrap();

        assert_eq!(store.check_session(at(9, 30, 0)), SessionStatus::Expired);
    }

    #[test]
    fn custom_max_age_is_honoured() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage, 8);
        store.save(&session(at(1, 0, 0))).unwrap();
        assert!(matches!(store.check_session(at(8, 0, 0)), SessionStatus::Active(_)));
    }
}
