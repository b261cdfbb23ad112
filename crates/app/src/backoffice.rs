//! The assembled back office.

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use factordesk_auth::{AuthProvider, LoginError, LoginFlow, Session, SessionStatus, SessionStore};
use factordesk_invoicing::DraftStore;
use factordesk_reports::{InvoiceDetail, InvoiceTable, QueryError, SearchOutcome, SearchView};
use factordesk_storage::{LocalStorage, SqliteStorage};

use crate::config::AppConfig;

/// Builds the invoice table for the current session, so remote queries run
/// with the signed-in user's token.
pub type TableFactory = Arc<dyn Fn(Option<&Session>) -> Arc<dyn InvoiceTable> + Send + Sync>;

/// A factory that hands out the same table whatever the session.
pub fn fixed_table(table: Arc<dyn InvoiceTable>) -> TableFactory {
    Arc::new(move |_: Option<&Session>| table.clone())
}

pub struct Backoffice {
    config: AppConfig,
    sessions: SessionStore,
    drafts: DraftStore,
    auth: Arc<dyn AuthProvider>,
    tables: TableFactory,
    session: Option<Session>,
}

impl fmt::Debug for Backoffice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backoffice")
            .field("config", &self.config)
            .field("drafts", &self.drafts.len())
            .field("signed_in", &self.session.as_ref().map(|s| s.email.as_str()))
            .finish_non_exhaustive()
    }
}

impl Backoffice {
    /// Open the SQLite storage named by `config` and hydrate from it.
    pub fn open(
        config: AppConfig,
        auth: Arc<dyn AuthProvider>,
        tables: TableFactory,
    ) -> anyhow::Result<Self> {
        let path = config.db_path()?;
        let storage = SqliteStorage::open(&path)
            .with_context(|| format!("failed to open local storage at {:?}", path))?;
        tracing::info!(path = %path.display(), "back office storage ready");
        Ok(Self::with_storage(config, Arc::new(storage), auth, tables))
    }

    /// Wire the back office over the hosted auth and database service.
    #[cfg(feature = "remote")]
    pub fn open_remote(config: AppConfig) -> anyhow::Result<Self> {
        use factordesk_auth::RestAuthProvider;
        use factordesk_reports::PostgrestInvoiceTable;

        let remote = config
            .remote
            .clone()
            .context("FACTORDESK_REMOTE_URL and FACTORDESK_REMOTE_ANON_KEY are required")?;
        let auth = Arc::new(RestAuthProvider::new(&remote.url, &remote.anon_key));
        let tables: TableFactory = Arc::new(move |session: Option<&Session>| {
            let table = PostgrestInvoiceTable::new(&remote.url, &remote.anon_key);
            let table = match session {
                Some(session) => table.with_access_token(&session.access_token),
                None => table,
            };
            Arc::new(table) as Arc<dyn InvoiceTable>
        });
        Self::open(config, auth, tables)
    }

    /// Wire the back office over an existing storage backend.
    pub fn with_storage(
        config: AppConfig,
        storage: Arc<dyn LocalStorage>,
        auth: Arc<dyn AuthProvider>,
        tables: TableFactory,
    ) -> Self {
        let sessions = SessionStore::new(storage.clone(), config.session_max_age_hours);
        let drafts = DraftStore::hydrate(storage, config.attachment_policy());
        Self {
            config,
            sessions,
            drafts,
            auth,
            tables,
            session: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftStore {
        &mut self.drafts
    }

    /// Apply the session-age rule to the stored session.
    ///
    /// When nothing is stored but this office signed in (the session write
    /// failed), the in-memory session is checked instead.
    pub fn check_session(&mut self, now: DateTime<Utc>) -> SessionStatus {
        let status = match self.sessions.check_session(now) {
            SessionStatus::Missing => match self.session.take() {
                Some(session) if !session.is_expired(now, self.sessions.max_age_hours()) => {
                    tracing::debug!(email = %session.email, "session not in storage; using the signed-in session");
                    SessionStatus::Active(session)
                }
                Some(session) => {
                    tracing::info!(email = %session.email, "in-memory session expired; logging out");
                    if let Err(err) = self.sessions.clear() {
                        tracing::error!(error = %err, "failed to clear stored session");
                    }
                    SessionStatus::Expired
                }
                None => SessionStatus::Missing,
            },
            status => status,
        };
        self.session = match &status {
            SessionStatus::Active(session) => Some(session.clone()),
            SessionStatus::Expired | SessionStatus::Missing => None,
        };
        status
    }

    /// Submit the login form and persist the resulting session.
    pub async fn login(
        &mut self,
        flow: &mut LoginFlow,
        now: DateTime<Utc>,
    ) -> Result<Session, LoginError> {
        let session = flow.submit(self.auth.as_ref(), now).await?;
        if let Err(err) = self.sessions.save(&session) {
            tracing::error!(error = %err, "failed to persist session; it will not survive a restart");
        }
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Sign out remotely (best effort) and clear the stored session.
    ///
    /// Drafts are kept.
    pub async fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(err) = self.auth.sign_out(&session.access_token).await {
                tracing::warn!(email = %session.email, error = %err, "remote sign-out failed");
            }
        }
        if let Err(err) = self.sessions.clear() {
            tracing::error!(error = %err, "failed to clear stored session");
        }
        tracing::info!("logged out");
    }

    /// Run an invoice search. A session error logs the user out.
    pub async fn search(&mut self, view: &mut SearchView, now: DateTime<Utc>) -> SearchOutcome {
        if !matches!(self.check_session(now), SessionStatus::Active(_)) {
            return SearchOutcome::SessionExpired;
        }
        let table = (self.tables)(self.session.as_ref());
        let outcome = view.run(table.as_ref()).await;
        if outcome == SearchOutcome::SessionExpired {
            self.logout().await;
        }
        outcome
    }

    /// Load one invoice for the detail screen. A session error logs the user
    /// out and is returned as is.
    pub async fn invoice_detail(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<InvoiceDetail, QueryError> {
        if !matches!(self.check_session(now), SessionStatus::Active(_)) {
            return Err(QueryError::Remote {
                code: Some("session_expired".to_string()),
                message: "Session expired. Please log in again.".to_string(),
            });
        }
        let table = (self.tables)(self.session.as_ref());
        match table.fetch(id).await {
            Ok(row) => Ok(InvoiceDetail::from_row(&row)),
            Err(err) => {
                if err.is_session_error() {
                    self.logout().await;
                }
                Err(err)
            }
        }
    }
}
