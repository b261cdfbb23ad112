//! `factordesk-auth`: login and session-age policy for the back office.
//!
//! The remote auth service is an opaque collaborator behind [`AuthProvider`].
//! This crate owns what happens around it: the two-step login form, the
//! session value written to local storage, and the forced-logout rule.

pub mod login;
pub mod provider;
#[cfg(feature = "remote")]
pub mod remote;
pub mod session;

pub use login::{LoginError, LoginFlow, LoginStep};
pub use provider::{AuthError, AuthGrant, AuthProvider, is_session_error};
#[cfg(feature = "remote")]
pub use remote::RestAuthProvider;
pub use session::{
    DEFAULT_MAX_AGE_HOURS, Session, SessionStatus, SessionStore, is_expired,
};
