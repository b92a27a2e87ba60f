//! Auth state container.
//!
//! `AuthStore` is a cheap-to-clone handle to one shared `AuthState`. Every
//! change goes through one of the transition methods, each applied in a
//! single `send_modify` so readers never see a half-applied transition.
//! Create one per process (or per test) and pass it to whoever needs it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub enum AuthStatus {
    #[default]
    Unauthenticated,
    Checking,
    Authenticated,
    /// Not authenticated; the last login or probe failed.
    Error,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated)
    }
}

/// The operation a `begin`/`fail` transition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Login,
    Register,
    Probe,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub error: Option<String>,
    pub loading: bool,
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }
}

#[derive(Clone)]
pub struct AuthStore {
    tx: Arc<watch::Sender<AuthState>>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    /// Receiver that is notified after every transition.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn begin(&self, op: AuthOperation) {
        self.tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
            if op != AuthOperation::Register && !state.status.is_authenticated() {
                state.status = AuthStatus::Checking;
            }
        });
        debug!(?op, "Auth operation started");
    }

    pub fn succeed(&self, user: User) {
        debug!(username = %user.username, "Authenticated");
        self.tx.send_modify(|state| {
            state.status = AuthStatus::Authenticated;
            state.user = Some(user);
            state.error = None;
            state.loading = false;
            state.authenticated_at = Some(Utc::now());
        });
    }

    /// Record a failed operation. Registration never touches status or user.
    pub fn fail(&self, op: AuthOperation, message: impl Into<String>) {
        let message = message.into();
        debug!(?op, %message, "Auth operation failed");
        self.tx.send_modify(|state| {
            state.loading = false;
            state.error = Some(message);
            if op != AuthOperation::Register {
                state.status = AuthStatus::Error;
                state.user = None;
                state.authenticated_at = None;
            }
        });
    }

    /// End a successful registration. The account still has to log in.
    pub fn finish_register(&self) {
        self.tx.send_modify(|state| {
            state.loading = false;
            state.error = None;
        });
    }

    pub fn clear_error(&self) {
        self.tx.send_modify(|state| state.error = None);
    }

    /// Back to the initial state, whatever the current one is.
    pub fn logout(&self) {
        self.tx.send_modify(|state| *state = AuthState::default());
        debug!("Auth state cleared");
    }

    /// Logout-equivalent reset after an unrecoverable 401, keeping a message.
    pub fn session_expired(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|state| {
            *state = AuthState {
                error: Some(message),
                ..AuthState::default()
            };
        });
        debug!("Session expired, auth state cleared");
    }
}
