//! Auth actions: the only code that drives `AuthStore` transitions from
//! network results.
//!
//! Each action moves the store into its loading state, calls the
//! `SessionClient`, and turns the outcome into exactly one closing
//! transition before returning. Failures are also returned as `AuthError`
//! so callers can react, but the store already reflects them.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiRequest, SessionClient, Transport};
use crate::models::{Credentials, Registration, User, UserEnvelope};
use crate::routes::Navigation;

use super::store::{AuthOperation, AuthStore};
use super::AuthError;

pub struct AuthActions<T> {
    client: Arc<SessionClient<T>>,
    store: AuthStore,
}

impl<T> Clone for AuthActions<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            store: self.store.clone(),
        }
    }
}

impl<T: Transport> AuthActions<T> {
    pub fn new(client: Arc<SessionClient<T>>, store: AuthStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &AuthStore {
        &self.store
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        self.store.begin(AuthOperation::Login);
        let result = self.client.login(credentials).await;
        match self.authenticate(AuthOperation::Login, result) {
            Ok(user) => {
                info!(username = %user.username, "Login successful");
                Ok(user)
            }
            Err(e) => {
                debug!(error = %e, "Login failed");
                Err(e)
            }
        }
    }

    /// Create an account. Success never signs the user in; the returned
    /// navigation sends them to the login page.
    pub async fn register(&self, registration: &Registration) -> Result<Navigation, AuthError> {
        self.store.begin(AuthOperation::Register);
        match self.client.register(registration).await {
            Ok(_) => {
                self.store.finish_register();
                info!(username = %registration.username, "Registration successful");
                Ok(Navigation::login())
            }
            Err(e) => {
                debug!(error = %e, "Registration failed");
                self.store.fail(AuthOperation::Register, e.user_message());
                Err(e.into())
            }
        }
    }

    /// Probe for an existing session (after a restart or an OAuth return).
    pub async fn fetch_current_user(&self) -> Result<User, AuthError> {
        self.store.begin(AuthOperation::Probe);
        let result = self.client.fetch_current_user().await;
        self.authenticate(AuthOperation::Probe, result)
    }

    /// Clear local state immediately, then tell the backend. The server call
    /// is best effort; its failure is logged and otherwise ignored.
    pub async fn logout(&self) {
        self.store.logout();
        info!("Logged out");
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "Server logout failed, local session already cleared");
        }
    }

    /// Authorized call for catalog consumers. An unrecoverable 401 resets
    /// the store the same way a logout would.
    pub async fn request<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, AuthError> {
        match self.client.send_json(request).await {
            Ok(body) => Ok(body),
            Err(e) => {
                if e.is_unauthorized() {
                    warn!(error = %e, "Session no longer valid");
                    self.store.session_expired(e.user_message());
                }
                Err(e.into())
            }
        }
    }

    fn authenticate(
        &self,
        op: AuthOperation,
        result: Result<UserEnvelope, ApiError>,
    ) -> Result<User, AuthError> {
        match result {
            Ok(UserEnvelope { user: Some(user) }) => {
                self.store.succeed(user.clone());
                Ok(user)
            }
            Ok(UserEnvelope { user: None }) => {
                self.store.fail(op, AuthError::MissingUser.to_string());
                Err(AuthError::MissingUser)
            }
            Err(e) => {
                self.store.fail(op, e.user_message());
                Err(e.into())
            }
        }
    }
}
