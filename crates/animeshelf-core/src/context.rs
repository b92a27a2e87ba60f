//! Wiring of the session layer for a running client.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::api::{HttpTransport, SessionClient};
use crate::auth::{AuthActions, AuthStore};
use crate::config::Config;
use crate::oauth::OAuthBridge;

/// Everything a front end needs: the actions (with their store) and the
/// OAuth bridge, all pointing at the same API origin.
#[derive(Clone)]
pub struct AuthContext {
    pub actions: AuthActions<HttpTransport>,
    pub oauth: OAuthBridge,
}

impl AuthContext {
    pub fn from_config(config: &Config) -> Result<Self> {
        let base = config.api_base()?;
        let transport = HttpTransport::new(base.clone(), config.request_timeout())
            .context("Failed to build HTTP client")?;
        let client = Arc::new(SessionClient::new(transport, config.refresh_mode));
        debug!(api = %base, refresh_mode = ?config.refresh_mode, "Session layer configured");

        Ok(Self {
            actions: AuthActions::new(client, AuthStore::new()),
            oauth: OAuthBridge::new(base),
        })
    }

    pub fn store(&self) -> &AuthStore {
        self.actions.store()
    }
}
