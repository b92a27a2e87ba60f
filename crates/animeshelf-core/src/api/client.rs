//! Session client for the animeshelf auth backend.
//!
//! This module provides the `SessionClient` which wraps every outbound call,
//! classifies failures into `ApiError`, and applies the refresh-on-expiry
//! rule: a request answered with `401 TOKEN_EXPIRED` gets one refresh and,
//! if that works, one re-issue.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::{Credentials, Registration, UserEnvelope};

use super::error::TOKEN_EXPIRED;
use super::transport::{ApiRequest, ApiResponse, Transport};
use super::ApiError;

// ============================================================================
// Endpoints
// ============================================================================

pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const REFRESH_PATH: &str = "/auth/refresh-token";
pub const CURRENT_USER_PATH: &str = "/auth/me";

/// How concurrent expired requests share refresh calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// Every expired request refreshes on its own.
    PerRequest,
    /// Requests that expired under the same session share one refresh.
    #[default]
    Coalesced,
}

/// Bookkeeping for coalesced refreshes.
#[derive(Debug)]
struct RefreshGate {
    /// Bumped every time a refresh finishes, successful or not.
    generation: u64,
    last_outcome: Result<(), ApiError>,
}

pub struct SessionClient<T> {
    transport: T,
    refresh_mode: RefreshMode,
    gate: Mutex<RefreshGate>,
}

impl<T: Transport> SessionClient<T> {
    pub fn new(transport: T, refresh_mode: RefreshMode) -> Self {
        Self {
            transport,
            refresh_mode,
            gate: Mutex::new(RefreshGate {
                generation: 0,
                last_outcome: Ok(()),
            }),
        }
    }

    // ===== Auth Endpoints =====

    pub async fn register(&self, registration: &Registration) -> Result<UserEnvelope, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH)
            .with_json(registration)?
            .without_retry();
        self.send_json(request).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<UserEnvelope, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .with_json(credentials)?
            .without_retry();
        self.send_json(request).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.execute(ApiRequest::post(LOGOUT_PATH)).await?;
        Ok(())
    }

    /// Ask the backend for fresh session cookies. Never retried.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let request = ApiRequest::post(REFRESH_PATH).without_retry();
        self.transport.send(&request).await?.error_for_status()?;
        info!("Session refreshed");
        Ok(())
    }

    pub async fn fetch_current_user(&self) -> Result<UserEnvelope, ApiError> {
        self.send_json(ApiRequest::post(CURRENT_USER_PATH)).await
    }

    // ===== Generic Requests =====

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.send_json(ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        self.execute(request).await?.json()
    }

    /// Send a request, recovering once from an expired access token.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let observed = self.current_generation().await;

        let response = self.transport.send(&request).await?;
        if response.is_success() {
            return Ok(response);
        }

        let err = ApiError::from_status(response.status, &response.body);
        if !err.is_token_expired() || !request.retry_on_expiry || request.is_retry() {
            return Err(err);
        }

        debug!(path = %request.path, "Access token expired, refreshing");
        match self.recover(observed).await {
            Ok(()) => {
                let retry = request.retried();
                self.transport.send(&retry).await?.error_for_status()
            }
            Err(refresh_err) => {
                warn!(path = %request.path, error = %refresh_err, "Session refresh failed");
                Err(ApiError::Unauthorized {
                    code: Some(TOKEN_EXPIRED.to_string()),
                    message: "Your session has expired. Please log in again.".to_string(),
                })
            }
        }
    }

    async fn current_generation(&self) -> u64 {
        match self.refresh_mode {
            RefreshMode::PerRequest => 0,
            RefreshMode::Coalesced => self.gate.lock().await.generation,
        }
    }

    /// Run (or join) the refresh for a request sent under `observed`.
    async fn recover(&self, observed: u64) -> Result<(), ApiError> {
        match self.refresh_mode {
            RefreshMode::PerRequest => self.refresh().await,
            RefreshMode::Coalesced => {
                let mut gate = self.gate.lock().await;
                if gate.generation != observed {
                    debug!(generation = gate.generation, "Reusing concurrent refresh outcome");
                    return gate.last_outcome.clone();
                }
                let outcome = self.refresh().await;
                gate.generation += 1;
                gate.last_outcome = outcome.clone();
                outcome
            }
        }
    }
}
