//! In-memory stand-in for the auth backend, used by unit tests.
//!
//! Models the server side of the session cookies: no session, a valid one,
//! or one whose access token expired. Every call is recorded, and every
//! response is decided before the call yields once to the scheduler, so
//! joined futures interleave the way concurrent browser requests do.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use super::client::{CURRENT_USER_PATH, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, REGISTER_PATH};
use super::transport::{ApiRequest, ApiResponse, Transport};
use super::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSession {
    None,
    Valid,
    Expired,
}

#[derive(Debug)]
struct MockState {
    calls: Vec<ApiRequest>,
    session: ServerSession,
    user: serde_json::Value,
    refresh_allowed: bool,
    refresh_restores_session: bool,
    login_expired: bool,
    register_conflict: bool,
    logout_fails: bool,
    omit_user: bool,
    offline: bool,
}

#[derive(Debug)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub const PASSWORD: &'static str = "correct-horse";

    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                calls: Vec::new(),
                session: ServerSession::None,
                user: json!({ "id": 1, "username": "ann" }),
                refresh_allowed: true,
                refresh_restores_session: true,
                login_expired: false,
                register_conflict: false,
                logout_fails: false,
                omit_user: false,
                offline: false,
            }),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().expect("mock state poisoned");
        f(&mut state)
    }

    pub fn set_session(&self, session: ServerSession) {
        self.with_state(|s| s.session = session);
    }

    pub fn session(&self) -> ServerSession {
        self.with_state(|s| s.session)
    }

    pub fn set_refresh_allowed(&self, allowed: bool) {
        self.with_state(|s| s.refresh_allowed = allowed);
    }

    pub fn set_refresh_restores_session(&self, restores: bool) {
        self.with_state(|s| s.refresh_restores_session = restores);
    }

    pub fn set_login_expired(&self, expired: bool) {
        self.with_state(|s| s.login_expired = expired);
    }

    pub fn set_register_conflict(&self, conflict: bool) {
        self.with_state(|s| s.register_conflict = conflict);
    }

    pub fn set_logout_fails(&self, fails: bool) {
        self.with_state(|s| s.logout_fails = fails);
    }

    /// Answer login and current-user calls with `{}` instead of `{ user }`.
    pub fn set_omit_user(&self, omit: bool) {
        self.with_state(|s| s.omit_user = omit);
    }

    pub fn set_offline(&self, offline: bool) {
        self.with_state(|s| s.offline = offline);
    }

    pub fn total_calls(&self) -> usize {
        self.with_state(|s| s.calls.len())
    }

    pub fn count(&self, path: &str) -> usize {
        self.with_state(|s| s.calls.iter().filter(|r| r.path == path).count())
    }

    pub fn calls_to(&self, path: &str) -> Vec<ApiRequest> {
        self.with_state(|s| s.calls.iter().filter(|r| r.path == path).cloned().collect())
    }

    fn user_body(state: &MockState) -> ApiResponse {
        if state.omit_user {
            ApiResponse::new(200, "{}")
        } else {
            ApiResponse::new(200, json!({ "user": state.user }).to_string())
        }
    }

    fn respond(state: &mut MockState, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        if state.offline {
            return Err(ApiError::NetworkError("connection refused".to_string()));
        }

        let expired = || {
            ApiResponse::new(
                401,
                json!({ "code": "TOKEN_EXPIRED", "message": "Access token expired" }).to_string(),
            )
        };
        let no_session = || {
            ApiResponse::new(
                401,
                json!({ "code": "NO_TOKEN", "message": "Not authenticated" }).to_string(),
            )
        };

        let response = match request.path.as_str() {
            LOGIN_PATH => {
                let password = request
                    .body
                    .as_ref()
                    .and_then(|b| b["password"].as_str())
                    .unwrap_or_default();
                if state.login_expired {
                    expired()
                } else if password == Self::PASSWORD {
                    state.session = ServerSession::Valid;
                    Self::user_body(state)
                } else {
                    ApiResponse::new(
                        401,
                        json!({ "code": "INVALID_CREDENTIALS", "message": "Invalid username or password" })
                            .to_string(),
                    )
                }
            }
            REGISTER_PATH => {
                if state.register_conflict {
                    ApiResponse::new(409, json!({ "message": "Username already taken" }).to_string())
                } else {
                    ApiResponse::new(201, json!({ "user": state.user }).to_string())
                }
            }
            LOGOUT_PATH => {
                state.session = ServerSession::None;
                if state.logout_fails {
                    ApiResponse::new(500, "internal error")
                } else {
                    ApiResponse::new(200, "{}")
                }
            }
            REFRESH_PATH => {
                if state.refresh_allowed && state.session != ServerSession::None {
                    if state.refresh_restores_session {
                        state.session = ServerSession::Valid;
                    }
                    ApiResponse::new(200, "{}")
                } else {
                    ApiResponse::new(
                        401,
                        json!({ "code": "INVALID_REFRESH_TOKEN", "message": "Refresh token invalid" })
                            .to_string(),
                    )
                }
            }
            path => match state.session {
                ServerSession::None => no_session(),
                ServerSession::Expired => expired(),
                ServerSession::Valid if path == CURRENT_USER_PATH => Self::user_body(state),
                ServerSession::Valid => ApiResponse::new(200, json!({ "items": [] }).to_string()),
            },
        };
        Ok(response)
    }
}

#[async_trait]
impl Transport for MockBackend {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let result = self.with_state(|state| {
            state.calls.push(request.clone());
            Self::respond(state, request)
        });
        tokio::task::yield_now().await;
        result
    }
}
