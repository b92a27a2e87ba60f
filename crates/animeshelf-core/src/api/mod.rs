//! REST client module for the animeshelf auth backend.
//!
//! This module provides the `SessionClient` for register, login, logout,
//! refresh and current-user calls, plus generic requests for other
//! endpoints.
//!
//! The session itself lives in cookies set by the backend; the client only
//! observes whether calls made with them succeed.

pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod mock;
pub mod transport;

pub use client::{RefreshMode, SessionClient};
pub use error::{ApiError, ErrorBody, TOKEN_EXPIRED};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
