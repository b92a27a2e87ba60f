//! Authentication module for the client-side session.
//!
//! This module provides:
//! - `AuthStore`: the shared `AuthState` and its transitions
//! - `AuthActions`: login, register, logout and the current-user probe
//! - `AuthForm`: headless login/register forms with client-side validation
//!
//! Auth state is never persisted; a new process starts unauthenticated and
//! probes the backend for a surviving session cookie.

pub mod actions;
pub mod forms;
pub mod store;

use thiserror::Error;

use crate::api::ApiError;

pub use actions::AuthActions;
pub use forms::{AuthForm, Field, FormMode, FormOutcome, ValidationError};
pub use store::{AuthOperation, AuthState, AuthStatus, AuthStore};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("The server did not return an account")]
    MissingUser,
}
