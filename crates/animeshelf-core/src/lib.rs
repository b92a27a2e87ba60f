//! Core library for animeshelf - the client-side session layer.
//!
//! - `api`: session client with refresh-on-expiry over a cookie-carrying transport
//! - `auth`: auth state store, actions and headless forms
//! - `guard`: route guard for protected views
//! - `oauth`: provider hand-off and callback probe
//! - `config`, `context`: configuration and wiring

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod guard;
pub mod models;
pub mod oauth;
pub mod routes;

pub use context::AuthContext;
