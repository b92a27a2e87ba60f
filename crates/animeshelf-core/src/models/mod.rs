//! Data models for the animeshelf auth backend.
//!
//! - `User`, `UserId`: the signed-in account
//! - `Credentials`, `Registration`: request payloads
//! - `UserEnvelope`: the `{ user }` success body

pub mod user;

pub use user::{Credentials, Registration, User, UserEnvelope, UserId};
