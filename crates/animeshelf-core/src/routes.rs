//! Route paths the auth layer navigates between.

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/login";
pub const OAUTH_SUCCESS_ROUTE: &str = "/auth/success";

/// Views that require an authenticated session.
const PROTECTED_PREFIXES: &[&str] = &["/profile", "/dashboard", "/create", "/edit/"];

/// Where the consumer should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl Navigation {
    pub fn push(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            replace: false,
        }
    }

    pub fn replace(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            replace: true,
        }
    }

    pub fn home() -> Self {
        Self::push(HOME_ROUTE)
    }

    pub fn login() -> Self {
        Self::push(LOGIN_ROUTE)
    }

    /// Redirect away from a protected view. Replaces history so going back
    /// does not land on the guard again.
    pub fn login_redirect() -> Self {
        Self::replace(LOGIN_ROUTE)
    }
}

pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        if prefix.ends_with('/') {
            path.starts_with(prefix) && path.len() > prefix.len()
        } else {
            path == *prefix || path.starts_with(&format!("{}/", prefix))
        }
    })
}
