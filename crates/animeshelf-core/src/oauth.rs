//! OAuth hand-off to external identity providers.
//!
//! The provider dance happens entirely between the browser and the backend:
//! the client navigates to `{api}/auth/{provider}`, the backend completes the
//! flow, sets the session cookies and sends the browser back to
//! `/auth/success`. The only client-side work on return is the usual
//! current-user probe.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};
use url::Url;

use crate::api::Transport;
use crate::auth::AuthActions;
use crate::routes::{Navigation, HOME_ROUTE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn slug(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            "github" => Ok(OAuthProvider::Github),
            other => Err(format!("Unknown OAuth provider: {}", other)),
        }
    }
}

/// Something that can leave the app for an external URL (a browser tab,
/// a system opener, a terminal prompt).
pub trait Navigator {
    fn navigate_external(&self, url: &Url);
}

#[derive(Debug, Clone)]
pub struct OAuthBridge {
    api_base: Url,
}

impl OAuthBridge {
    pub fn new(api_base: Url) -> Self {
        Self { api_base }
    }

    pub fn authorization_url(&self, provider: OAuthProvider) -> Result<Url, url::ParseError> {
        let base = self.api_base.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/auth/{}", base, provider.slug()))
    }

    /// Hand the user to the provider. Fire and forget: nothing comes back
    /// through this call; the flow resumes at the callback route.
    pub fn begin<N: Navigator + ?Sized>(
        &self,
        provider: OAuthProvider,
        navigator: &N,
    ) -> Result<(), url::ParseError> {
        let url = self.authorization_url(provider)?;
        info!(%provider, %url, "Starting OAuth hand-off");
        navigator.navigate_external(&url);
        Ok(())
    }

    /// Handle the return to the success route: probe for the session the
    /// backend just created and say where to go next.
    pub async fn handle_callback<T: Transport>(&self, actions: &AuthActions<T>) -> Navigation {
        match actions.fetch_current_user().await {
            Ok(user) => {
                info!(username = %user.username, "OAuth login completed");
                Navigation::replace(HOME_ROUTE)
            }
            Err(e) => {
                debug!(error = %e, "No session after OAuth return");
                Navigation::login_redirect()
            }
        }
    }
}
