//! Route guard for protected views.
//!
//! A `RouteGuard` lives as long as one mount of a protected view. It renders
//! when the session is authenticated, shows a loading state while any auth
//! operation is in flight, probes the backend at most once per mount, and
//! otherwise redirects to the login page with history replaced.

use tracing::{debug, error};

use crate::api::Transport;
use crate::auth::{AuthActions, AuthState};
use crate::routes::Navigation;

/// What the view should do for the state it was evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Loading,
    /// Start the current-user probe. Returned once per guard.
    Probe,
    Redirect(Navigation),
}

/// Settled outcome of `RouteGuard::resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    Protected,
    Redirect(Navigation),
}

#[derive(Debug, Default)]
pub struct RouteGuard {
    /// Set before the probe starts and never cleared for this mount.
    checked: bool,
    probing: bool,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_checked(&self) -> bool {
        self.checked
    }

    pub fn evaluate(&mut self, state: &AuthState) -> GuardDecision {
        if state.is_authenticated() {
            return GuardDecision::Render;
        }
        if state.loading || self.probing {
            return GuardDecision::Loading;
        }
        if !self.checked {
            self.checked = true;
            self.probing = true;
            return GuardDecision::Probe;
        }
        GuardDecision::Redirect(Navigation::login_redirect())
    }

    /// Mark this mount's probe as settled.
    pub fn probe_finished(&mut self) {
        self.probing = false;
    }

    /// Evaluate, probing if needed, until the view can render or must
    /// redirect.
    ///
    /// The probe runs as its own task: dropping this future (the view
    /// unmounting) does not cancel it, and its result still lands in the
    /// store.
    pub async fn resolve<T>(&mut self, actions: &AuthActions<T>) -> GuardView
    where
        T: Transport + 'static,
    {
        let mut rx = actions.store().subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            match self.evaluate(&state) {
                GuardDecision::Render => return GuardView::Protected,
                GuardDecision::Redirect(navigation) => return GuardView::Redirect(navigation),
                GuardDecision::Probe => {
                    debug!("No session in memory, probing backend");
                    let probe_actions = actions.clone();
                    let probe =
                        tokio::spawn(async move { probe_actions.fetch_current_user().await });
                    let joined = probe.await;
                    self.probe_finished();
                    match joined {
                        Ok(Ok(user)) => debug!(username = %user.username, "Probe found a session"),
                        Ok(Err(e)) => debug!(error = %e, "Probe found no session"),
                        Err(e) => {
                            error!(error = %e, "Session probe task failed");
                            return GuardView::Redirect(Navigation::login_redirect());
                        }
                    }
                }
                GuardDecision::Loading => {
                    if rx.changed().await.is_err() {
                        return GuardView::Redirect(Navigation::login_redirect());
                    }
                }
            }
        }
    }
}
