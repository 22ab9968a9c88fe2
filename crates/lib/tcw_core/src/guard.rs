//! Route gating over the session state.

use serde::{Deserialize, Serialize};

use crate::session::AuthState;

/// Where the guards send users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRoutes {
    /// Sign-in page for unauthenticated visitors.
    pub login: String,
    /// Landing page for users who are already signed in.
    pub landing: String,
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self {
            login: "/login".into(),
            landing: "/dashboard".into(),
        }
    }
}

/// What the router should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session state not settled yet; show a loading indicator.
    Loading,
    Render,
    /// Navigate to `to`, remembering the page that was requested.
    Redirect { to: String, from: Option<String> },
}

/// Gate for pages that need a signed-in user.
pub fn requires_session(
    state: &AuthState,
    requested_path: &str,
    routes: &GuardRoutes,
) -> GuardDecision {
    if state.is_loading() {
        GuardDecision::Loading
    } else if state.is_authenticated() {
        GuardDecision::Render
    } else {
        GuardDecision::Redirect {
            to: routes.login.clone(),
            from: Some(requested_path.to_string()),
        }
    }
}

/// Gate for pages only anonymous visitors should see (the login page).
pub fn requires_no_session(state: &AuthState, routes: &GuardRoutes) -> GuardDecision {
    if state.is_loading() {
        GuardDecision::Loading
    } else if state.is_authenticated() {
        GuardDecision::Redirect {
            to: routes.landing.clone(),
            from: None,
        }
    } else {
        GuardDecision::Render
    }
}
