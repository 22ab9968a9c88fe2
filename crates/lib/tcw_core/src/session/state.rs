//! Session state and its transition function.

use crate::models::auth::User;

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Restoring from storage at startup.
    #[default]
    Initializing,
    Unauthenticated,
    LoggingIn,
    Authenticated,
    /// Authenticated, with a profile refresh in flight.
    Refreshing,
}

impl SessionPhase {
    pub fn is_loading(self) -> bool {
        matches!(
            self,
            SessionPhase::Initializing | SessionPhase::LoggingIn | SessionPhase::Refreshing
        )
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, SessionPhase::Authenticated | SessionPhase::Refreshing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Initializing => "initializing",
            SessionPhase::Unauthenticated => "unauthenticated",
            SessionPhase::LoggingIn => "logging_in",
            SessionPhase::Authenticated => "authenticated",
            SessionPhase::Refreshing => "refreshing",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot observed by the UI. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub phase: SessionPhase,
    pub user: Option<User>,
    pub token: Option<String>,
    /// User-facing message from the last failed operation.
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.phase.is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }
}

/// Inputs to [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Restored { user: User, token: String },
    NoSession,
    LoginStarted,
    LoginSucceeded { user: User, token: String },
    LoginFailed { message: String },
    LoggedOut,
    RefreshStarted,
    RefreshSucceeded { user: User },
    RefreshFailed { message: String },
    /// Validation found the stored session gone or expired. Silent.
    SessionExpired,
    ErrorCleared,
}

/// Apply `event` to `state`. Events that do not apply to the current phase
/// return the state unchanged.
pub fn reduce(state: &AuthState, event: SessionEvent) -> AuthState {
    use SessionEvent as E;
    use SessionPhase as P;

    match (state.phase, event) {
        (P::Initializing, E::Restored { user, token }) => AuthState {
            phase: P::Authenticated,
            user: Some(user),
            token: Some(token),
            error: None,
        },
        (P::Initializing, E::NoSession) => AuthState {
            phase: P::Unauthenticated,
            ..AuthState::default()
        },
        (P::Initializing | P::Unauthenticated | P::LoggingIn, E::LoginStarted) => AuthState {
            phase: P::LoggingIn,
            ..AuthState::default()
        },
        (P::LoggingIn, E::LoginSucceeded { user, token }) => AuthState {
            phase: P::Authenticated,
            user: Some(user),
            token: Some(token),
            error: None,
        },
        (P::LoggingIn, E::LoginFailed { message }) => AuthState {
            phase: P::Unauthenticated,
            error: Some(message),
            ..AuthState::default()
        },
        (_, E::LoggedOut) => AuthState {
            phase: P::Unauthenticated,
            ..AuthState::default()
        },
        (P::Authenticated, E::RefreshStarted) => AuthState {
            phase: P::Refreshing,
            error: None,
            ..state.clone()
        },
        (P::Refreshing, E::RefreshSucceeded { user }) => AuthState {
            phase: P::Authenticated,
            user: Some(user),
            error: None,
            ..state.clone()
        },
        (P::Refreshing, E::RefreshFailed { message }) => AuthState {
            phase: P::Authenticated,
            error: Some(message),
            ..state.clone()
        },
        (P::Authenticated | P::Refreshing, E::SessionExpired) => AuthState {
            phase: P::Unauthenticated,
            ..AuthState::default()
        },
        (_, E::ErrorCleared) => AuthState {
            error: None,
            ..state.clone()
        },
        _ => state.clone(),
    }
}
