//! Observable session controller.
//!
//! [`SessionController`] drives [`AuthState`] through [`reduce`] in response
//! to login, logout, refresh and validation, and publishes every change on a
//! `tokio::sync::watch` channel. It never decides validity itself; it mirrors
//! what the [`AuthClient`] reports.
//!
//! While authenticated, a background task re-validates the session on a fixed
//! interval. The task holds only a weak reference, so dropping the last
//! controller handle stops it.

pub mod state;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub use state::{AuthState, SessionEvent, SessionPhase, reduce};

use crate::auth::client::AuthClient;
use crate::auth::{AuthError, user_message};
use crate::models::auth::{Credentials, User};

/// Cheap-to-clone handle over the shared session state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    client: Arc<AuthClient>,
    state: watch::Sender<AuthState>,
    /// Bumped by every login, logout and expiry. Completions started under an
    /// older epoch are discarded.
    epoch: AtomicU64,
    revalidate_interval: Duration,
    validator: Mutex<Option<JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let slot = self.validator.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl SessionController {
    /// Create a controller in the `Initializing` phase. The validation
    /// interval comes from the client's configuration.
    pub fn new(client: Arc<AuthClient>) -> Self {
        let revalidate_interval = client.config().revalidate_interval;
        let (state, _) = watch::channel(AuthState::default());
        Self {
            inner: Arc::new(Inner {
                client,
                state,
                epoch: AtomicU64::new(0),
                revalidate_interval,
                validator: Mutex::new(None),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn client(&self) -> &AuthClient {
        &self.inner.client
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Restore the session from storage. Leaves `Initializing` either way.
    ///
    /// Must be called from within a tokio runtime; a restored session starts
    /// the periodic validator on it.
    pub fn start(&self) -> AuthState {
        let client = &self.inner.client;
        let event = match (client.current_user(), client.current_token()) {
            (Some(user), Some(token)) => {
                info!(user_id = %user.id, "session restored");
                SessionEvent::Restored { user, token }
            }
            _ => {
                debug!("no stored session");
                SessionEvent::NoSession
            }
        };
        self.apply(event)
    }

    /// Sign in. An existing session is logged out first and a login still in
    /// flight is cancelled.
    ///
    /// On failure the state carries a user-facing message and the original
    /// error is returned.
    pub async fn login(&self, credentials: Credentials) -> Result<User, AuthError> {
        if self.state().is_authenticated() {
            self.logout();
        }
        // Only the latest attempt may persist a session.
        self.inner.client.cancel_in_flight();
        let epoch = self.bump_epoch();
        self.apply(SessionEvent::LoginStarted);

        let result = self.inner.client.login_session(&credentials).await;

        if !self.is_current(epoch) {
            warn!("discarding superseded login");
            if let Ok(record) = &result {
                self.inner.client.discard_session(&record.token);
            }
            return Err(AuthError::Cancelled);
        }

        match result {
            Ok(record) => {
                self.apply(SessionEvent::LoginSucceeded {
                    user: record.user.clone(),
                    token: record.token,
                });
                Ok(record.user)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                self.apply(SessionEvent::LoginFailed {
                    message: user_message(&e),
                });
                Err(e)
            }
        }
    }

    /// Sign out. Aborts in-flight requests and stops the validator.
    pub fn logout(&self) {
        self.bump_epoch();
        self.inner.client.logout();
        self.apply(SessionEvent::LoggedOut);
    }

    /// Re-fetch the profile. A 401 ends the session silently.
    pub async fn refresh_profile(&self) -> Result<User, AuthError> {
        if !self.state().is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        let epoch = self.current_epoch();
        self.apply(SessionEvent::RefreshStarted);

        let result = self.inner.client.refresh_profile().await;

        if !self.is_current(epoch) {
            warn!("discarding superseded profile refresh");
            return Err(AuthError::Cancelled);
        }

        match result {
            Ok(user) => {
                self.apply(SessionEvent::RefreshSucceeded { user: user.clone() });
                Ok(user)
            }
            Err(e) if e.is_unauthorized() => {
                info!("token rejected during profile refresh");
                self.expire();
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "profile refresh failed");
                self.apply(SessionEvent::RefreshFailed {
                    message: user_message(&e),
                });
                Err(e)
            }
        }
    }

    pub fn clear_error(&self) {
        self.apply(SessionEvent::ErrorCleared);
    }

    /// One validity check. Returns whether the session is still valid; an
    /// invalid session is expired.
    pub fn validate(&self) -> bool {
        if !self.state().is_authenticated() {
            return false;
        }
        if self.inner.client.is_authenticated() {
            debug!("session still valid");
            return true;
        }
        info!("session no longer valid");
        self.expire();
        false
    }

    /// Stop the periodic validator for good.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        self.stop_validator();
    }

    fn expire(&self) {
        self.bump_epoch();
        self.inner.client.logout();
        self.apply(SessionEvent::SessionExpired);
    }

    fn apply(&self, event: SessionEvent) -> AuthState {
        let mut changed = false;
        self.inner.state.send_if_modified(|state| {
            let next = reduce(state, event);
            if next == *state {
                return false;
            }
            debug!(from = %state.phase, to = %next.phase, "session transition");
            *state = next;
            changed = true;
            true
        });
        let state = self.state();
        if changed {
            self.sync_validator(&state);
        }
        state
    }

    fn bump_epoch(&self) -> u64 {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.current_epoch() == epoch
    }

    /// Run the validator exactly while authenticated.
    fn sync_validator(&self, state: &AuthState) {
        if !state.is_authenticated() {
            self.stop_validator();
            return;
        }
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return;
        }

        let mut slot = self
            .inner
            .validator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime; periodic session validation disabled");
            return;
        };
        *slot = Some(spawn_validator(
            &runtime,
            Arc::downgrade(&self.inner),
            self.inner.revalidate_interval,
        ));
        debug!(interval = ?self.inner.revalidate_interval, "session validator started");
    }

    fn stop_validator(&self) {
        let handle = self
            .inner
            .validator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            debug!("session validator stopped");
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.inner.state.borrow().phase)
            .field("epoch", &self.current_epoch())
            .finish_non_exhaustive()
    }
}

fn spawn_validator(
    runtime: &tokio::runtime::Handle,
    inner: Weak<Inner>,
    period: Duration,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(inner) = inner.upgrade() else {
                break;
            };
            if !(SessionController { inner }).validate() {
                break;
            }
        }
    })
}
