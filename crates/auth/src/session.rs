//! Session store: the single holder of "who is signed in right now".
//!
//! Two inputs race at startup: the change-notification stream and the
//! one-time snapshot fetch. The subscription is established before the fetch
//! is issued so no event can be missed, and every update carries the
//! backend's monotonic sequence number; an update is applied only if it is
//! newer than what the store already holds. The incidental completion order
//! of the two paths therefore does not matter.

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::identity::{AuthEvent, AuthSession, AuthUser, IdentityProvider};

/// Hook invoked after each applied session change, with the signed-in
/// principal (or `None` on sign-out).
///
/// Implementations must not call back into the identity backend on the same
/// tick; spawn an independent task instead (see [`crate::facade`]).
pub type ChangeHook = Arc<dyn Fn(Option<AuthUser>) + Send + Sync>;

/// Snapshot of the store's state.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session: Option<AuthSession>,
    pub loading: bool,
    last_seq: Option<u64>,
}

impl SessionState {
    fn initial() -> Self {
        Self {
            session: None,
            loading: true,
            last_seq: None,
        }
    }
}

pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    task: JoinHandle<()>,
}

impl SessionStore {
    /// Start the store against an identity provider.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(identity: Arc<dyn IdentityProvider>, on_change: ChangeHook) -> Self {
        let state = Arc::new(RwLock::new(SessionState::initial()));

        // Order matters: subscribe first, then fetch. An event fired while
        // the fetch is in flight is buffered by the channel and ordered by
        // its sequence number.
        let rx = identity.subscribe();
        let task = tokio::spawn(Self::run(identity, rx, state.clone(), on_change));

        Self { state, task }
    }

    async fn run(
        identity: Arc<dyn IdentityProvider>,
        mut rx: broadcast::Receiver<AuthEvent>,
        state: Arc<RwLock<SessionState>>,
        on_change: ChangeHook,
    ) {
        match identity.current_session().await {
            Ok(snapshot) => {
                Self::apply(&state, snapshot.seq, snapshot.session, &on_change);
            }
            Err(e) => {
                tracing::warn!(error = %e, "initial session fetch failed");
                if let Ok(mut s) = state.write() {
                    s.loading = false;
                }
            }
        }

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let session = event.session().cloned();
                    Self::apply(&state, event.seq, session, &on_change);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "session event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    fn apply(
        state: &Arc<RwLock<SessionState>>,
        seq: u64,
        session: Option<AuthSession>,
        on_change: &ChangeHook,
    ) {
        {
            let mut s = match state.write() {
                Ok(s) => s,
                Err(_) => return,
            };
            if s.last_seq.is_some_and(|last| seq <= last) {
                // Stale: a newer update has already been applied.
                s.loading = false;
                return;
            }
            s.last_seq = Some(seq);
            s.session = session.clone();
            s.loading = false;
        }
        on_change(session.map(|s| s.user));
    }

    pub fn snapshot(&self) -> SessionState {
        match self.state.read() {
            Ok(s) => s.clone(),
            Err(_) => SessionState::initial(),
        }
    }

    /// Clear the held session synchronously (sign-out path). The backend's
    /// own `SignedOut` notification, when it arrives, is a no-op on top.
    pub fn clear(&self) {
        if let Ok(mut s) = self.state.write() {
            s.session = None;
            s.loading = false;
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.task.abort();
    }
}
