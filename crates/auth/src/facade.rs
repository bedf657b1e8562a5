//! Auth facade: the one object the rest of the application talks to.
//!
//! Owned by the composition root and passed down explicitly; there is no
//! hidden singleton. Composes the session store and the profile loader and
//! exposes sign-in/sign-up/sign-out plus a consistent view of the current
//! principal.

use std::sync::{Arc, RwLock};

use instihub_core::{Profile, StudentDetail};

use crate::directory::DirectoryReader;
use crate::identity::{AuthError, AuthSession, AuthUser, IdentityProvider};
use crate::loader::{LoadedIdentity, ProfileLoader};
use crate::roles::RoleSet;
use crate::session::{ChangeHook, SessionStore};

/// Read-only view of the current auth state.
///
/// The role predicates are recomputed from the role set on every call;
/// nothing here is cached across state changes.
#[derive(Debug, Clone, Default)]
pub struct AuthView {
    pub loading: bool,
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
    pub profile: Option<Profile>,
    pub roles: RoleSet,
    pub student: Option<StudentDetail>,
}

impl AuthView {
    pub fn is_institute_admin(&self) -> bool {
        self.roles.is_institute_admin()
    }

    pub fn is_teacher(&self) -> bool {
        self.roles.is_teacher()
    }

    pub fn is_student(&self) -> bool {
        self.roles.is_student()
    }

    pub fn is_parent(&self) -> bool {
        self.roles.is_parent()
    }
}

pub struct AuthFacade {
    identity: Arc<dyn IdentityProvider>,
    store: SessionStore,
    loaded: Arc<RwLock<LoadedIdentity>>,
}

impl AuthFacade {
    /// Wire the facade to an identity provider and a directory.
    ///
    /// Must be called from within a tokio runtime: session changes trigger a
    /// deferred directory load on a spawned task. The load is never run
    /// inside the identity backend's notification path, which would re-enter
    /// its internal locking.
    pub fn start(
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn DirectoryReader>,
    ) -> Self {
        let loaded = Arc::new(RwLock::new(LoadedIdentity::default()));
        let loader = ProfileLoader::new(directory);

        let hook: ChangeHook = {
            let loaded = loaded.clone();
            Arc::new(move |user: Option<AuthUser>| match user {
                Some(user) => {
                    let loaded = loaded.clone();
                    let loader = loader.clone();
                    tokio::spawn(async move {
                        let identity_data = loader.load(user.id).await;
                        if let Ok(mut slot) = loaded.write() {
                            // Last resolved load wins; state is idempotently
                            // re-derivable from the backend of record.
                            *slot = identity_data;
                        }
                    });
                }
                None => {
                    if let Ok(mut slot) = loaded.write() {
                        *slot = LoadedIdentity::default();
                    }
                }
            })
        };

        let store = SessionStore::start(identity.clone(), hook);

        Self {
            identity,
            store,
            loaded,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.identity.sign_in(email, password).await.map(|_| ())
    }

    /// Create a principal. Tenant setup and role assignment are separate
    /// privileged steps.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(), AuthError> {
        self.identity
            .sign_up(email, password, full_name)
            .await
            .map(|_| ())
    }

    /// Sign out. Local state is cleared unconditionally: a remote failure is
    /// logged but never leaves a half-signed-out session behind.
    pub async fn sign_out(&self) {
        if let Err(e) = self.identity.sign_out().await {
            tracing::warn!(error = %e, "remote sign-out failed; clearing local state anyway");
        }
        self.store.clear();
        if let Ok(mut slot) = self.loaded.write() {
            *slot = LoadedIdentity::default();
        }
    }

    pub fn view(&self) -> AuthView {
        let session_state = self.store.snapshot();
        let loaded = match self.loaded.read() {
            Ok(l) => l.clone(),
            Err(_) => LoadedIdentity::default(),
        };

        AuthView {
            loading: session_state.loading,
            user: session_state.session.as_ref().map(|s| s.user.clone()),
            session: session_state.session,
            profile: loaded.profile,
            roles: loaded.roles,
            student: loaded.student,
        }
    }
}
