//! Identity backend abstraction.
//!
//! The hosted identity service is modeled as two traits: the client-facing
//! [`IdentityProvider`] (sign-in/sign-up/session lifecycle, change
//! notifications) and the privileged [`IdentityAdmin`] used by server-side
//! operations (token introspection, pre-confirmed account creation).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use instihub_core::PrincipalId;

/// An authenticated identity, independent of any business role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: PrincipalId,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

/// An active session: the principal plus its tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// A session-state transition reported by the identity backend.
#[derive(Debug, Clone)]
pub enum AuthChange {
    SignedIn(AuthSession),
    Refreshed(AuthSession),
    SignedOut,
}

/// A sequenced change notification.
///
/// The sequence number is stamped by the backend and is strictly monotonic
/// per backend instance; consumers use it to order change events against the
/// one-time snapshot fetch (last write wins).
#[derive(Debug, Clone)]
pub struct AuthEvent {
    pub seq: u64,
    pub change: AuthChange,
}

impl AuthEvent {
    /// The session carried by this change, if any.
    pub fn session(&self) -> Option<&AuthSession> {
        match &self.change {
            AuthChange::SignedIn(s) | AuthChange::Refreshed(s) => Some(s),
            AuthChange::SignedOut => None,
        }
    }
}

/// Point-in-time view of the current session, stamped with the backend's
/// sequence counter at read time.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub seq: u64,
    pub session: Option<AuthSession>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Wrong password, unknown email, or unconfirmed account. Deliberately
    /// indistinguishable to the caller.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    EmailInUse,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("auth backend error: {0}")]
    Backend(String),
}

/// Client-facing identity operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Create a principal. Does not create a tenant or any role; that is the
    /// separate privileged setup step.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// One-time "what is the current session" fetch.
    async fn current_session(&self) -> Result<SessionSnapshot, AuthError>;

    /// Exchange a refresh token for a fresh access token.
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// Subscribe to session-change notifications.
    ///
    /// Callers that also need the current session must subscribe **before**
    /// calling [`current_session`](IdentityProvider::current_session) so no
    /// event can fall between the two.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Privileged identity operations, only reachable from trusted server-side
/// code paths.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Resolve a bearer access token to its principal.
    async fn authenticate(&self, access_token: &str) -> Result<AuthUser, AuthError>;

    /// Create an account on behalf of someone else, optionally pre-confirmed
    /// (admin-enrolled students and teachers skip email verification).
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        email_confirm: bool,
    ) -> Result<AuthUser, AuthError>;

    /// Password sign-in on behalf of a resolved identifier (ID-based login).
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;
}
