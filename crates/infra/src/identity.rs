//! In-memory identity provider.
//!
//! Dev/test stand-in for the hosted identity service: argon2 password
//! hashes, HS256 access tokens, opaque rotating refresh tokens, and a
//! broadcast channel of sequenced session-change events. Creating an
//! account also inserts the blank profile row, mirroring the hosted
//! backend's on-signup trigger.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use password_hash::{PasswordHash, SaltString};
use tokio::sync::broadcast;
use uuid::Uuid;

use instihub_auth::{
    AuthChange, AuthError, AuthEvent, AuthSession, AuthUser, Hs256TokenCodec, IdentityAdmin,
    IdentityProvider, JwtClaims, SessionSnapshot,
};
use instihub_core::{PrincipalId, Profile};

use crate::directory::{DirectoryAdmin, InMemoryDirectory};

const ACCESS_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone)]
struct Account {
    id: PrincipalId,
    email: String,
    full_name: String,
    password_hash: String,
    email_confirmed: bool,
    created_at: DateTime<Utc>,
    last_sign_in_at: Option<DateTime<Utc>>,
}

impl Account {
    fn to_user(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at,
            last_sign_in_at: self.last_sign_in_at,
        }
    }
}

/// The current session together with the sequence number of the change that
/// installed it. Read and written as one unit: a snapshot must never pair a
/// newer sequence number with an older session, or the store would discard
/// the genuine change event as stale.
#[derive(Debug, Clone, Default)]
struct CurrentSession {
    seq: u64,
    session: Option<AuthSession>,
}

pub struct InMemoryIdentity {
    codec: Hs256TokenCodec,
    directory: Arc<InMemoryDirectory>,
    // Keyed by lowercase email.
    accounts: RwLock<HashMap<String, Account>>,
    refresh_tokens: RwLock<HashMap<String, PrincipalId>>,
    current: RwLock<CurrentSession>,
    seq: AtomicU64,
    tx: broadcast::Sender<AuthEvent>,
}

impl InMemoryIdentity {
    pub fn new(secret: &[u8], directory: Arc<InMemoryDirectory>) -> Self {
        let (tx, _) = broadcast::channel(32);
        Self {
            codec: Hs256TokenCodec::new(secret),
            directory,
            accounts: RwLock::new(HashMap::new()),
            refresh_tokens: RwLock::new(HashMap::new()),
            current: RwLock::new(CurrentSession::default()),
            seq: AtomicU64::new(0),
            tx,
        }
    }

    fn hash_password(password: &str) -> Result<String, AuthError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Backend(e.to_string()))?;
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .to_string();
        Ok(phc)
    }

    fn verify_password(hash: &str, password: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn lock_poisoned() -> AuthError {
        AuthError::Backend("identity lock poisoned".to_string())
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install `session` as current and notify subscribers.
    ///
    /// The sequence number is allocated under the `current` lock so the
    /// stamped pair is atomic with respect to snapshots.
    fn publish(&self, session: Option<AuthSession>, change: AuthChange) -> Result<(), AuthError> {
        let seq = {
            let mut current = self.current.write().map_err(|_| Self::lock_poisoned())?;
            let seq = self.next_seq();
            current.seq = seq;
            current.session = session;
            seq
        };
        // No receivers is fine (server-side use has none).
        let _ = self.tx.send(AuthEvent { seq, change });
        Ok(())
    }

    fn account_by_id(&self, id: PrincipalId) -> Result<Option<Account>, AuthError> {
        let accounts = self.accounts.read().map_err(|_| Self::lock_poisoned())?;
        Ok(accounts.values().find(|a| a.id == id).cloned())
    }

    fn mint_session(&self, account: &Account) -> Result<AuthSession, AuthError> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES);
        let claims = JwtClaims {
            sub: account.id,
            email: account.email.clone(),
            iat: now,
            exp: expires_at,
        };
        let access_token = self
            .codec
            .encode(&claims)
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        let refresh_token = Uuid::new_v4().simple().to_string();
        self.refresh_tokens
            .write()
            .map_err(|_| Self::lock_poisoned())?
            .insert(refresh_token.clone(), account.id);

        Ok(AuthSession {
            user: account.to_user(),
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Create the account and its blank profile row (signup-trigger analog).
    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        email_confirmed: bool,
    ) -> Result<AuthUser, AuthError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Backend("invalid email".to_string()));
        }

        let account = {
            let mut accounts = self.accounts.write().map_err(|_| Self::lock_poisoned())?;
            if accounts.contains_key(&email) {
                return Err(AuthError::EmailInUse);
            }
            let account = Account {
                id: PrincipalId::new(),
                email: email.clone(),
                full_name: full_name.to_string(),
                password_hash: Self::hash_password(password)?,
                email_confirmed,
                created_at: Utc::now(),
                last_sign_in_at: None,
            };
            accounts.insert(email, account.clone());
            account
        };

        self.directory
            .insert_profile(Profile {
                id: account.id,
                email: account.email.clone(),
                full_name: account.full_name.clone(),
                phone: None,
                avatar_url: None,
                institute_id: None,
                is_active: true,
            })
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        tracing::info!(principal_id = %account.id, "account created");
        Ok(account.to_user())
    }

    fn password_sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.trim().to_lowercase();
        let account = {
            let mut accounts = self.accounts.write().map_err(|_| Self::lock_poisoned())?;
            let account = accounts.get_mut(&email).ok_or(AuthError::InvalidCredentials)?;
            if !account.email_confirmed
                || !Self::verify_password(&account.password_hash, password)
            {
                return Err(AuthError::InvalidCredentials);
            }
            account.last_sign_in_at = Some(Utc::now());
            account.clone()
        };

        let session = self.mint_session(&account)?;
        self.publish(
            Some(session.clone()),
            AuthChange::SignedIn(session.clone()),
        )?;
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.password_sign_in(email, password)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthUser, AuthError> {
        // No mailer in the in-memory backend: self-signup is confirmed
        // immediately instead of waiting on a verification link.
        self.register(email, password, full_name, true).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let (seq, previous) = {
            let mut current = self.current.write().map_err(|_| Self::lock_poisoned())?;
            let seq = self.next_seq();
            current.seq = seq;
            (seq, current.session.take())
        };

        if let Some(session) = previous {
            if let Ok(mut tokens) = self.refresh_tokens.write() {
                tokens.remove(&session.refresh_token);
            }
        }
        let _ = self.tx.send(AuthEvent {
            seq,
            change: AuthChange::SignedOut,
        });
        Ok(())
    }

    async fn current_session(&self) -> Result<SessionSnapshot, AuthError> {
        let current = self
            .current
            .read()
            .map_err(|_| Self::lock_poisoned())?
            .clone();
        Ok(SessionSnapshot {
            seq: current.seq,
            session: current.session,
        })
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let principal_id = {
            let mut tokens = self.refresh_tokens.write().map_err(|_| Self::lock_poisoned())?;
            tokens.remove(refresh_token).ok_or(AuthError::InvalidToken)?
        };

        let account = self
            .account_by_id(principal_id)?
            .ok_or(AuthError::InvalidToken)?;

        let session = self.mint_session(&account)?;
        self.publish(
            Some(session.clone()),
            AuthChange::Refreshed(session.clone()),
        )?;
        Ok(session)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl IdentityAdmin for InMemoryIdentity {
    async fn authenticate(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let claims = self
            .codec
            .decode(access_token)
            .map_err(|_| AuthError::InvalidToken)?;

        self.account_by_id(claims.sub)?
            .map(|a| a.to_user())
            .ok_or(AuthError::InvalidToken)
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        email_confirm: bool,
    ) -> Result<AuthUser, AuthError> {
        self.register(email, password, full_name, email_confirm).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        self.password_sign_in(email, password)
    }
}
