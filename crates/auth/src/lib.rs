//! `instihub-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: the identity
//! backend and the tenant-scoped directory are traits, and everything here
//! (session store, profile loader, facade, route guard) composes over them.

pub mod claims;
pub mod directory;
pub mod facade;
pub mod guard;
pub mod identity;
pub mod loader;
pub mod roles;
pub mod session;

pub use claims::{Hs256TokenCodec, JwtClaims, TokenError, TokenValidationError, validate_claims};
pub use directory::{DirectoryError, DirectoryReader};
pub use facade::{AuthFacade, AuthView};
pub use guard::{RouteDecision, evaluate_route};
pub use identity::{
    AuthChange, AuthError, AuthEvent, AuthSession, AuthUser, IdentityAdmin, IdentityProvider,
    SessionSnapshot,
};
pub use loader::{LoadedIdentity, ProfileLoader};
pub use roles::{Role, RoleSet};
pub use session::{SessionState, SessionStore};
