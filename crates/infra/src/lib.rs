//! `instihub-infra` — concrete backends and the privileged operation layer.
//!
//! Contains the in-memory identity provider and tenant-scoped directory
//! (dev/test stand-ins for the hosted backend), the credential resolver for
//! ID-based login, and the provisioning service implementing the
//! tenant-scoped admin operations.

pub mod directory;
pub mod identity;
pub mod provision;
pub mod resolver;

pub use directory::{DirectoryAdmin, InMemoryDirectory};
pub use identity::InMemoryIdentity;
pub use provision::{
    CreateStudentAccount, CreateTeacherAccount, CreatedAccount, LoginWithId, ProvisionError,
    ProvisionService, SetupInstitute,
};
pub use resolver::{CredentialResolver, IdentifierKind, ResolveError};
