//! `instihub-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the tenant-scoped domain records, and the
//! domain error model.

pub mod error;
pub mod id;
pub mod model;

pub use error::{DomainError, DomainResult};
pub use id::{BatchId, CourseId, InstituteId, PrincipalId};
pub use model::{Institute, Profile, StudentDetail, StudentStatus, TeacherDetail};
