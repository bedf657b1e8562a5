//! Read access to the tenant-scoped directory.
//!
//! Lookups are typed (identifier values are never interpolated into a query
//! string) and zero-or-one where the schema allows at most one row.

use async_trait::async_trait;
use thiserror::Error;

use instihub_core::{PrincipalId, Profile, StudentDetail, TeacherDetail};

use crate::roles::RoleSet;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("directory backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait DirectoryReader: Send + Sync {
    /// Profile by principal id (zero-or-one).
    async fn profile(&self, id: PrincipalId) -> Result<Option<Profile>, DirectoryError>;

    /// All role assignments for a principal.
    async fn roles(&self, id: PrincipalId) -> Result<RoleSet, DirectoryError>;

    /// Student detail by profile id (zero-or-one).
    async fn student_by_profile(
        &self,
        id: PrincipalId,
    ) -> Result<Option<StudentDetail>, DirectoryError>;

    async fn teacher_by_employee_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<TeacherDetail>, DirectoryError>;

    async fn student_by_registration_number(
        &self,
        registration_number: &str,
    ) -> Result<Option<StudentDetail>, DirectoryError>;

    async fn student_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<StudentDetail>, DirectoryError>;
}
