//! Credential resolver: map an institute-issued identifier to a sign-in
//! email.
//!
//! Teachers log in with an employee id, students with a registration number
//! (falling back to roll number). The resolver only yields identities that
//! are currently eligible to sign in: active teachers, active students.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use instihub_auth::{DirectoryError, DirectoryReader};
use instihub_core::{PrincipalId, StudentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Teacher,
    Student,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// No eligible identity matches the identifier. Covers unknown ids,
    /// inactive teachers, non-active students, and orphaned detail rows
    /// alike, so callers cannot probe which identifiers exist.
    #[error("no matching identity")]
    NotFound,

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

#[derive(Clone)]
pub struct CredentialResolver {
    directory: Arc<dyn DirectoryReader>,
}

impl CredentialResolver {
    pub fn new(directory: Arc<dyn DirectoryReader>) -> Self {
        Self { directory }
    }

    /// Resolve an identifier to the email the identity backend knows.
    pub async fn resolve(
        &self,
        kind: IdentifierKind,
        identifier: &str,
    ) -> Result<String, ResolveError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ResolveError::NotFound);
        }

        let profile_id = match kind {
            IdentifierKind::Teacher => self.resolve_teacher(identifier).await?,
            IdentifierKind::Student => self.resolve_student(identifier).await?,
        };

        self.email_for(profile_id).await
    }

    async fn resolve_teacher(&self, employee_id: &str) -> Result<PrincipalId, ResolveError> {
        let teacher = self
            .directory
            .teacher_by_employee_id(employee_id)
            .await?
            .ok_or(ResolveError::NotFound)?;
        if !teacher.is_active {
            return Err(ResolveError::NotFound);
        }
        Ok(teacher.profile_id)
    }

    async fn resolve_student(&self, identifier: &str) -> Result<PrincipalId, ResolveError> {
        let by_registration = self
            .directory
            .student_by_registration_number(identifier)
            .await?;
        let student = match by_registration {
            Some(s) => s,
            None => self
                .directory
                .student_by_roll_number(identifier)
                .await?
                .ok_or(ResolveError::NotFound)?,
        };
        if student.status != StudentStatus::Active {
            return Err(ResolveError::NotFound);
        }
        Ok(student.profile_id)
    }

    async fn email_for(&self, profile_id: PrincipalId) -> Result<String, ResolveError> {
        // A detail row without a profile is an orphan; treat it as absent.
        let profile = self
            .directory
            .profile(profile_id)
            .await?
            .ok_or(ResolveError::NotFound)?;
        Ok(profile.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use instihub_core::{InstituteId, Profile, StudentDetail, TeacherDetail};

    use crate::directory::{DirectoryAdmin, InMemoryDirectory};

    async fn seed_teacher(dir: &InMemoryDirectory, employee_id: &str, active: bool) -> PrincipalId {
        let id = PrincipalId::new();
        dir.insert_profile(Profile {
            id,
            email: format!("{employee_id}@staff.test").to_lowercase(),
            full_name: "T".to_string(),
            phone: None,
            avatar_url: None,
            institute_id: Some(InstituteId::new()),
            is_active: true,
        })
        .await
        .unwrap();
        dir.insert_teacher(TeacherDetail {
            profile_id: id,
            institute_id: InstituteId::new(),
            employee_id: employee_id.to_string(),
            qualification: None,
            subjects: Vec::new(),
            salary: 0.0,
            is_active: active,
        })
        .await
        .unwrap();
        id
    }

    async fn seed_student(
        dir: &InMemoryDirectory,
        registration: Option<&str>,
        roll: Option<&str>,
        status: StudentStatus,
    ) -> PrincipalId {
        let id = PrincipalId::new();
        dir.insert_profile(Profile {
            id,
            email: format!("{id}@students.test"),
            full_name: "S".to_string(),
            phone: None,
            avatar_url: None,
            institute_id: Some(InstituteId::new()),
            is_active: true,
        })
        .await
        .unwrap();
        dir.insert_student(StudentDetail {
            profile_id: id,
            institute_id: InstituteId::new(),
            course_id: None,
            batch_id: None,
            registration_number: registration.map(str::to_string),
            roll_number: roll.map(str::to_string),
            status,
            is_verified: true,
            is_blocked: false,
            blocked_reason: None,
            total_fee: 0.0,
            paid_fee: 0.0,
        })
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn teacher_resolves_by_employee_id() {
        let dir = Arc::new(InMemoryDirectory::new());
        seed_teacher(&dir, "EMP12345678", true).await;

        let resolver = CredentialResolver::new(dir);
        let email = resolver
            .resolve(IdentifierKind::Teacher, " EMP12345678 ")
            .await
            .unwrap();
        assert_eq!(email, "emp12345678@staff.test");
    }

    #[tokio::test]
    async fn inactive_teacher_is_not_found() {
        let dir = Arc::new(InMemoryDirectory::new());
        seed_teacher(&dir, "EMP00000009", false).await;

        let resolver = CredentialResolver::new(dir);
        let err = resolver
            .resolve(IdentifierKind::Teacher, "EMP00000009")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound));
    }

    #[tokio::test]
    async fn student_falls_back_from_registration_to_roll() {
        let dir = Arc::new(InMemoryDirectory::new());
        let id = seed_student(&dir, None, Some("42"), StudentStatus::Active).await;

        let resolver = CredentialResolver::new(dir);
        let email = resolver.resolve(IdentifierKind::Student, "42").await.unwrap();
        assert_eq!(email, format!("{id}@students.test"));
    }

    #[tokio::test]
    async fn registration_match_wins_over_roll_match() {
        let dir = Arc::new(InMemoryDirectory::new());
        // One student's registration number equals another's roll number.
        let reg_owner = seed_student(&dir, Some("777"), None, StudentStatus::Active).await;
        seed_student(&dir, Some("REG-B"), Some("777"), StudentStatus::Active).await;

        let resolver = CredentialResolver::new(dir);
        let email = resolver.resolve(IdentifierKind::Student, "777").await.unwrap();
        assert_eq!(email, format!("{reg_owner}@students.test"));
    }

    #[tokio::test]
    async fn non_active_student_is_not_found() {
        let dir = Arc::new(InMemoryDirectory::new());
        seed_student(&dir, Some("REG-LEFT"), None, StudentStatus::Left).await;

        let resolver = CredentialResolver::new(dir);
        let err = resolver
            .resolve(IdentifierKind::Student, "REG-LEFT")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound));
    }

    #[tokio::test]
    async fn orphaned_detail_rows_resolve_to_not_found() {
        let dir = Arc::new(InMemoryDirectory::new());

        // Detail rows whose principal has no profile row: the identifier
        // matches but there is no email to hand back.
        dir.insert_student(StudentDetail {
            profile_id: PrincipalId::new(),
            institute_id: InstituteId::new(),
            course_id: None,
            batch_id: None,
            registration_number: Some("REG-ORPHAN".to_string()),
            roll_number: None,
            status: StudentStatus::Active,
            is_verified: false,
            is_blocked: false,
            blocked_reason: None,
            total_fee: 0.0,
            paid_fee: 0.0,
        })
        .await
        .unwrap();
        dir.insert_teacher(TeacherDetail {
            profile_id: PrincipalId::new(),
            institute_id: InstituteId::new(),
            employee_id: "EMP99999999".to_string(),
            qualification: None,
            subjects: Vec::new(),
            salary: 0.0,
            is_active: true,
        })
        .await
        .unwrap();

        let resolver = CredentialResolver::new(dir);
        let student = resolver
            .resolve(IdentifierKind::Student, "REG-ORPHAN")
            .await
            .unwrap_err();
        let teacher = resolver
            .resolve(IdentifierKind::Teacher, "EMP99999999")
            .await
            .unwrap_err();
        assert!(matches!(student, ResolveError::NotFound));
        assert!(matches!(teacher, ResolveError::NotFound));
    }

    #[tokio::test]
    async fn blank_identifier_is_not_found() {
        let dir = Arc::new(InMemoryDirectory::new());
        let resolver = CredentialResolver::new(dir);
        let err = resolver
            .resolve(IdentifierKind::Student, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound));
    }
}
