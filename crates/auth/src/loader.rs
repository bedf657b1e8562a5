//! Profile & role loader.
//!
//! Loading is best-effort: a directory failure is logged and leaves that
//! part of the result empty. The UI layer must tolerate a profile without
//! roles, roles without a profile, and a student role without a detail row.

use std::sync::Arc;

use instihub_core::{PrincipalId, Profile, StudentDetail};

use crate::directory::DirectoryReader;
use crate::roles::{Role, RoleSet};

/// Everything the directory knows about a signed-in principal.
#[derive(Debug, Clone, Default)]
pub struct LoadedIdentity {
    pub profile: Option<Profile>,
    pub roles: RoleSet,
    pub student: Option<StudentDetail>,
}

#[derive(Clone)]
pub struct ProfileLoader {
    directory: Arc<dyn DirectoryReader>,
}

impl ProfileLoader {
    pub fn new(directory: Arc<dyn DirectoryReader>) -> Self {
        Self { directory }
    }

    /// Load profile, role set, and (for students) the detail record.
    ///
    /// The role fetch is attempted before the student-detail fetch since the
    /// latter is gated on the role set containing `student`.
    pub async fn load(&self, principal_id: PrincipalId) -> LoadedIdentity {
        let profile = match self.directory.profile(principal_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(%principal_id, error = %e, "profile fetch failed");
                None
            }
        };

        let roles = match self.directory.roles(principal_id).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!(%principal_id, error = %e, "role fetch failed");
                RoleSet::default()
            }
        };

        let student = if roles.contains(Role::Student) {
            match self.directory.student_by_profile(principal_id).await {
                Ok(student) => student,
                Err(e) => {
                    tracing::warn!(%principal_id, error = %e, "student detail fetch failed");
                    None
                }
            }
        } else {
            None
        };

        LoadedIdentity {
            profile,
            roles,
            student,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use instihub_core::{InstituteId, StudentStatus, TeacherDetail};

    use crate::directory::DirectoryError;

    /// Directory stub: fixed profile/roles/student, with per-call failure
    /// switches to exercise the best-effort paths.
    #[derive(Default)]
    struct StubDirectory {
        profile: Option<Profile>,
        roles: RoleSet,
        student: Option<StudentDetail>,
        fail_profile: bool,
        fail_roles: bool,
    }

    #[async_trait]
    impl DirectoryReader for StubDirectory {
        async fn profile(&self, _: PrincipalId) -> Result<Option<Profile>, DirectoryError> {
            if self.fail_profile {
                return Err(DirectoryError::Backend("profiles unavailable".to_string()));
            }
            Ok(self.profile.clone())
        }

        async fn roles(&self, _: PrincipalId) -> Result<RoleSet, DirectoryError> {
            if self.fail_roles {
                return Err(DirectoryError::Backend("roles unavailable".to_string()));
            }
            Ok(self.roles.clone())
        }

        async fn student_by_profile(
            &self,
            _: PrincipalId,
        ) -> Result<Option<StudentDetail>, DirectoryError> {
            Ok(self.student.clone())
        }

        async fn teacher_by_employee_id(
            &self,
            _: &str,
        ) -> Result<Option<TeacherDetail>, DirectoryError> {
            Ok(None)
        }

        async fn student_by_registration_number(
            &self,
            _: &str,
        ) -> Result<Option<StudentDetail>, DirectoryError> {
            Ok(None)
        }

        async fn student_by_roll_number(
            &self,
            _: &str,
        ) -> Result<Option<StudentDetail>, DirectoryError> {
            Ok(None)
        }
    }

    fn student_detail(profile_id: PrincipalId) -> StudentDetail {
        StudentDetail {
            profile_id,
            institute_id: InstituteId::new(),
            course_id: None,
            batch_id: None,
            registration_number: Some("REG-7".to_string()),
            roll_number: None,
            status: StudentStatus::Active,
            is_verified: false,
            is_blocked: false,
            blocked_reason: None,
            total_fee: 0.0,
            paid_fee: 0.0,
        }
    }

    #[tokio::test]
    async fn student_detail_fetched_only_for_student_role() {
        let id = PrincipalId::new();

        let with_role = StubDirectory {
            roles: vec![Role::Student].into(),
            student: Some(student_detail(id)),
            ..Default::default()
        };
        let loaded = ProfileLoader::new(Arc::new(with_role)).load(id).await;
        assert!(loaded.student.is_some());

        let without_role = StubDirectory {
            roles: vec![Role::Teacher].into(),
            student: Some(student_detail(id)),
            ..Default::default()
        };
        let loaded = ProfileLoader::new(Arc::new(without_role)).load(id).await;
        assert!(loaded.student.is_none(), "non-students never fetch detail");
    }

    #[tokio::test]
    async fn partial_failures_yield_partial_state() {
        let id = PrincipalId::new();

        let stub = StubDirectory {
            roles: vec![Role::Teacher].into(),
            fail_profile: true,
            ..Default::default()
        };
        let loaded = ProfileLoader::new(Arc::new(stub)).load(id).await;

        assert!(loaded.profile.is_none());
        assert!(loaded.roles.is_teacher(), "roles survive a profile failure");
    }

    #[tokio::test]
    async fn role_failure_leaves_empty_role_set() {
        let id = PrincipalId::new();
        let stub = StubDirectory {
            fail_roles: true,
            student: Some(student_detail(id)),
            ..Default::default()
        };
        let loaded = ProfileLoader::new(Arc::new(stub)).load(id).await;

        assert!(loaded.roles.is_empty());
        // No roles known means the student gate never opens.
        assert!(loaded.student.is_none());
    }
}
