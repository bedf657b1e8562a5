//! Tenant-scoped directory: profiles, role assignments, institutes, and the
//! student/teacher detail records.
//!
//! The write side is only reachable from privileged server-side code; the
//! read side backs the profile loader and the credential resolver.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use instihub_auth::{DirectoryError, DirectoryReader, Role, RoleSet};
use instihub_core::{Institute, InstituteId, PrincipalId, Profile, StudentDetail, TeacherDetail};

/// Privileged directory mutations, in addition to read access.
#[async_trait]
pub trait DirectoryAdmin: DirectoryReader {
    /// Insert a fresh profile row for a newly created principal.
    async fn insert_profile(&self, profile: Profile) -> Result<(), DirectoryError>;

    /// Attach a profile to an institute and record the contact phone.
    ///
    /// A profile's institute, once set, is immutable: attaching to a
    /// different institute is a conflict, never a reassignment.
    async fn attach_to_institute(
        &self,
        principal_id: PrincipalId,
        institute_id: InstituteId,
        phone: Option<String>,
    ) -> Result<(), DirectoryError>;

    async fn assign_role(&self, principal_id: PrincipalId, role: Role)
    -> Result<(), DirectoryError>;

    async fn insert_institute(&self, institute: Institute) -> Result<(), DirectoryError>;

    async fn insert_student(&self, student: StudentDetail) -> Result<(), DirectoryError>;

    async fn insert_teacher(&self, teacher: TeacherDetail) -> Result<(), DirectoryError>;
}

fn poisoned() -> DirectoryError {
    DirectoryError::Backend("directory lock poisoned".to_string())
}

/// In-memory directory for dev and tests.
///
/// Per-row writes are atomic under the table locks, mirroring the backing
/// store's single-record consistency; multi-step flows get no transaction
/// (see the provisioning layer's partial-failure reporting).
#[derive(Default)]
pub struct InMemoryDirectory {
    profiles: RwLock<HashMap<PrincipalId, Profile>>,
    roles: RwLock<HashMap<PrincipalId, RoleSet>>,
    students: RwLock<HashMap<PrincipalId, StudentDetail>>,
    teachers: RwLock<HashMap<PrincipalId, TeacherDetail>>,
    institutes: RwLock<HashMap<InstituteId, Institute>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn institute(&self, id: InstituteId) -> Option<Institute> {
        self.institutes.read().ok()?.get(&id).cloned()
    }

    pub fn institute_count(&self) -> usize {
        self.institutes.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn students_in(&self, institute_id: InstituteId) -> Vec<StudentDetail> {
        match self.students.read() {
            Ok(map) => map
                .values()
                .filter(|s| s.institute_id == institute_id)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn teachers_in(&self, institute_id: InstituteId) -> Vec<TeacherDetail> {
        match self.teachers.read() {
            Ok(map) => map
                .values()
                .filter(|t| t.institute_id == institute_id)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Admin action: block or unblock a student.
    pub fn set_student_blocked(
        &self,
        profile_id: PrincipalId,
        blocked: bool,
        reason: Option<String>,
    ) -> Result<(), DirectoryError> {
        let mut students = self.students.write().map_err(|_| poisoned())?;
        let student = students.get_mut(&profile_id).ok_or(DirectoryError::NotFound)?;
        student.is_blocked = blocked;
        student.blocked_reason = if blocked { reason } else { None };
        Ok(())
    }

    /// Admin action: change a student's lifecycle status (soft delete is
    /// `Left`; students are never hard-deleted).
    pub fn set_student_status(
        &self,
        profile_id: PrincipalId,
        status: instihub_core::StudentStatus,
    ) -> Result<(), DirectoryError> {
        let mut students = self.students.write().map_err(|_| poisoned())?;
        let student = students.get_mut(&profile_id).ok_or(DirectoryError::NotFound)?;
        student.status = status;
        Ok(())
    }

    /// Admin action: activate or deactivate a teacher.
    pub fn set_teacher_active(
        &self,
        profile_id: PrincipalId,
        active: bool,
    ) -> Result<(), DirectoryError> {
        let mut teachers = self.teachers.write().map_err(|_| poisoned())?;
        let teacher = teachers.get_mut(&profile_id).ok_or(DirectoryError::NotFound)?;
        teacher.is_active = active;
        Ok(())
    }
}

#[async_trait]
impl DirectoryReader for InMemoryDirectory {
    async fn profile(&self, id: PrincipalId) -> Result<Option<Profile>, DirectoryError> {
        let profiles = self.profiles.read().map_err(|_| poisoned())?;
        Ok(profiles.get(&id).cloned())
    }

    async fn roles(&self, id: PrincipalId) -> Result<RoleSet, DirectoryError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles.get(&id).cloned().unwrap_or_default())
    }

    async fn student_by_profile(
        &self,
        id: PrincipalId,
    ) -> Result<Option<StudentDetail>, DirectoryError> {
        let students = self.students.read().map_err(|_| poisoned())?;
        Ok(students.get(&id).cloned())
    }

    async fn teacher_by_employee_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<TeacherDetail>, DirectoryError> {
        let teachers = self.teachers.read().map_err(|_| poisoned())?;
        Ok(teachers
            .values()
            .find(|t| t.employee_id == employee_id)
            .cloned())
    }

    async fn student_by_registration_number(
        &self,
        registration_number: &str,
    ) -> Result<Option<StudentDetail>, DirectoryError> {
        let students = self.students.read().map_err(|_| poisoned())?;
        Ok(students
            .values()
            .find(|s| s.registration_number.as_deref() == Some(registration_number))
            .cloned())
    }

    async fn student_by_roll_number(
        &self,
        roll_number: &str,
    ) -> Result<Option<StudentDetail>, DirectoryError> {
        let students = self.students.read().map_err(|_| poisoned())?;
        Ok(students
            .values()
            .find(|s| s.roll_number.as_deref() == Some(roll_number))
            .cloned())
    }
}

#[async_trait]
impl DirectoryAdmin for InMemoryDirectory {
    async fn insert_profile(&self, profile: Profile) -> Result<(), DirectoryError> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned())?;
        if profiles.contains_key(&profile.id) {
            return Err(DirectoryError::Conflict(format!(
                "profile already exists for principal {}",
                profile.id
            )));
        }
        profiles.insert(profile.id, profile);
        Ok(())
    }

    async fn attach_to_institute(
        &self,
        principal_id: PrincipalId,
        institute_id: InstituteId,
        phone: Option<String>,
    ) -> Result<(), DirectoryError> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned())?;
        let profile = profiles.get_mut(&principal_id).ok_or(DirectoryError::NotFound)?;

        match profile.institute_id {
            Some(existing) if existing != institute_id => {
                return Err(DirectoryError::Conflict(
                    "profile already belongs to another institute".to_string(),
                ));
            }
            _ => profile.institute_id = Some(institute_id),
        }
        if phone.is_some() {
            profile.phone = phone;
        }
        Ok(())
    }

    async fn assign_role(
        &self,
        principal_id: PrincipalId,
        role: Role,
    ) -> Result<(), DirectoryError> {
        let mut roles = self.roles.write().map_err(|_| poisoned())?;
        let set = roles.entry(principal_id).or_default();
        if !set.insert(role) {
            return Err(DirectoryError::Conflict(format!(
                "role {role} already assigned"
            )));
        }
        Ok(())
    }

    async fn insert_institute(&self, institute: Institute) -> Result<(), DirectoryError> {
        let mut institutes = self.institutes.write().map_err(|_| poisoned())?;
        if institutes.contains_key(&institute.id) {
            return Err(DirectoryError::Conflict("institute already exists".to_string()));
        }
        institutes.insert(institute.id, institute);
        Ok(())
    }

    async fn insert_student(&self, student: StudentDetail) -> Result<(), DirectoryError> {
        let mut students = self.students.write().map_err(|_| poisoned())?;
        if students.contains_key(&student.profile_id) {
            return Err(DirectoryError::Conflict(
                "student record already exists for this profile".to_string(),
            ));
        }
        if let Some(reg) = student.registration_number.as_deref() {
            if students
                .values()
                .any(|s| s.registration_number.as_deref() == Some(reg))
            {
                return Err(DirectoryError::Conflict(
                    "registration number already in use".to_string(),
                ));
            }
        }
        if let Some(roll) = student.roll_number.as_deref() {
            if students.values().any(|s| s.roll_number.as_deref() == Some(roll)) {
                return Err(DirectoryError::Conflict("roll number already in use".to_string()));
            }
        }
        students.insert(student.profile_id, student);
        Ok(())
    }

    async fn insert_teacher(&self, teacher: TeacherDetail) -> Result<(), DirectoryError> {
        let mut teachers = self.teachers.write().map_err(|_| poisoned())?;
        if teachers.contains_key(&teacher.profile_id) {
            return Err(DirectoryError::Conflict(
                "teacher record already exists for this profile".to_string(),
            ));
        }
        if teachers.values().any(|t| t.employee_id == teacher.employee_id) {
            return Err(DirectoryError::Conflict("employee id already in use".to_string()));
        }
        teachers.insert(teacher.profile_id, teacher);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use instihub_core::StudentStatus;

    fn profile(id: PrincipalId) -> Profile {
        Profile {
            id,
            email: format!("{id}@institute.test"),
            full_name: "Test Person".to_string(),
            phone: None,
            avatar_url: None,
            institute_id: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn institute_attachment_is_immutable() {
        let dir = InMemoryDirectory::new();
        let id = PrincipalId::new();
        dir.insert_profile(profile(id)).await.unwrap();

        let inst_a = InstituteId::new();
        let inst_b = InstituteId::new();

        dir.attach_to_institute(id, inst_a, None).await.unwrap();
        // Re-attaching to the same institute is fine (idempotent update).
        dir.attach_to_institute(id, inst_a, Some("123".to_string()))
            .await
            .unwrap();

        let err = dir.attach_to_institute(id, inst_b, None).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_role_assignment_conflicts() {
        let dir = InMemoryDirectory::new();
        let id = PrincipalId::new();

        dir.assign_role(id, Role::Teacher).await.unwrap();
        let err = dir.assign_role(id, Role::Teacher).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Conflict(_)));

        // A second, different role is a normal multi-role principal.
        dir.assign_role(id, Role::InstituteAdmin).await.unwrap();
        let roles = dir.roles(id).await.unwrap();
        assert_eq!(roles.len(), 2);
    }

    #[tokio::test]
    async fn employee_id_is_unique_per_directory() {
        let dir = InMemoryDirectory::new();
        let institute_id = InstituteId::new();

        let teacher = |profile_id| TeacherDetail {
            profile_id,
            institute_id,
            employee_id: "EMP00000001".to_string(),
            qualification: None,
            subjects: Vec::new(),
            salary: 0.0,
            is_active: true,
        };

        dir.insert_teacher(teacher(PrincipalId::new())).await.unwrap();
        let err = dir.insert_teacher(teacher(PrincipalId::new())).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn student_lookup_falls_back_by_identifier_type() {
        let dir = InMemoryDirectory::new();
        let id = PrincipalId::new();
        let student = StudentDetail {
            profile_id: id,
            institute_id: InstituteId::new(),
            course_id: None,
            batch_id: None,
            registration_number: Some("REG-100".to_string()),
            roll_number: Some("17".to_string()),
            status: StudentStatus::Active,
            is_verified: false,
            is_blocked: false,
            blocked_reason: None,
            total_fee: 0.0,
            paid_fee: 0.0,
        };
        dir.insert_student(student).await.unwrap();

        assert!(
            dir.student_by_registration_number("REG-100")
                .await
                .unwrap()
                .is_some()
        );
        assert!(dir.student_by_roll_number("17").await.unwrap().is_some());
        assert!(
            dir.student_by_registration_number("17")
                .await
                .unwrap()
                .is_none()
        );
    }
}
