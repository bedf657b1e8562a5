//! Privileged provisioning operations.
//!
//! Each operation authorizes the caller against the directory before
//! touching anything, then runs its writes as discrete steps. There is no
//! transaction across steps: a failure mid-way is reported as a partial
//! failure naming the step that broke, and earlier writes are left in
//! place for an operator to reconcile.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use instihub_auth::{
    AuthError, AuthSession, DirectoryError, IdentityAdmin, Role,
};
use instihub_core::{
    BatchId, CourseId, Institute, InstituteId, PrincipalId, StudentDetail, StudentStatus,
    TeacherDetail,
};

use crate::directory::DirectoryAdmin;
use crate::resolver::{CredentialResolver, IdentifierKind, ResolveError};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    /// Deliberately unspecific: identifier-based login must not reveal
    /// whether the identifier, the account, or the password was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but a follow-up write failed. Earlier steps are
    /// not rolled back.
    #[error("partial failure at {step}: {source}")]
    Partial {
        step: &'static str,
        source: DirectoryError,
    },

    #[error(transparent)]
    Identity(#[from] AuthError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

#[derive(Debug, Clone)]
pub struct CreateStudentAccount {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub institute_id: InstituteId,
    pub course_id: Option<CourseId>,
    pub batch_id: Option<BatchId>,
    pub registration_number: Option<String>,
    pub roll_number: Option<String>,
    pub total_fee: f64,
    pub paid_fee: f64,
}

#[derive(Debug, Clone)]
pub struct CreateTeacherAccount {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub institute_id: InstituteId,
    /// Assigned from the clock when absent.
    pub employee_id: Option<String>,
    pub qualification: Option<String>,
    pub subjects: Vec<String>,
    pub salary: f64,
}

#[derive(Debug, Clone)]
pub struct SetupInstitute {
    pub user_id: PrincipalId,
    pub institute_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginWithId {
    pub user_type: IdentifierKind,
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct CreatedAccount {
    pub user_id: PrincipalId,
    pub email: String,
    /// Set for teacher accounts: the employee id the account signs in with.
    pub employee_id: Option<String>,
}

/// "EMP" plus the last eight digits of the millisecond timestamp.
///
/// Collision-prone only for two creations in the same millisecond within
/// one directory, where the uniqueness check rejects the second.
pub fn generate_employee_id(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().unsigned_abs();
    format!("EMP{:08}", millis % 100_000_000)
}

#[derive(Clone)]
pub struct ProvisionService {
    identity: Arc<dyn IdentityAdmin>,
    directory: Arc<dyn DirectoryAdmin>,
    resolver: CredentialResolver,
}

impl ProvisionService {
    pub fn new(
        identity: Arc<dyn IdentityAdmin>,
        directory: Arc<dyn DirectoryAdmin>,
        resolver: CredentialResolver,
    ) -> Self {
        Self {
            identity,
            directory,
            resolver,
        }
    }

    /// Caller must be an institute admin of exactly the target institute.
    async fn require_admin_of(
        &self,
        caller: PrincipalId,
        institute_id: InstituteId,
    ) -> Result<(), ProvisionError> {
        let roles = self.directory.roles(caller).await?;
        if !roles.contains(Role::InstituteAdmin) {
            return Err(ProvisionError::Forbidden(
                "only institute admins can create accounts".to_string(),
            ));
        }

        // The caller is authenticated; a missing profile row still means it
        // has no institute to act for.
        let profile = self.directory.profile(caller).await?.ok_or_else(|| {
            ProvisionError::Forbidden("caller has no profile".to_string())
        })?;
        if profile.institute_id != Some(institute_id) {
            return Err(ProvisionError::Forbidden(
                "cannot create accounts for other institutes".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn create_student(
        &self,
        caller: PrincipalId,
        req: CreateStudentAccount,
    ) -> Result<CreatedAccount, ProvisionError> {
        if req.email.trim().is_empty() || req.password.is_empty() || req.full_name.trim().is_empty()
        {
            return Err(ProvisionError::Validation(
                "email, password and full name are required".to_string(),
            ));
        }
        self.require_admin_of(caller, req.institute_id).await?;

        let user = self
            .identity
            .create_user(&req.email, &req.password, &req.full_name, true)
            .await?;
        tracing::info!(user_id = %user.id, institute_id = %req.institute_id, "student account created");

        self.directory
            .attach_to_institute(user.id, req.institute_id, req.phone.clone())
            .await
            .map_err(|source| ProvisionError::Partial {
                step: "profile update",
                source,
            })?;

        self.directory
            .assign_role(user.id, Role::Student)
            .await
            .map_err(|source| ProvisionError::Partial {
                step: "role assignment",
                source,
            })?;

        self.directory
            .insert_student(StudentDetail {
                profile_id: user.id,
                institute_id: req.institute_id,
                course_id: req.course_id,
                batch_id: req.batch_id,
                registration_number: req.registration_number,
                roll_number: req.roll_number,
                status: StudentStatus::Active,
                // Verification is a later admin action, never granted at
                // enrollment.
                is_verified: false,
                is_blocked: false,
                blocked_reason: None,
                total_fee: req.total_fee,
                paid_fee: req.paid_fee,
            })
            .await
            .map_err(|source| ProvisionError::Partial {
                step: "student record",
                source,
            })?;

        Ok(CreatedAccount {
            user_id: user.id,
            email: user.email,
            employee_id: None,
        })
    }

    pub async fn create_teacher(
        &self,
        caller: PrincipalId,
        req: CreateTeacherAccount,
    ) -> Result<CreatedAccount, ProvisionError> {
        if req.email.trim().is_empty() || req.password.is_empty() || req.full_name.trim().is_empty()
        {
            return Err(ProvisionError::Validation(
                "email, password and full name are required".to_string(),
            ));
        }
        self.require_admin_of(caller, req.institute_id).await?;

        let employee_id = match req.employee_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => generate_employee_id(Utc::now()),
        };

        let user = self
            .identity
            .create_user(&req.email, &req.password, &req.full_name, true)
            .await?;
        tracing::info!(
            user_id = %user.id,
            institute_id = %req.institute_id,
            employee_id,
            "teacher account created"
        );

        self.directory
            .attach_to_institute(user.id, req.institute_id, req.phone.clone())
            .await
            .map_err(|source| ProvisionError::Partial {
                step: "profile update",
                source,
            })?;

        self.directory
            .assign_role(user.id, Role::Teacher)
            .await
            .map_err(|source| ProvisionError::Partial {
                step: "role assignment",
                source,
            })?;

        self.directory
            .insert_teacher(TeacherDetail {
                profile_id: user.id,
                institute_id: req.institute_id,
                employee_id: employee_id.clone(),
                qualification: req.qualification,
                subjects: req.subjects,
                salary: req.salary,
                is_active: true,
            })
            .await
            .map_err(|source| ProvisionError::Partial {
                step: "teacher record",
                source,
            })?;

        Ok(CreatedAccount {
            user_id: user.id,
            email: user.email,
            employee_id: Some(employee_id),
        })
    }

    /// First-run bootstrap: a freshly signed-up principal claims a new
    /// institute and becomes its admin. Only callable for oneself, and only
    /// while the principal has no roles at all.
    pub async fn setup_institute(
        &self,
        caller: PrincipalId,
        req: SetupInstitute,
    ) -> Result<InstituteId, ProvisionError> {
        if req.institute_name.trim().is_empty() || req.email.trim().is_empty() {
            return Err(ProvisionError::Validation(
                "institute name and email are required".to_string(),
            ));
        }
        if caller != req.user_id {
            return Err(ProvisionError::Forbidden(
                "can only set up an institute for yourself".to_string(),
            ));
        }
        let roles = self.directory.roles(caller).await?;
        if !roles.is_empty() {
            return Err(ProvisionError::Forbidden(
                "account already belongs to an institute".to_string(),
            ));
        }

        let institute = Institute {
            id: InstituteId::new(),
            name: req.institute_name.trim().to_string(),
            email: req.email.trim().to_string(),
            phone: req.phone.clone(),
            created_at: Utc::now(),
        };
        let institute_id = institute.id;
        self.directory.insert_institute(institute).await?;
        tracing::info!(%institute_id, user_id = %caller, "institute created");

        self.directory
            .attach_to_institute(caller, institute_id, req.phone)
            .await
            .map_err(|source| ProvisionError::Partial {
                step: "profile update",
                source,
            })?;

        self.directory
            .assign_role(caller, Role::InstituteAdmin)
            .await
            .map_err(|source| ProvisionError::Partial {
                step: "role assignment",
                source,
            })?;

        Ok(institute_id)
    }

    /// Identifier-based login: resolve the identifier to an email, then run
    /// an ordinary password sign-in. All failure modes surface as the same
    /// invalid-credentials error.
    pub async fn login_with_id(&self, req: LoginWithId) -> Result<AuthSession, ProvisionError> {
        let email = match self.resolver.resolve(req.user_type, &req.identifier).await {
            Ok(email) => email,
            Err(ResolveError::NotFound) => return Err(ProvisionError::InvalidCredentials),
            Err(ResolveError::Directory(e)) => return Err(ProvisionError::Directory(e)),
        };

        self.identity
            .sign_in_with_password(&email, &req.password)
            .await
            .map_err(|e| match e {
                AuthError::InvalidCredentials => ProvisionError::InvalidCredentials,
                other => ProvisionError::Identity(other),
            })
    }
}
