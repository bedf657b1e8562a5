//! Request/response DTOs and JSON mapping helpers.
//!
//! The wire format is camelCase; domain structs stay snake_case.

use serde::Deserialize;
use serde_json::json;

use instihub_auth::AuthSession;
use instihub_core::{BatchId, CourseId, InstituteId, PrincipalId};
use instihub_infra::{
    CreateStudentAccount, CreateTeacherAccount, IdentifierKind, LoginWithId, SetupInstitute,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentAccountRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub institute_id: InstituteId,
    #[serde(default)]
    pub course_id: Option<CourseId>,
    #[serde(default)]
    pub batch_id: Option<BatchId>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub total_fee: f64,
    #[serde(default)]
    pub paid_fee: f64,
}

impl From<CreateStudentAccountRequest> for CreateStudentAccount {
    fn from(r: CreateStudentAccountRequest) -> Self {
        Self {
            email: r.email,
            password: r.password,
            full_name: r.full_name,
            phone: r.phone,
            institute_id: r.institute_id,
            course_id: r.course_id,
            batch_id: r.batch_id,
            registration_number: r.registration_number,
            roll_number: r.roll_number,
            total_fee: r.total_fee,
            paid_fee: r.paid_fee,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacherAccountRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub institute_id: InstituteId,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub salary: f64,
}

impl From<CreateTeacherAccountRequest> for CreateTeacherAccount {
    fn from(r: CreateTeacherAccountRequest) -> Self {
        Self {
            email: r.email,
            password: r.password,
            full_name: r.full_name,
            phone: r.phone,
            institute_id: r.institute_id,
            employee_id: r.employee_id,
            qualification: r.qualification,
            subjects: r.subjects,
            salary: r.salary,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupInstituteRequest {
    pub user_id: PrincipalId,
    pub institute_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl From<SetupInstituteRequest> for SetupInstitute {
    fn from(r: SetupInstituteRequest) -> Self {
        Self {
            user_id: r.user_id,
            institute_name: r.institute_name,
            email: r.email,
            phone: r.phone,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginWithIdRequest {
    pub user_type: IdentifierKind,
    pub identifier: String,
    pub password: String,
}

impl From<LoginWithIdRequest> for LoginWithId {
    fn from(r: LoginWithIdRequest) -> Self {
        Self {
            user_type: r.user_type,
            identifier: r.identifier,
            password: r.password,
        }
    }
}

pub fn session_to_json(session: &AuthSession) -> serde_json::Value {
    json!({
        "access_token": session.access_token,
        "refresh_token": session.refresh_token,
        "expires_at": session.expires_at.timestamp(),
    })
}

pub fn user_to_json(session: &AuthSession) -> serde_json::Value {
    json!({
        "id": session.user.id,
        "email": session.user.email,
    })
}
