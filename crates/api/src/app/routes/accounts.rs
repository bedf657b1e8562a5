use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::{AppServices, dto, errors};
use crate::context::CallerContext;

pub async fn create_student_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateStudentAccountRequest>,
) -> axum::response::Response {
    let created = match services
        .provision
        .create_student(caller.principal_id(), body.into())
        .await
    {
        Ok(c) => c,
        Err(e) => return errors::provision_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "userId": created.user_id,
            "message": "Student account created successfully",
        })),
    )
        .into_response()
}

pub async fn create_teacher_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateTeacherAccountRequest>,
) -> axum::response::Response {
    let created = match services
        .provision
        .create_teacher(caller.principal_id(), body.into())
        .await
    {
        Ok(c) => c,
        Err(e) => return errors::provision_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "userId": created.user_id,
            "employeeId": created.employee_id,
            "message": "Teacher account created successfully",
        })),
    )
        .into_response()
}
