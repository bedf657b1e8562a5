use axum::{Router, routing::get, routing::post};

pub mod accounts;
pub mod institute;
pub mod login;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/create-student-account", post(accounts::create_student_account))
        .route("/create-teacher-account", post(accounts::create_teacher_account))
        .route("/setup-institute", post(institute::setup_institute))
}
