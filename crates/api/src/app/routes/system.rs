use axum::{Json, http::StatusCode, response::IntoResponse};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    axum::extract::Extension(caller): axum::extract::Extension<crate::context::CallerContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "principal_id": caller.principal_id().to_string(),
        "email": caller.email(),
    }))
}
