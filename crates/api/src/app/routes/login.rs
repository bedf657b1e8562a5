use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::{AppServices, dto, errors};

/// Identifier-based login (employee id for teachers, registration or roll
/// number for students). Public: this is how those users sign in at all.
pub async fn login_with_id(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginWithIdRequest>,
) -> axum::response::Response {
    let session = match services.provision.login_with_id(body.into()).await {
        Ok(s) => s,
        Err(e) => return errors::provision_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "session": dto::session_to_json(&session),
            "user": dto::user_to_json(&session),
        })),
    )
        .into_response()
}
