use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use instihub_auth::AuthError;
use instihub_infra::ProvisionError;

pub fn provision_error_to_response(err: ProvisionError) -> axum::response::Response {
    match err {
        ProvisionError::Unauthorized => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required")
        }
        ProvisionError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        ProvisionError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        // One message for every credential failure mode.
        ProvisionError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Invalid credentials",
        ),
        e @ ProvisionError::Partial { .. } => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "partial_failure",
            e.to_string(),
        ),
        ProvisionError::Identity(AuthError::EmailInUse) => {
            json_error(StatusCode::CONFLICT, "conflict", "email already registered")
        }
        ProvisionError::Identity(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "identity_error",
            e.to_string(),
        ),
        ProvisionError::Directory(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "directory_error",
            e.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
