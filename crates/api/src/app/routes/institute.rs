use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::{AppServices, dto, errors};
use crate::context::CallerContext;

pub async fn setup_institute(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::SetupInstituteRequest>,
) -> axum::response::Response {
    let institute_id = match services
        .provision
        .setup_institute(caller.principal_id(), body.into())
        .await
    {
        Ok(id) => id,
        Err(e) => return errors::provision_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "instituteId": institute_id,
            "message": "Institute created successfully",
        })),
    )
        .into_response()
}
