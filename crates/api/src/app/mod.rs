//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::{Extension, Router, routing::get, routing::post};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use instihub_infra::{CredentialResolver, InMemoryDirectory, InMemoryIdentity, ProvisionService};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Backend wiring shared by every handler.
pub struct AppServices {
    pub identity: Arc<InMemoryIdentity>,
    pub directory: Arc<InMemoryDirectory>,
    pub provision: ProvisionService,
}

pub fn build_services(jwt_secret: &str) -> AppServices {
    let directory = Arc::new(InMemoryDirectory::new());
    let identity = Arc::new(InMemoryIdentity::new(
        jwt_secret.as_bytes(),
        directory.clone(),
    ));
    let provision = ProvisionService::new(
        identity.clone(),
        directory.clone(),
        CredentialResolver::new(directory.clone()),
    );
    AppServices {
        identity,
        directory,
        provision,
    }
}

/// Browser origins allowed to call the API.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    exact: Vec<String>,
    suffixes: Vec<&'static str>,
}

impl CorsConfig {
    /// Local dev origins plus the hosted preview domains; extend with the
    /// comma-separated `ALLOWED_ORIGINS` variable.
    pub fn from_env() -> Self {
        let mut exact = vec![
            "http://localhost:5173".to_string(),
            "http://localhost:3000".to_string(),
        ];
        if let Ok(raw) = std::env::var("ALLOWED_ORIGINS") {
            for origin in raw.split(',') {
                let origin = origin.trim();
                if !origin.is_empty() {
                    exact.push(origin.to_string());
                }
            }
        }
        Self {
            exact,
            suffixes: vec![".lovable.app", ".lovable.dev"],
        }
    }

    pub fn is_allowed(&self, origin: &HeaderValue) -> bool {
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        self.exact.iter().any(|o| o == origin)
            || self.suffixes.iter().any(|suffix| origin.ends_with(suffix))
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        identity: services.identity.clone(),
    };

    let cors_config = CorsConfig::from_env();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            cors_config.is_allowed(origin)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Protected routes: require a valid bearer token.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/login-with-id", post(routes::login::login_with_id))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)).layer(cors))
}
