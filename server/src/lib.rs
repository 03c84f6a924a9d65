//! HTTP admin API for the Plasma license store.
//!
//! Every `/api/*` route requires `Authorization: Bearer <token>`. `/health`
//! is open.

pub mod admin;
pub mod credentials;
mod error;

pub use error::{ApiError, ApiResult};

use axum::{
    Json, Router,
    extract::{Request, State, rejection::JsonRejection},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use plasma_license::LicenseStore;
use plasma_license::api::{
    CheckAccessRequest, CheckAccessResponse, GenerateRequest, GenerateResponse, HealthResponse,
    ListKeysResponse, RevokeRequest, RevokeResponse, ValidateRequest, ValidateResponse,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Shared state behind the router.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<LicenseStore>>,
    api_token: Arc<str>,
}

impl AppState {
    pub fn new(store: LicenseStore, api_token: impl Into<Arc<str>>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            api_token: api_token.into(),
        }
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "license-api".to_string(),
    })
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == &*state.api_token);

    if !authorized {
        debug!("Rejected {} {} without a valid token", request.method(), request.uri());
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}

/// Unwraps an optional JSON body; an absent or unparsable body reads as empty.
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    body.map(|Json(inner)| inner).unwrap_or_default()
}

async fn validate_handler(
    State(state): State<AppState>,
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Json<ValidateResponse>> {
    let request = body_or_default(body);
    let key = request
        .license_key
        .ok_or(ApiError::MissingField("license_key"))?;

    let mut store = state.store.lock().await;
    let validation = store.validate(&key, request.user_identifier.as_deref())?;
    Ok(Json(ValidateResponse::from(&validation)))
}

async fn check_access_handler(
    State(state): State<AppState>,
    body: Result<Json<CheckAccessRequest>, JsonRejection>,
) -> ApiResult<Json<CheckAccessResponse>> {
    let request = body_or_default(body);
    let identity = request
        .user_identifier
        .ok_or(ApiError::MissingField("user_identifier"))?;

    let store = state.store.lock().await;
    let access = store.check_access(Some(&identity))?;
    Ok(Json(CheckAccessResponse::from(&access)))
}

async fn generate_handler(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let request = body_or_default(body);
    let key_type = request.key_type.ok_or(ApiError::MissingField("key_type"))?;

    let mut store = state.store.lock().await;
    let license_key = store.generate(&key_type, request.custom_data)?;
    Ok(Json(GenerateResponse {
        success: true,
        license_key,
        key_type,
    }))
}

async fn list_keys_handler(State(state): State<AppState>) -> ApiResult<Json<ListKeysResponse>> {
    let store = state.store.lock().await;
    let keys = store.list()?;
    Ok(Json(ListKeysResponse { keys }))
}

async fn revoke_handler(
    State(state): State<AppState>,
    body: Result<Json<RevokeRequest>, JsonRejection>,
) -> ApiResult<Json<RevokeResponse>> {
    let request = body_or_default(body);
    let key = request
        .license_key
        .ok_or(ApiError::MissingField("license_key"))?;

    let mut store = state.store.lock().await;
    let success = store.revoke(&key)?;
    let message = if success {
        "Key revoked successfully"
    } else {
        "Key not found"
    };
    Ok(Json(RevokeResponse {
        success,
        message: message.to_string(),
    }))
}

/// Build the HTTP API router over the given state.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/validate", post(validate_handler))
        .route("/check_access", post(check_access_handler))
        .route("/generate", post(generate_handler))
        .route("/list_keys", get(list_keys_handler))
        .route("/revoke", post(revoke_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .with_state(state)
}
