// rest_api/src/lib.rs
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error as AnyhowError};
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router, ServiceExt,
};
use log::{error, info, warn};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::NormalizePath;

use simrs_core::{AppConfig, HospitalEngine};
use simrs_models::HospitalError;
use simrs_security::{AuthError, TokenIssuer};

pub mod extract;
mod handlers;
pub mod listing;

/// Errors surfaced by the HTTP layer. Every variant renders as
/// `{"code": ..., "detail": ...}`.
#[derive(Debug, Error)]
pub enum RestApiError {
    #[error(transparent)]
    Hospital(#[from] HospitalError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<AuthError> for RestApiError {
    fn from(err: AuthError) -> Self {
        RestApiError::Hospital(err.into())
    }
}

impl RestApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            RestApiError::Hospital(e) => {
                let status = match e {
                    HospitalError::NotFound(_) => StatusCode::NOT_FOUND,
                    HospitalError::Conflict(_) => StatusCode::CONFLICT,
                    HospitalError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    HospitalError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
                    HospitalError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                    HospitalError::Forbidden(_) => StatusCode::FORBIDDEN,
                    HospitalError::InvalidRange(_) | HospitalError::InvalidData(_) => StatusCode::BAD_REQUEST,
                    HospitalError::Storage(_) | HospitalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
            RestApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_DATA"),
        }
    }
}

impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = Json(json!({
            "code": code,
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, RestApiError>;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<HospitalEngine>,
    pub tokens: TokenIssuer,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(engine: Arc<HospitalEngine>, config: AppConfig) -> Self {
        let tokens = TokenIssuer::new(&config.security.jwt_secret, config.security.token_ttl_minutes);
        AppState { engine, tokens, config: Arc::new(config) }
    }
}

async fn health_check_handler() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })))
}

/// Routes relative to the API prefix.
fn api_routes() -> Router<AppState> {
    use handlers::{allocations, appointments, dashboard, emergency, identity, inventory, payments};

    Router::new()
        .route("/health", get(health_check_handler))
        .route("/auth/register", post(identity::register))
        .route("/auth/login", post(identity::login))
        .route("/auth/refresh", post(identity::refresh))
        .route("/users", get(identity::list_users))
        .route("/users/me", get(identity::me))
        .route("/admin/users", post(identity::create_user))
        .route("/admin/users/:id", axum::routing::patch(identity::update_user))
        .route("/wards", get(inventory::list_wards).post(inventory::create_ward))
        .route(
            "/wards/:id",
            get(inventory::get_ward)
                .patch(inventory::update_ward)
                .delete(inventory::delete_ward),
        )
        .route("/rooms", get(inventory::list_rooms).post(inventory::create_room))
        .route("/beds", get(inventory::list_beds).post(inventory::create_bed))
        .route("/beds/availability", get(inventory::list_available_beds))
        .route("/beds/:id", get(inventory::get_bed))
        .route("/beds/:id/maintenance", post(inventory::start_maintenance))
        .route("/beds/:id/release_maintenance", post(inventory::release_maintenance))
        .route("/beds/:id/reclaim", post(inventory::reclaim_bed))
        .route("/beds/:id/reserve", post(emergency::reserve_bed))
        .route("/beds/:id/release_reservation", post(emergency::release_reservation))
        .route(
            "/bed-allocations",
            get(allocations::list_allocations).post(allocations::allocate),
        )
        .route(
            "/bed-allocations/:id",
            get(allocations::get_allocation).patch(allocations::update_allocation),
        )
        .route("/appointments", get(appointments::list_appointments))
        .route("/appointments/request_appointment", post(appointments::request_appointment))
        .route("/appointments/:id", get(appointments::get_appointment))
        .route("/appointments/:id/assign_doctor", post(appointments::assign_doctor))
        .route("/appointments/:id/check_in", post(appointments::check_in))
        .route("/appointments/:id/complete", post(appointments::complete))
        .route("/appointments/:id/cancel", post(appointments::cancel))
        .route(
            "/payments/midtrans",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/payments/midtrans/notification", post(payments::gateway_notification))
        .route(
            "/emergency/cases",
            get(emergency::list_cases).post(emergency::register_case),
        )
        .route("/dashboard/:kind", get(dashboard::dashboard))
}

/// The full router, nested under the configured API prefix.
pub fn build_router(state: AppState) -> Router {
    let prefix = state.config.rest.api_prefix.trim_end_matches('/').to_string();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    let api = api_routes().with_state(state);
    let router = if prefix.is_empty() { api } else { Router::new().nest(&prefix, api) };
    router.layer(cors)
}

/// `build_router` with trailing slashes trimmed before routing, so
/// `/api/users/` and `/api/users` reach the same handler.
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(build_router(state))
}

/// Serves the API until `shutdown_rx` fires.
pub async fn start_server(state: AppState, shutdown_rx: oneshot::Receiver<()>) -> Result<(), AnyhowError> {
    let rest = &state.config.rest;
    let addr: SocketAddr = format!("{}:{}", rest.host, rest.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", rest.host, rest.port))?;
    let app = build_app(state.clone());

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!("REST API listening on http://{}{}", addr, state.config.rest.api_prefix);

    let shutdown_signal = async {
        if shutdown_rx.await.is_err() {
            warn!("Shutdown sender dropped; stopping REST API");
        }
        info!("Received shutdown signal.");
    };

    axum::serve(listener, ServiceExt::<axum::extract::Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("REST API server failed to start or run")?;

    info!("REST API server stopped.");
    Ok(())
}
