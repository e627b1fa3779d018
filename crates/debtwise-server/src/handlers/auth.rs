//! Identity and health handlers

use std::sync::Arc;

use axum::extract::Request;
use axum::{extract::State, Json};
use serde::Serialize;

use crate::{get_user_id, AppState};
use debtwise_core::ChatBackend;

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// The authenticated user's email or identifier
    pub user: String,
    /// How the user was authenticated
    pub auth_method: String,
}

/// GET /api/me - The user requests act for
pub async fn get_me(State(state): State<Arc<AppState>>, request: Request) -> Json<MeResponse> {
    let user = get_user_id(request.headers());

    let auth_method = match user.as_str() {
        "api-key" => "api_key",
        "local-dev" if !state.config.require_auth => "none",
        "local-dev" => "unknown",
        _ => "cloudflare_header",
    };

    Json(MeResponse {
        user,
        auth_method: auth_method.to_string(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub advisor_configured: bool,
    pub advisor_model: Option<String>,
}

/// GET /api/health - Liveness plus advisor configuration (no auth)
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        advisor_configured: state.advisor.is_some(),
        advisor_model: state.advisor.as_ref().map(|a| a.model().to_string()),
    })
}
