//! Debtwise Web Server
//!
//! Axum-based REST API for the Debtwise debt management tool.
//!
//! Security features:
//! - Cloudflare Access header or bearer API key authentication (secure by
//!   default, use --no-auth for local dev)
//! - Every debt, payment and chat entry is scoped to the authenticated user
//! - Restrictive CORS policy
//! - Full audit logging for all API access (reads and writes)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use debtwise_core::{AdvisorConfig, ChatBackend, ChatClient, Database};

mod handlers;

/// Maximum audit log page size
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Cloudflare Access header for authenticated user email
const CF_ACCESS_USER_HEADER: &str = "cf-access-authenticated-user-email";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Paths served without authentication
const PUBLIC_PATHS: &[&str] = &["/api/health"];

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// API keys for service authentication ("Bearer <key>" in Authorization header)
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

impl ServerConfig {
    /// Read API keys from `DEBTWISE_API_KEYS` (comma separated)
    pub fn api_keys_from_env() -> Vec<String> {
        std::env::var("DEBTWISE_API_KEYS")
            .map(|keys| {
                keys.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Chat-completion client, if one is configured
    pub advisor: Option<ChatClient>,
    pub advisor_config: AdvisorConfig,
}

/// Authentication middleware - accepts a Cloudflare Access header or a bearer API key
///
/// **Cloudflare Access header**: trusted as the user identity. Safe behind a
/// Cloudflare Tunnel (which rewrites CF headers); spoofable if the server is
/// exposed directly.
///
/// **API keys**: compared in constant time.
async fn auth_middleware(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if !state.config.require_auth || PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let cf_user = request
        .headers()
        .get(CF_ACCESS_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    if let Some(email) = cf_user {
        info!(user = %email, path = %request.uri().path(), "Authenticated via Cloudflare Access header");
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        info!(user = "api-key", path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Constant-time for same-length keys
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Identify the user a request acts for. All stored data is keyed by this id.
pub fn get_user_id(headers: &axum::http::HeaderMap) -> String {
    if let Some(email) = headers
        .get(CF_ACCESS_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        return email.to_string();
    }

    if headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .is_some()
    {
        return "api-key".to_string();
    }

    "local-dev".to_string()
}

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router, configuring the advisor from the
/// environment and the advisor settings file
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let advisor_config = AdvisorConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Invalid advisor config, using defaults");
        AdvisorConfig::default()
    });

    let advisor = ChatClient::from_config(&advisor_config);
    match advisor {
        Some(ref client) => info!(
            "Advisor backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => info!(
            "ℹ️  Advisor backend not configured (set OPENAI_COMPATIBLE_HOST or OPENAI_API_KEY to enable chat)"
        ),
    }

    create_router_with_advisor(db, static_dir, config, advisor, advisor_config)
}

/// Create the application router with an explicit advisor backend
pub fn create_router_with_advisor(
    db: Database,
    static_dir: Option<&str>,
    config: ServerConfig,
    advisor: Option<ChatClient>,
    advisor_config: AdvisorConfig,
) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        advisor,
        advisor_config,
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Auth
        .route("/me", get(handlers::get_me))
        // Dashboard
        .route("/dashboard", get(handlers::get_dashboard))
        // Debts
        .route("/debts", get(handlers::list_debts).post(handlers::create_debt))
        .route(
            "/debts/:id",
            get(handlers::get_debt)
                .put(handlers::update_debt)
                .delete(handlers::delete_debt),
        )
        .route("/debts/:id/payments", get(handlers::list_debt_payments))
        // Payments
        .route(
            "/payments",
            get(handlers::list_payments).post(handlers::create_payment),
        )
        .route("/payments/:id", get(handlers::get_payment))
        // Reports
        .route(
            "/reports/payment-history",
            get(handlers::get_payment_history),
        )
        // Advisor
        .route("/chat", post(handlers::chat))
        .route(
            "/chat/messages",
            get(handlers::list_chat_messages)
                .post(handlers::send_chat_message)
                .delete(handlers::clear_chat_messages),
        )
        // Audit log
        .route("/audit", get(handlers::list_audit_log));

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    }

    check_advisor_connection().await;

    let app = create_router(db, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log advisor backend connection status
async fn check_advisor_connection() {
    match ChatClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!("✅ Advisor backend connected: {}", client.host());
            } else {
                warn!(
                    "⚠️  Advisor backend configured but not responding: {}",
                    client.host()
                );
            }
        }
        None => info!("ℹ️  Advisor backend not configured"),
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Client-caused core errors keep their message; everything else is generic
        if let Some(core) = err.downcast_ref::<debtwise_core::Error>() {
            match core {
                debtwise_core::Error::Validation(msg) => return Self::bad_request(msg),
                debtwise_core::Error::DebtNotFound(id) => {
                    return Self::not_found(&format!("Debt {} not found", id))
                }
                _ => {}
            }
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}
