//! Audit log handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::Deserialize;

use crate::{get_user_id, AppError, AppState, MAX_PAGE_LIMIT};
use debtwise_core::AuditEntry;

/// Query parameters for audit log
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default = "default_audit_limit")]
    pub limit: i64,
}

fn default_audit_limit() -> i64 {
    100
}

/// GET /api/audit - List audit log entries
pub async fn list_audit_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQuery>,
    request: Request,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    let user_id = get_user_id(request.headers());
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);

    let entries = state.db.list_audit_log(limit)?;

    state.db.log_audit(
        &user_id,
        "list",
        Some("audit_log"),
        None,
        Some(&format!("limit={}", limit)),
    )?;

    Ok(Json(entries))
}
