//! Report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::Deserialize;

use crate::{get_user_id, AppError, AppState};
use debtwise_core::{monthly_payment_history, MonthlyTotal, MAX_HISTORY_MONTHS};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_months")]
    pub months: u32,
}

fn default_months() -> u32 {
    12
}

/// GET /api/reports/payment-history - Monthly payment totals, oldest first
pub async fn get_payment_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
    request: Request,
) -> Result<Json<Vec<MonthlyTotal>>, AppError> {
    let user_id = get_user_id(request.headers());
    let months = params.months.min(MAX_HISTORY_MONTHS);

    let payments = state.db.list_payments(&user_id)?;
    let today = chrono::Utc::now().date_naive();
    let history = monthly_payment_history(&payments, today, months);

    state.db.log_audit(
        &user_id,
        "report",
        Some("payment_history"),
        None,
        Some(&format!("months={}", months)),
    )?;

    Ok(Json(history))
}
