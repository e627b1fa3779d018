//! Dashboard handler

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};
use serde::Serialize;

use crate::{get_user_id, AppError, AppState};
use debtwise_core::{Aggregates, Debt, Payment};

/// Number of payments shown on the dashboard
const DASHBOARD_RECENT_PAYMENTS: usize = 5;

#[derive(Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub totals: Aggregates,
    pub debts: Vec<Debt>,
    pub recent_payments: Vec<Payment>,
}

/// GET /api/dashboard - Totals, debts and the most recent payments
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<DashboardResponse>, AppError> {
    let user_id = get_user_id(request.headers());

    let ledger = state.db.load_ledger(&user_id)?;
    let totals = ledger.aggregates();

    // Stored payments come back newest first
    let recent_payments: Vec<Payment> = ledger
        .payments()
        .iter()
        .take(DASHBOARD_RECENT_PAYMENTS)
        .cloned()
        .collect();

    state.db.log_audit(
        &user_id,
        "view",
        Some("dashboard"),
        None,
        Some(&format!(
            "debts={}, payments={}",
            ledger.debts().len(),
            ledger.payments().len()
        )),
    )?;

    Ok(Json(DashboardResponse {
        totals,
        debts: ledger.debts().to_vec(),
        recent_payments,
    }))
}
