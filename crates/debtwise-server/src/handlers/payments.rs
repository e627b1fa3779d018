//! Payment handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};

use super::{read_json, JSON_BODY_LIMIT};
use crate::{get_user_id, AppError, AppState};
use debtwise_core::{NewPayment, Payment};

/// GET /api/payments - List the user's payments, most recent first
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<Payment>>, AppError> {
    let user_id = get_user_id(request.headers());

    let payments = state.db.list_payments(&user_id)?;

    state.db.log_audit(
        &user_id,
        "list",
        Some("payment"),
        None,
        Some(&format!("count={}", payments.len())),
    )?;

    Ok(Json(payments))
}

/// POST /api/payments - Record a payment against a debt
///
/// Resubmitting with the same `idempotency_key` returns the original payment.
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Payment>, AppError> {
    let user_id = get_user_id(request.headers());
    let new_payment: NewPayment = read_json(request, JSON_BODY_LIMIT).await?;

    let payment = state.db.record_payment(
        &user_id,
        &new_payment,
        state.advisor_config.missing_debt_policy,
    )?;

    state.db.log_audit(
        &user_id,
        "create",
        Some("payment"),
        Some(payment.id),
        Some(&format!(
            "debt_id={}, amount={:.2}, interest={:.2}, capital={:.2}",
            payment.debt_id, payment.amount, payment.interest_amount, payment.capital_amount
        )),
    )?;

    Ok(Json(payment))
}

/// GET /api/payments/:id - Get a single payment
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Payment>, AppError> {
    let user_id = get_user_id(request.headers());

    let payment = state
        .db
        .get_payment(&user_id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Payment {} not found", id)))?;

    state
        .db
        .log_audit(&user_id, "get", Some("payment"), Some(id), None)?;

    Ok(Json(payment))
}
