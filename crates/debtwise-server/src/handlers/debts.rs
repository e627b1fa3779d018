//! Debt management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};

use super::{read_json, JSON_BODY_LIMIT};
use crate::{get_user_id, AppError, AppState, SuccessResponse};
use debtwise_core::{Debt, DebtUpdate, NewDebt, Payment};

/// GET /api/debts - List the user's debts
pub async fn list_debts(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<Debt>>, AppError> {
    let user_id = get_user_id(request.headers());

    let debts = state.db.list_debts(&user_id)?;

    state.db.log_audit(
        &user_id,
        "list",
        Some("debt"),
        None,
        Some(&format!("count={}", debts.len())),
    )?;

    Ok(Json(debts))
}

/// POST /api/debts - Create a debt
pub async fn create_debt(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Debt>, AppError> {
    let user_id = get_user_id(request.headers());
    let new_debt: NewDebt = read_json(request, JSON_BODY_LIMIT).await?;

    let debt = state.db.create_debt(&user_id, &new_debt)?;

    state.db.log_audit(
        &user_id,
        "create",
        Some("debt"),
        Some(debt.id),
        Some(&format!("name={}, amount={:.2}", debt.name, debt.amount)),
    )?;

    Ok(Json(debt))
}

/// GET /api/debts/:id - Get a single debt
pub async fn get_debt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Debt>, AppError> {
    let user_id = get_user_id(request.headers());

    let debt = state
        .db
        .get_debt(&user_id, id)?
        .ok_or_else(|| AppError::not_found(&format!("Debt {} not found", id)))?;

    state
        .db
        .log_audit(&user_id, "get", Some("debt"), Some(id), None)?;

    Ok(Json(debt))
}

/// PUT /api/debts/:id - Update a debt's name, monthly payment or rate
pub async fn update_debt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Debt>, AppError> {
    let user_id = get_user_id(request.headers());
    let update: DebtUpdate = read_json(request, JSON_BODY_LIMIT).await?;

    if update.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }

    let debt = state
        .db
        .update_debt(&user_id, id, &update)?
        .ok_or_else(|| AppError::not_found(&format!("Debt {} not found", id)))?;

    state
        .db
        .log_audit(&user_id, "update", Some("debt"), Some(id), None)?;

    Ok(Json(debt))
}

/// DELETE /api/debts/:id - Delete a debt (its payments are kept)
pub async fn delete_debt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_id = get_user_id(request.headers());

    if !state.db.delete_debt(&user_id, id)? {
        return Err(AppError::not_found(&format!("Debt {} not found", id)));
    }

    state
        .db
        .log_audit(&user_id, "delete", Some("debt"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/debts/:id/payments - Payments recorded against a debt
pub async fn list_debt_payments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Vec<Payment>>, AppError> {
    let user_id = get_user_id(request.headers());

    let payments = state.db.list_payments_for_debt(&user_id, id)?;

    state.db.log_audit(
        &user_id,
        "list",
        Some("payment"),
        Some(id),
        Some(&format!("debt_id={}, count={}", id, payments.len())),
    )?;

    Ok(Json(payments))
}
