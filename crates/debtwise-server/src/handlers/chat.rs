//! Advisor chat handlers
//!
//! `POST /api/chat` is a stateless proxy: the client supplies its own
//! financial summary and history. The `/api/chat/messages` routes keep the
//! conversation server side, building the summary from the user's ledger.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::read_json;
use crate::{get_user_id, AppError, AppState};
use debtwise_core::{
    send_advisory_message, AdvisorySession, ChatClient, ChatMessage, ChatRole, Error,
    FinancialContext,
};

/// Chat bodies carry a financial summary and history
const CHAT_BODY_LIMIT: usize = 1024 * 1024;

const CHAT_FAILURE_MESSAGE: &str = "Failed to process chat request";

/// A prior turn supplied by the client
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub financial_context: Option<FinancialContext>,
    #[serde(default)]
    pub chat_history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Serialize)]
pub struct ClearedResponse {
    pub success: bool,
    pub cleared: usize,
}

const NOT_CONFIGURED: &str = "Advisor not configured";

/// A chat request with no configured advisor fails like any other advisor
/// error.
fn advisor(state: &AppState) -> Result<&ChatClient, AppError> {
    state.advisor.as_ref().ok_or_else(|| {
        warn!(error = NOT_CONFIGURED, "Chat request failed");
        AppError::internal(CHAT_FAILURE_MESSAGE)
    })
}

fn require_message(message: &str) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::bad_request("message is required"));
    }
    Ok(())
}

/// Map an advisor error to a response. Blank messages are the client's fault;
/// everything else is reported with a fixed message.
fn chat_error(err: Error) -> AppError {
    match err {
        Error::Validation(msg) => AppError::bad_request(&msg),
        other => {
            warn!(error = %other, "Chat request failed");
            AppError::internal(CHAT_FAILURE_MESSAGE)
        }
    }
}

/// POST /api/chat - Ask the advisor one question with client-supplied context
pub async fn chat(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ChatResponse>, AppError> {
    let user_id = get_user_id(request.headers());
    let body: ChatRequest = read_json(request, CHAT_BODY_LIMIT).await?;
    require_message(&body.message)?;
    let client = advisor(&state)?;

    let history: Vec<ChatMessage> = body
        .chat_history
        .into_iter()
        .map(|entry| ChatMessage::new(entry.role, entry.content))
        .collect();
    let context = body.financial_context.as_ref().map(FinancialContext::render);

    let options = state.advisor_config.generation_options();
    let response = send_advisory_message(
        client,
        &history,
        &body.message,
        context.as_deref(),
        &options,
    )
    .await
    .map_err(chat_error)?;

    state.db.log_audit(
        &user_id,
        "chat",
        Some("advisor"),
        None,
        Some(&format!(
            "history={}, has_context={}",
            history.len(),
            context.is_some()
        )),
    )?;

    Ok(Json(ChatResponse { response }))
}

/// GET /api/chat/messages - The user's conversation log, oldest first
pub async fn list_chat_messages(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let user_id = get_user_id(request.headers());

    let messages = state.db.list_chat_messages(&user_id)?;

    state.db.log_audit(
        &user_id,
        "list",
        Some("chat_message"),
        None,
        Some(&format!("count={}", messages.len())),
    )?;

    Ok(Json(messages))
}

/// POST /api/chat/messages - Continue the stored conversation
///
/// The advisor sees a summary of the user's current ledger. The exchange is
/// stored even when the advisor fails or is not configured, in which case the
/// log gains a system entry describing the failure.
pub async fn send_chat_message(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ChatResponse>, AppError> {
    let user_id = get_user_id(request.headers());
    let body: SendMessageRequest = read_json(request, CHAT_BODY_LIMIT).await?;
    require_message(&body.message)?;

    let log = state.db.list_chat_messages(&user_id)?;
    let stored = log.len();

    let mut session =
        AdvisorySession::from_log(log, state.advisor_config.generation_options());
    let result = match state.advisor.as_ref() {
        Some(client) => {
            let context = state.db.load_ledger(&user_id)?.financial_context().render();
            session.send(client, &body.message, Some(&context)).await
        }
        None => Err(session.record_failure(&body.message, NOT_CONFIGURED)),
    };

    state
        .db
        .append_chat_messages(&user_id, &session.log()[stored..])?;

    state.db.log_audit(
        &user_id,
        "chat",
        Some("chat_message"),
        None,
        Some(&format!("ok={}", result.is_ok())),
    )?;

    let response = result.map_err(chat_error)?;
    Ok(Json(ChatResponse { response }))
}

/// DELETE /api/chat/messages - End the session by clearing the log
pub async fn clear_chat_messages(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ClearedResponse>, AppError> {
    let user_id = get_user_id(request.headers());

    let cleared = state.db.clear_chat_messages(&user_id)?;

    state.db.log_audit(
        &user_id,
        "clear",
        Some("chat_message"),
        None,
        Some(&format!("count={}", cleared)),
    )?;

    Ok(Json(ClearedResponse {
        success: true,
        cleared,
    }))
}
