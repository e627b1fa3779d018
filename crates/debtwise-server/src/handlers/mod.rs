//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod audit;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod debts;
pub mod payments;
pub mod reports;

pub use audit::*;
pub use auth::*;
pub use chat::*;
pub use dashboard::*;
pub use debts::*;
pub use payments::*;
pub use reports::*;

use axum::extract::Request;
use serde::de::DeserializeOwned;

use crate::AppError;

/// Body limit for ordinary JSON requests
const JSON_BODY_LIMIT: usize = 64 * 1024;

/// Read and parse a JSON request body. Unknown fields are reported to the
/// client since every request type rejects them.
pub(crate) async fn read_json<T: DeserializeOwned>(
    request: Request,
    limit: usize,
) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}
