//! Debtwise Core Library
//!
//! Shared functionality for the Debtwise debt management tool:
//! - Ledger model: payment allocation, balances and aggregates
//! - Advisor: financial context formatting and chat sessions
//! - Pluggable chat-completion backends (OpenAI-compatible, mock)
//! - Database access and migrations

pub mod advisor;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;

/// Test utilities including a mock chat-completions server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisor::{
    format_financial_context, send_advisory_message, system_prompt, AdvisorConfig,
    AdvisorySession, ChatBackend, ChatClient, FinancialContext, GenerationOptions, MockBackend,
    OpenAICompatibleBackend, PromptMessage,
};
pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
pub use ledger::{
    allocate_payment, allocate_payment_for, apply_payment, compute_aggregates,
    monthly_payment_history, Ledger, MissingDebtPolicy, MAX_HISTORY_MONTHS,
};
pub use models::{
    Aggregates, ChatMessage, ChatRole, Debt, DebtUpdate, MonthlyTotal, NewDebt, NewPayment,
    Payment, PaymentAllocation,
};
