//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db, config, date parsing)
//! - `debts` - Debt management commands (list, add, show, delete)
//! - `payments` - Payment commands (list, add)
//! - `dashboard` - Dashboard and payment history
//! - `chat` - Advisor conversation commands
//! - `serve` - Web server command

pub mod chat;
pub mod core;
pub mod dashboard;
pub mod debts;
pub mod payments;
pub mod serve;

// Re-export command functions for main.rs
pub use chat::*;
pub use core::*;
pub use dashboard::*;
pub use debts::*;
pub use payments::*;
pub use serve::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
