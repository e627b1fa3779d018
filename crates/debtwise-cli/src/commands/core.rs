//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_advisor_config` / `advisor_client` - Advisor settings
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use debtwise_core::{AdvisorConfig, ChatBackend, ChatClient, Database};
use tracing::warn;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Load advisor settings, falling back to defaults if the file is invalid
pub fn load_advisor_config() -> AdvisorConfig {
    AdvisorConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Invalid advisor config, using defaults");
        AdvisorConfig::default()
    })
}

/// Chat client configured from the environment
pub fn advisor_client(config: &AdvisorConfig) -> Result<ChatClient> {
    let client = ChatClient::from_config(config).context(
        "Advisor not configured (set OPENAI_COMPATIBLE_HOST or OPENAI_API_KEY, or AI_BACKEND=mock)",
    )?;
    tracing::debug!(host = client.host(), model = client.model(), "Advisor client ready");
    Ok(client)
}

/// Parse a YYYY-MM-DD date, or use today's date when none is given
pub fn parse_date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", s)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a debt: debtwise debts add Visa --amount 1500 --monthly-payment 75 --rate 19.9");
    println!("  2. Record a payment: debtwise payments add 1 100");
    println!("  3. Start web UI: debtwise serve");

    Ok(())
}
