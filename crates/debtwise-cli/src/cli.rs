//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use debtwise_core::MAX_HISTORY_MONTHS;

/// Debtwise - Track debts, record payments and ask for advice
#[derive(Parser)]
#[command(name = "debtwise")]
#[command(about = "Self-hosted debt payoff tracker with an AI advisor", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "debtwise.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set DEBTWISE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// User whose ledger to operate on
    ///
    /// Matches the identity the web server records for requests (the
    /// Cloudflare Access email, or "local-dev" without auth).
    #[arg(long, default_value = "local-dev", global = true)]
    pub user: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Manage debts (defaults to list)
    Debts {
        #[command(subcommand)]
        action: Option<DebtsAction>,
    },

    /// Record and list payments (defaults to list)
    Payments {
        #[command(subcommand)]
        action: Option<PaymentsAction>,
    },

    /// Show totals, debts and recent payments
    Dashboard {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show monthly payment totals
    History {
        /// Number of months to show, ending with the current month (at most 120)
        #[arg(
            short,
            long,
            default_value = "12",
            value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_HISTORY_MONTHS))
        )]
        months: u32,
    },

    /// Ask the advisor a question (continues the stored conversation)
    Chat {
        /// Question for the advisor
        message: String,
    },

    /// Show the stored advisor conversation
    ChatLog {
        /// Clear the conversation instead of showing it
        #[arg(long)]
        clear: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires Cloudflare Access authentication headers
        /// or an API key from DEBTWISE_API_KEYS.
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum DebtsAction {
    /// List debts
    List,

    /// Add a debt
    Add {
        /// Debt name (e.g., "Visa")
        name: String,

        /// Current balance
        #[arg(short, long)]
        amount: f64,

        /// Scheduled monthly payment
        #[arg(short, long)]
        monthly_payment: f64,

        /// Annual interest rate in percent (e.g., 19.9)
        #[arg(short, long, default_value = "0")]
        rate: f64,
    },

    /// Show a debt and its payments
    Show {
        /// Debt ID
        id: i64,
    },

    /// Delete a debt (its payments are kept)
    Delete {
        /// Debt ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum PaymentsAction {
    /// List payments, most recent first
    List {
        /// Only payments for this debt
        #[arg(long)]
        debt: Option<i64>,

        /// Maximum number of payments to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Record a payment against a debt
    Add {
        /// Debt ID
        debt_id: i64,

        /// Amount paid
        amount: f64,

        /// Payment date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,

        /// Idempotency key; repeating it returns the original payment
        #[arg(long)]
        key: Option<String>,
    },
}
