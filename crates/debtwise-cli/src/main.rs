//! Debtwise CLI - Debt payoff tracker
//!
//! Usage:
//!   debtwise init                          Initialize database
//!   debtwise debts add Visa -a 1500 -m 75  Add a debt
//!   debtwise payments add 1 100            Record a payment
//!   debtwise chat "Which debt first?"      Ask the advisor
//!   debtwise serve --port 3000             Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Debts { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(DebtsAction::List) => commands::cmd_debts_list(&db, &cli.user),
                Some(DebtsAction::Add {
                    name,
                    amount,
                    monthly_payment,
                    rate,
                }) => commands::cmd_debts_add(&db, &cli.user, &name, amount, monthly_payment, rate),
                Some(DebtsAction::Show { id }) => commands::cmd_debts_show(&db, &cli.user, id),
                Some(DebtsAction::Delete { id }) => commands::cmd_debts_delete(&db, &cli.user, id),
            }
        }
        Commands::Payments { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_payments_list(&db, &cli.user, None, 20),
                Some(PaymentsAction::List { debt, limit }) => {
                    commands::cmd_payments_list(&db, &cli.user, debt, limit)
                }
                Some(PaymentsAction::Add {
                    debt_id,
                    amount,
                    date,
                    note,
                    key,
                }) => {
                    let config = commands::load_advisor_config();
                    let date = commands::parse_date_or_today(date.as_deref())?;
                    commands::cmd_payments_add(
                        &db,
                        &cli.user,
                        commands::PaymentArgs {
                            debt_id,
                            amount,
                            date,
                            note,
                            key,
                        },
                        config.missing_debt_policy,
                    )
                }
            }
        }
        Commands::Dashboard { json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_dashboard(&db, &cli.user, json)
        }
        Commands::History { months } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let today = chrono::Local::now().date_naive();
            commands::cmd_history(&db, &cli.user, today, months)
        }
        Commands::Chat { message } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_advisor_config();
            let client = commands::advisor_client(&config)?;
            commands::cmd_chat(&db, &cli.user, &client, &config, &message).await
        }
        Commands::ChatLog { clear } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_chat_log(&db, &cli.user, clear)
        }
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                no_auth,
                cli.no_encrypt,
                static_dir.as_deref(),
            )
            .await
        }
    }
}
