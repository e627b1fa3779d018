//! Advisor conversation commands

use anyhow::{Context, Result};
use debtwise_core::{AdvisorConfig, AdvisorySession, ChatClient, ChatRole, Database};

/// Send one message in the user's stored conversation and print the reply.
///
/// The exchange is saved even when the advisor fails.
pub async fn cmd_chat(
    db: &Database,
    user: &str,
    client: &ChatClient,
    config: &AdvisorConfig,
    message: &str,
) -> Result<()> {
    let log = db.list_chat_messages(user)?;
    let stored = log.len();
    let context = db.load_ledger(user)?.financial_context().render();

    let mut session = AdvisorySession::from_log(log, config.generation_options());
    let result = session.send(client, message, Some(&context)).await;

    db.append_chat_messages(user, &session.log()[stored..])?;

    let reply = result.context("Advisor request failed")?;
    println!();
    println!("🤖 {}", reply);
    println!();

    Ok(())
}

pub fn cmd_chat_log(db: &Database, user: &str, clear: bool) -> Result<()> {
    if clear {
        let cleared = db.clear_chat_messages(user)?;
        println!("🧹 Cleared {} message(s)", cleared);
        return Ok(());
    }

    let messages = db.list_chat_messages(user)?;
    if messages.is_empty() {
        println!("No conversation yet. Ask something with:");
        println!("  debtwise chat \"Which debt should I pay off first?\"");
        return Ok(());
    }

    println!();
    for message in &messages {
        let who = match message.role {
            ChatRole::User => "🧑 You",
            ChatRole::Assistant => "🤖 Advisor",
            ChatRole::System => "⚠️  System",
        };
        println!(
            "{} ({})",
            who,
            message.timestamp.format("%Y-%m-%d %H:%M")
        );
        println!("   {}", message.content);
        println!();
    }

    Ok(())
}
