//! Advisory conversation session
//!
//! The session owns the visible conversation log. Each exchange appends the
//! user's message, then either the assistant reply or a single system entry
//! describing the failure. Failed exchanges are not retried.

use tracing::{debug, warn};

use super::{ChatBackend, GenerationOptions, PromptMessage};
use crate::error::{Error, Result};
use crate::models::{ChatMessage, ChatRole};

/// Instruction sent ahead of every conversation, with the financial summary
/// (or "None") embedded.
pub fn system_prompt(context: Option<&str>) -> String {
    format!(
        "You are a helpful and empathetic financial advisor specializing in debt management. \n\
Your role is to provide practical advice and emotional support to help users overcome their debt.\n\
\n\
Here is gathered debt information: \n\
{}\n\
\n\
Based on this information, provide specific, actionable advice that takes into account the user's current financial situation. \n\
Focus on:\n\
1. Practical steps to manage and reduce debt\n  - Especially which debt should be tackled first\n\
2. Strategies to optimize interest payments\n\
3. Budgeting advice to maintain payments\n\
4. Specific recommendations based on their debt composition\n\
\n\
Format your response using markdown:\n\
- Use **bold** for important points\n\
- Use numbered lists (1., 2., etc.) for steps\n\
- Use bullet points for lists of items\n\
- Use *italics* for emphasis\n\
\n\
Keep responses clear, encouraging, and focused on achievable goals. Explain your reasoning.",
        context.unwrap_or("None")
    )
}

/// Build the message list: instruction, prior user/assistant turns, new message.
/// System log entries (failure notices) are local and never sent.
fn build_messages(
    history: &[ChatMessage],
    user_message: &str,
    context: Option<&str>,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(system_prompt(context)));

    for entry in history {
        match entry.role {
            ChatRole::User => messages.push(PromptMessage::user(entry.content.clone())),
            ChatRole::Assistant => {
                messages.push(PromptMessage::assistant(entry.content.clone()))
            }
            ChatRole::System => {}
        }
    }

    messages.push(PromptMessage::user(user_message));
    messages
}

/// Ask the advisor one question without touching any log
pub async fn send_advisory_message<B: ChatBackend + ?Sized>(
    backend: &B,
    history: &[ChatMessage],
    user_message: &str,
    context: Option<&str>,
    options: &GenerationOptions,
) -> Result<String> {
    if user_message.trim().is_empty() {
        return Err(Error::Validation("message is required".into()));
    }

    let messages = build_messages(history, user_message, context);
    debug!(
        model = backend.model(),
        messages = messages.len(),
        has_context = context.is_some(),
        "Sending advisor request"
    );

    backend.chat(&messages, options).await.map_err(|e| match e {
        Error::AdvisoryUnavailable(_) => e,
        other => Error::AdvisoryUnavailable(other.to_string()),
    })
}

/// A user's conversation with the advisor
#[derive(Debug, Clone, Default)]
pub struct AdvisorySession {
    log: Vec<ChatMessage>,
    options: GenerationOptions,
}

impl AdvisorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GenerationOptions) -> Self {
        Self {
            log: Vec::new(),
            options,
        }
    }

    /// Resume a conversation from a stored log
    pub fn from_log(log: Vec<ChatMessage>, options: GenerationOptions) -> Self {
        Self { log, options }
    }

    pub fn log(&self) -> &[ChatMessage] {
        &self.log
    }

    pub fn into_log(self) -> Vec<ChatMessage> {
        self.log
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Send a message and record the exchange in the log.
    ///
    /// On failure the log gains one system entry with the error text and the
    /// error is returned as [`Error::AdvisoryUnavailable`]. A blank message is
    /// rejected without touching the log.
    pub async fn send<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        user_message: &str,
        context: Option<&str>,
    ) -> Result<String> {
        if user_message.trim().is_empty() {
            return Err(Error::Validation("message is required".into()));
        }

        let result =
            send_advisory_message(backend, &self.log, user_message, context, &self.options)
                .await;

        match result {
            Ok(reply) => {
                self.log.push(ChatMessage::user(user_message));
                self.log.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                let reason = match e {
                    Error::AdvisoryUnavailable(msg) => msg,
                    other => other.to_string(),
                };
                Err(self.record_failure(user_message, &reason))
            }
        }
    }

    /// Record a message the advisor could not answer: the user entry followed
    /// by a system entry with the error text. Returns the error to report.
    pub fn record_failure(&mut self, user_message: &str, reason: &str) -> Error {
        warn!(error = %reason, "Advisor request failed");
        self.log.push(ChatMessage::user(user_message));
        self.log
            .push(ChatMessage::system(format!("Error: {}. Please try again.", reason)));
        Error::AdvisoryUnavailable(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::MockBackend;

    #[test]
    fn test_system_prompt_embeds_context() {
        let prompt = system_prompt(Some("Current Financial Situation:\n- Total Debt: $5.00\n"));
        assert!(prompt.starts_with("You are a helpful and empathetic financial advisor"));
        assert!(prompt.contains("Here is gathered debt information: \nCurrent Financial Situation:"));
        assert!(prompt.ends_with("Explain your reasoning."));
    }

    #[test]
    fn test_system_prompt_without_context() {
        let prompt = system_prompt(None);
        assert!(prompt.contains("Here is gathered debt information: \nNone\n"));
    }

    #[tokio::test]
    async fn test_send_appends_user_and_assistant() {
        let backend = MockBackend::with_reply("Pay the Visa first.");
        let mut session = AdvisorySession::new();

        let reply = session.send(&backend, "What now?", None).await.unwrap();

        assert_eq!(reply, "Pay the Visa first.");
        assert_eq!(session.log().len(), 2);
        assert_eq!(session.log()[0].role, ChatRole::User);
        assert_eq!(session.log()[0].content, "What now?");
        assert_eq!(session.log()[1].role, ChatRole::Assistant);
        assert_eq!(session.log()[1].content, "Pay the Visa first.");
    }

    #[tokio::test]
    async fn test_failure_appends_one_system_entry() {
        let backend = MockBackend::failing("connection refused");
        let mut session = AdvisorySession::new();

        let err = session.send(&backend, "Help", Some("ctx")).await.unwrap_err();

        assert!(matches!(err, Error::AdvisoryUnavailable(_)));
        let roles: Vec<ChatRole> = session.log().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::System]);
        assert_eq!(
            session.log()[1].content,
            "Error: connection refused. Please try again."
        );
        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn test_record_failure_without_backend() {
        let mut session = AdvisorySession::new();

        let err = session.record_failure("Anyone there?", "Advisor not configured");

        assert!(matches!(err, Error::AdvisoryUnavailable(ref msg) if msg == "Advisor not configured"));
        assert_eq!(session.log().len(), 2);
        assert_eq!(session.log()[0].role, ChatRole::User);
        assert_eq!(session.log()[0].content, "Anyone there?");
        assert_eq!(session.log()[1].role, ChatRole::System);
        assert_eq!(
            session.log()[1].content,
            "Error: Advisor not configured. Please try again."
        );
    }

    #[tokio::test]
    async fn test_message_sequence_skips_system_entries() {
        let backend = MockBackend::with_reply("ok");
        let history = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("answer"),
            ChatMessage::user("second"),
            ChatMessage::system("Error: timeout. Please try again."),
        ];
        let mut session = AdvisorySession::from_log(history, GenerationOptions::default());

        session.send(&backend, "third", Some("ctx")).await.unwrap();

        let calls = backend.calls();
        let sent = &calls[0];
        let roles: Vec<&str> = sent.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user", "user"]);
        assert!(sent[0].content.contains("ctx"));
        assert_eq!(sent.last().unwrap().content, "third");
        assert_eq!(session.log().len(), 6);
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let backend = MockBackend::new();
        let mut session = AdvisorySession::new();

        let err = session.send(&backend, "   ", None).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(session.log().is_empty());
        assert!(backend.calls().is_empty());
    }
}
