//! Advisor conversation log

use rusqlite::{params, Connection};

use super::{parse_datetime, with_write_transaction, Database};
use crate::error::Result;
use crate::models::{ChatMessage, ChatRole};

fn insert_chat_message(conn: &Connection, user_id: &str, message: &ChatMessage) -> Result<i64> {
    conn.execute(
        "INSERT INTO chat_messages (user_id, role, content, timestamp) VALUES (?, ?, ?, ?)",
        params![
            user_id,
            message.role.as_str(),
            message.content,
            message.timestamp.to_rfc3339()
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Append an entry to a user's conversation log
    pub fn append_chat_message(&self, user_id: &str, message: &ChatMessage) -> Result<i64> {
        let conn = self.conn()?;
        insert_chat_message(&conn, user_id, message)
    }

    /// Append several entries in order, all or none
    pub fn append_chat_messages(&self, user_id: &str, messages: &[ChatMessage]) -> Result<usize> {
        if messages.is_empty() {
            return Ok(0);
        }
        let conn = self.conn()?;

        with_write_transaction(&conn, |conn| {
            for message in messages {
                insert_chat_message(conn, user_id, message)?;
            }
            Ok(messages.len())
        })
    }

    /// A user's conversation log in the order it was written
    pub fn list_chat_messages(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT role, content, timestamp FROM chat_messages WHERE user_id = ? ORDER BY id",
        )?;

        let messages = stmt
            .query_map(params![user_id], |row| {
                let role: String = row.get(0)?;
                let timestamp: String = row.get(2)?;
                Ok(ChatMessage {
                    // The CHECK constraint keeps roles to the known set
                    role: role.parse().unwrap_or(ChatRole::System),
                    content: row.get(1)?,
                    timestamp: parse_datetime(&timestamp),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// Delete a user's conversation log. Returns the number of entries removed.
    pub fn clear_chat_messages(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM chat_messages WHERE user_id = ?", params![user_id])?;
        Ok(removed)
    }
}
