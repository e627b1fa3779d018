//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `debts` - Debt CRUD
//! - `payments` - Payment recording (transactional) and queries
//! - `chat` - Per-user advisor conversation log
//! - `audit` - API access audit trail
//!
//! Every debt, payment and chat row belongs to a user id; queries never
//! cross users.

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

mod audit;
mod chat;
mod debts;
mod payments;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "DEBTWISE_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"debtwise-salt-v1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let output = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(output.as_bytes()))
}

/// Parse a stored timestamp. Accepts RFC 3339 and SQLite's
/// `CURRENT_TIMESTAMP` format ("YYYY-MM-DD HH:MM:SS").
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a stored calendar date column
pub(crate) fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction, taking the write lock
/// before anything is read.
///
/// Rolls back when `f` fails and also when COMMIT itself fails (for example
/// on a deferred constraint), so the pooled connection is never handed back
/// with a transaction still open.
pub(crate) fn with_write_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    conn.execute("BEGIN IMMEDIATE", [])?;

    let result = f(conn).and_then(|value| {
        conn.execute("COMMIT", [])?;
        Ok(value)
    });

    if result.is_err() && !conn.is_autocommit() {
        let _ = conn.execute("ROLLBACK", []);
    }
    result
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `DEBTWISE_DB_KEY` to be set. Returns an error otherwise; use
    /// `new_unencrypted()` for development and tests.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = match passphrase {
            Some(pass) => {
                let key_pragma = format!("PRAGMA key = 'x\"{}\"';", derive_key(pass)?);
                let manager = manager.with_init(move |conn| conn.execute_batch(&key_pragma));
                Pool::builder().max_size(10).build(manager)?
            }
            None => Pool::builder().max_size(10).build(manager)?,
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` so every pooled
    /// connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "debtwise_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let path = path.to_string_lossy().to_string();

        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the single writer
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            CREATE TABLE IF NOT EXISTS debts (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                monthly_payment REAL NOT NULL DEFAULT 0,
                interest_rate REAL NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_debts_user ON debts(user_id);

            -- No foreign key on debt_id: payments outlive deleted debts
            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                debt_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                note TEXT,
                interest_amount REAL NOT NULL,
                capital_amount REAL NOT NULL,
                idempotency_key TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, idempotency_key)
            );

            CREATE INDEX IF NOT EXISTS idx_payments_user_date ON payments(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_payments_debt ON payments(user_id, debt_id);

            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant', 'system')),
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_messages_user ON chat_messages(user_id, id);

            -- Audit log (tracks all API access)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                user_id TEXT NOT NULL,
                action TEXT NOT NULL,
                entity_type TEXT,
                entity_id INTEGER,
                details TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_audit_log_user ON audit_log(user_id);
            CREATE INDEX IF NOT EXISTS idx_audit_log_timestamp ON audit_log(timestamp);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

/// Audit log entry
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub user_id: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}
