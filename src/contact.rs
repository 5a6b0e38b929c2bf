use crate::error::ContactError;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    subject     TEXT NOT NULL,
    message     TEXT NOT NULL,
    created_at  TEXT NOT NULL
)";

/// A contact form submission as received.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Trimmed copy, or an error if any field is blank.
    fn validated(&self) -> Result<Self, ContactError> {
        let trimmed = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        };

        let fields = [&trimmed.name, &trimmed.email, &trimmed.subject, &trimmed.message];
        if fields.iter().any(|f| f.is_empty()) {
            return Err(ContactError::InvalidInput("All fields are required.".to_string()));
        }
        Ok(trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredContact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only log of contact form submissions, one row per message.
#[derive(Clone)]
pub struct ContactLog {
    conn: Arc<Mutex<Connection>>,
}

impl ContactLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContactError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening contact log at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, ContactError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, ContactError> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Validates and stores one submission.
    pub async fn submit(&self, message: ContactMessage) -> Result<StoredContact, ContactError> {
        let message = message.validated()?;
        let conn = Arc::clone(&self.conn);

        let stored = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO contacts (name, email, subject, message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.name,
                    message.email,
                    message.subject,
                    message.message,
                    created_at
                ],
            )?;

            Ok::<_, rusqlite::Error>(StoredContact {
                id: conn.last_insert_rowid(),
                name: message.name,
                email: message.email,
                subject: message.subject,
                message: message.message,
                created_at,
            })
        })
        .await??;

        debug!("Stored contact message {} from {}", stored.id, stored.email);
        Ok(stored)
    }

    /// All stored submissions, oldest first.
    pub async fn entries(&self) -> Result<Vec<StoredContact>, ContactError> {
        let conn = Arc::clone(&self.conn);
        let rows = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            let mut stmt = conn.prepare(
                "SELECT id, name, email, subject, message, created_at FROM contacts ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(StoredContact {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        subject: row.get(3)?,
                        message: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, rusqlite::Error>(rows)
        })
        .await??;
        Ok(rows)
    }
}
