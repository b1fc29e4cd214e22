//! Durable session storage backed by SQLite.
//!
//! Two keys survive process restarts: `jwt` (the bearer token) and
//! `username` (the sign-in identifier, kept for the welcome fallback).
//! Writes are transactional so the pair is stored or cleared atomically.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

const KEY_JWT: &str = "jwt";
const KEY_USERNAME: &str = "username";

/// A signed-in session: the token plus the identifier it was obtained with.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub username: String,
}

pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Persist both keys atomically, replacing any previous session.
    pub fn save(&mut self, session: &Session) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO session (key, value) VALUES (?1, ?2)",
            params![KEY_JWT, session.token],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO session (key, value) VALUES (?1, ?2)",
            params![KEY_USERNAME, session.username],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// The stored session, if a token is present. A missing username row
    /// degrades to an empty string rather than discarding the token.
    pub fn current(&self) -> Result<Option<Session>> {
        let token = self.get(KEY_JWT)?;
        match token {
            Some(token) => {
                let username = self.get(KEY_USERNAME)?.unwrap_or_default();
                Ok(Some(Session { token, username }))
            }
            None => Ok(None),
        }
    }

    /// Remove both keys atomically.
    pub fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM session WHERE key IN (?1, ?2)",
            params![KEY_JWT, KEY_USERNAME],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM session WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}
