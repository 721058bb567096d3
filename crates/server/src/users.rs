//! Accounts and the roster
//!
//! Users register with tagged credentials. The wire form of the username is
//! what the roster hands out; uniqueness and login are checked against the
//! decoded name, since two tokens of the same name never compare equal.
//! All user data lives in SQLite at `local/users.sqlite`.

use std::path::Path;
use std::str::FromStr;

use bcrypt::{hash, verify};
use chrono::Utc;
use serde::Serialize;
use spectralink_core::codec::{self, Decoded};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

pub type Result<T> = std::result::Result<T, UserError>;

/// Registered account, without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    /// Username as registered (usually a tagged token)
    pub username: String,
    /// Decoded username
    pub display_name: String,
    pub created_at: String,
}

pub struct UserManager {
    pool: SqlitePool,
    cost: u32,
}

impl UserManager {
    pub async fn new(db_path: &Path, cost: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite://{}",
            db_path.to_string_lossy().replace('\\', "/")
        ))?
        .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                display_name TEXT UNIQUE NOT NULL,
                email TEXT,
                phone TEXT,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_login TEXT
            )
            "#,
        )
        .execute(&pool)
        .await?;

        info!("[Users] Initialized at {:?}", db_path);
        Ok(Self { pool, cost })
    }

    /// Register a user. `username` and `password` may be tagged or plain.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User> {
        let display_name = credential("username", username)?;
        if display_name.trim().is_empty() {
            return Err(UserError::Invalid("username is required".into()));
        }
        let password = credential("password", password)?;
        if password.is_empty() {
            return Err(UserError::Invalid("password is required".into()));
        }

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE display_name = ?")
                .bind(&display_name)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            warn!("[Users] Duplicate registration for {}", display_name);
            return Err(UserError::UsernameTaken);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            display_name,
            created_at: Utc::now().to_rfc3339(),
        };
        let password_hash = hash(&password, self.cost)?;

        sqlx::query(
            "INSERT INTO users (id, username, display_name, email, phone, password_hash, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(email)
        .bind(phone)
        .bind(&password_hash)
        .bind(&user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // Lost a race against a concurrent registration.
            sqlx::Error::Database(db) if db.is_unique_violation() => UserError::UsernameTaken,
            other => UserError::Database(other),
        })?;

        info!("[Users] Registered {}", user.display_name);
        Ok(user)
    }

    /// Verify credentials and return the stored wire username.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let display_name = credential("username", username)?;
        let password = credential("password", password)?;

        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT id, username, password_hash FROM users WHERE display_name = ?",
        )
        .bind(&display_name)
        .fetch_optional(&self.pool)
        .await?;

        let (id, wire_username, password_hash) = row.ok_or(UserError::InvalidCredentials)?;
        if !verify(&password, &password_hash)? {
            warn!("[Users] Failed login attempt for {}", display_name);
            return Err(UserError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(&id)
            .execute(&self.pool)
            .await?;

        info!("[Users] {} logged in", display_name);
        Ok(wire_username)
    }

    /// Wire usernames in registration order.
    pub async fn roster(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT username FROM users ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(username,)| username).collect())
    }
}

/// Decode a tagged credential; plain values pass through.
fn credential(field: &str, value: &str) -> Result<String> {
    match codec::inspect(value) {
        Decoded::Tagged(plain) => Ok(plain),
        Decoded::Plain => Ok(value.to_string()),
        Decoded::Corrupt => Err(UserError::Invalid(format!("malformed {}", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectralink_core::codec::encode;
    use tempfile::TempDir;

    async fn manager(dir: &TempDir) -> UserManager {
        UserManager::new(&dir.path().join("users.sqlite"), 4).await.unwrap()
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let dir = TempDir::new().unwrap();
        let users = manager(&dir).await;

        let wire = encode("alice");
        users
            .register(&wire, &encode("hunter22"), Some(&encode("a@x.io")), None)
            .await
            .unwrap();

        // A fresh token of the same credentials still logs in.
        let stored = users.login(&encode("alice"), &encode("hunter22")).await.unwrap();
        assert_eq!(stored, wire);
    }

    #[tokio::test]
    async fn test_duplicate_by_plaintext_is_rejected() {
        let dir = TempDir::new().unwrap();
        let users = manager(&dir).await;

        users.register(&encode("bob"), "pw1234", None, None).await.unwrap();
        let err = users.register(&encode("bob"), "other1", None, None).await.unwrap_err();
        assert!(matches!(err, UserError::UsernameTaken));
        let err = users.register("bob", "other1", None, None).await.unwrap_err();
        assert!(matches!(err, UserError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let dir = TempDir::new().unwrap();
        let users = manager(&dir).await;
        users.register("carol", "right-pw", None, None).await.unwrap();

        let err = users.login("carol", &encode("wrong-pw")).await.unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));
        let err = users.login("nobody", "right-pw").await.unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_roster_keeps_registration_order() {
        let dir = TempDir::new().unwrap();
        let users = manager(&dir).await;
        let alice = encode("alice");
        users.register(&alice, "pw1234", None, None).await.unwrap();
        users.register("bob", "pw1234", None, None).await.unwrap();

        assert_eq!(users.roster().await.unwrap(), vec![alice, "bob".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_credential_is_invalid() {
        let dir = TempDir::new().unwrap();
        let users = manager(&dir).await;
        let err = users
            .register("🔒[0123456789abcdef0123456789abcdef]!!", "pw1234", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Invalid(_)));
    }
}
