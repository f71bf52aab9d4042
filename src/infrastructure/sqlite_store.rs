use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;

use crate::core::{FilmId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::traits::DocumentStore;
use crate::models::{FavoriteRecord, UserCredentials, UserDocument};

/// SQLite implementation of the per-user document store
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Configuration(format!("Invalid database url {}: {}", url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to ":memory:" opens its own database, so pin those to one.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to {}: {}", url, e)))?;

        let store = Self { pool };
        store.initialize().await?;
        info!("Document store ready at {}", url);
        Ok(store)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Create tables if they do not exist yet
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                uid TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS friends (
                owner_uid TEXT NOT NULL REFERENCES users(uid),
                friend_uid TEXT NOT NULL,
                PRIMARY KEY (owner_uid, friend_uid)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create friends table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS favorites (
                uid TEXT NOT NULL,
                film_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                poster_url TEXT,
                PRIMARY KEY (uid, film_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create favorites table: {}", e)))?;

        Ok(())
    }

    async fn friends_of(&self, uid: &UserId) -> AppResult<Vec<UserId>> {
        let rows = sqlx::query("SELECT friend_uid FROM friends WHERE owner_uid = ? ORDER BY rowid")
            .bind(uid.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list friends of {}: {}", uid, e)))?;

        Ok(rows
            .into_iter()
            .map(|row| UserId::new(row.get::<String, _>("friend_uid")))
            .collect())
    }

    async fn hydrate_user(&self, row: SqliteRow) -> AppResult<UserDocument> {
        let uid = UserId::new(row.get::<String, _>("uid"));
        let created_millis: i64 = row.get("created_at");
        let friends = self.friends_of(&uid).await?;

        Ok(UserDocument {
            uid,
            username: row.get("username"),
            full_name: row.get("full_name"),
            friends,
            created_at: DateTime::<Utc>::from_timestamp_millis(created_millis).unwrap_or_default(),
        })
    }

    async fn ensure_user(&self, uid: &UserId) -> AppResult<()> {
        let exists = sqlx::query("SELECT 1 FROM users WHERE uid = ?")
            .bind(uid.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to look up user {}: {}", uid, e)))?;

        match exists {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("user {}", uid))),
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create_user(&self, doc: &UserDocument, credentials: &UserCredentials) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (uid, username, full_name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(doc.uid.as_str())
        .bind(&doc.username)
        .bind(&doc.full_name)
        .bind(&credentials.email)
        .bind(&credentials.password_hash)
        .bind(doc.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("username or email is already registered".to_string())
            }
            _ => AppError::Database(format!("Failed to create user {}: {}", doc.uid, e)),
        })?;
        Ok(())
    }

    async fn get_user(&self, uid: &UserId) -> AppResult<Option<UserDocument>> {
        let row = sqlx::query("SELECT uid, username, full_name, created_at FROM users WHERE uid = ?")
            .bind(uid.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user {}: {}", uid, e)))?;

        match row {
            Some(row) => Ok(Some(self.hydrate_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserDocument>> {
        let row =
            sqlx::query("SELECT uid, username, full_name, created_at FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to find username {}: {}", username, e))
                })?;

        match row {
            Some(row) => Ok(Some(self.hydrate_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>> {
        let row = sqlx::query("SELECT uid, email, password_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to find email {}: {}", email, e)))?;

        Ok(row.map(|row| UserCredentials {
            uid: UserId::new(row.get::<String, _>("uid")),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
        }))
    }

    async fn add_friend_ref(&self, owner: &UserId, friend: &UserId) -> AppResult<()> {
        self.ensure_user(owner).await?;
        sqlx::query("INSERT OR IGNORE INTO friends (owner_uid, friend_uid) VALUES (?, ?)")
            .bind(owner.as_str())
            .bind(friend.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to add friend {} to {}: {}", friend, owner, e))
            })?;
        Ok(())
    }

    async fn remove_friend_ref(&self, owner: &UserId, friend: &UserId) -> AppResult<()> {
        self.ensure_user(owner).await?;
        sqlx::query("DELETE FROM friends WHERE owner_uid = ? AND friend_uid = ?")
            .bind(owner.as_str())
            .bind(friend.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to remove friend {} from {}: {}",
                    friend, owner, e
                ))
            })?;
        Ok(())
    }

    async fn list_favorites(&self, uid: &UserId) -> AppResult<Vec<FavoriteRecord>> {
        let rows = sqlx::query(
            "SELECT film_id, title, poster_url FROM favorites WHERE uid = ? ORDER BY rowid",
        )
        .bind(uid.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list favorites of {}: {}", uid, e)))?;

        Ok(rows
            .into_iter()
            .map(|row| FavoriteRecord {
                id: FilmId::new(row.get("film_id")),
                title: row.get("title"),
                poster_url: row.get("poster_url"),
            })
            .collect())
    }

    async fn upsert_favorite(&self, uid: &UserId, favorite: &FavoriteRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO favorites (uid, film_id, title, poster_url) VALUES (?, ?, ?, ?)
            ON CONFLICT (uid, film_id) DO UPDATE SET title = excluded.title, poster_url = excluded.poster_url
            "#,
        )
        .bind(uid.as_str())
        .bind(favorite.id.value())
        .bind(&favorite.title)
        .bind(&favorite.poster_url)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to save favorite {} for {}: {}", favorite.id, uid, e))
        })?;
        Ok(())
    }

    async fn delete_favorite(&self, uid: &UserId, id: FilmId) -> AppResult<()> {
        sqlx::query("DELETE FROM favorites WHERE uid = ? AND film_id = ?")
            .bind(uid.as_str())
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to delete favorite {} for {}: {}", id, uid, e))
            })?;
        Ok(())
    }
}
