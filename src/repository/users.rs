//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Sqlite>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_staff, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (case-insensitive)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_staff, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Insert a user and return it
    pub async fn create(
        &self,
        username: &str,
        password_hash: Option<&str>,
        is_staff: bool,
    ) -> AppResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, is_staff, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(is_staff)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => self.get_by_id(done.last_insert_rowid()).await,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!("A user named {} already exists", username),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Set password and staff flag of an existing user
    pub async fn update_credentials(
        &self,
        id: i64,
        password_hash: &str,
        is_staff: bool,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = ?, is_staff = ? WHERE id = ?")
            .bind(password_hash)
            .bind(is_staff)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
