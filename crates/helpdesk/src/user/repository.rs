//! User repository for database operations.

use anyhow::{Context, Result, bail};
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::{CreateUserRequest, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user. `request.password` must already be hashed.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create(&self, request: &CreateUserRequest) -> Result<User> {
        debug!("Creating user: {} ({})", request.username, request.email);

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, username, is_staff, is_superuser)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.email)
        .bind(&request.password)
        .bind(&request.username)
        .bind(request.is_staff)
        .bind(request.is_superuser)
        .execute(&self.pool)
        .await;

        // A concurrent registration can win between the availability check and here.
        match inserted {
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                bail!("User with email '{}' already exists.", request.email);
            }
            other => {
                other.context("Failed to insert user")?;
            }
        }

        self.get_by_email(&request.email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after creation"))
    }

    /// Get a user by email.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, created_at, email, password_hash, username, is_staff, is_superuser
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        Ok(user)
    }

    /// Check if an email is available.
    #[instrument(skip(self))]
    pub async fn is_email_available(&self, email: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check email availability")?;

        Ok(count.0 == 0)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;

        Ok(count.0)
    }
}
