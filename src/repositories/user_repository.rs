use crate::models::User;
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for user data access
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    pub async fn create(&self, name: &str, email: &str) -> SqlxResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a user by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a user by email address
    pub async fn find_by_email(&self, email: &str) -> SqlxResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find or create a user by email (upsert pattern)
    /// Returns the user whether it was created or already existed
    pub async fn find_or_create(&self, name: &str, email: &str) -> SqlxResult<User> {
        if let Some(user) = self.find_by_email(email).await? {
            return Ok(user);
        }

        self.create(name, email).await
    }
}
