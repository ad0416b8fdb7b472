//! User repository for database operations.

use domain::models::User;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::user::UserEntity;
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str = "id, email, name, password_hash, organization_id, role, \
     invite_pending, is_active, created_at, last_login";

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1 AND is_active = TRUE
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    /// Find a user by email address (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE LOWER(email) = LOWER($1) AND is_active = TRUE
            "#,
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    /// Find the pending ghost user of an organization, if one exists.
    pub async fn find_ghost_by_org(&self, org_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("find_ghost_by_org");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE organization_id = $1 AND invite_pending = TRUE AND is_active = TRUE
            ORDER BY created_at
            LIMIT 1
            "#,
        ))
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    /// Record a successful login.
    pub async fn record_login(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("record_login");
        let result = sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();

        result.map(|_| ())
    }
}
