/// User account records
///
/// Accounts are read by the authentication service and written only at
/// provisioning time. The tables keep the legacy layout so existing rows (and
/// their `$2a$10$` bcrypt hashes) work unchanged.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     username VARCHAR(50) NOT NULL UNIQUE,
///     password VARCHAR(100) NOT NULL,
///     enabled BOOLEAN NOT NULL DEFAULT TRUE
/// );
///
/// CREATE TABLE user_roles (
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role VARCHAR(50) NOT NULL,
///     PRIMARY KEY (user_id, role)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tokengate_shared::models::user::{CreateUser, UserRecord};
/// use tokengate_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let user = UserRecord::create(
///     &pool,
///     CreateUser {
///         username: "admin".to_string(),
///         password_hash: "$2a$10$...".to_string(),
///         enabled: true,
///         roles: vec!["ADMIN".to_string(), "USER".to_string()],
///     },
/// )
/// .await?;
///
/// let found = UserRecord::find_by_username(&pool, "admin").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Columns selected for every lookup; roles are aggregated in name order
const SELECT_USER: &str = r#"
    SELECT u.id,
           u.username,
           u.password AS password_hash,
           u.enabled,
           COALESCE(
               array_agg(r.role::TEXT ORDER BY r.role) FILTER (WHERE r.role IS NOT NULL),
               ARRAY[]::TEXT[]
           ) AS roles
    FROM users u
    LEFT JOIN user_roles r ON r.user_id = u.id
"#;

/// A user account with its roles
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    /// Unique user id
    pub id: i64,

    /// Unique login name
    pub username: String,

    /// Self-describing password hash (bcrypt or argon2id)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Disabled accounts cannot log in
    pub enabled: bool,

    /// Flat role list; empty means "use the configured defaults"
    pub roles: Vec<String>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("enabled", &self.enabled)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Input for provisioning a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Login name (must be unique)
    pub username: String,

    /// Already-hashed password, never plaintext
    pub password_hash: String,

    /// Whether the account may log in
    pub enabled: bool,

    /// Roles to attach
    pub roles: Vec<String>,
}

impl UserRecord {
    /// Inserts a user and its roles in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the username is taken or the database fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (username, password, enabled)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(data.enabled)
        .fetch_one(&mut *tx)
        .await?;

        let mut roles = data.roles;
        roles.sort();
        roles.dedup();

        if !roles.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role)
                SELECT $1, unnest($2::TEXT[])
                "#,
            )
            .bind(id)
            .bind(&roles)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Self {
            id,
            username: data.username,
            password_hash: data.password_hash,
            enabled: data.enabled,
            roles,
        })
    }

    /// Finds a user by exact username
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("{SELECT_USER} WHERE u.username = $1 GROUP BY u.id");

        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("{SELECT_USER} WHERE u.id = $1 GROUP BY u.id");

        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Enables or disables an account
    ///
    /// Returns `true` if a row was updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn set_enabled(pool: &PgPool, id: i64, enabled: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET enabled = $2 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user (roles cascade)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
