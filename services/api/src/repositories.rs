//! Repositories for database operations
//!
//! Repositories return `anyhow::Result`; handlers decide which failures are
//! the client's fault. Anything that writes more than one row runs inside a
//! transaction.

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::{PgExecutor, PgPool};
use tracing::info;

use crate::models::{
    pagination::PageRequest,
    user::{CreateUserRequest, User, UserResponse},
};

pub mod cart;
pub mod favorite;
pub mod ingredient;
pub mod recipe;
pub mod subscription;
pub mod tag;

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, password_hash, \
                            is_superuser, is_blocked, created_at";

/// The registration field a failed insert collided on, if any
///
/// Covers the window between the uniqueness lookup and the insert, where a
/// concurrent registration can claim the same email or username.
pub fn unique_user_field(err: &anyhow::Error) -> Option<&'static str> {
    let db_err = match err.downcast_ref::<sqlx::Error>()? {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => db_err,
        _ => return None,
    };
    match db_err.constraint()? {
        "users_email_key" | "users_email_lower_key" => Some("email"),
        "users_username_key" => Some("username"),
        _ => None,
    }
}

/// Profile columns of `users u`, with `is_subscribed` relative to `$1`
const PROFILE_SELECT: &str = r#"
    SELECT u.id, u.email, u.username, u.first_name, u.last_name,
           EXISTS (
               SELECT 1 FROM subscriptions s
               WHERE s.author_id = u.id AND s.user_id = $1
           ) AS is_subscribed
    FROM users u
"#;

/// Load the profiles of `ids` as seen by `viewer`
pub(crate) async fn fetch_profiles<'e, E>(
    executor: E,
    ids: &[i64],
    viewer: Option<i64>,
) -> Result<Vec<UserResponse>>
where
    E: PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let profiles = sqlx::query_as::<_, UserResponse>(&format!(
        "{PROFILE_SELECT} WHERE u.id = ANY($2)"
    ))
    .bind(viewer)
    .bind(ids)
    .fetch_all(executor)
    .await?;

    Ok(profiles)
}

/// Hash a password with Argon2 and a fresh salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, new_user: &CreateUserRequest) -> Result<User> {
        info!("Creating new user: {}", new_user.username);

        let password_hash = hash_password(&new_user.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Which unique field, if any, an email/username pair collides on
    pub async fn find_conflict(&self, email: &str, username: &str) -> Result<Option<&'static str>> {
        let row: Option<(bool, bool)> = sqlx::query_as(
            r#"
            SELECT LOWER(email) = LOWER($1), username = $2
            FROM users
            WHERE LOWER(email) = LOWER($1) OR username = $2
            ORDER BY (LOWER(email) = LOWER($1)) DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(email_taken, _)| if email_taken { "email" } else { "username" }))
    }

    /// Find a user by email, ignoring case
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Verify a user's password
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);

        Ok(result.is_ok())
    }

    /// Replace a user's password
    pub async fn set_password(&self, id: i64, password: &str) -> Result<()> {
        info!("Changing password for user: {}", id);

        let password_hash = hash_password(password)?;
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Whether a user may edit content they do not own
    pub async fn is_superuser(&self, id: i64) -> Result<bool> {
        let is_superuser: Option<bool> =
            sqlx::query_scalar("SELECT is_superuser FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(is_superuser.unwrap_or(false))
    }

    /// Public profile of a user as seen by `viewer`
    pub async fn profile(&self, id: i64, viewer: Option<i64>) -> Result<Option<UserResponse>> {
        Ok(fetch_profiles(&self.pool, &[id], viewer).await?.pop())
    }

    /// Page through all users, newest first
    pub async fn list_profiles(
        &self,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<(Vec<UserResponse>, i64)> {
        let users = sqlx::query_as::<_, UserResponse>(&format!(
            "{PROFILE_SELECT} ORDER BY u.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(viewer)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((users, count))
    }
}
