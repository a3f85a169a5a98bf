//! Identity provider adapter.
//!
//! The notes service only ever talks to accounts through [`IdentityProvider`]:
//! create one, trade credentials for a bearer token, and turn a token back into
//! the identity it was issued to. [`SqliteIdentityProvider`] keeps accounts and
//! issued tokens next to the notes; the in-memory provider lives in
//! [`crate::memory`].

use anyhow::Context;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::sqlite::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::structs::Identity;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Error, Debug)]
pub enum IdentityError {
    /// The provider refused to create the account.
    #[error("{0}")]
    Rejected(String),
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

#[rocket::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, IdentityError>;

    async fn authenticate(&self, credentials: &Credentials) -> Result<(Identity, String), IdentityError>;

    async fn verify(&self, token: &str) -> Result<Identity, IdentityError>;
}

pub const DUPLICATE_EMAIL: &str = "User already registered";

/// Hash a password with Argon2id into a PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// `Ok(false)` on mismatch, `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking pool, off the async workers.
pub async fn hash_password_blocking(password: &str) -> anyhow::Result<String> {
    let password = password.to_string();
    rocket::tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(password: &str, hash: &str) -> anyhow::Result<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    rocket::tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .context("Password verification task failed")?
}

/// When a token issued now stops being accepted.
pub fn token_expiry(token_ttl: Duration) -> anyhow::Result<DateTime<Utc>> {
    Utc::now()
        .checked_add_signed(token_ttl)
        .with_context(|| format!("Token lifetime of {}s is out of range", token_ttl.num_seconds()))
}

/// 256 random bits, hex encoded.
pub fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// SQLite //////////////////////////////////////////////////////////////////////////////////////////

pub struct SqliteIdentityProvider {
    pool: SqlitePool,
    token_ttl: Duration,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    display_name: String,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    email: String,
    display_name: String,
    expires_at: i64,
}

impl SqliteIdentityProvider {
    pub fn new(pool: SqlitePool, token_ttl: Duration) -> Self {
        Self { pool, token_ttl }
    }
}

#[rocket::async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, IdentityError> {
        let password_hash = hash_password_blocking(password).await?;
        let id = Uuid::new_v4().to_string();

        let inserted = sqlx::query(
            r#"
            INSERT INTO users ( id, email, password_hash, display_name, created_at )
            VALUES ( ?1, ?2, ?3, ?4, ?5 )
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(&password_hash)
        .bind(display_name)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(Identity {
                id,
                email: email.to_string(),
                display_name: display_name.to_string(),
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(IdentityError::Rejected(DUPLICATE_EMAIL.into()))
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed creating user").into()),
        }
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<(Identity, String), IdentityError> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, display_name
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(&credentials.email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed looking up user")?
        .ok_or(IdentityError::InvalidCredentials)?;

        if !verify_password_blocking(&credentials.password, &user.password_hash).await? {
            return Err(IdentityError::InvalidCredentials);
        }

        let token = new_token();
        let expires_at = token_expiry(self.token_ttl)?.timestamp_millis();

        sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await
            .context("Failed purging expired sessions")?;

        sqlx::query(
            r#"
            INSERT INTO sessions ( token, user_id, expires_at )
            VALUES ( ?1, ?2, ?3 )
            "#,
        )
        .bind(&token)
        .bind(&user.id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .context("Failed storing session")?;

        let identity = Identity {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
        };
        Ok((identity, token))
    }

    async fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let session = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT users.id, users.email, users.display_name, sessions.expires_at
            FROM sessions
            JOIN users ON users.id = sessions.user_id
            WHERE sessions.token = ?1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .context("Failed looking up session")?
        .ok_or(IdentityError::InvalidToken)?;

        if session.expires_at <= Utc::now().timestamp_millis() {
            sqlx::query("DELETE FROM sessions WHERE token = ?1")
                .bind(token)
                .execute(&self.pool)
                .await
                .context("Failed removing expired session")?;
            return Err(IdentityError::ExpiredToken);
        }

        Ok(Identity {
            id: session.id,
            email: session.email,
            display_name: session.display_name,
        })
    }
}
