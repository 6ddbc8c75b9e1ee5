use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{is_unique_violation, ApiError};
use crate::users::repo_types::{NewUser, Provider, User};
use crate::users::validate::validate_new_user;

const USER_COLUMNS: &str = "id, name, email, photo, user_type, phone, password_hash, \
     google_id, facebook_id, twitter_id, is_email_verified, password_changed_at, \
     password_reset_token_hash, password_reset_expires_at, role, active, created_at, updated_at";

// Every read goes through these helpers so the soft-delete predicate is a
// store invariant, not something callers opt into.

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND active = TRUE"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Lookup by normalized email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND active = TRUE"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_provider_id(
        db: &PgPool,
        provider: Provider,
        provider_user_id: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {} = $1 AND active = TRUE",
            provider.id_column()
        ))
        .bind(provider_user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a validated record. Unique-index rejections surface as
    /// Conflict so callers can either report "already in use" or retry
    /// as a lookup-and-link.
    pub async fn create(db: &PgPool, new_user: &NewUser) -> Result<User, ApiError> {
        validate_new_user(new_user)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
                 (name, email, user_type, phone, photo, password_hash, \
                  google_id, facebook_id, twitter_id, is_email_verified) \
             VALUES ($1, $2, $3, $4, COALESCE($5, 'default.jpg'), $6, $7, $8, $9, $10) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new_user.name.trim())
        .bind(&new_user.email)
        .bind(new_user.user_type)
        .bind(new_user.phone.as_deref().filter(|p| !p.is_empty()))
        .bind(new_user.photo.as_deref())
        .bind(new_user.password_hash.as_deref())
        .bind(new_user.google_id.as_deref())
        .bind(new_user.facebook_id.as_deref())
        .bind(new_user.twitter_id.as_deref())
        .bind(new_user.is_email_verified)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Email already in use".into())
            } else {
                ApiError::from(e)
            }
        })?;
        Ok(user)
    }

    /// Backfill a provider id onto an existing record (account link).
    pub async fn link_provider(
        db: &PgPool,
        user_id: Uuid,
        provider: Provider,
        provider_user_id: &str,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET {} = $2, is_email_verified = TRUE, updated_at = now() \
             WHERE id = $1 AND active = TRUE \
             RETURNING {USER_COLUMNS}",
            provider.id_column()
        ))
        .bind(user_id)
        .bind(provider_user_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Provider account already linked elsewhere".into())
            } else {
                ApiError::from(e)
            }
        })?;
        Ok(user)
    }

    /// Write a new password hash. Backdates password_changed_at by one
    /// second so tokens issued in the same instant are already stale,
    /// and consumes any pending reset slot.
    pub async fn set_password(db: &PgPool, user_id: Uuid, hash: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET password_hash = $2, \
                 password_changed_at = now() - interval '1 second', \
                 password_reset_token_hash = NULL, \
                 password_reset_expires_at = NULL, \
                 updated_at = now() \
             WHERE id = $1 AND active = TRUE \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Arm the single reset slot. Concurrent requests overwrite it; only
    /// the latest code or ticket verifies.
    pub async fn set_reset_token(
        db: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET password_reset_token_hash = $2, \
                 password_reset_expires_at = $3, updated_at = now() \
             WHERE id = $1 AND active = TRUE",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn clear_reset_token(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET password_reset_token_hash = NULL, \
                 password_reset_expires_at = NULL, updated_at = now() \
             WHERE id = $1 AND active = TRUE",
        )
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Lookup by email and an unexpired reset-slot digest (OTP stage).
    pub async fn find_by_email_and_reset_hash(
        db: &PgPool,
        email: &str,
        token_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE email = $1 AND password_reset_token_hash = $2 \
               AND password_reset_expires_at > now() AND active = TRUE"
        ))
        .bind(email)
        .bind(token_hash)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Lookup by an unexpired reset-slot digest alone (ticket stage).
    pub async fn find_by_reset_hash(
        db: &PgPool,
        token_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE password_reset_token_hash = $1 \
               AND password_reset_expires_at > now() AND active = TRUE"
        ))
        .bind(token_hash)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_profile(
        db: &PgPool,
        user_id: Uuid,
        name: Option<&str>,
        phone: Option<&str>,
        photo: Option<&str>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 phone = COALESCE($3, phone), \
                 photo = COALESCE($4, photo), \
                 updated_at = now() \
             WHERE id = $1 AND active = TRUE \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(name)
        .bind(phone)
        .bind(photo)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Soft delete. The record stays for uniqueness bookkeeping but
    /// disappears from every read path.
    pub async fn deactivate(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET active = FALSE, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE active = TRUE \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
