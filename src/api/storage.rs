//! Database access for users, refresh tokens and chirps.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::refresh::{self, RefreshTokenRecord};

/// Outcome when attempting to create a new user row.
#[derive(Debug)]
pub(super) enum InsertUserOutcome {
    Created(UserRecord),
    EmailTaken,
}

#[derive(Debug, Clone)]
pub(super) struct UserRecord {
    pub(super) id: Uuid,
    pub(super) created_at_unix: i64,
    pub(super) updated_at_unix: i64,
    pub(super) email: String,
    pub(super) hashed_password: String,
    pub(super) is_chirpy_red: bool,
}

#[derive(Debug, Clone)]
pub(super) struct ChirpRecord {
    pub(super) id: Uuid,
    pub(super) created_at_unix: i64,
    pub(super) updated_at_unix: i64,
    pub(super) body: String,
    pub(super) user_id: Uuid,
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        created_at_unix: row.get("created_at_unix"),
        updated_at_unix: row.get("updated_at_unix"),
        email: row.get("email"),
        hashed_password: row.get("hashed_password"),
        is_chirpy_red: row.get("is_chirpy_red"),
    }
}

fn chirp_from_row(row: &sqlx::postgres::PgRow) -> ChirpRecord {
    ChirpRecord {
        id: row.get("id"),
        created_at_unix: row.get("created_at_unix"),
        updated_at_unix: row.get("updated_at_unix"),
        body: row.get("body"),
        user_id: row.get("user_id"),
    }
}

pub(super) async fn insert_user(
    pool: &PgPool,
    email: &str,
    hashed_password: &str,
) -> Result<InsertUserOutcome> {
    let query = r"
        INSERT INTO users (email, hashed_password)
        VALUES ($1, $2)
        RETURNING id,
            EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix,
            EXTRACT(EPOCH FROM updated_at)::BIGINT AS updated_at_unix,
            email, hashed_password, is_chirpy_red
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertUserOutcome::Created(user_from_row(&row))),
        Err(err) if is_unique_violation(&err) => Ok(InsertUserOutcome::EmailTaken),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

pub(super) async fn user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id,
            EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix,
            EXTRACT(EPOCH FROM updated_at)::BIGINT AS updated_at_unix,
            email, hashed_password, is_chirpy_red
        FROM users
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;
    Ok(row.as_ref().map(user_from_row))
}

pub(super) async fn update_user_credentials(
    pool: &PgPool,
    user_id: Uuid,
    email: &str,
    hashed_password: &str,
) -> Result<Option<UserRecord>> {
    let query = r"
        UPDATE users
        SET email = $1,
            hashed_password = $2,
            updated_at = NOW()
        WHERE id = $3
        RETURNING id,
            EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix,
            EXTRACT(EPOCH FROM updated_at)::BIGINT AS updated_at_unix,
            email, hashed_password, is_chirpy_red
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(hashed_password)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update user credentials")?;
    Ok(row.as_ref().map(user_from_row))
}

/// Flip `is_chirpy_red` for a user; `false` when the user does not exist.
pub(super) async fn upgrade_user(pool: &PgPool, user_id: Uuid) -> Result<bool> {
    let query = r"
        UPDATE users
        SET is_chirpy_red = TRUE,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to upgrade user")?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn insert_refresh_token(
    pool: &PgPool,
    token: &str,
    user_id: Uuid,
    ttl_seconds: i64,
) -> Result<()> {
    let query = r"
        INSERT INTO refresh_tokens (token, user_id, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token)
        .bind(user_id)
        .bind(ttl_seconds)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert refresh token")?;
    Ok(())
}

/// Resolve a refresh token to its owner if it is still exchangeable.
///
/// The row and the database clock are read in one statement; the
/// [`refresh::is_valid`] predicate then decides, so revoked and expired rows
/// are indistinguishable from absent ones.
pub(super) async fn lookup_valid_refresh_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<Uuid>> {
    let query = r"
        SELECT user_id,
            EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix,
            EXTRACT(EPOCH FROM expires_at)::BIGINT AS expires_at_unix,
            EXTRACT(EPOCH FROM revoked_at)::BIGINT AS revoked_at_unix,
            EXTRACT(EPOCH FROM NOW())::BIGINT AS now_unix
        FROM refresh_tokens
        WHERE token = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup refresh token")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let record = RefreshTokenRecord {
        user_id: row.get("user_id"),
        created_at_unix: row.get("created_at_unix"),
        expires_at_unix: row.get("expires_at_unix"),
        revoked_at_unix: row.get("revoked_at_unix"),
    };
    let now_unix: i64 = row.get("now_unix");

    if refresh::is_valid(&record, now_unix) {
        Ok(Some(record.user_id))
    } else {
        Ok(None)
    }
}

/// Mark a refresh token revoked; `false` when no live row matched.
///
/// The `revoked_at IS NULL` guard keeps the first revocation instant terminal,
/// and the single UPDATE serializes against concurrent lookups.
pub(super) async fn revoke_refresh_token(pool: &PgPool, token: &str) -> Result<bool> {
    let query = r"
        UPDATE refresh_tokens
        SET revoked_at = NOW()
        WHERE token = $1
          AND revoked_at IS NULL
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(token)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to revoke refresh token")?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn insert_chirp(
    pool: &PgPool,
    body: &str,
    user_id: Uuid,
) -> Result<ChirpRecord> {
    let query = r"
        INSERT INTO chirps (body, user_id)
        VALUES ($1, $2)
        RETURNING id,
            EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix,
            EXTRACT(EPOCH FROM updated_at)::BIGINT AS updated_at_unix,
            body, user_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(body)
        .bind(user_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert chirp")?;
    Ok(chirp_from_row(&row))
}

pub(super) async fn list_chirps(
    pool: &PgPool,
    author: Option<Uuid>,
    descending: bool,
) -> Result<Vec<ChirpRecord>> {
    // Two static statements instead of interpolating ORDER BY.
    let query = if descending {
        r"
        SELECT id,
            EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix,
            EXTRACT(EPOCH FROM updated_at)::BIGINT AS updated_at_unix,
            body, user_id
        FROM chirps
        WHERE $1::uuid IS NULL OR user_id = $1
        ORDER BY created_at DESC
        "
    } else {
        r"
        SELECT id,
            EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix,
            EXTRACT(EPOCH FROM updated_at)::BIGINT AS updated_at_unix,
            body, user_id
        FROM chirps
        WHERE $1::uuid IS NULL OR user_id = $1
        ORDER BY created_at ASC
        "
    };
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(author)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list chirps")?;
    Ok(rows.iter().map(chirp_from_row).collect())
}

pub(super) async fn chirp_by_id(pool: &PgPool, chirp_id: Uuid) -> Result<Option<ChirpRecord>> {
    let query = r"
        SELECT id,
            EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix,
            EXTRACT(EPOCH FROM updated_at)::BIGINT AS updated_at_unix,
            body, user_id
        FROM chirps
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(chirp_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup chirp")?;
    Ok(row.as_ref().map(chirp_from_row))
}

pub(super) async fn delete_chirp(pool: &PgPool, chirp_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM chirps WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(chirp_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete chirp")?;
    Ok(result.rows_affected() > 0)
}

/// Dev-only: wipe all user data. Chirps and refresh tokens go via cascade.
pub(super) async fn reset(pool: &PgPool) -> Result<()> {
    let query = "DELETE FROM users";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to reset users")?;
    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn insert_user_outcome_debug_names() {
        assert_eq!(format!("{:?}", InsertUserOutcome::EmailTaken), "EmailTaken");
    }
}
