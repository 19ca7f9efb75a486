//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Every operation here is a single SQL statement, so no explicit
//! transactions are needed; uniqueness of usernames is enforced by the
//! database constraint and surfaced as a dedicated error.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    NewUserRecord, ProfileChanges, StoredCredentials, UserRepository, UserRepositoryError,
};
use crate::domain::{PasswordHash, User, UserId};

use super::diesel_helpers::user_from_row;
use super::models::{NewUserRow, ProfileChangesRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain user repository errors.
fn map_pool_error(error: PoolError) -> UserRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserRepositoryError::connection(message)
        }
    }
}

/// Map Diesel errors to domain user repository errors.
fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => UserRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => UserRepositoryError::query("database query error"),
        DieselError::DeserializationError(_) => {
            UserRepositoryError::query("stored row failed validation")
        }
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::SerializationFailure => {
                UserRepositoryError::conflict(info.message().to_owned())
            }
            DatabaseErrorKind::ClosedConnection => {
                UserRepositoryError::connection("database connection error")
            }
            _ => UserRepositoryError::query("database error"),
        },
        _ => UserRepositoryError::query("database error"),
    }
}

/// Map a write error, translating a username unique violation into the
/// dedicated duplicate error.
fn map_username_collision(error: diesel::result::Error, username: &str) -> UserRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info
                .constraint_name()
                .is_some_and(|name| name.contains("username")) =>
        {
            UserRepositoryError::duplicate_username(username)
        }
        _ => map_diesel_error(error),
    }
}

/// Build an ILIKE pattern that matches the keyword as a literal substring.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, record: NewUserRecord) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewUserRow {
            id: *record.id.as_uuid(),
            username: record.username.as_ref(),
            password_hash: record.password_hash.as_str(),
            full_name: record.full_name.as_ref(),
            bio: record.bio.as_ref().map(|bio| bio.as_ref()),
            friend_count: 0,
            post_count: 0,
            created_at: Utc::now(),
        };

        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_username_collision(error, record.username.as_ref()))?;

        user_from_row(row).map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(user_from_row).transpose().map_err(map_diesel_error)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(user_from_row).transpose().map_err(map_diesel_error)
    }

    async fn credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<(Uuid, String)> = users::table
            .filter(users::username.eq(username))
            .select((users::id, users::password_hash))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let Some((user_id, stored_hash)) = row else {
            return Ok(None);
        };
        let password_hash = PasswordHash::from_phc_string(stored_hash)
            .map_err(|error| UserRepositoryError::query(error.to_string()))?;
        Ok(Some(StoredCredentials {
            user_id: UserId::from_uuid(user_id),
            password_hash,
        }))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let pattern = like_pattern(keyword);
        let rows: Vec<UserRow> = users::table
            .filter(
                users::username
                    .ilike(&pattern)
                    .or(users::full_name.ilike(&pattern)),
            )
            .order(users::username.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_diesel_error)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
    ) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = ProfileChangesRow {
            username: changes.username.as_ref(),
            full_name: changes.full_name.as_ref(),
            bio: changes.bio.as_ref().map(|bio| bio.as_ref()),
            password_hash: changes.password_hash.as_ref().map(PasswordHash::as_str),
        };

        let row: Option<UserRow> = diesel::update(users::table.find(*id.as_uuid()))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|error| map_username_collision(error, changes.username.as_ref()))?;

        let row = row.ok_or(UserRepositoryError::user_not_found(*id))?;
        user_from_row(row).map_err(map_diesel_error)
    }
}
