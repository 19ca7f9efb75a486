//! PostgreSQL-backed `NotificationRepository` implementation using Diesel ORM.
//!
//! The log is append-only: inserts and a single `is_read` flip are the only
//! writes. Recipient existence is enforced by the foreign key; the violation
//! is translated back into the port's missing-user error.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{
    NewNotification, NotificationRepository, NotificationRepositoryError,
};
use crate::domain::{Notification, NotificationId, UserId};

use super::diesel_helpers::notification_from_row;
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::notifications;

/// Diesel-backed implementation of the `NotificationRepository` port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain notification log errors.
fn map_pool_error(error: PoolError) -> NotificationRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            NotificationRepositoryError::connection(message)
        }
    }
}

/// Map Diesel errors to domain notification log errors.
fn map_diesel_error(error: DieselError) -> NotificationRepositoryError {
    use diesel::result::DatabaseErrorKind;

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
        DieselError::NotFound => NotificationRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => {
            NotificationRepositoryError::query("database query error")
        }
        DieselError::DeserializationError(_) => {
            NotificationRepositoryError::query("stored row failed validation")
        }
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::SerializationFailure => {
                NotificationRepositoryError::conflict(info.message().to_owned())
            }
            DatabaseErrorKind::ClosedConnection => {
                NotificationRepositoryError::connection("database connection error")
            }
            _ => NotificationRepositoryError::query("database error"),
        },
        _ => NotificationRepositoryError::query("database error"),
    }
}

/// Whether a foreign key violation names the recipient column.
fn is_recipient_constraint(name: Option<&str>) -> bool {
    name.is_some_and(|name| name.contains("user_id"))
}

/// Map an insert error, translating a recipient foreign key violation into
/// the dedicated missing-user error.
fn map_recipient_missing(error: DieselError, user_id: UserId) -> NotificationRepositoryError {
    use diesel::result::DatabaseErrorKind;

    match &error {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info)
            if is_recipient_constraint(info.constraint_name()) =>
        {
            NotificationRepositoryError::user_not_found(user_id)
        }
        _ => map_diesel_error(error),
    }
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn append(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewNotificationRow {
            id: *notification.id.as_uuid(),
            user_id: *notification.user_id.as_uuid(),
            message: notification.message.as_ref(),
            is_read: false,
            created_at: Utc::now(),
        };
        let row: NotificationRow = diesel::insert_into(notifications::table)
            .values(&new_row)
            .returning(NotificationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_recipient_missing(error, notification.user_id))?;

        notification_from_row(row).map_err(map_diesel_error)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = notifications::table
            .filter(notifications::user_id.eq(*user_id.as_uuid()))
            .order((
                notifications::created_at.desc(),
                notifications::id.asc(),
            ))
            .select(NotificationRow::as_select())
            .into_boxed();
        if unread_only {
            query = query.filter(notifications::is_read.eq(false));
        }

        let rows: Vec<NotificationRow> = query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(notification_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_diesel_error)
    }

    async fn mark_read(
        &self,
        notification_id: &NotificationId,
    ) -> Result<Notification, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<NotificationRow> =
            diesel::update(notifications::table.find(*notification_id.as_uuid()))
                .set(notifications::is_read.eq(true))
                .returning(NotificationRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;

        let row = row.ok_or(NotificationRepositoryError::notification_not_found(
            *notification_id,
        ))?;
        notification_from_row(row).map_err(map_diesel_error)
    }
}
