//! Port for the notification log.

use async_trait::async_trait;

use crate::domain::{Notification, NotificationId, NotificationMessage, UserId};

/// Errors raised by notification log adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationRepositoryError {
    /// Repository connection could not be established.
    #[error("notification log connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("notification log query failed: {message}")]
    Query { message: String },

    /// The store aborted the transaction due to a concurrent conflict.
    #[error("notification log transaction conflict: {message}")]
    Conflict { message: String },

    /// A referenced user row does not exist.
    #[error("no user with id {user_id}")]
    UserNotFound { user_id: UserId },

    /// No notification row exists for the given id.
    #[error("no notification with id {notification_id}")]
    NotificationNotFound { notification_id: NotificationId },
}

impl NotificationRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a conflict error with the given message.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a missing-user error.
    pub const fn user_not_found(user_id: UserId) -> Self {
        Self::UserNotFound { user_id }
    }

    /// Create a missing-notification error.
    pub const fn notification_not_found(notification_id: NotificationId) -> Self {
        Self::NotificationNotFound { notification_id }
    }
}

/// Validated input for appending a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// Identifier chosen by the caller.
    pub id: NotificationId,
    /// User the notification is addressed to.
    pub user_id: UserId,
    /// Message text.
    pub message: NotificationMessage,
}

/// Port for appending and reading notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Append a new unread notification.
    async fn append(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotificationRepositoryError>;

    /// Notifications for a user, newest first, optionally unread only.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Mark a notification read. Safe to repeat on an already-read row.
    async fn mark_read(
        &self,
        notification_id: &NotificationId,
    ) -> Result<Notification, NotificationRepositoryError>;
}

/// Fixture implementation for tests that do not exercise the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationRepository;

#[async_trait]
impl NotificationRepository for FixtureNotificationRepository {
    async fn append(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotificationRepositoryError> {
        Ok(Notification {
            id: notification.id,
            user_id: notification.user_id,
            message: notification.message,
            read: false,
            created_at: chrono::Utc::now(),
        })
    }

    async fn list_for_user(
        &self,
        _user_id: &UserId,
        _unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        Ok(Vec::new())
    }

    async fn mark_read(
        &self,
        notification_id: &NotificationId,
    ) -> Result<Notification, NotificationRepositoryError> {
        Err(NotificationRepositoryError::notification_not_found(
            *notification_id,
        ))
    }
}
