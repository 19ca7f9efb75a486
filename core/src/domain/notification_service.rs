//! Notification log domain service.
//!
//! Direct appends, per-user listings, and read-state flips. Graph and like
//! mutations write their own notifications inside their repository
//! transactions; this service is the read surface plus standalone appends.

use std::sync::Arc;

use crate::domain::ports::{NewNotification, NotificationRepository, NotificationRepositoryError};
use crate::domain::{DomainResult, Error, Notification, NotificationId, NotificationMessage, UserId};

fn map_repository_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::unavailable(format!("notification log unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification log error: {message}"))
        }
        NotificationRepositoryError::Conflict { message } => {
            Error::store_conflict(format!("notification log conflict: {message}"))
        }
        NotificationRepositoryError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
        NotificationRepositoryError::NotificationNotFound { notification_id } => {
            Error::not_found(format!("notification {notification_id} not found"))
        }
    }
}

/// Notification service implementing appends, listings, and mark-read.
#[derive(Clone)]
pub struct NotificationService<R> {
    notification_repo: Arc<R>,
}

impl<R> NotificationService<R> {
    /// Create a new service with the notification repository.
    pub fn new(notification_repo: Arc<R>) -> Self {
        Self { notification_repo }
    }
}

impl<R> NotificationService<R>
where
    R: NotificationRepository,
{
    /// Append an unread notification for `user`.
    pub async fn notify(
        &self,
        user: &UserId,
        message: NotificationMessage,
    ) -> DomainResult<Notification> {
        let notification = NewNotification {
            id: NotificationId::random(),
            user_id: *user,
            message,
        };

        self.notification_repo
            .append(notification)
            .await
            .map_err(map_repository_error)
    }

    /// Notifications for `user`, newest first.
    ///
    /// With `unread_only` set, already-read entries are filtered out.
    pub async fn notifications(
        &self,
        user: &UserId,
        unread_only: bool,
    ) -> DomainResult<Vec<Notification>> {
        self.notification_repo
            .list_for_user(user, unread_only)
            .await
            .map_err(map_repository_error)
    }

    /// Mark a notification read. Marking an already-read entry is a no-op.
    pub async fn mark_read(&self, notification_id: &NotificationId) -> DomainResult<Notification> {
        self.notification_repo
            .mark_read(notification_id)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "notification_service_tests.rs"]
mod tests;
