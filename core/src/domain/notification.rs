//! Notification log records and canonical message texts.
//!
//! The message formatters are the single source for the notification texts
//! the graph operations emit; repositories call them inside the same
//! transaction as the mutation they announce.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FullName, PostTitle, UserId, Username};

/// Validation errors returned by the notification constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    EmptyMessage,
    MessageTooLong { max: usize },
}

impl fmt::Display for NotificationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "notification message must not be empty"),
            Self::MessageTooLong { max } => {
                write!(f, "notification message must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for NotificationValidationError {}

/// Stable notification identifier stored as a UUID.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Generate a new random [`NotificationId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Maximum allowed length for a notification message.
pub const NOTIFICATION_MESSAGE_MAX: usize = 200;

/// Free-text notification message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NotificationMessage(String);

impl NotificationMessage {
    /// Validate and construct a [`NotificationMessage`] from owned input.
    pub fn new(message: impl Into<String>) -> Result<Self, NotificationValidationError> {
        Self::from_owned(message.into())
    }

    fn from_owned(message: String) -> Result<Self, NotificationValidationError> {
        if message.trim().is_empty() {
            return Err(NotificationValidationError::EmptyMessage);
        }
        if message.chars().count() > NOTIFICATION_MESSAGE_MAX {
            return Err(NotificationValidationError::MessageTooLong {
                max: NOTIFICATION_MESSAGE_MAX,
            });
        }
        Ok(Self(message))
    }
}

impl AsRef<str> for NotificationMessage {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for NotificationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<NotificationMessage> for String {
    fn from(value: NotificationMessage) -> Self {
        value.0
    }
}

impl TryFrom<String> for NotificationMessage {
    type Error = NotificationValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// A notification log record.
///
/// Append-only: the only permitted mutation is flipping `read` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Stable identifier.
    pub id: NotificationId,
    /// User this notification belongs to.
    pub user_id: UserId,
    /// Message text.
    pub message: NotificationMessage,
    /// Whether the user has marked this notification read.
    pub read: bool,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Message emitted to the receiver of a new friend request.
pub fn friend_request_message(sender: &Username) -> NotificationMessage {
    NotificationMessage(format!("{sender} sent you a friend request."))
}

/// Message emitted to each party of a newly confirmed friendship.
///
/// `counterpart` is the full name of the other user.
pub fn friendship_accepted_message(counterpart: &FullName) -> NotificationMessage {
    NotificationMessage(format!("You are now friends with {counterpart}."))
}

/// Message emitted to a post's owner when someone else likes it.
pub fn post_liked_message(liker: &Username, title: &PostTitle) -> NotificationMessage {
    NotificationMessage(format!("{liker} liked your post '{title}'."))
}
