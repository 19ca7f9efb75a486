//! Port for the like ledger.

use async_trait::async_trait;

use crate::domain::{LikeToggle, PostId, UserId};

/// Errors raised by like ledger adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LikeRepositoryError {
    /// Repository connection could not be established.
    #[error("like ledger connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("like ledger query failed: {message}")]
    Query { message: String },

    /// The store aborted the transaction due to a concurrent conflict.
    #[error("like ledger transaction conflict: {message}")]
    Conflict { message: String },

    /// A referenced user row does not exist.
    #[error("no user with id {user_id}")]
    UserNotFound { user_id: UserId },

    /// No post row exists for the given id.
    #[error("no post with id {post_id}")]
    PostNotFound { post_id: PostId },
}

impl LikeRepositoryError {
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

    /// Create a missing-post error.
    pub const fn post_not_found(post_id: PostId) -> Self {
        Self::PostNotFound { post_id }
    }
}

/// Port for toggling and reading likes.
///
/// A ledger row's existence is the fact "this user likes this post"; the
/// post's counter is maintained in the same transaction as the row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Toggle the (post, user) like.
    ///
    /// Inserting the row increments the post counter and, when the liker is
    /// not the owner, appends the owner's notification. Removing the row
    /// decrements the counter, clamped at zero, with no notification.
    async fn toggle(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> Result<LikeToggle, LikeRepositoryError>;

    /// Whether a ledger row exists for the pair.
    async fn has_liked(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> Result<bool, LikeRepositoryError>;

    /// Count ledger rows for a post.
    ///
    /// Reads the ledger, not the denormalized counter, so callers can audit
    /// the two against each other.
    async fn count_for(&self, post_id: &PostId) -> Result<i64, LikeRepositoryError>;
}

/// Fixture implementation for tests that do not exercise the ledger.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLikeRepository;

#[async_trait]
impl LikeRepository for FixtureLikeRepository {
    async fn toggle(
        &self,
        post_id: &PostId,
        _user_id: &UserId,
    ) -> Result<LikeToggle, LikeRepositoryError> {
        Err(LikeRepositoryError::post_not_found(*post_id))
    }

    async fn has_liked(
        &self,
        _post_id: &PostId,
        _user_id: &UserId,
    ) -> Result<bool, LikeRepositoryError> {
        Ok(false)
    }

    async fn count_for(&self, _post_id: &PostId) -> Result<i64, LikeRepositoryError> {
        Ok(0)
    }
}
