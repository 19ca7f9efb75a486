//! Like ledger domain service.
//!
//! Idempotent like toggling. The ledger row is the fact; the post counter
//! and the owner's notification ride the same repository transaction.

use std::sync::Arc;

use crate::domain::ports::{LikeRepository, LikeRepositoryError};
use crate::domain::{DomainResult, Error, LikeToggle, PostId, UserId};

fn map_repository_error(error: LikeRepositoryError) -> Error {
    match error {
        LikeRepositoryError::Connection { message } => {
            Error::unavailable(format!("like ledger unavailable: {message}"))
        }
        LikeRepositoryError::Query { message } => {
            Error::internal(format!("like ledger error: {message}"))
        }
        LikeRepositoryError::Conflict { message } => {
            Error::store_conflict(format!("like ledger conflict: {message}"))
        }
        LikeRepositoryError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
        LikeRepositoryError::PostNotFound { post_id } => {
            Error::not_found(format!("post {post_id} not found"))
        }
    }
}

/// Like service implementing the toggle and its read-side lookups.
#[derive(Clone)]
pub struct LikeService<R> {
    like_repo: Arc<R>,
}

impl<R> LikeService<R> {
    /// Create a new service with the like repository.
    pub fn new(like_repo: Arc<R>) -> Self {
        Self { like_repo }
    }
}

impl<R> LikeService<R>
where
    R: LikeRepository,
{
    /// Toggle `user`'s like on a post.
    ///
    /// Not yet liked: the ledger row appears, the counter increments, and
    /// the post's owner is notified unless they liked their own post.
    /// Already liked: the row disappears and the counter decrements, clamped
    /// at zero, with no notification. Repeating the call alternates between
    /// the two.
    pub async fn toggle_like(&self, user: &UserId, post_id: &PostId) -> DomainResult<LikeToggle> {
        self.like_repo
            .toggle(post_id, user)
            .await
            .map_err(map_repository_error)
    }

    /// Whether `user` currently likes the post.
    pub async fn has_liked(&self, user: &UserId, post_id: &PostId) -> DomainResult<bool> {
        self.like_repo
            .has_liked(post_id, user)
            .await
            .map_err(map_repository_error)
    }

    /// Count of ledger rows for the post.
    ///
    /// Read from the ledger rather than the denormalized counter, so the
    /// two can be audited against each other.
    pub async fn like_count(&self, post_id: &PostId) -> DomainResult<i64> {
        self.like_repo
            .count_for(post_id)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "like_service_tests.rs"]
mod tests;
