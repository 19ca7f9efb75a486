//! Post content domain service.
//!
//! Post creation, owner-only deletion, and feed reads. Title uniqueness is
//! global and enforced inside the repository's transaction.

use std::sync::Arc;

use crate::domain::ports::{NewPost, PostRepository, PostRepositoryError};
use crate::domain::{DomainResult, Error, Post, PostDescription, PostId, PostTitle, UserId};

fn map_repository_error(error: PostRepositoryError) -> Error {
    match error {
        PostRepositoryError::Connection { message } => {
            Error::unavailable(format!("post repository unavailable: {message}"))
        }
        PostRepositoryError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
        PostRepositoryError::Conflict { message } => {
            Error::store_conflict(format!("post repository conflict: {message}"))
        }
        PostRepositoryError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
        PostRepositoryError::PostNotFound { post_id } => {
            Error::not_found(format!("post {post_id} not found"))
        }
        PostRepositoryError::DuplicateTitle { title } => {
            Error::duplicate_title(format!("a post titled '{title}' already exists"))
        }
        PostRepositoryError::NotOwner { post_id } => Error::not_authorized(format!(
            "post {post_id} can only be deleted by its owner"
        )),
    }
}

/// Content service implementing post publication and feeds.
#[derive(Clone)]
pub struct ContentService<R> {
    post_repo: Arc<R>,
}

impl<R> ContentService<R> {
    /// Create a new service with the post repository.
    pub fn new(post_repo: Arc<R>) -> Self {
        Self { post_repo }
    }
}

impl<R> ContentService<R>
where
    R: PostRepository,
{
    /// Publish a post owned by `owner`.
    ///
    /// The owner's post counter increments in the same transaction as the
    /// insert.
    pub async fn create_post(
        &self,
        owner: &UserId,
        title: PostTitle,
        description: PostDescription,
    ) -> DomainResult<Post> {
        let post = NewPost {
            id: PostId::random(),
            owner_id: *owner,
            title,
            description,
        };

        self.post_repo
            .create(post)
            .await
            .map_err(map_repository_error)
    }

    /// Delete a post as `actor`. Owner-only.
    ///
    /// All like ledger rows for the post disappear with it and the owner's
    /// post counter decrements, clamped at zero, in one transaction.
    pub async fn delete_post(&self, actor: &UserId, post_id: &PostId) -> DomainResult<()> {
        self.post_repo
            .delete(actor, post_id)
            .await
            .map_err(map_repository_error)
    }

    /// Fetch a post by id.
    pub async fn post(&self, post_id: &PostId) -> DomainResult<Post> {
        self.post_repo
            .find_by_id(post_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("post {post_id} not found")))
    }

    /// The user's feed: own posts plus posts by current friends, newest
    /// first, ties broken by ascending id.
    pub async fn feed(&self, user: &UserId) -> DomainResult<Vec<Post>> {
        self.post_repo
            .feed_for(user)
            .await
            .map_err(map_repository_error)
    }

    /// Posts authored by `owner`, newest first.
    pub async fn posts_by(&self, owner: &UserId) -> DomainResult<Vec<Post>> {
        self.post_repo
            .posts_by(owner)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "content_service_tests.rs"]
mod tests;
