//! Port for post persistence and feed reads.

use async_trait::async_trait;

use crate::domain::{Post, PostDescription, PostId, PostTitle, UserId};

/// Errors raised by post repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostRepositoryError {
    /// Repository connection could not be established.
    #[error("post repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("post repository query failed: {message}")]
    Query { message: String },

    /// The store aborted the transaction due to a concurrent conflict.
    #[error("post repository transaction conflict: {message}")]
    Conflict { message: String },

    /// A referenced user row does not exist.
    #[error("no user with id {user_id}")]
    UserNotFound { user_id: UserId },

    /// No post row exists for the given id.
    #[error("no post with id {post_id}")]
    PostNotFound { post_id: PostId },

    /// The title is already taken by another post.
    #[error("a post titled '{title}' already exists")]
    DuplicateTitle { title: String },

    /// The acting user does not own the post.
    #[error("post {post_id} can only be deleted by its owner")]
    NotOwner { post_id: PostId },
}

impl PostRepositoryError {
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

    /// Create a duplicate-title error.
    pub fn duplicate_title(title: impl Into<String>) -> Self {
        Self::DuplicateTitle {
            title: title.into(),
        }
    }

    /// Create a wrong-owner error.
    pub const fn not_owner(post_id: PostId) -> Self {
        Self::NotOwner { post_id }
    }
}

/// Validated input for inserting a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Identifier chosen by the caller.
    pub id: PostId,
    /// Authoring user.
    pub owner_id: UserId,
    /// Globally unique title.
    pub title: PostTitle,
    /// Post body.
    pub description: PostDescription,
}

/// Port for writing posts and assembling feeds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post and increment the owner's post counter, atomically.
    async fn create(&self, post: NewPost) -> Result<Post, PostRepositoryError>;

    /// Delete a post as `actor`, cascading its like ledger rows and
    /// decrementing the owner's post counter (clamped at zero), atomically.
    async fn delete(&self, actor: &UserId, post_id: &PostId)
    -> Result<(), PostRepositoryError>;

    /// Find a post by id.
    async fn find_by_id(&self, post_id: &PostId) -> Result<Option<Post>, PostRepositoryError>;

    /// The user's own posts plus posts authored by any current friend,
    /// without duplicates, newest first.
    async fn feed_for(&self, user_id: &UserId) -> Result<Vec<Post>, PostRepositoryError>;

    /// Posts authored by the given user, newest first.
    async fn posts_by(&self, owner_id: &UserId) -> Result<Vec<Post>, PostRepositoryError>;
}

/// Fixture implementation for tests that do not exercise post persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePostRepository;

#[async_trait]
impl PostRepository for FixturePostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, PostRepositoryError> {
        Ok(Post {
            id: post.id,
            owner_id: post.owner_id,
            title: post.title,
            description: post.description,
            like_count: 0,
            created_at: chrono::Utc::now(),
        })
    }

    async fn delete(
        &self,
        _actor: &UserId,
        post_id: &PostId,
    ) -> Result<(), PostRepositoryError> {
        Err(PostRepositoryError::post_not_found(*post_id))
    }

    async fn find_by_id(
        &self,
        _post_id: &PostId,
    ) -> Result<Option<Post>, PostRepositoryError> {
        Ok(None)
    }

    async fn feed_for(&self, _user_id: &UserId) -> Result<Vec<Post>, PostRepositoryError> {
        Ok(Vec::new())
    }

    async fn posts_by(&self, _owner_id: &UserId) -> Result<Vec<Post>, PostRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_feed_is_empty() {
        let repo = FixturePostRepository;
        let feed = repo
            .feed_for(&UserId::random())
            .await
            .expect("fixture feed succeeds");
        assert!(feed.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_create_starts_with_zero_likes() {
        let repo = FixturePostRepository;
        let post = NewPost {
            id: PostId::random(),
            owner_id: UserId::random(),
            title: PostTitle::new("hello").expect("valid title"),
            description: PostDescription::new("first post").expect("valid description"),
        };

        let created = repo.create(post).await.expect("fixture create succeeds");
        assert_eq!(created.like_count, 0);
    }

    #[rstest]
    fn duplicate_title_error_formats_title() {
        let err = PostRepositoryError::duplicate_title("hello");
        assert!(err.to_string().contains("hello"));
    }
}
