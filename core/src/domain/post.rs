//! Post data model and like toggle outcomes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Validation errors returned by the post constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    EmptyDescription,
    DescriptionTooLong { max: usize },
}

impl fmt::Display for PostValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "post title must not be empty"),
            Self::TitleTooLong { max } => {
                write!(f, "post title must be at most {max} characters")
            }
            Self::EmptyDescription => write!(f, "post description must not be empty"),
            Self::DescriptionTooLong { max } => {
                write!(f, "post description must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for PostValidationError {}

/// Stable post identifier stored as a UUID.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Generate a new random [`PostId`].
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

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Maximum allowed length for a post title.
pub const POST_TITLE_MAX: usize = 30;
/// Maximum allowed length for a post description.
pub const POST_DESCRIPTION_MAX: usize = 500;

/// Post title, unique across all posts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostTitle(String);

impl PostTitle {
    /// Validate and construct a [`PostTitle`] from owned input.
    pub fn new(title: impl Into<String>) -> Result<Self, PostValidationError> {
        Self::from_owned(title.into())
    }

    fn from_owned(title: String) -> Result<Self, PostValidationError> {
        if title.trim().is_empty() {
            return Err(PostValidationError::EmptyTitle);
        }
        if title.chars().count() > POST_TITLE_MAX {
            return Err(PostValidationError::TitleTooLong {
                max: POST_TITLE_MAX,
            });
        }
        Ok(Self(title))
    }
}

impl AsRef<str> for PostTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PostTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PostTitle> for String {
    fn from(value: PostTitle) -> Self {
        value.0
    }
}

impl TryFrom<String> for PostTitle {
    type Error = PostValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Free-text post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostDescription(String);

impl PostDescription {
    /// Validate and construct a [`PostDescription`] from owned input.
    pub fn new(description: impl Into<String>) -> Result<Self, PostValidationError> {
        Self::from_owned(description.into())
    }

    fn from_owned(description: String) -> Result<Self, PostValidationError> {
        if description.trim().is_empty() {
            return Err(PostValidationError::EmptyDescription);
        }
        if description.chars().count() > POST_DESCRIPTION_MAX {
            return Err(PostValidationError::DescriptionTooLong {
                max: POST_DESCRIPTION_MAX,
            });
        }
        Ok(Self(description))
    }
}

impl AsRef<str> for PostDescription {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PostDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PostDescription> for String {
    fn from(value: PostDescription) -> Self {
        value.0
    }
}

impl TryFrom<String> for PostDescription {
    type Error = PostValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// A post record.
///
/// ## Invariants
/// - `title` is unique across all posts, not per owner.
/// - `like_count` equals the number of like ledger rows for this post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Stable identifier.
    pub id: PostId,
    /// User who authored the post.
    pub owner_id: UserId,
    /// Globally unique title.
    pub title: PostTitle,
    /// Post body.
    pub description: PostDescription,
    /// Denormalized count of like ledger rows.
    pub like_count: i32,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Direction a like toggle resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeAction {
    /// A like ledger row was inserted.
    Liked,
    /// The existing like ledger row was removed.
    Unliked,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    /// Which direction the toggle resolved to.
    pub action: LikeAction,
    /// The post's like counter after the toggle.
    pub like_count: i32,
}
