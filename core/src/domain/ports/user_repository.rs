//! Port for user identity persistence.

use async_trait::async_trait;

use crate::domain::{Bio, FullName, PasswordHash, User, UserId, Username};

/// Errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserRepositoryError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },

    /// The store aborted the transaction due to a concurrent conflict.
    #[error("user repository transaction conflict: {message}")]
    Conflict { message: String },

    /// The username is already taken by another user.
    #[error("username '{username}' is already taken")]
    DuplicateUsername { username: String },

    /// No user row exists for the given id.
    #[error("no user with id {user_id}")]
    UserNotFound { user_id: UserId },
}

impl UserRepositoryError {
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

    /// Create a duplicate-username error.
    pub fn duplicate_username(username: impl Into<String>) -> Self {
        Self::DuplicateUsername {
            username: username.into(),
        }
    }

    /// Create a missing-user error.
    pub const fn user_not_found(user_id: UserId) -> Self {
        Self::UserNotFound { user_id }
    }
}

/// Validated input for inserting a new user row.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    /// Identifier chosen by the caller.
    pub id: UserId,
    /// Unique login handle.
    pub username: Username,
    /// Stored credential hash.
    pub password_hash: PasswordHash,
    /// Display name.
    pub full_name: FullName,
    /// Optional profile blurb.
    pub bio: Option<Bio>,
}

/// Credential material for a stored user, fetched for verification.
///
/// Kept separate from [`User`] so the hash never travels with profile reads.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    /// The owning user.
    pub user_id: UserId,
    /// Stored credential hash.
    pub password_hash: PasswordHash,
}

/// Full profile replacement, password change optional.
#[derive(Debug, Clone)]
pub struct ProfileChanges {
    /// New unique login handle (may equal the current one).
    pub username: Username,
    /// New display name.
    pub full_name: FullName,
    /// New profile blurb, or `None` to clear it.
    pub bio: Option<Bio>,
    /// New credential hash, or `None` to keep the current one.
    pub password_hash: Option<PasswordHash>,
}

/// Port for writing and reading user identities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user with zeroed counters.
    ///
    /// Fails with [`UserRepositoryError::DuplicateUsername`] when the handle
    /// is taken.
    async fn create(&self, record: NewUserRecord) -> Result<User, UserRepositoryError>;

    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Find a user by exact username.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<User>, UserRepositoryError>;

    /// Fetch credential material by exact username.
    async fn credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Case-insensitive substring search over username and full name,
    /// ordered by username.
    async fn search(&self, keyword: &str) -> Result<Vec<User>, UserRepositoryError>;

    /// Replace a user's profile fields.
    ///
    /// Fails with [`UserRepositoryError::UserNotFound`] when the user is
    /// absent and [`UserRepositoryError::DuplicateUsername`] when the new
    /// handle collides with another user.
    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
    ) -> Result<User, UserRepositoryError>;
}

/// Fixture implementation for tests that do not exercise user persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn create(&self, record: NewUserRecord) -> Result<User, UserRepositoryError> {
        Ok(User {
            id: record.id,
            username: record.username,
            full_name: record.full_name,
            bio: record.bio,
            friend_count: 0,
            post_count: 0,
            created_at: chrono::Utc::now(),
        })
    }

    async fn find_by_id(&self, _id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_by_username(
        &self,
        _username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn credentials_by_username(
        &self,
        _username: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        Ok(None)
    }

    async fn search(&self, _keyword: &str) -> Result<Vec<User>, UserRepositoryError> {
        Ok(Vec::new())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        _changes: ProfileChanges,
    ) -> Result<User, UserRepositoryError> {
        Err(UserRepositoryError::user_not_found(*id))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    fn sample_record() -> NewUserRecord {
        NewUserRecord {
            id: UserId::random(),
            username: Username::new("alice").expect("valid username"),
            password_hash: PasswordHash::from_phc_string(
                "$argon2id$v=19$m=19456,t=2,p=1$MDEyMzQ1Njc4OWFiY2RlZg$L8Xui4Dl/eyLLO/bGL3ZVyZ+WnNBqAbsLjmbNqnvs8U",
            )
            .expect("valid PHC string"),
            full_name: FullName::new("Alice Liddell").expect("valid full name"),
            bio: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_lookups_return_none() {
        let repo = FixtureUserRepository;
        assert!(
            repo.find_by_id(&UserId::random())
                .await
                .expect("fixture lookup succeeds")
                .is_none()
        );
        assert!(
            repo.credentials_by_username("alice")
                .await
                .expect("fixture lookup succeeds")
                .is_none()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_create_echoes_the_record() {
        let repo = FixtureUserRepository;
        let record = sample_record();
        let username = record.username.clone();

        let user = repo.create(record).await.expect("fixture create succeeds");

        assert_eq!(user.username, username);
        assert_eq!(user.friend_count, 0);
        assert_eq!(user.post_count, 0);
    }

    #[rstest]
    fn duplicate_username_error_formats_handle() {
        let err = UserRepositoryError::duplicate_username("alice");
        assert!(err.to_string().contains("alice"));
    }
}
