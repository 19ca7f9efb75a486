//! Identity domain service.
//!
//! Registration, credential verification, lookups, and profile edits.
//! Password hashing happens here so plaintext never crosses a port.

use std::sync::Arc;

use crate::domain::ports::{NewUserRecord, ProfileChanges, UserRepository, UserRepositoryError};
use crate::domain::{
    Bio, DomainResult, Error, FullName, Password, PasswordHash, User, UserId, Username,
};

fn map_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::Conflict { message } => {
            Error::store_conflict(format!("user repository conflict: {message}"))
        }
        UserRepositoryError::DuplicateUsername { username } => {
            Error::duplicate_username(format!("username '{username}' is already taken"))
        }
        UserRepositoryError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
    }
}

fn hash_password(password: &Password) -> DomainResult<PasswordHash> {
    PasswordHash::hash(password)
        .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
}

/// Validated input for registering a new user.
#[derive(Debug, Clone)]
pub struct NewUserInput {
    /// Unique login handle.
    pub username: Username,
    /// Plaintext credential, hashed before persistence.
    pub password: Password,
    /// Display name.
    pub full_name: FullName,
    /// Optional profile blurb.
    pub bio: Option<Bio>,
}

/// Full profile replacement. `password: None` keeps the current credential.
#[derive(Debug, Clone)]
pub struct ProfileInput {
    /// New unique login handle (may equal the current one).
    pub username: Username,
    /// New display name.
    pub full_name: FullName,
    /// New profile blurb, or `None` to clear it.
    pub bio: Option<Bio>,
    /// Replacement credential, or `None` to keep the current one.
    pub password: Option<Password>,
}

/// Identity service implementing registration, login checks, and profiles.
#[derive(Clone)]
pub struct IdentityService<R> {
    user_repo: Arc<R>,
}

impl<R> IdentityService<R> {
    /// Create a new service with the user repository.
    pub fn new(user_repo: Arc<R>) -> Self {
        Self { user_repo }
    }
}

impl<R> IdentityService<R>
where
    R: UserRepository,
{
    /// Register a new user with a freshly hashed credential.
    pub async fn register(&self, input: NewUserInput) -> DomainResult<User> {
        let password_hash = hash_password(&input.password)?;
        let record = NewUserRecord {
            id: UserId::random(),
            username: input.username,
            password_hash,
            full_name: input.full_name,
            bio: input.bio,
        };

        self.user_repo
            .create(record)
            .await
            .map_err(map_repository_error)
    }

    /// Check a username/password pair against the stored credential.
    ///
    /// An unknown username fails `NotFound`; a known username with the wrong
    /// password fails `BadCredential`. Callers decide whether to collapse
    /// the two before showing them to anyone.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &Password,
    ) -> DomainResult<UserId> {
        let credentials = self
            .user_repo
            .credentials_by_username(username)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("no user named '{username}'")))?;

        if !credentials.password_hash.verify(password) {
            return Err(Error::bad_credential("password verification failed"));
        }

        Ok(credentials.user_id)
    }

    /// Fetch a user by id.
    pub async fn user(&self, id: &UserId) -> DomainResult<User> {
        self.user_repo
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    /// Fetch a user by exact username.
    pub async fn user_by_username(&self, username: &str) -> DomainResult<User> {
        self.user_repo
            .find_by_username(username)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("no user named '{username}'")))
    }

    /// Case-insensitive substring search over usernames and full names.
    ///
    /// An empty keyword matches nobody.
    pub async fn search_users(&self, keyword: &str) -> DomainResult<Vec<User>> {
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        self.user_repo
            .search(keyword)
            .await
            .map_err(map_repository_error)
    }

    /// Replace a user's profile, hashing the new password when one is given.
    pub async fn update_profile(&self, actor: &UserId, input: ProfileInput) -> DomainResult<User> {
        let password_hash = match input.password.as_ref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };
        let changes = ProfileChanges {
            username: input.username,
            full_name: input.full_name,
            bio: input.bio,
            password_hash,
        };

        self.user_repo
            .update_profile(actor, changes)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "identity_service_tests.rs"]
mod tests;
