//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or any other protocol-specific envelope; the core only promises
//! a stable machine-readable code and a human-readable message. Every error
//! is a value returned to the caller; none of them abort the process.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A referenced entity (user, request, post, notification) is absent.
    NotFound,
    /// Registration or profile update collides with an existing username.
    DuplicateUsername,
    /// Post creation collides with an existing title (titles are global).
    DuplicateTitle,
    /// A pending request already exists for this exact (sender, receiver) pair.
    DuplicatePending,
    /// A user attempted to send a friend request to themselves.
    SelfRequest,
    /// A user attempted to remove themselves from their own friend list.
    SelfRemoval,
    /// A state transition was attempted on a request that is no longer pending.
    AlreadyResolved,
    /// The actor is not the entity entitled to perform this action.
    NotAuthorized,
    /// The username exists but the supplied password does not match.
    BadCredential,
    /// Edge removal was requested for a pair that is not friends.
    NotFriends,
    /// The store aborted the transaction due to a concurrent conflict; the
    /// caller may retry.
    StoreConflict,
    /// The persistence layer cannot be reached.
    Unavailable,
    /// An unexpected error occurred inside the domain.
    Internal,
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` is non-empty: every constructor supplies one.
///
/// # Examples
/// ```
/// use mingle_core::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("no user with id 42");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Error {
    code: ErrorCode,
    message: String,
}

impl Error {
    /// Create a new error with an explicit code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// A referenced entity does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// The username is already taken.
    pub fn duplicate_username(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateUsername, message)
    }

    /// The post title is already taken.
    pub fn duplicate_title(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateTitle, message)
    }

    /// A pending request already exists for this pair.
    pub fn duplicate_pending(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicatePending, message)
    }

    /// Self-directed friend request.
    pub fn self_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SelfRequest, message)
    }

    /// Self-directed friend removal.
    pub fn self_removal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SelfRemoval, message)
    }

    /// The request has already been accepted or declined.
    pub fn already_resolved(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyResolved, message)
    }

    /// The actor may not perform this action.
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotAuthorized, message)
    }

    /// The supplied password does not match the stored credential.
    pub fn bad_credential(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadCredential, message)
    }

    /// The pair is not friends.
    pub fn not_friends(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFriends, message)
    }

    /// The transaction was aborted by a concurrent conflict.
    pub fn store_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreConflict, message)
    }

    /// The persistence layer is unreachable.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unavailable, message)
    }

    /// An unexpected internal failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {}
