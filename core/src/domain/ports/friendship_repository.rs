//! Port for friend request and friendship edge persistence.

use async_trait::async_trait;

use crate::domain::{
    FriendRequest, FriendshipAccepted, RequestId, RequestStatus, User, UserId,
};

/// Errors raised by friendship repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FriendshipRepositoryError {
    /// Repository connection could not be established.
    #[error("friendship repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("friendship repository query failed: {message}")]
    Query { message: String },

    /// The store aborted the transaction due to a concurrent conflict.
    #[error("friendship repository transaction conflict: {message}")]
    Conflict { message: String },

    /// A referenced user row does not exist.
    #[error("no user with id {user_id}")]
    UserNotFound { user_id: UserId },

    /// No request row exists for the given id.
    #[error("no friend request with id {request_id}")]
    RequestNotFound { request_id: RequestId },

    /// The acting user is not the receiver of the request.
    #[error("request {request_id} can only be resolved by its receiver")]
    NotReceiver { request_id: RequestId },

    /// The request has already left the pending state.
    #[error("request already resolved as {status}")]
    AlreadyResolved { status: RequestStatus },

    /// A pending request for this ordered pair already exists.
    #[error("a request from {sender_id} to {receiver_id} is still pending")]
    DuplicatePending {
        sender_id: UserId,
        receiver_id: UserId,
    },

    /// No friendship edge exists between the pair.
    #[error("{user_id} and {friend_id} are not friends")]
    NotFriends { user_id: UserId, friend_id: UserId },
}

impl FriendshipRepositoryError {
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

    /// Create a missing-request error.
    pub const fn request_not_found(request_id: RequestId) -> Self {
        Self::RequestNotFound { request_id }
    }

    /// Create a wrong-receiver error.
    pub const fn not_receiver(request_id: RequestId) -> Self {
        Self::NotReceiver { request_id }
    }

    /// Create an already-resolved error.
    pub const fn already_resolved(status: RequestStatus) -> Self {
        Self::AlreadyResolved { status }
    }

    /// Create a duplicate-pending error.
    pub const fn duplicate_pending(sender_id: UserId, receiver_id: UserId) -> Self {
        Self::DuplicatePending {
            sender_id,
            receiver_id,
        }
    }

    /// Create a not-friends error.
    pub const fn not_friends(user_id: UserId, friend_id: UserId) -> Self {
        Self::NotFriends { user_id, friend_id }
    }
}

/// Validated input for inserting a new pending request.
///
/// The self-request check happens before this record is built; adapters can
/// assume `sender_id != receiver_id`.
#[derive(Debug, Clone)]
pub struct NewFriendRequest {
    /// Identifier chosen by the caller.
    pub id: RequestId,
    /// User who initiates the request.
    pub sender_id: UserId,
    /// User the request is addressed to.
    pub receiver_id: UserId,
}

/// Port for mutating and reading the friendship graph.
///
/// Multi-step operations (accept, remove) are transactional in every adapter:
/// the request flip, edge rows, counters, and notifications commit together
/// or not at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// Insert a pending request and append the receiver's notification.
    ///
    /// Verifies both users exist and that no pending request already covers
    /// this ordered pair.
    async fn insert_request(
        &self,
        request: NewFriendRequest,
    ) -> Result<FriendRequest, FriendshipRepositoryError>;

    /// Resolve a pending request as accepted, acting as `receiver`.
    ///
    /// Collapses a reciprocal pending request, creates the symmetric edge
    /// idempotently, increments both friend counters only when the edge is
    /// new, and appends a confirmation notification to each party.
    async fn accept_request(
        &self,
        receiver: &UserId,
        request_id: &RequestId,
    ) -> Result<FriendshipAccepted, FriendshipRepositoryError>;

    /// Resolve a pending request as declined, acting as `receiver`.
    ///
    /// No edge, counter, or notification side effects.
    async fn decline_request(
        &self,
        receiver: &UserId,
        request_id: &RequestId,
    ) -> Result<FriendRequest, FriendshipRepositoryError>;

    /// Remove the symmetric edge between two users.
    ///
    /// Deletes both directed rows and decrements both friend counters,
    /// clamped at zero.
    async fn remove_friendship(
        &self,
        user_id: &UserId,
        friend_id: &UserId,
    ) -> Result<(), FriendshipRepositoryError>;

    /// Whether a friendship edge exists between the pair.
    ///
    /// Single edge lookup, independent of friend list length.
    async fn are_friends(
        &self,
        user_id: &UserId,
        other_id: &UserId,
    ) -> Result<bool, FriendshipRepositoryError>;

    /// Pending requests addressed to `receiver`, newest first.
    async fn pending_requests_for(
        &self,
        receiver: &UserId,
    ) -> Result<Vec<FriendRequest>, FriendshipRepositoryError>;

    /// The user's current friends.
    async fn friends_of(&self, user_id: &UserId) -> Result<Vec<User>, FriendshipRepositoryError>;
}

/// Fixture implementation for tests that do not exercise the graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFriendshipRepository;

#[async_trait]
impl FriendshipRepository for FixtureFriendshipRepository {
    async fn insert_request(
        &self,
        request: NewFriendRequest,
    ) -> Result<FriendRequest, FriendshipRepositoryError> {
        Ok(FriendRequest {
            id: request.id,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            status: RequestStatus::Pending,
            created_at: chrono::Utc::now(),
        })
    }

    async fn accept_request(
        &self,
        _receiver: &UserId,
        request_id: &RequestId,
    ) -> Result<FriendshipAccepted, FriendshipRepositoryError> {
        Err(FriendshipRepositoryError::request_not_found(*request_id))
    }

    async fn decline_request(
        &self,
        _receiver: &UserId,
        request_id: &RequestId,
    ) -> Result<FriendRequest, FriendshipRepositoryError> {
        Err(FriendshipRepositoryError::request_not_found(*request_id))
    }

    async fn remove_friendship(
        &self,
        user_id: &UserId,
        friend_id: &UserId,
    ) -> Result<(), FriendshipRepositoryError> {
        Err(FriendshipRepositoryError::not_friends(*user_id, *friend_id))
    }

    async fn are_friends(
        &self,
        _user_id: &UserId,
        _other_id: &UserId,
    ) -> Result<bool, FriendshipRepositoryError> {
        Ok(false)
    }

    async fn pending_requests_for(
        &self,
        _receiver: &UserId,
    ) -> Result<Vec<FriendRequest>, FriendshipRepositoryError> {
        Ok(Vec::new())
    }

    async fn friends_of(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<User>, FriendshipRepositoryError> {
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
    async fn fixture_insert_echoes_a_pending_request() {
        let repo = FixtureFriendshipRepository;
        let request = NewFriendRequest {
            id: RequestId::random(),
            sender_id: UserId::random(),
            receiver_id: UserId::random(),
        };
        let sender_id = request.sender_id;

        let inserted = repo
            .insert_request(request)
            .await
            .expect("fixture insert succeeds");

        assert_eq!(inserted.sender_id, sender_id);
        assert_eq!(inserted.status, RequestStatus::Pending);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_reads_are_empty() {
        let repo = FixtureFriendshipRepository;
        let user = UserId::random();

        assert!(
            !repo
                .are_friends(&user, &UserId::random())
                .await
                .expect("fixture lookup succeeds")
        );
        assert!(
            repo.pending_requests_for(&user)
                .await
                .expect("fixture list succeeds")
                .is_empty()
        );
    }

    #[rstest]
    fn already_resolved_error_formats_status() {
        let err = FriendshipRepositoryError::already_resolved(RequestStatus::Declined);
        assert!(err.to_string().contains("declined"));
    }
}
