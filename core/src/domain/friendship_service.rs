//! Friendship graph domain service.
//!
//! Friend request lifecycle and symmetric friendship edges. Self-directed
//! refusals are decided here; everything that needs store state (duplicate
//! pending detection, authorization, edge existence) is decided inside the
//! repository's transaction and mapped from its error variants.

use std::sync::Arc;

use crate::domain::ports::{FriendshipRepository, FriendshipRepositoryError, NewFriendRequest};
use crate::domain::{
    DomainResult, Error, FriendRequest, FriendshipAccepted, RequestId, User, UserId,
};

fn map_repository_error(error: FriendshipRepositoryError) -> Error {
    match error {
        FriendshipRepositoryError::Connection { message } => {
            Error::unavailable(format!("friendship repository unavailable: {message}"))
        }
        FriendshipRepositoryError::Query { message } => {
            Error::internal(format!("friendship repository error: {message}"))
        }
        FriendshipRepositoryError::Conflict { message } => {
            Error::store_conflict(format!("friendship repository conflict: {message}"))
        }
        FriendshipRepositoryError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
        FriendshipRepositoryError::RequestNotFound { request_id } => {
            Error::not_found(format!("friend request {request_id} not found"))
        }
        FriendshipRepositoryError::NotReceiver { request_id } => Error::not_authorized(format!(
            "friend request {request_id} can only be resolved by its receiver"
        )),
        FriendshipRepositoryError::AlreadyResolved { status } => {
            Error::already_resolved(format!("friend request already {status}"))
        }
        FriendshipRepositoryError::DuplicatePending {
            sender_id,
            receiver_id,
        } => Error::duplicate_pending(format!(
            "a request from {sender_id} to {receiver_id} is still pending"
        )),
        FriendshipRepositoryError::NotFriends { user_id, friend_id } => {
            Error::not_friends(format!("{user_id} and {friend_id} are not friends"))
        }
    }
}

/// Friendship service implementing the request lifecycle and edge reads.
#[derive(Clone)]
pub struct FriendshipService<R> {
    friendship_repo: Arc<R>,
}

impl<R> FriendshipService<R> {
    /// Create a new service with the friendship repository.
    pub fn new(friendship_repo: Arc<R>) -> Self {
        Self { friendship_repo }
    }
}

impl<R> FriendshipService<R>
where
    R: FriendshipRepository,
{
    /// Send a friend request from `sender` to `receiver`.
    ///
    /// The receiver is notified in the same transaction. At most one pending
    /// request may exist per ordered pair; a resolved request never blocks a
    /// new one.
    pub async fn send_request(
        &self,
        sender: &UserId,
        receiver: &UserId,
    ) -> DomainResult<FriendRequest> {
        if sender == receiver {
            return Err(Error::self_request(
                "cannot send a friend request to yourself",
            ));
        }

        let request = NewFriendRequest {
            id: RequestId::random(),
            sender_id: *sender,
            receiver_id: *receiver,
        };

        self.friendship_repo
            .insert_request(request)
            .await
            .map_err(map_repository_error)
    }

    /// Accept a pending request addressed to `actor`.
    ///
    /// Resolves a reciprocal pending request from the same pair, creates the
    /// symmetric edge, adjusts both friend counters when the edge is new,
    /// and notifies both parties, all in one transaction.
    pub async fn accept_request(
        &self,
        actor: &UserId,
        request_id: &RequestId,
    ) -> DomainResult<FriendshipAccepted> {
        self.friendship_repo
            .accept_request(actor, request_id)
            .await
            .map_err(map_repository_error)
    }

    /// Decline a pending request addressed to `actor`. No side effects.
    pub async fn decline_request(
        &self,
        actor: &UserId,
        request_id: &RequestId,
    ) -> DomainResult<FriendRequest> {
        self.friendship_repo
            .decline_request(actor, request_id)
            .await
            .map_err(map_repository_error)
    }

    /// Remove the friendship between `user` and `other`.
    ///
    /// Both directed rows disappear and both friend counters decrement,
    /// clamped at zero, in one transaction.
    pub async fn remove_friend(&self, user: &UserId, other: &UserId) -> DomainResult<()> {
        if user == other {
            return Err(Error::self_removal("cannot remove yourself as a friend"));
        }

        self.friendship_repo
            .remove_friendship(user, other)
            .await
            .map_err(map_repository_error)
    }

    /// Whether `a` and `b` are currently friends. Single edge lookup.
    pub async fn is_friend(&self, a: &UserId, b: &UserId) -> DomainResult<bool> {
        self.friendship_repo
            .are_friends(a, b)
            .await
            .map_err(map_repository_error)
    }

    /// Pending requests addressed to `user`, newest first.
    pub async fn pending_requests(&self, user: &UserId) -> DomainResult<Vec<FriendRequest>> {
        self.friendship_repo
            .pending_requests_for(user)
            .await
            .map_err(map_repository_error)
    }

    /// The user's current friends.
    pub async fn friends(&self, user: &UserId) -> DomainResult<Vec<User>> {
        self.friendship_repo
            .friends_of(user)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "friendship_service_tests.rs"]
mod tests;
