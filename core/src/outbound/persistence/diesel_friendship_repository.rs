//! PostgreSQL-backed `FriendshipRepository` implementation using Diesel ORM.
//!
//! Request resolution and edge removal are multi-step writes: the request
//! row, both directed edge rows, both friend counters, and the notification
//! log all move together. Each operation runs in one transaction, locking
//! the affected user rows `FOR UPDATE` in ascending id order so concurrent
//! accepts and removals serialise instead of deadlocking.

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{FriendshipRepository, FriendshipRepositoryError, NewFriendRequest};
use crate::domain::{
    FriendRequest, FriendshipAccepted, FullName, RequestId, RequestStatus, User, UserId,
    Username, friend_request_message, friendship_accepted_message,
};

use super::diesel_helpers::{corrupt_row, lock_user_row, request_from_row, user_from_row};
use super::models::{
    FriendRequestRow, NewFriendRequestRow, NewFriendshipRow, NewNotificationRow, UserRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{friend_requests, friendships, notifications, users};

/// Diesel-backed implementation of the `FriendshipRepository` port.
#[derive(Clone)]
pub struct DieselFriendshipRepository {
    pool: DbPool,
}

impl DieselFriendshipRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain friendship repository errors.
fn map_pool_error(error: PoolError) -> FriendshipRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            FriendshipRepositoryError::connection(message)
        }
    }
}

/// Map Diesel errors to domain friendship repository errors.
fn map_diesel_error(error: DieselError) -> FriendshipRepositoryError {
    use diesel::result::DatabaseErrorKind;

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => FriendshipRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => {
            FriendshipRepositoryError::query("database query error")
        }
        DieselError::DeserializationError(_) => {
            FriendshipRepositoryError::query("stored row failed validation")
        }
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::SerializationFailure => {
                FriendshipRepositoryError::conflict(info.message().to_owned())
            }
            DatabaseErrorKind::ClosedConnection => {
                FriendshipRepositoryError::connection("database connection error")
            }
            _ => FriendshipRepositoryError::query("database error"),
        },
        _ => FriendshipRepositoryError::query("database error"),
    }
}

/// Whether a unique violation names the pending-pair partial index.
fn is_pending_pair_constraint(name: Option<&str>) -> bool {
    name.is_some_and(|name| name.contains("pending"))
}

/// Map an insert error, translating a pending-pair unique violation into
/// the dedicated duplicate error. Covers the race where two identical
/// sends pass the in-transaction check together.
fn map_pending_collision(
    error: DieselError,
    sender_id: UserId,
    receiver_id: UserId,
) -> FriendshipRepositoryError {
    use diesel::result::DatabaseErrorKind;

    match &error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if is_pending_pair_constraint(info.constraint_name()) =>
        {
            FriendshipRepositoryError::duplicate_pending(sender_id, receiver_id)
        }
        _ => map_diesel_error(error),
    }
}

enum InsertOutcome {
    Inserted(FriendRequestRow),
    SenderMissing,
    ReceiverMissing,
    StillPending,
}

enum AcceptOutcome {
    Accepted {
        row: FriendRequestRow,
        edge_created: bool,
    },
    Missing,
    WrongReceiver,
    Resolved {
        status: RequestStatus,
    },
}

enum DeclineOutcome {
    Declined(FriendRequestRow),
    Missing,
    WrongReceiver,
    Resolved { status: RequestStatus },
}

enum RemoveOutcome {
    Removed,
    UserMissing(Uuid),
    NotFriends,
}

#[async_trait]
impl FriendshipRepository for DieselFriendshipRepository {
    async fn insert_request(
        &self,
        request: NewFriendRequest,
    ) -> Result<FriendRequest, FriendshipRepositoryError> {
        let request_id = *request.id.as_uuid();
        let sender_id = *request.sender_id.as_uuid();
        let receiver_id = *request.receiver_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let sender: Option<UserRow> = users::table
                        .find(sender_id)
                        .select(UserRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(sender) = sender else {
                        return Ok(InsertOutcome::SenderMissing);
                    };

                    let receiver_exists: bool =
                        diesel::select(exists(users::table.find(receiver_id)))
                            .get_result(conn)
                            .await?;
                    if !receiver_exists {
                        return Ok(InsertOutcome::ReceiverMissing);
                    }

                    let still_pending: bool = diesel::select(exists(
                        friend_requests::table.filter(
                            friend_requests::sender_id
                                .eq(sender_id)
                                .and(friend_requests::receiver_id.eq(receiver_id))
                                .and(
                                    friend_requests::status
                                        .eq(RequestStatus::Pending.as_str()),
                                ),
                        ),
                    ))
                    .get_result(conn)
                    .await?;
                    if still_pending {
                        return Ok(InsertOutcome::StillPending);
                    }

                    let now = Utc::now();
                    let new_row = NewFriendRequestRow {
                        id: request_id,
                        sender_id,
                        receiver_id,
                        status: RequestStatus::Pending.as_str(),
                        created_at: now,
                    };
                    let row: FriendRequestRow = diesel::insert_into(friend_requests::table)
                        .values(&new_row)
                        .returning(FriendRequestRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let sender_name = Username::new(sender.username).map_err(corrupt_row)?;
                    let message = friend_request_message(&sender_name);
                    let notification = NewNotificationRow {
                        id: Uuid::new_v4(),
                        user_id: receiver_id,
                        message: message.as_ref(),
                        is_read: false,
                        created_at: now,
                    };
                    diesel::insert_into(notifications::table)
                        .values(&notification)
                        .execute(conn)
                        .await?;

                    Ok(InsertOutcome::Inserted(row))
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| {
                map_pending_collision(error, request.sender_id, request.receiver_id)
            })?;

        match outcome {
            InsertOutcome::Inserted(row) => request_from_row(row).map_err(map_diesel_error),
            InsertOutcome::SenderMissing => {
                Err(FriendshipRepositoryError::user_not_found(request.sender_id))
            }
            InsertOutcome::ReceiverMissing => Err(FriendshipRepositoryError::user_not_found(
                request.receiver_id,
            )),
            InsertOutcome::StillPending => Err(FriendshipRepositoryError::duplicate_pending(
                request.sender_id,
                request.receiver_id,
            )),
        }
    }

    async fn accept_request(
        &self,
        receiver: &UserId,
        request_id: &RequestId,
    ) -> Result<FriendshipAccepted, FriendshipRepositoryError> {
        let receiver_uuid = *receiver.as_uuid();
        let request_uuid = *request_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let row: Option<FriendRequestRow> = friend_requests::table
                        .find(request_uuid)
                        .select(FriendRequestRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(row) = row else {
                        return Ok(AcceptOutcome::Missing);
                    };
                    if row.receiver_id != receiver_uuid {
                        return Ok(AcceptOutcome::WrongReceiver);
                    }
                    let status = RequestStatus::parse(&row.status).map_err(corrupt_row)?;
                    if !status.is_pending() {
                        return Ok(AcceptOutcome::Resolved { status });
                    }

                    let (first, second) = if row.sender_id <= row.receiver_id {
                        (row.sender_id, row.receiver_id)
                    } else {
                        (row.receiver_id, row.sender_id)
                    };
                    let first_row = lock_user_row(conn, first)
                        .await?
                        .ok_or(DieselError::NotFound)?;
                    let second_row = lock_user_row(conn, second)
                        .await?
                        .ok_or(DieselError::NotFound)?;
                    let (sender_row, receiver_row) = if first == row.sender_id {
                        (first_row, second_row)
                    } else {
                        (second_row, first_row)
                    };

                    // A reciprocal pending request resolves in the same accept.
                    diesel::update(
                        friend_requests::table.filter(
                            friend_requests::sender_id
                                .eq(row.receiver_id)
                                .and(friend_requests::receiver_id.eq(row.sender_id))
                                .and(
                                    friend_requests::status
                                        .eq(RequestStatus::Pending.as_str()),
                                ),
                        ),
                    )
                    .set(friend_requests::status.eq(RequestStatus::Accepted.as_str()))
                    .execute(conn)
                    .await?;

                    let edge_exists: bool = diesel::select(exists(
                        friendships::table.find((row.sender_id, row.receiver_id)),
                    ))
                    .get_result(conn)
                    .await?;

                    let now = Utc::now();
                    if !edge_exists {
                        let edge_rows = vec![
                            NewFriendshipRow {
                                user_id: row.sender_id,
                                friend_id: row.receiver_id,
                                created_at: now,
                            },
                            NewFriendshipRow {
                                user_id: row.receiver_id,
                                friend_id: row.sender_id,
                                created_at: now,
                            },
                        ];
                        diesel::insert_into(friendships::table)
                            .values(&edge_rows)
                            .execute(conn)
                            .await?;

                        diesel::update(users::table.find(row.sender_id))
                            .set(users::friend_count.eq(sender_row.friend_count + 1))
                            .execute(conn)
                            .await?;
                        diesel::update(users::table.find(row.receiver_id))
                            .set(users::friend_count.eq(receiver_row.friend_count + 1))
                            .execute(conn)
                            .await?;
                    }

                    let updated: FriendRequestRow =
                        diesel::update(friend_requests::table.find(request_uuid))
                            .set(
                                friend_requests::status
                                    .eq(RequestStatus::Accepted.as_str()),
                            )
                            .returning(FriendRequestRow::as_returning())
                            .get_result(conn)
                            .await?;

                    let sender_name =
                        FullName::new(sender_row.full_name).map_err(corrupt_row)?;
                    let receiver_name =
                        FullName::new(receiver_row.full_name).map_err(corrupt_row)?;
                    let sender_message = friendship_accepted_message(&receiver_name);
                    let receiver_message = friendship_accepted_message(&sender_name);
                    let notification_rows = vec![
                        NewNotificationRow {
                            id: Uuid::new_v4(),
                            user_id: row.sender_id,
                            message: sender_message.as_ref(),
                            is_read: false,
                            created_at: now,
                        },
                        NewNotificationRow {
                            id: Uuid::new_v4(),
                            user_id: row.receiver_id,
                            message: receiver_message.as_ref(),
                            is_read: false,
                            created_at: now,
                        },
                    ];
                    diesel::insert_into(notifications::table)
                        .values(&notification_rows)
                        .execute(conn)
                        .await?;

                    Ok(AcceptOutcome::Accepted {
                        row: updated,
                        edge_created: !edge_exists,
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match outcome {
            AcceptOutcome::Accepted { row, edge_created } => Ok(FriendshipAccepted {
                request: request_from_row(row).map_err(map_diesel_error)?,
                edge_created,
            }),
            AcceptOutcome::Missing => {
                Err(FriendshipRepositoryError::request_not_found(*request_id))
            }
            AcceptOutcome::WrongReceiver => {
                Err(FriendshipRepositoryError::not_receiver(*request_id))
            }
            AcceptOutcome::Resolved { status } => {
                Err(FriendshipRepositoryError::already_resolved(status))
            }
        }
    }

    async fn decline_request(
        &self,
        receiver: &UserId,
        request_id: &RequestId,
    ) -> Result<FriendRequest, FriendshipRepositoryError> {
        let receiver_uuid = *receiver.as_uuid();
        let request_uuid = *request_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let row: Option<FriendRequestRow> = friend_requests::table
                        .find(request_uuid)
                        .select(FriendRequestRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(row) = row else {
                        return Ok(DeclineOutcome::Missing);
                    };
                    if row.receiver_id != receiver_uuid {
                        return Ok(DeclineOutcome::WrongReceiver);
                    }
                    let status = RequestStatus::parse(&row.status).map_err(corrupt_row)?;
                    if !status.is_pending() {
                        return Ok(DeclineOutcome::Resolved { status });
                    }

                    let updated: FriendRequestRow =
                        diesel::update(friend_requests::table.find(request_uuid))
                            .set(
                                friend_requests::status
                                    .eq(RequestStatus::Declined.as_str()),
                            )
                            .returning(FriendRequestRow::as_returning())
                            .get_result(conn)
                            .await?;

                    Ok(DeclineOutcome::Declined(updated))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match outcome {
            DeclineOutcome::Declined(row) => request_from_row(row).map_err(map_diesel_error),
            DeclineOutcome::Missing => {
                Err(FriendshipRepositoryError::request_not_found(*request_id))
            }
            DeclineOutcome::WrongReceiver => {
                Err(FriendshipRepositoryError::not_receiver(*request_id))
            }
            DeclineOutcome::Resolved { status } => {
                Err(FriendshipRepositoryError::already_resolved(status))
            }
        }
    }

    async fn remove_friendship(
        &self,
        user_id: &UserId,
        friend_id: &UserId,
    ) -> Result<(), FriendshipRepositoryError> {
        let user_uuid = *user_id.as_uuid();
        let friend_uuid = *friend_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let (first, second) = if user_uuid <= friend_uuid {
                        (user_uuid, friend_uuid)
                    } else {
                        (friend_uuid, user_uuid)
                    };
                    let Some(first_row) = lock_user_row(conn, first).await? else {
                        return Ok(RemoveOutcome::UserMissing(first));
                    };
                    let Some(second_row) = lock_user_row(conn, second).await? else {
                        return Ok(RemoveOutcome::UserMissing(second));
                    };

                    let edge_exists: bool = diesel::select(exists(
                        friendships::table.find((user_uuid, friend_uuid)),
                    ))
                    .get_result(conn)
                    .await?;
                    if !edge_exists {
                        return Ok(RemoveOutcome::NotFriends);
                    }

                    diesel::delete(friendships::table.find((user_uuid, friend_uuid)))
                        .execute(conn)
                        .await?;
                    diesel::delete(friendships::table.find((friend_uuid, user_uuid)))
                        .execute(conn)
                        .await?;

                    diesel::update(users::table.find(first))
                        .set(users::friend_count.eq((first_row.friend_count - 1).max(0)))
                        .execute(conn)
                        .await?;
                    diesel::update(users::table.find(second))
                        .set(users::friend_count.eq((second_row.friend_count - 1).max(0)))
                        .execute(conn)
                        .await?;

                    Ok(RemoveOutcome::Removed)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match outcome {
            RemoveOutcome::Removed => Ok(()),
            RemoveOutcome::UserMissing(id) => Err(FriendshipRepositoryError::user_not_found(
                UserId::from_uuid(id),
            )),
            RemoveOutcome::NotFriends => Err(FriendshipRepositoryError::not_friends(
                *user_id, *friend_id,
            )),
        }
    }

    async fn are_friends(
        &self,
        user_id: &UserId,
        other_id: &UserId,
    ) -> Result<bool, FriendshipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(exists(
            friendships::table.find((*user_id.as_uuid(), *other_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn pending_requests_for(
        &self,
        receiver: &UserId,
    ) -> Result<Vec<FriendRequest>, FriendshipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<FriendRequestRow> = friend_requests::table
            .filter(
                friend_requests::receiver_id
                    .eq(*receiver.as_uuid())
                    .and(friend_requests::status.eq(RequestStatus::Pending.as_str())),
            )
            .order((
                friend_requests::created_at.desc(),
                friend_requests::id.asc(),
            ))
            .select(FriendRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(request_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_diesel_error)
    }

    async fn friends_of(&self, user_id: &UserId) -> Result<Vec<User>, FriendshipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let friend_ids = friendships::table
            .filter(friendships::user_id.eq(*user_id.as_uuid()))
            .select(friendships::friend_id);
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(friend_ids))
            .order(users::username.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use diesel::result::DatabaseErrorKind;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(
            repo_err,
            FriendshipRepositoryError::Connection { .. }
        ));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn serialization_failure_maps_to_conflict() {
        let diesel_err = DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure,
            Box::new("could not serialize access".to_owned()),
        );

        assert!(matches!(
            map_diesel_error(diesel_err),
            FriendshipRepositoryError::Conflict { .. }
        ));
    }

    #[rstest]
    #[case(Some("friend_requests_pending_pair_idx"), true)]
    #[case(Some("friend_requests_pkey"), false)]
    #[case(None, false)]
    fn pending_pair_constraints_are_recognised(
        #[case] name: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(is_pending_pair_constraint(name), expected);
    }

    #[rstest]
    fn a_unique_violation_without_the_pending_index_stays_generic() {
        let diesel_err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_owned()),
        );

        let repo_err = map_pending_collision(
            diesel_err,
            UserId::random(),
            UserId::random(),
        );

        assert!(matches!(repo_err, FriendshipRepositoryError::Query { .. }));
    }
}
