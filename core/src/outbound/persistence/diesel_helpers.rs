//! Conversion helpers shared by the Diesel repository adapters.
//!
//! Fetched rows are plain strings and uuids; these functions lift them back
//! into validated domain types. A row that fails validation is corrupt by
//! definition, so the failure is wrapped as a Diesel deserialisation error:
//! inside a transaction that aborts it, and either way the adapter's error
//! mapping reports it as a query failure.

use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use super::models::{FriendRequestRow, NotificationRow, PostRow, UserRow};
use super::schema::{posts, users};
use crate::domain::{
    Bio, FriendRequest, FullName, Notification, NotificationId, NotificationMessage, Post,
    PostDescription, PostId, PostTitle, RequestId, RequestStatus, User, UserId, Username,
};

/// Wraps a domain validation failure on fetched data as a Diesel error.
pub(crate) fn corrupt_row(
    error: impl std::error::Error + Send + Sync + 'static,
) -> DieselError {
    DieselError::DeserializationError(Box::new(error))
}

/// Loads a user row under `FOR UPDATE`, serialising counter maintenance.
///
/// Callers that lock two users must lock them in ascending id order.
pub(crate) async fn lock_user_row(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<UserRow>, DieselError> {
    users::table
        .find(id)
        .select(UserRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

/// Loads a post row under `FOR UPDATE`, serialising like-counter updates.
pub(crate) async fn lock_post_row(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<PostRow>, DieselError> {
    posts::table
        .find(id)
        .select(PostRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

pub(crate) fn user_from_row(row: UserRow) -> Result<User, DieselError> {
    Ok(User {
        id: UserId::from_uuid(row.id),
        username: Username::new(row.username).map_err(corrupt_row)?,
        full_name: FullName::new(row.full_name).map_err(corrupt_row)?,
        bio: row.bio.map(Bio::new).transpose().map_err(corrupt_row)?,
        friend_count: row.friend_count,
        post_count: row.post_count,
        created_at: row.created_at,
    })
}

pub(crate) fn request_from_row(row: FriendRequestRow) -> Result<FriendRequest, DieselError> {
    Ok(FriendRequest {
        id: RequestId::from_uuid(row.id),
        sender_id: UserId::from_uuid(row.sender_id),
        receiver_id: UserId::from_uuid(row.receiver_id),
        status: RequestStatus::parse(&row.status).map_err(corrupt_row)?,
        created_at: row.created_at,
    })
}

pub(crate) fn post_from_row(row: PostRow) -> Result<Post, DieselError> {
    Ok(Post {
        id: PostId::from_uuid(row.id),
        owner_id: UserId::from_uuid(row.owner_id),
        title: PostTitle::new(row.title).map_err(corrupt_row)?,
        description: PostDescription::new(row.description).map_err(corrupt_row)?,
        like_count: row.like_count,
        created_at: row.created_at,
    })
}

pub(crate) fn notification_from_row(row: NotificationRow) -> Result<Notification, DieselError> {
    Ok(Notification {
        id: NotificationId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        message: NotificationMessage::new(row.message).map_err(corrupt_row)?,
        read: row.is_read,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn valid_rows_convert_to_domain_records() {
        let row = UserRow {
            id: Uuid::new_v4(),
            username: "alice".to_owned(),
            full_name: "Alice Liddell".to_owned(),
            bio: None,
            friend_count: 3,
            post_count: 1,
            created_at: Utc::now(),
        };

        let user = user_from_row(row).expect("valid row");
        assert_eq!(user.username.as_ref(), "alice");
        assert_eq!(user.friend_count, 3);
    }

    #[test]
    fn an_unknown_status_string_is_reported_as_corrupt() {
        let row = FriendRequestRow {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            status: "revoked".to_owned(),
            created_at: Utc::now(),
        };

        let error = request_from_row(row).expect_err("unknown status");
        assert!(matches!(error, DieselError::DeserializationError(_)));
    }

    #[test]
    fn a_blank_username_is_reported_as_corrupt() {
        let row = UserRow {
            id: Uuid::new_v4(),
            username: String::new(),
            full_name: "Alice Liddell".to_owned(),
            bio: None,
            friend_count: 0,
            post_count: 0,
            created_at: Utc::now(),
        };

        let error = user_from_row(row).expect_err("blank username");
        assert!(matches!(error, DieselError::DeserializationError(_)));
    }
}
