//! Row structs bridging the Diesel schema and the domain model.
//!
//! Queryable rows are plain data; validation back into domain types happens
//! in `diesel_helpers`. Insertable rows borrow from the domain values they
//! are built from, so inserts never clone strings.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{friend_requests, friendships, notifications, post_likes, posts, users};

/// Profile projection of a `users` row. The credential hash is selected
/// separately and only where verification needs it.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub friend_count: i32,
    pub post_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new `users` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub bio: Option<&'a str>,
    pub friend_count: i32,
    pub post_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Changeset for a profile replacement.
///
/// `bio` always writes, clearing the column when `None`; `password_hash`
/// writes only when a new hash was supplied.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct ProfileChangesRow<'a> {
    pub username: &'a str,
    pub full_name: &'a str,
    #[diesel(treat_none_as_null = true)]
    pub bio: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

/// Full `friend_requests` row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = friend_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FriendRequestRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new pending request.
#[derive(Debug, Insertable)]
#[diesel(table_name = friend_requests)]
pub(crate) struct NewFriendRequestRow<'a> {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for one directed friendship row.
#[derive(Debug, Insertable)]
#[diesel(table_name = friendships)]
pub(crate) struct NewFriendshipRow {
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Full `posts` row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new `posts` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for one like ledger row.
#[derive(Debug, Insertable)]
#[diesel(table_name = post_likes)]
pub(crate) struct NewPostLikeRow {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Full `notifications` row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new `notifications` row.
#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: &'a str,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
