//! Diesel table definitions for the social graph schema.
//!
//! The counters on `users` and `posts` are denormalised summaries of the
//! `friendships` and `post_likes` tables. Repository adapters maintain them
//! inside the same transaction as the rows they count.

diesel::table! {
    /// Registered accounts and their denormalised activity counters.
    users (id) {
        /// Primary key.
        id -> Uuid,
        /// Unique handle used for login and mentions.
        username -> Varchar,
        /// Argon2id digest in PHC string format.
        password_hash -> Varchar,
        /// Display name shown in notifications.
        full_name -> Varchar,
        /// Optional free-form profile text.
        bio -> Nullable<Text>,
        /// Number of accepted friendship edges, never negative.
        friend_count -> Int4,
        /// Number of posts the user currently owns, never negative.
        post_count -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Friend request lifecycle rows.
    ///
    /// A partial unique index on `(sender_id, receiver_id)` where
    /// `status = 'pending'` blocks duplicate open requests while leaving
    /// resolved history intact.
    friend_requests (id) {
        /// Primary key.
        id -> Uuid,
        /// User who sent the request.
        sender_id -> Uuid,
        /// User the request is addressed to.
        receiver_id -> Uuid,
        /// Lifecycle state: `pending`, `accepted` or `declined`.
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Accepted friendships, stored as two directed rows per edge.
    friendships (user_id, friend_id) {
        /// Owning side of this directed row.
        user_id -> Uuid,
        /// The befriended user.
        friend_id -> Uuid,
        /// When the edge was created.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// User posts with a denormalised like counter.
    posts (id) {
        /// Primary key.
        id -> Uuid,
        /// Author of the post.
        owner_id -> Uuid,
        /// Globally unique title.
        title -> Varchar,
        /// Post body.
        description -> Text,
        /// Number of `post_likes` rows for this post, never negative.
        like_count -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Like ledger: one row per (post, user) pair that currently likes.
    post_likes (post_id, user_id) {
        /// Liked post.
        post_id -> Uuid,
        /// User who likes it.
        user_id -> Uuid,
        /// When the like was recorded.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only notification feed.
    notifications (id) {
        /// Primary key.
        id -> Uuid,
        /// Recipient of the notification.
        user_id -> Uuid,
        /// Human-readable notification text.
        message -> Varchar,
        /// Whether the recipient has marked the notification read.
        is_read -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(posts -> users (owner_id));
diesel::joinable!(notifications -> users (user_id));
diesel::joinable!(post_likes -> posts (post_id));
diesel::joinable!(post_likes -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    friend_requests,
    friendships,
    posts,
    post_likes,
    notifications,
);
