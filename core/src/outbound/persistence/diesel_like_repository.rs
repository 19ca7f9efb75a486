//! PostgreSQL-backed `LikeRepository` implementation using Diesel ORM.
//!
//! The toggle locks the post row `FOR UPDATE`, so concurrent toggles on the
//! same post serialise and the denormalised `like_count` always matches the
//! ledger. Liking someone else's post appends the owner's notification in
//! the same transaction; liking your own stays silent.

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{LikeRepository, LikeRepositoryError};
use crate::domain::{
    LikeAction, LikeToggle, PostId, PostTitle, UserId, Username, post_liked_message,
};

use super::diesel_helpers::{corrupt_row, lock_post_row};
use super::models::{NewNotificationRow, NewPostLikeRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{notifications, post_likes, posts, users};

/// Diesel-backed implementation of the `LikeRepository` port.
#[derive(Clone)]
pub struct DieselLikeRepository {
    pool: DbPool,
}

impl DieselLikeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain like ledger errors.
fn map_pool_error(error: PoolError) -> LikeRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            LikeRepositoryError::connection(message)
        }
    }
}

/// Map Diesel errors to domain like ledger errors.
fn map_diesel_error(error: DieselError) -> LikeRepositoryError {
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
        DieselError::NotFound => LikeRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => LikeRepositoryError::query("database query error"),
        DieselError::DeserializationError(_) => {
            LikeRepositoryError::query("stored row failed validation")
        }
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::SerializationFailure => {
                LikeRepositoryError::conflict(info.message().to_owned())
            }
            DatabaseErrorKind::ClosedConnection => {
                LikeRepositoryError::connection("database connection error")
            }
            _ => LikeRepositoryError::query("database error"),
        },
        _ => LikeRepositoryError::query("database error"),
    }
}

enum ToggleOutcome {
    Toggled { action: LikeAction, like_count: i32 },
    PostMissing,
    LikerMissing,
}

#[async_trait]
impl LikeRepository for DieselLikeRepository {
    async fn toggle(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> Result<LikeToggle, LikeRepositoryError> {
        let post_uuid = *post_id.as_uuid();
        let user_uuid = *user_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let Some(post_row) = lock_post_row(conn, post_uuid).await? else {
                        return Ok(ToggleOutcome::PostMissing);
                    };

                    let liker: Option<UserRow> = users::table
                        .find(user_uuid)
                        .select(UserRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(liker) = liker else {
                        return Ok(ToggleOutcome::LikerMissing);
                    };

                    let already_liked: bool = diesel::select(exists(
                        post_likes::table.find((post_uuid, user_uuid)),
                    ))
                    .get_result(conn)
                    .await?;

                    if already_liked {
                        diesel::delete(post_likes::table.find((post_uuid, user_uuid)))
                            .execute(conn)
                            .await?;

                        let new_count = (post_row.like_count - 1).max(0);
                        diesel::update(posts::table.find(post_uuid))
                            .set(posts::like_count.eq(new_count))
                            .execute(conn)
                            .await?;

                        return Ok(ToggleOutcome::Toggled {
                            action: LikeAction::Unliked,
                            like_count: new_count,
                        });
                    }

                    let now = Utc::now();
                    let ledger_row = NewPostLikeRow {
                        post_id: post_uuid,
                        user_id: user_uuid,
                        created_at: now,
                    };
                    diesel::insert_into(post_likes::table)
                        .values(&ledger_row)
                        .execute(conn)
                        .await?;

                    let new_count = post_row.like_count + 1;
                    diesel::update(posts::table.find(post_uuid))
                        .set(posts::like_count.eq(new_count))
                        .execute(conn)
                        .await?;

                    if post_row.owner_id != user_uuid {
                        let liker_name =
                            Username::new(liker.username).map_err(corrupt_row)?;
                        let title = PostTitle::new(post_row.title).map_err(corrupt_row)?;
                        let message = post_liked_message(&liker_name, &title);
                        let notification = NewNotificationRow {
                            id: Uuid::new_v4(),
                            user_id: post_row.owner_id,
                            message: message.as_ref(),
                            is_read: false,
                            created_at: now,
                        };
                        diesel::insert_into(notifications::table)
                            .values(&notification)
                            .execute(conn)
                            .await?;
                    }

                    Ok(ToggleOutcome::Toggled {
                        action: LikeAction::Liked,
                        like_count: new_count,
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match outcome {
            ToggleOutcome::Toggled { action, like_count } => {
                Ok(LikeToggle { action, like_count })
            }
            ToggleOutcome::PostMissing => Err(LikeRepositoryError::post_not_found(*post_id)),
            ToggleOutcome::LikerMissing => Err(LikeRepositoryError::user_not_found(*user_id)),
        }
    }

    async fn has_liked(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> Result<bool, LikeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(exists(
            post_likes::table.find((*post_id.as_uuid(), *user_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn count_for(&self, post_id: &PostId) -> Result<i64, LikeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        post_likes::table
            .filter(post_likes::post_id.eq(*post_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}
