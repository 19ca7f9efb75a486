//! PostgreSQL-backed `PostRepository` implementation using Diesel ORM.
//!
//! Creating and deleting posts maintains the owner's `post_count` inside
//! the same transaction, with the owner row locked `FOR UPDATE`. Deletion
//! also clears the post's like ledger so no orphaned rows survive.

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{NewPost, PostRepository, PostRepositoryError};
use crate::domain::{Post, PostId, UserId};

use super::diesel_helpers::{lock_post_row, lock_user_row, post_from_row};
use super::models::{NewPostRow, PostRow};
use super::pool::{DbPool, PoolError};
use super::schema::{friendships, post_likes, posts, users};

/// Diesel-backed implementation of the `PostRepository` port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain post repository errors.
fn map_pool_error(error: PoolError) -> PostRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            PostRepositoryError::connection(message)
        }
    }
}

/// Map Diesel errors to domain post repository errors.
fn map_diesel_error(error: DieselError) -> PostRepositoryError {
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
        DieselError::NotFound => PostRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => PostRepositoryError::query("database query error"),
        DieselError::DeserializationError(_) => {
            PostRepositoryError::query("stored row failed validation")
        }
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::SerializationFailure => {
                PostRepositoryError::conflict(info.message().to_owned())
            }
            DatabaseErrorKind::ClosedConnection => {
                PostRepositoryError::connection("database connection error")
            }
            _ => PostRepositoryError::query("database error"),
        },
        _ => PostRepositoryError::query("database error"),
    }
}

/// Whether a unique violation names the global title constraint.
fn is_title_constraint(name: Option<&str>) -> bool {
    name.is_some_and(|name| name.contains("title"))
}

/// Map an insert error, translating a title unique violation into the
/// dedicated duplicate error. Covers the race where two posts with the
/// same title pass the in-transaction check together.
fn map_title_collision(error: DieselError, title: &str) -> PostRepositoryError {
    use diesel::result::DatabaseErrorKind;

    match &error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if is_title_constraint(info.constraint_name()) =>
        {
            PostRepositoryError::duplicate_title(title)
        }
        _ => map_diesel_error(error),
    }
}

enum CreateOutcome {
    Created(PostRow),
    OwnerMissing,
    TitleTaken,
}

enum DeleteOutcome {
    Deleted,
    Missing,
    NotOwner,
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, PostRepositoryError> {
        let post_id = *post.id.as_uuid();
        let owner_id = *post.owner_id.as_uuid();
        let title: &str = post.title.as_ref();
        let description: &str = post.description.as_ref();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let Some(owner) = lock_user_row(conn, owner_id).await? else {
                        return Ok(CreateOutcome::OwnerMissing);
                    };

                    let title_taken: bool = diesel::select(exists(
                        posts::table.filter(posts::title.eq(title)),
                    ))
                    .get_result(conn)
                    .await?;
                    if title_taken {
                        return Ok(CreateOutcome::TitleTaken);
                    }

                    let new_row = NewPostRow {
                        id: post_id,
                        owner_id,
                        title,
                        description,
                        like_count: 0,
                        created_at: Utc::now(),
                    };
                    let row: PostRow = diesel::insert_into(posts::table)
                        .values(&new_row)
                        .returning(PostRow::as_returning())
                        .get_result(conn)
                        .await?;

                    diesel::update(users::table.find(owner_id))
                        .set(users::post_count.eq(owner.post_count + 1))
                        .execute(conn)
                        .await?;

                    Ok(CreateOutcome::Created(row))
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| map_title_collision(error, post.title.as_ref()))?;

        match outcome {
            CreateOutcome::Created(row) => post_from_row(row).map_err(map_diesel_error),
            CreateOutcome::OwnerMissing => {
                Err(PostRepositoryError::user_not_found(post.owner_id))
            }
            CreateOutcome::TitleTaken => {
                Err(PostRepositoryError::duplicate_title(post.title.as_ref()))
            }
        }
    }

    async fn delete(
        &self,
        actor: &UserId,
        post_id: &PostId,
    ) -> Result<(), PostRepositoryError> {
        let actor_uuid = *actor.as_uuid();
        let post_uuid = *post_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let Some(post_row) = lock_post_row(conn, post_uuid).await? else {
                        return Ok(DeleteOutcome::Missing);
                    };
                    if post_row.owner_id != actor_uuid {
                        return Ok(DeleteOutcome::NotOwner);
                    }

                    let owner = lock_user_row(conn, post_row.owner_id)
                        .await?
                        .ok_or(DieselError::NotFound)?;

                    diesel::delete(post_likes::table.filter(post_likes::post_id.eq(post_uuid)))
                        .execute(conn)
                        .await?;
                    diesel::delete(posts::table.find(post_uuid))
                        .execute(conn)
                        .await?;

                    diesel::update(users::table.find(post_row.owner_id))
                        .set(users::post_count.eq((owner.post_count - 1).max(0)))
                        .execute(conn)
                        .await?;

                    Ok(DeleteOutcome::Deleted)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match outcome {
            DeleteOutcome::Deleted => Ok(()),
            DeleteOutcome::Missing => Err(PostRepositoryError::post_not_found(*post_id)),
            DeleteOutcome::NotOwner => Err(PostRepositoryError::not_owner(*post_id)),
        }
    }

    async fn find_by_id(&self, post_id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PostRow> = posts::table
            .find(*post_id.as_uuid())
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(post_from_row).transpose().map_err(map_diesel_error)
    }

    async fn feed_for(&self, user_id: &UserId) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let friend_ids = friendships::table
            .filter(friendships::user_id.eq(*user_id.as_uuid()))
            .select(friendships::friend_id);
        let rows: Vec<PostRow> = posts::table
            .filter(
                posts::owner_id
                    .eq(*user_id.as_uuid())
                    .or(posts::owner_id.eq_any(friend_ids)),
            )
            .order((posts::created_at.desc(), posts::id.asc()))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(post_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_diesel_error)
    }

    async fn posts_by(&self, owner_id: &UserId) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PostRow> = posts::table
            .filter(posts::owner_id.eq(*owner_id.as_uuid()))
            .order((posts::created_at.desc(), posts::id.asc()))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(post_from_row)
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

        assert!(matches!(repo_err, PostRepositoryError::Connection { .. }));
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
            PostRepositoryError::Conflict { .. }
        ));
    }

    #[rstest]
    #[case(Some("posts_title_key"), true)]
    #[case(Some("posts_pkey"), false)]
    #[case(None, false)]
    fn title_constraints_are_recognised(#[case] name: Option<&str>, #[case] expected: bool) {
        assert_eq!(is_title_constraint(name), expected);
    }

    #[rstest]
    fn a_unique_violation_without_the_title_constraint_stays_generic() {
        let diesel_err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_owned()),
        );

        let repo_err = map_title_collision(diesel_err, "First post");

        assert!(matches!(repo_err, PostRepositoryError::Query { .. }));
    }
}
