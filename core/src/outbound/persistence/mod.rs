//! Persistence adapters backed by PostgreSQL via Diesel.
//!
//! Each repository adapter owns a handle to the shared connection pool and
//! implements one domain port. Multi-step writes (request acceptance, like
//! toggling, post removal) run inside a single database transaction so the
//! denormalised counters can never drift from the rows they summarise.

mod diesel_friendship_repository;
mod diesel_helpers;
mod diesel_like_repository;
mod diesel_notification_repository;
mod diesel_post_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_friendship_repository::DieselFriendshipRepository;
pub use diesel_like_repository::DieselLikeRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_post_repository::DieselPostRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
