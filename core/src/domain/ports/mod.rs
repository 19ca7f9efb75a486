//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters.
//! Each trait exposes strongly typed errors so adapters map their failures
//! into predictable variants instead of returning a catch-all. Refusals that
//! can only be detected inside the store's transaction (duplicate pending
//! request, non-receiver resolution, missing rows) are port error variants;
//! the services translate them into the domain taxonomy.

mod friendship_repository;
mod like_repository;
mod notification_repository;
mod post_repository;
mod user_repository;

#[cfg(test)]
pub use friendship_repository::MockFriendshipRepository;
pub use friendship_repository::{
    FixtureFriendshipRepository, FriendshipRepository, FriendshipRepositoryError,
    NewFriendRequest,
};
#[cfg(test)]
pub use like_repository::MockLikeRepository;
pub use like_repository::{FixtureLikeRepository, LikeRepository, LikeRepositoryError};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{
    FixtureNotificationRepository, NewNotification, NotificationRepository,
    NotificationRepositoryError,
};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{FixturePostRepository, NewPost, PostRepository, PostRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    FixtureUserRepository, NewUserRecord, ProfileChanges, StoredCredentials, UserRepository,
    UserRepositoryError,
};
