//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed domain entities and the driving services
//! that enforce the social-graph invariants. Keep types immutable and
//! document invariants and serialisation contracts (serde) in each type's
//! Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode — transport-agnostic error payload and taxonomy.
//! - User, Username, FullName, Bio, Password, PasswordHash — identity types.
//! - FriendRequest, RequestStatus, Friendship, FriendshipAccepted — graph types.
//! - Post, PostTitle, PostDescription, LikeAction, LikeToggle — content types.
//! - Notification, NotificationMessage — notification log types.
//! - IdentityService, FriendshipService, ContentService, LikeService,
//!   NotificationService — one driving service per component.

pub mod error;
pub mod ports;
pub mod user;

mod content_service;
mod friendship;
mod friendship_service;
mod identity_service;
mod like_service;
mod notification;
mod notification_service;
mod post;

pub use self::content_service::ContentService;
pub use self::error::{Error, ErrorCode};
pub use self::friendship::{
    FriendRequest, Friendship, FriendshipAccepted, RequestId, RequestStatus, RequestStatusParseError,
};
pub use self::friendship_service::FriendshipService;
pub use self::identity_service::{IdentityService, NewUserInput, ProfileInput};
pub use self::like_service::LikeService;
pub use self::notification::{
    Notification, NotificationId, NotificationMessage, NotificationValidationError,
    friend_request_message, friendship_accepted_message, post_liked_message,
};
pub use self::notification_service::NotificationService;
pub use self::post::{
    LikeAction, LikeToggle, Post, PostId, PostTitle, PostDescription, PostValidationError,
};
pub use self::user::{
    Bio, FullName, Password, PasswordHash, User, UserId, UserValidationError, Username,
};

/// Convenient result alias for domain operations.
pub type DomainResult<T> = Result<T, Error>;
