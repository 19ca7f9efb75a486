//! Shared helper utilities for the integration tests.
//!
//! Integration tests compile as separate crates under `core/tests/`, which
//! makes it awkward to share the backend wiring without copy/paste. The
//! [`TestBackend`] here drives every domain service over one shared
//! in-memory store, the same shape a deployment has over PostgreSQL.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mingle_core::domain::{
    ContentService, FriendshipService, FullName, IdentityService, LikeService, NewUserInput,
    NotificationService, Password, Post, PostDescription, PostTitle, User, Username,
};
use mingle_core::outbound::memory::MemoryStore;
use uuid::Uuid;

/// Every domain service, wired over one shared store.
pub struct TestBackend {
    pub identity: IdentityService<MemoryStore>,
    pub friendships: FriendshipService<MemoryStore>,
    pub content: ContentService<MemoryStore>,
    pub likes: LikeService<MemoryStore>,
    pub notifications: NotificationService<MemoryStore>,
}

impl TestBackend {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            identity: IdentityService::new(Arc::clone(&store)),
            friendships: FriendshipService::new(Arc::clone(&store)),
            content: ContentService::new(Arc::clone(&store)),
            likes: LikeService::new(Arc::clone(&store)),
            notifications: NotificationService::new(store),
        }
    }

    /// Register a user with a fixed password of `correct horse`.
    pub async fn register(&self, username: &str, full_name: &str) -> User {
        self.identity
            .register(NewUserInput {
                username: Username::new(username).expect("valid username"),
                password: Password::new("correct horse").expect("valid password"),
                full_name: FullName::new(full_name).expect("valid full name"),
                bio: None,
            })
            .await
            .expect("registration succeeds")
    }

    /// Make two users friends through the request lifecycle.
    pub async fn befriend(&self, a: &User, b: &User) {
        let request = self
            .friendships
            .send_request(&a.id, &b.id)
            .await
            .expect("request sends");
        self.friendships
            .accept_request(&b.id, &request.id)
            .await
            .expect("request accepts");
    }

    /// Publish a post with a stock body.
    pub async fn publish(&self, owner: &User, title: &str) -> Post {
        self.content
            .create_post(
                &owner.id,
                PostTitle::new(title).expect("valid title"),
                PostDescription::new("a post body").expect("valid description"),
            )
            .await
            .expect("post publishes")
    }
}

/// Assert a listing is ordered newest first, ties broken by ascending id.
///
/// Entries created in the same instant make exact sequences nondeterministic,
/// so ordering is asserted as a property of consecutive pairs instead.
pub fn assert_newest_first<T>(items: &[T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    for pair in items.windows(2) {
        if let [earlier, later] = pair {
            let (at_a, id_a) = key(earlier);
            let (at_b, id_b) = key(later);
            assert!(
                at_a > at_b || (at_a == at_b && id_a <= id_b),
                "expected newest-first order, got {at_a} (id {id_a}) before {at_b} (id {id_b})"
            );
        }
    }
}
