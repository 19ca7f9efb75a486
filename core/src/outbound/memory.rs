//! In-memory implementation of every repository port.
//!
//! One mutex guards the whole store, so each operation is atomic exactly the
//! way the Diesel adapters' transactions are: request flips, edge rows,
//! counters, and notifications move together. The integration tests drive the
//! domain services over this store; consumers can embed it for theirs.
//!
//! Refusals mirror the PostgreSQL adapters variant for variant. The one
//! divergence is unrepresentable states (a request whose user rows vanished):
//! the database surfaces those as query errors, this store as `UserNotFound`.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::ports::{
    FriendshipRepository, FriendshipRepositoryError, LikeRepository, LikeRepositoryError,
    NewFriendRequest, NewNotification, NewPost, NewUserRecord, NotificationRepository,
    NotificationRepositoryError, PostRepository, PostRepositoryError, ProfileChanges,
    StoredCredentials, UserRepository, UserRepositoryError,
};
use crate::domain::{
    FriendRequest, FriendshipAccepted, LikeAction, LikeToggle, Notification, NotificationId,
    NotificationMessage, PasswordHash, Post, PostId, RequestId, RequestStatus, User, UserId,
    friend_request_message, friendship_accepted_message, post_liked_message,
};

/// A user row together with the credential hash that never leaves the store
/// through profile reads.
#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: PasswordHash,
}

/// Mutable store contents. Friendship edges and like ledger rows are keyed
/// the same way the database keys them: `(user_id, friend_id)` directed
/// pairs and `(post_id, user_id)` pairs.
#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, StoredUser>,
    requests: HashMap<Uuid, FriendRequest>,
    edges: HashSet<(Uuid, Uuid)>,
    posts: HashMap<Uuid, Post>,
    likes: HashSet<(Uuid, Uuid)>,
    notifications: Vec<Notification>,
}

impl MemoryState {
    fn push_notification(&mut self, user_id: UserId, message: NotificationMessage) {
        self.notifications.push(Notification {
            id: NotificationId::random(),
            user_id,
            message,
            read: false,
            created_at: Utc::now(),
        });
    }

    fn username_taken(&self, username: &str, exclude: Option<Uuid>) -> bool {
        self.users.values().any(|stored| {
            stored.user.username.as_ref() == username
                && Some(*stored.user.id.as_uuid()) != exclude
        })
    }

    fn title_taken(&self, title: &str) -> bool {
        self.posts.values().any(|post| post.title.as_ref() == title)
    }

    fn pending_between(&self, sender: Uuid, receiver: Uuid) -> bool {
        self.requests.values().any(|request| {
            *request.sender_id.as_uuid() == sender
                && *request.receiver_id.as_uuid() == receiver
                && request.status.is_pending()
        })
    }
}

/// Mutex-guarded store implementing all five repository ports.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the store, recovering the guard if a test thread panicked while
    /// holding it. No operation leaves the state half-mutated, so the
    /// contents stay coherent either way.
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, record: NewUserRecord) -> Result<User, UserRepositoryError> {
        let mut state = self.lock();
        if state.username_taken(record.username.as_ref(), None) {
            return Err(UserRepositoryError::duplicate_username(
                record.username.as_ref(),
            ));
        }
        let user = User {
            id: record.id,
            username: record.username,
            full_name: record.full_name,
            bio: record.bio,
            friend_count: 0,
            post_count: 0,
            created_at: Utc::now(),
        };
        state.users.insert(
            *user.id.as_uuid(),
            StoredUser {
                user: user.clone(),
                password_hash: record.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock();
        Ok(state.users.get(id.as_uuid()).map(|stored| stored.user.clone()))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .find(|stored| stored.user.username.as_ref() == username)
            .map(|stored| stored.user.clone()))
    }

    async fn credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .find(|stored| stored.user.username.as_ref() == username)
            .map(|stored| StoredCredentials {
                user_id: stored.user.id,
                password_hash: stored.password_hash.clone(),
            }))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<User>, UserRepositoryError> {
        let state = self.lock();
        let needle = keyword.to_lowercase();
        let mut matched: Vec<User> = state
            .users
            .values()
            .filter(|stored| {
                stored.user.username.as_ref().to_lowercase().contains(&needle)
                    || stored.user.full_name.as_ref().to_lowercase().contains(&needle)
            })
            .map(|stored| stored.user.clone())
            .collect();
        matched.sort_by(|a, b| a.username.as_ref().cmp(b.username.as_ref()));
        Ok(matched)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
    ) -> Result<User, UserRepositoryError> {
        let mut state = self.lock();
        if !state.users.contains_key(id.as_uuid()) {
            return Err(UserRepositoryError::user_not_found(*id));
        }
        if state.username_taken(changes.username.as_ref(), Some(*id.as_uuid())) {
            return Err(UserRepositoryError::duplicate_username(
                changes.username.as_ref(),
            ));
        }
        let Some(stored) = state.users.get_mut(id.as_uuid()) else {
            return Err(UserRepositoryError::user_not_found(*id));
        };
        stored.user.username = changes.username;
        stored.user.full_name = changes.full_name;
        stored.user.bio = changes.bio;
        if let Some(hash) = changes.password_hash {
            stored.password_hash = hash;
        }
        Ok(stored.user.clone())
    }
}

#[async_trait]
impl FriendshipRepository for MemoryStore {
    async fn insert_request(
        &self,
        request: NewFriendRequest,
    ) -> Result<FriendRequest, FriendshipRepositoryError> {
        let mut state = self.lock();
        let Some(sender_name) = state
            .users
            .get(request.sender_id.as_uuid())
            .map(|stored| stored.user.username.clone())
        else {
            return Err(FriendshipRepositoryError::user_not_found(request.sender_id));
        };
        if !state.users.contains_key(request.receiver_id.as_uuid()) {
            return Err(FriendshipRepositoryError::user_not_found(
                request.receiver_id,
            ));
        }
        if state.pending_between(
            *request.sender_id.as_uuid(),
            *request.receiver_id.as_uuid(),
        ) {
            return Err(FriendshipRepositoryError::duplicate_pending(
                request.sender_id,
                request.receiver_id,
            ));
        }
        let inserted = FriendRequest {
            id: request.id,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        };
        state.requests.insert(*inserted.id.as_uuid(), inserted.clone());
        state.push_notification(request.receiver_id, friend_request_message(&sender_name));
        Ok(inserted)
    }

    async fn accept_request(
        &self,
        receiver: &UserId,
        request_id: &RequestId,
    ) -> Result<FriendshipAccepted, FriendshipRepositoryError> {
        let mut state = self.lock();
        let Some(request) = state.requests.get(request_id.as_uuid()).cloned() else {
            return Err(FriendshipRepositoryError::request_not_found(*request_id));
        };
        if request.receiver_id != *receiver {
            return Err(FriendshipRepositoryError::not_receiver(*request_id));
        }
        if !request.status.is_pending() {
            return Err(FriendshipRepositoryError::already_resolved(request.status));
        }

        let sender_uuid = *request.sender_id.as_uuid();
        let receiver_uuid = *request.receiver_id.as_uuid();
        let Some(sender_name) = state
            .users
            .get(&sender_uuid)
            .map(|stored| stored.user.full_name.clone())
        else {
            return Err(FriendshipRepositoryError::user_not_found(request.sender_id));
        };
        let Some(receiver_name) = state
            .users
            .get(&receiver_uuid)
            .map(|stored| stored.user.full_name.clone())
        else {
            return Err(FriendshipRepositoryError::user_not_found(
                request.receiver_id,
            ));
        };

        if let Some(entry) = state.requests.get_mut(request_id.as_uuid()) {
            entry.status = RequestStatus::Accepted;
        }
        // A reciprocal pending request collapses into the same friendship.
        for entry in state.requests.values_mut() {
            if *entry.sender_id.as_uuid() == receiver_uuid
                && *entry.receiver_id.as_uuid() == sender_uuid
                && entry.status.is_pending()
            {
                entry.status = RequestStatus::Accepted;
            }
        }

        let edge_created = !state.edges.contains(&(sender_uuid, receiver_uuid));
        if edge_created {
            state.edges.insert((sender_uuid, receiver_uuid));
            state.edges.insert((receiver_uuid, sender_uuid));
            for uuid in [sender_uuid, receiver_uuid] {
                if let Some(stored) = state.users.get_mut(&uuid) {
                    stored.user.friend_count += 1;
                }
            }
        }

        state.push_notification(
            request.sender_id,
            friendship_accepted_message(&receiver_name),
        );
        state.push_notification(
            request.receiver_id,
            friendship_accepted_message(&sender_name),
        );

        let accepted = FriendRequest {
            status: RequestStatus::Accepted,
            ..request
        };
        Ok(FriendshipAccepted {
            request: accepted,
            edge_created,
        })
    }

    async fn decline_request(
        &self,
        receiver: &UserId,
        request_id: &RequestId,
    ) -> Result<FriendRequest, FriendshipRepositoryError> {
        let mut state = self.lock();
        let Some(request) = state.requests.get(request_id.as_uuid()).cloned() else {
            return Err(FriendshipRepositoryError::request_not_found(*request_id));
        };
        if request.receiver_id != *receiver {
            return Err(FriendshipRepositoryError::not_receiver(*request_id));
        }
        if !request.status.is_pending() {
            return Err(FriendshipRepositoryError::already_resolved(request.status));
        }
        if let Some(entry) = state.requests.get_mut(request_id.as_uuid()) {
            entry.status = RequestStatus::Declined;
        }
        Ok(FriendRequest {
            status: RequestStatus::Declined,
            ..request
        })
    }

    async fn remove_friendship(
        &self,
        user_id: &UserId,
        friend_id: &UserId,
    ) -> Result<(), FriendshipRepositoryError> {
        let mut state = self.lock();
        if !state.users.contains_key(user_id.as_uuid()) {
            return Err(FriendshipRepositoryError::user_not_found(*user_id));
        }
        if !state.users.contains_key(friend_id.as_uuid()) {
            return Err(FriendshipRepositoryError::user_not_found(*friend_id));
        }
        let a = *user_id.as_uuid();
        let b = *friend_id.as_uuid();
        if !state.edges.contains(&(a, b)) {
            return Err(FriendshipRepositoryError::not_friends(*user_id, *friend_id));
        }
        state.edges.remove(&(a, b));
        state.edges.remove(&(b, a));
        for uuid in [a, b] {
            if let Some(stored) = state.users.get_mut(&uuid) {
                stored.user.friend_count = (stored.user.friend_count - 1).max(0);
            }
        }
        Ok(())
    }

    async fn are_friends(
        &self,
        user_id: &UserId,
        other_id: &UserId,
    ) -> Result<bool, FriendshipRepositoryError> {
        let state = self.lock();
        Ok(state
            .edges
            .contains(&(*user_id.as_uuid(), *other_id.as_uuid())))
    }

    async fn pending_requests_for(
        &self,
        receiver: &UserId,
    ) -> Result<Vec<FriendRequest>, FriendshipRepositoryError> {
        let state = self.lock();
        let mut pending: Vec<FriendRequest> = state
            .requests
            .values()
            .filter(|request| request.receiver_id == *receiver && request.status.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|request| (Reverse(request.created_at), *request.id.as_uuid()));
        Ok(pending)
    }

    async fn friends_of(&self, user_id: &UserId) -> Result<Vec<User>, FriendshipRepositoryError> {
        let state = self.lock();
        let mut friends: Vec<User> = state
            .edges
            .iter()
            .filter(|(owner, _)| owner == user_id.as_uuid())
            .filter_map(|(_, friend)| state.users.get(friend).map(|stored| stored.user.clone()))
            .collect();
        friends.sort_by(|a, b| a.username.as_ref().cmp(b.username.as_ref()));
        Ok(friends)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, PostRepositoryError> {
        let mut state = self.lock();
        if !state.users.contains_key(post.owner_id.as_uuid()) {
            return Err(PostRepositoryError::user_not_found(post.owner_id));
        }
        if state.title_taken(post.title.as_ref()) {
            return Err(PostRepositoryError::duplicate_title(post.title.as_ref()));
        }
        let created = Post {
            id: post.id,
            owner_id: post.owner_id,
            title: post.title,
            description: post.description,
            like_count: 0,
            created_at: Utc::now(),
        };
        state.posts.insert(*created.id.as_uuid(), created.clone());
        if let Some(stored) = state.users.get_mut(created.owner_id.as_uuid()) {
            stored.user.post_count += 1;
        }
        Ok(created)
    }

    async fn delete(
        &self,
        actor: &UserId,
        post_id: &PostId,
    ) -> Result<(), PostRepositoryError> {
        let mut state = self.lock();
        let Some(post) = state.posts.get(post_id.as_uuid()).cloned() else {
            return Err(PostRepositoryError::post_not_found(*post_id));
        };
        if post.owner_id != *actor {
            return Err(PostRepositoryError::not_owner(*post_id));
        }
        state
            .likes
            .retain(|(liked_post, _)| liked_post != post_id.as_uuid());
        state.posts.remove(post_id.as_uuid());
        if let Some(stored) = state.users.get_mut(post.owner_id.as_uuid()) {
            stored.user.post_count = (stored.user.post_count - 1).max(0);
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        post_id: &PostId,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let state = self.lock();
        Ok(state.posts.get(post_id.as_uuid()).cloned())
    }

    async fn feed_for(&self, user_id: &UserId) -> Result<Vec<Post>, PostRepositoryError> {
        let state = self.lock();
        let uid = *user_id.as_uuid();
        let mut feed: Vec<Post> = state
            .posts
            .values()
            .filter(|post| {
                let owner = *post.owner_id.as_uuid();
                owner == uid || state.edges.contains(&(uid, owner))
            })
            .cloned()
            .collect();
        feed.sort_by_key(|post| (Reverse(post.created_at), *post.id.as_uuid()));
        Ok(feed)
    }

    async fn posts_by(&self, owner_id: &UserId) -> Result<Vec<Post>, PostRepositoryError> {
        let state = self.lock();
        let mut authored: Vec<Post> = state
            .posts
            .values()
            .filter(|post| post.owner_id == *owner_id)
            .cloned()
            .collect();
        authored.sort_by_key(|post| (Reverse(post.created_at), *post.id.as_uuid()));
        Ok(authored)
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn toggle(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> Result<LikeToggle, LikeRepositoryError> {
        let mut state = self.lock();
        let Some(post) = state.posts.get(post_id.as_uuid()).cloned() else {
            return Err(LikeRepositoryError::post_not_found(*post_id));
        };
        let Some(liker_name) = state
            .users
            .get(user_id.as_uuid())
            .map(|stored| stored.user.username.clone())
        else {
            return Err(LikeRepositoryError::user_not_found(*user_id));
        };

        let key = (*post_id.as_uuid(), *user_id.as_uuid());
        if state.likes.remove(&key) {
            let like_count = (post.like_count - 1).max(0);
            if let Some(entry) = state.posts.get_mut(post_id.as_uuid()) {
                entry.like_count = like_count;
            }
            return Ok(LikeToggle {
                action: LikeAction::Unliked,
                like_count,
            });
        }

        state.likes.insert(key);
        let like_count = post.like_count + 1;
        if let Some(entry) = state.posts.get_mut(post_id.as_uuid()) {
            entry.like_count = like_count;
        }
        if post.owner_id != *user_id {
            state.push_notification(
                post.owner_id,
                post_liked_message(&liker_name, &post.title),
            );
        }
        Ok(LikeToggle {
            action: LikeAction::Liked,
            like_count,
        })
    }

    async fn has_liked(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> Result<bool, LikeRepositoryError> {
        let state = self.lock();
        Ok(state
            .likes
            .contains(&(*post_id.as_uuid(), *user_id.as_uuid())))
    }

    async fn count_for(
        &self,
        post_id: &PostId,
    ) -> Result<i64, LikeRepositoryError> {
        let state = self.lock();
        let count = state
            .likes
            .iter()
            .filter(|(liked_post, _)| liked_post == post_id.as_uuid())
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn append(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotificationRepositoryError> {
        let mut state = self.lock();
        if !state.users.contains_key(notification.user_id.as_uuid()) {
            return Err(NotificationRepositoryError::user_not_found(
                notification.user_id,
            ));
        }
        let appended = Notification {
            id: notification.id,
            user_id: notification.user_id,
            message: notification.message,
            read: false,
            created_at: Utc::now(),
        };
        state.notifications.push(appended.clone());
        Ok(appended)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let state = self.lock();
        let mut listed: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|notification| {
                notification.user_id == *user_id && (!unread_only || !notification.read)
            })
            .cloned()
            .collect();
        listed.sort_by_key(|notification| {
            (Reverse(notification.created_at), *notification.id.as_uuid())
        });
        Ok(listed)
    }

    async fn mark_read(
        &self,
        notification_id: &NotificationId,
    ) -> Result<Notification, NotificationRepositoryError> {
        let mut state = self.lock();
        let Some(notification) = state
            .notifications
            .iter_mut()
            .find(|notification| notification.id == *notification_id)
        else {
            return Err(NotificationRepositoryError::notification_not_found(
                *notification_id,
            ));
        };
        notification.read = true;
        Ok(notification.clone())
    }
}
