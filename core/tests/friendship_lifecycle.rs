//! Behavioural tests for the friend request lifecycle and friendship edges,
//! driven through the domain services over the in-memory store.

use mingle_core::domain::{ErrorCode, UserId};
use rstest::rstest;

mod support;

use support::{TestBackend, assert_newest_first};

#[rstest]
#[tokio::test]
async fn sending_a_request_notifies_the_receiver() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let request = backend
        .friendships
        .send_request(&alice.id, &bob.id)
        .await
        .expect("request sends");
    assert_eq!(request.sender_id, alice.id);
    assert_eq!(request.receiver_id, bob.id);
    assert!(request.status.is_pending());

    let unread = backend
        .notifications
        .notifications(&bob.id, true)
        .await
        .expect("unread listing succeeds");
    assert_eq!(unread.len(), 1);
    let Some(notification) = unread.first() else {
        panic!("receiver should hold one notification");
    };
    assert_eq!(
        notification.message.as_ref(),
        "alice sent you a friend request."
    );
    assert!(!notification.read);

    let sender_unread = backend
        .notifications
        .notifications(&alice.id, true)
        .await
        .expect("unread listing succeeds");
    assert!(sender_unread.is_empty());
}

#[rstest]
#[tokio::test]
async fn a_self_request_is_rejected() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;

    let err = backend
        .friendships
        .send_request(&alice.id, &alice.id)
        .await
        .expect_err("self request is refused");
    assert_eq!(err.code(), ErrorCode::SelfRequest);
}

#[rstest]
#[tokio::test]
async fn a_request_to_an_unknown_user_is_rejected() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let ghost = UserId::random();

    let err = backend
        .friendships
        .send_request(&alice.id, &ghost)
        .await
        .expect_err("unknown receiver is refused");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn a_duplicate_pending_request_is_rejected_until_resolved() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let first = backend
        .friendships
        .send_request(&alice.id, &bob.id)
        .await
        .expect("first request sends");
    let err = backend
        .friendships
        .send_request(&alice.id, &bob.id)
        .await
        .expect_err("second request is refused while pending");
    assert_eq!(err.code(), ErrorCode::DuplicatePending);

    backend
        .friendships
        .decline_request(&bob.id, &first.id)
        .await
        .expect("decline succeeds");
    backend
        .friendships
        .send_request(&alice.id, &bob.id)
        .await
        .expect("a resolved request no longer blocks a new one");
}

#[rstest]
#[tokio::test]
async fn declining_leaves_no_edge_and_no_counters() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let request = backend
        .friendships
        .send_request(&alice.id, &bob.id)
        .await
        .expect("request sends");
    let declined = backend
        .friendships
        .decline_request(&bob.id, &request.id)
        .await
        .expect("decline succeeds");
    assert!(!declined.status.is_pending());

    assert!(
        !backend
            .friendships
            .is_friend(&alice.id, &bob.id)
            .await
            .expect("edge lookup succeeds")
    );
    for id in [alice.id, bob.id] {
        let user = backend.identity.user(&id).await.expect("user loads");
        assert_eq!(user.friend_count, 0);
    }
    let pending = backend
        .friendships
        .pending_requests(&bob.id)
        .await
        .expect("pending listing succeeds");
    assert!(pending.is_empty());

    // Declines are silent: the sender's log stays as it was.
    let sender_log = backend
        .notifications
        .notifications(&alice.id, false)
        .await
        .expect("listing succeeds");
    assert!(sender_log.is_empty());
}

#[rstest]
#[tokio::test]
async fn accepting_creates_the_edge_and_notifies_both_parties() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let request = backend
        .friendships
        .send_request(&alice.id, &bob.id)
        .await
        .expect("request sends");
    let accepted = backend
        .friendships
        .accept_request(&bob.id, &request.id)
        .await
        .expect("accept succeeds");
    assert!(accepted.edge_created);
    assert_eq!(accepted.request.id, request.id);

    assert!(
        backend
            .friendships
            .is_friend(&alice.id, &bob.id)
            .await
            .expect("edge lookup succeeds")
    );
    assert!(
        backend
            .friendships
            .is_friend(&bob.id, &alice.id)
            .await
            .expect("edge lookup succeeds")
    );
    for id in [alice.id, bob.id] {
        let user = backend.identity.user(&id).await.expect("user loads");
        assert_eq!(user.friend_count, 1);
    }

    let alice_log = backend
        .notifications
        .notifications(&alice.id, true)
        .await
        .expect("listing succeeds");
    assert!(
        alice_log
            .iter()
            .any(|n| n.message.as_ref() == "You are now friends with Bob Loblaw.")
    );
    let bob_log = backend
        .notifications
        .notifications(&bob.id, true)
        .await
        .expect("listing succeeds");
    assert!(
        bob_log
            .iter()
            .any(|n| n.message.as_ref() == "You are now friends with Alice Liddell.")
    );

    let friends = backend
        .friendships
        .friends(&alice.id)
        .await
        .expect("friend listing succeeds");
    assert_eq!(friends.len(), 1);
    assert!(friends.iter().any(|user| user.id == bob.id));
}

#[rstest]
#[tokio::test]
async fn only_the_receiver_may_resolve_a_request() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;
    let carol = backend.register("carol", "Carol Danvers").await;

    let request = backend
        .friendships
        .send_request(&alice.id, &bob.id)
        .await
        .expect("request sends");

    let as_sender = backend
        .friendships
        .accept_request(&alice.id, &request.id)
        .await
        .expect_err("sender cannot accept");
    assert_eq!(as_sender.code(), ErrorCode::NotAuthorized);

    let as_bystander = backend
        .friendships
        .decline_request(&carol.id, &request.id)
        .await
        .expect_err("bystander cannot decline");
    assert_eq!(as_bystander.code(), ErrorCode::NotAuthorized);

    // The failed resolutions changed nothing.
    let pending = backend
        .friendships
        .pending_requests(&bob.id)
        .await
        .expect("pending listing succeeds");
    assert_eq!(pending.len(), 1);
}

#[rstest]
#[tokio::test]
async fn a_resolved_request_cannot_be_resolved_again() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let request = backend
        .friendships
        .send_request(&alice.id, &bob.id)
        .await
        .expect("request sends");
    backend
        .friendships
        .accept_request(&bob.id, &request.id)
        .await
        .expect("accept succeeds");

    let again = backend
        .friendships
        .accept_request(&bob.id, &request.id)
        .await
        .expect_err("second accept is refused");
    assert_eq!(again.code(), ErrorCode::AlreadyResolved);

    let decline_after = backend
        .friendships
        .decline_request(&bob.id, &request.id)
        .await
        .expect_err("decline after accept is refused");
    assert_eq!(decline_after.code(), ErrorCode::AlreadyResolved);
}

#[rstest]
#[tokio::test]
async fn mutual_pending_requests_collapse_on_accept() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let forward = backend
        .friendships
        .send_request(&alice.id, &bob.id)
        .await
        .expect("forward request sends");
    let reciprocal = backend
        .friendships
        .send_request(&bob.id, &alice.id)
        .await
        .expect("reciprocal request sends");

    let accepted = backend
        .friendships
        .accept_request(&bob.id, &forward.id)
        .await
        .expect("accept succeeds");
    assert!(accepted.edge_created);

    // One edge, one counter increment each, and no pending leftovers.
    for id in [alice.id, bob.id] {
        let user = backend.identity.user(&id).await.expect("user loads");
        assert_eq!(user.friend_count, 1);
        let pending = backend
            .friendships
            .pending_requests(&id)
            .await
            .expect("pending listing succeeds");
        assert!(pending.is_empty());
    }

    let reciprocal_again = backend
        .friendships
        .accept_request(&alice.id, &reciprocal.id)
        .await
        .expect_err("the collapsed reciprocal is already resolved");
    assert_eq!(reciprocal_again.code(), ErrorCode::AlreadyResolved);
}

#[rstest]
#[tokio::test]
async fn removing_a_friend_is_symmetric_and_not_repeatable() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;
    backend.befriend(&alice, &bob).await;

    backend
        .friendships
        .remove_friend(&bob.id, &alice.id)
        .await
        .expect("removal succeeds from either side");

    assert!(
        !backend
            .friendships
            .is_friend(&alice.id, &bob.id)
            .await
            .expect("edge lookup succeeds")
    );
    assert!(
        !backend
            .friendships
            .is_friend(&bob.id, &alice.id)
            .await
            .expect("edge lookup succeeds")
    );
    for id in [alice.id, bob.id] {
        let user = backend.identity.user(&id).await.expect("user loads");
        assert_eq!(user.friend_count, 0);
    }

    let repeat = backend
        .friendships
        .remove_friend(&alice.id, &bob.id)
        .await
        .expect_err("second removal is refused");
    assert_eq!(repeat.code(), ErrorCode::NotFriends);

    let self_removal = backend
        .friendships
        .remove_friend(&alice.id, &alice.id)
        .await
        .expect_err("self removal is refused");
    assert_eq!(self_removal.code(), ErrorCode::SelfRemoval);
}

#[rstest]
#[tokio::test]
async fn unfriending_removes_the_friends_posts_from_the_feed() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;
    backend.befriend(&alice, &bob).await;

    let post = backend.publish(&bob, "seen by friends").await;
    let feed = backend
        .content
        .feed(&alice.id)
        .await
        .expect("feed assembles");
    assert!(feed.iter().any(|entry| entry.id == post.id));

    backend
        .friendships
        .remove_friend(&alice.id, &bob.id)
        .await
        .expect("removal succeeds");

    let feed = backend
        .content
        .feed(&alice.id)
        .await
        .expect("feed assembles");
    assert!(feed.iter().all(|entry| entry.id != post.id));

    // Likes are independent of the graph: an ex-friend can still like.
    let toggle = backend
        .likes
        .toggle_like(&alice.id, &post.id)
        .await
        .expect("liking needs no friendship");
    assert_eq!(toggle.like_count, 1);
}

#[rstest]
#[tokio::test]
async fn pending_requests_list_newest_first() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;
    let carol = backend.register("carol", "Carol Danvers").await;

    let from_bob = backend
        .friendships
        .send_request(&bob.id, &alice.id)
        .await
        .expect("request sends");
    let from_carol = backend
        .friendships
        .send_request(&carol.id, &alice.id)
        .await
        .expect("request sends");

    let pending = backend
        .friendships
        .pending_requests(&alice.id)
        .await
        .expect("pending listing succeeds");
    assert_eq!(pending.len(), 2);
    assert_newest_first(&pending, |request| {
        (request.created_at, *request.id.as_uuid())
    });

    let mut senders: Vec<_> = pending.iter().map(|request| request.sender_id).collect();
    senders.sort_unstable();
    let mut expected = vec![from_bob.sender_id, from_carol.sender_id];
    expected.sort_unstable();
    assert_eq!(senders, expected);
}
