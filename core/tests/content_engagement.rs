//! Behavioural tests for post publication, feeds, and the like ledger,
//! driven through the domain services over the in-memory store.

use mingle_core::domain::{
    ErrorCode, LikeAction, Notification, PostDescription, PostId, PostTitle,
};
use rstest::rstest;

mod support;

use support::{TestBackend, assert_newest_first};

#[rstest]
#[tokio::test]
async fn a_published_post_appears_in_the_owners_feed() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;

    let post = backend.publish(&alice, "hello").await;
    assert_eq!(post.owner_id, alice.id);
    assert_eq!(post.like_count, 0);

    let loaded = backend.content.post(&post.id).await.expect("post loads");
    assert_eq!(loaded.title.as_ref(), "hello");

    let feed = backend
        .content
        .feed(&alice.id)
        .await
        .expect("feed assembles");
    assert!(feed.iter().any(|entry| entry.id == post.id));

    let authored = backend
        .content
        .posts_by(&alice.id)
        .await
        .expect("author listing succeeds");
    assert_eq!(authored.len(), 1);
}

#[rstest]
#[tokio::test]
async fn post_titles_are_globally_unique() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    backend.publish(&alice, "hello").await;

    let err = backend
        .content
        .create_post(
            &bob.id,
            PostTitle::new("hello").expect("valid title"),
            PostDescription::new("another body").expect("valid description"),
        )
        .await
        .expect_err("a taken title is refused for any author");
    assert_eq!(err.code(), ErrorCode::DuplicateTitle);

    backend.publish(&bob, "hello again").await;
}

#[rstest]
#[tokio::test]
async fn the_feed_merges_own_and_friends_posts_newest_first() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;
    let carol = backend.register("carol", "Carol Danvers").await;
    backend.befriend(&alice, &bob).await;

    let own = backend.publish(&alice, "mine").await;
    let from_friend_one = backend.publish(&bob, "from bob, first").await;
    let from_friend_two = backend.publish(&bob, "from bob, second").await;
    let from_stranger = backend.publish(&carol, "from carol").await;

    let feed = backend
        .content
        .feed(&alice.id)
        .await
        .expect("feed assembles");

    let ids: Vec<_> = feed.iter().map(|entry| entry.id).collect();
    assert!(ids.contains(&own.id));
    assert!(ids.contains(&from_friend_one.id));
    assert!(ids.contains(&from_friend_two.id));
    assert!(!ids.contains(&from_stranger.id));
    assert_eq!(feed.len(), 3);

    let mut deduped = ids.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len(), "feed entries must be unique");

    assert_newest_first(&feed, |entry| (entry.created_at, *entry.id.as_uuid()));
}

#[rstest]
#[tokio::test]
async fn only_the_owner_may_delete_a_post() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let post = backend.publish(&alice, "hello").await;

    let err = backend
        .content
        .delete_post(&bob.id, &post.id)
        .await
        .expect_err("non-owner deletion is refused");
    assert_eq!(err.code(), ErrorCode::NotAuthorized);
    backend
        .content
        .post(&post.id)
        .await
        .expect("the refused deletion left the post in place");

    let missing = backend
        .content
        .delete_post(&alice.id, &PostId::random())
        .await
        .expect_err("deleting an unknown post is refused");
    assert_eq!(missing.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn deleting_a_post_clears_its_like_ledger() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let post = backend.publish(&alice, "hello").await;
    backend
        .likes
        .toggle_like(&bob.id, &post.id)
        .await
        .expect("like lands");

    backend
        .content
        .delete_post(&alice.id, &post.id)
        .await
        .expect("owner deletion succeeds");

    let lookup = backend
        .content
        .post(&post.id)
        .await
        .expect_err("the deleted post is gone");
    assert_eq!(lookup.code(), ErrorCode::NotFound);
    assert_eq!(
        backend
            .likes
            .like_count(&post.id)
            .await
            .expect("ledger count succeeds"),
        0
    );
    let toggle = backend
        .likes
        .toggle_like(&bob.id, &post.id)
        .await
        .expect_err("toggling a deleted post is refused");
    assert_eq!(toggle.code(), ErrorCode::NotFound);

    let owner = backend.identity.user(&alice.id).await.expect("user loads");
    assert_eq!(owner.post_count, 0);
}

#[rstest]
#[tokio::test]
async fn toggling_keeps_the_counter_and_ledger_in_step() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;
    let carol = backend.register("carol", "Carol Danvers").await;
    backend.befriend(&alice, &bob).await;

    let post = backend.publish(&alice, "hello").await;

    let steps = [
        (&bob.id, LikeAction::Liked, 1),
        (&carol.id, LikeAction::Liked, 2),
        (&bob.id, LikeAction::Unliked, 1),
        (&carol.id, LikeAction::Unliked, 0),
    ];
    for (user, expected_action, expected_count) in steps {
        let toggle = backend
            .likes
            .toggle_like(user, &post.id)
            .await
            .expect("toggle succeeds");
        assert_eq!(toggle.action, expected_action);
        assert_eq!(toggle.like_count, expected_count);

        // The denormalized counter and the ledger never drift apart.
        let stored = backend.content.post(&post.id).await.expect("post loads");
        let ledger = backend
            .likes
            .like_count(&post.id)
            .await
            .expect("ledger count succeeds");
        assert_eq!(i64::from(stored.like_count), ledger);
    }

    assert!(
        !backend
            .likes
            .has_liked(&bob.id, &post.id)
            .await
            .expect("ledger lookup succeeds")
    );
}

#[rstest]
#[tokio::test]
async fn liking_your_own_post_stays_silent() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;

    let post = backend.publish(&alice, "hello").await;
    let toggle = backend
        .likes
        .toggle_like(&alice.id, &post.id)
        .await
        .expect("self-like lands");
    assert_eq!(toggle.like_count, 1);

    let log = backend
        .notifications
        .notifications(&alice.id, false)
        .await
        .expect("listing succeeds");
    assert!(
        log.iter()
            .all(|n| !n.message.as_ref().contains("liked your post"))
    );
}

#[rstest]
#[tokio::test]
async fn each_fresh_like_notifies_the_owner() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let post = backend.publish(&alice, "hello").await;

    backend
        .likes
        .toggle_like(&bob.id, &post.id)
        .await
        .expect("like lands");
    let matching = |log: &[Notification]| {
        log.iter()
            .filter(|n| n.message.as_ref() == "bob liked your post 'hello'.")
            .count()
    };
    let log = backend
        .notifications
        .notifications(&alice.id, false)
        .await
        .expect("listing succeeds");
    assert_eq!(matching(&log), 1);

    // Unliking is silent; a later fresh like notifies again.
    backend
        .likes
        .toggle_like(&bob.id, &post.id)
        .await
        .expect("unlike lands");
    backend
        .likes
        .toggle_like(&bob.id, &post.id)
        .await
        .expect("second like lands");
    let log = backend
        .notifications
        .notifications(&alice.id, false)
        .await
        .expect("listing succeeds");
    assert_eq!(matching(&log), 2);
}
