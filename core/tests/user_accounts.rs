//! Behavioural tests for registration, credentials, search, and profiles,
//! driven through the identity service over the in-memory store.

use mingle_core::domain::{
    Bio, ErrorCode, FullName, NewUserInput, Password, ProfileInput, UserId, Username,
};
use rstest::rstest;

#[expect(
    dead_code,
    reason = "Shared harness includes helpers unused in this specific crate."
)]
mod support;

use support::TestBackend;

#[rstest]
#[tokio::test]
async fn registering_a_user_starts_with_zeroed_counters() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;

    assert_eq!(alice.username.as_ref(), "alice");
    assert_eq!(alice.full_name.as_ref(), "Alice Liddell");
    assert!(alice.bio.is_none());
    assert_eq!(alice.friend_count, 0);
    assert_eq!(alice.post_count, 0);

    let by_id = backend.identity.user(&alice.id).await.expect("user loads");
    assert_eq!(by_id, alice);
    let by_username = backend
        .identity
        .user_by_username("alice")
        .await
        .expect("user loads");
    assert_eq!(by_username.id, alice.id);
}

#[rstest]
#[tokio::test]
async fn a_taken_username_rejects_registration() {
    let backend = TestBackend::new();
    backend.register("alice", "Alice Liddell").await;

    let err = backend
        .identity
        .register(NewUserInput {
            username: Username::new("alice").expect("valid username"),
            password: Password::new("another pass").expect("valid password"),
            full_name: FullName::new("Alias Liddell").expect("valid full name"),
            bio: None,
        })
        .await
        .expect_err("a taken handle is refused");
    assert_eq!(err.code(), ErrorCode::DuplicateUsername);
}

#[rstest]
#[tokio::test]
async fn credentials_verify_only_with_the_original_password() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;

    let verified = backend
        .identity
        .verify_credentials("alice", &Password::new("correct horse").expect("valid password"))
        .await
        .expect("the original password verifies");
    assert_eq!(verified, alice.id);

    let wrong = backend
        .identity
        .verify_credentials("alice", &Password::new("battery staple").expect("valid password"))
        .await
        .expect_err("a wrong password is refused");
    assert_eq!(wrong.code(), ErrorCode::BadCredential);

    let unknown = backend
        .identity
        .verify_credentials("mallory", &Password::new("whatever").expect("valid password"))
        .await
        .expect_err("an unknown handle is refused");
    assert_eq!(unknown.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn search_matches_username_and_full_name_case_insensitively() {
    let backend = TestBackend::new();
    backend.register("alice", "Alice Liddell").await;
    backend.register("bob", "Robert Alton").await;
    backend.register("carol", "Carol Danvers").await;

    let found = backend
        .identity
        .search_users("al")
        .await
        .expect("search succeeds");
    let usernames: Vec<_> = found
        .iter()
        .map(|user| user.username.as_ref().to_owned())
        .collect();
    assert_eq!(usernames, ["alice", "bob"]);

    let by_full_name = backend
        .identity
        .search_users("LIDDELL")
        .await
        .expect("search succeeds");
    assert_eq!(by_full_name.len(), 1);

    let empty = backend
        .identity
        .search_users("")
        .await
        .expect("search succeeds");
    assert!(empty.is_empty(), "an empty keyword matches nobody");
}

#[rstest]
#[tokio::test]
async fn profile_updates_replace_every_field() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;

    let updated = backend
        .identity
        .update_profile(
            &alice.id,
            ProfileInput {
                username: Username::new("alice_l").expect("valid username"),
                full_name: FullName::new("Alice P. Liddell").expect("valid full name"),
                bio: Some(Bio::new("Down the rabbit hole.").expect("valid bio")),
                password: None,
            },
        )
        .await
        .expect("update succeeds");
    assert_eq!(updated.username.as_ref(), "alice_l");
    assert_eq!(updated.full_name.as_ref(), "Alice P. Liddell");
    assert_eq!(
        updated.bio.as_ref().map(|bio| bio.as_ref()),
        Some("Down the rabbit hole.")
    );

    // Omitting the bio clears it.
    let cleared = backend
        .identity
        .update_profile(
            &alice.id,
            ProfileInput {
                username: Username::new("alice_l").expect("valid username"),
                full_name: FullName::new("Alice P. Liddell").expect("valid full name"),
                bio: None,
                password: None,
            },
        )
        .await
        .expect("update succeeds");
    assert!(cleared.bio.is_none());
}

#[rstest]
#[tokio::test]
async fn profile_updates_enforce_username_uniqueness() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    backend.register("bob", "Bob Loblaw").await;

    let err = backend
        .identity
        .update_profile(
            &alice.id,
            ProfileInput {
                username: Username::new("bob").expect("valid username"),
                full_name: alice.full_name.clone(),
                bio: None,
                password: None,
            },
        )
        .await
        .expect_err("another user's handle is refused");
    assert_eq!(err.code(), ErrorCode::DuplicateUsername);

    backend
        .identity
        .update_profile(
            &alice.id,
            ProfileInput {
                username: alice.username.clone(),
                full_name: alice.full_name.clone(),
                bio: None,
                password: None,
            },
        )
        .await
        .expect("keeping your own handle is not a collision");

    let missing = backend
        .identity
        .update_profile(
            &UserId::random(),
            ProfileInput {
                username: Username::new("nobody").expect("valid username"),
                full_name: FullName::new("No Body").expect("valid full name"),
                bio: None,
                password: None,
            },
        )
        .await
        .expect_err("an unknown user is refused");
    assert_eq!(missing.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn a_password_change_rotates_the_credential() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;

    backend
        .identity
        .update_profile(
            &alice.id,
            ProfileInput {
                username: alice.username.clone(),
                full_name: alice.full_name.clone(),
                bio: None,
                password: Some(Password::new("battery staple").expect("valid password")),
            },
        )
        .await
        .expect("update succeeds");

    let stale = backend
        .identity
        .verify_credentials("alice", &Password::new("correct horse").expect("valid password"))
        .await
        .expect_err("the replaced password no longer verifies");
    assert_eq!(stale.code(), ErrorCode::BadCredential);

    let fresh = backend
        .identity
        .verify_credentials("alice", &Password::new("battery staple").expect("valid password"))
        .await
        .expect("the new password verifies");
    assert_eq!(fresh, alice.id);
}

#[rstest]
#[tokio::test]
async fn counters_follow_posts_and_friendships() {
    let backend = TestBackend::new();
    let alice = backend.register("alice", "Alice Liddell").await;
    let bob = backend.register("bob", "Bob Loblaw").await;

    let first = backend.publish(&alice, "first").await;
    backend.publish(&alice, "second").await;
    let loaded = backend.identity.user(&alice.id).await.expect("user loads");
    assert_eq!(loaded.post_count, 2);

    backend
        .content
        .delete_post(&alice.id, &first.id)
        .await
        .expect("deletion succeeds");
    let loaded = backend.identity.user(&alice.id).await.expect("user loads");
    assert_eq!(loaded.post_count, 1);

    backend.befriend(&alice, &bob).await;
    for id in [alice.id, bob.id] {
        let user = backend.identity.user(&id).await.expect("user loads");
        assert_eq!(user.friend_count, 1);
    }
}
