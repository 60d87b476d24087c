mod common;

use civic_service::error::AppError;
use civic_service::models::{Area, NewPost};
use civic_service::services::CommentThread;
use common::*;
use document_store::DocumentStore;
use std::sync::Arc;

async fn post_with_thread(env: &TestEnv, title: &str) -> (String, CommentThread) {
    let feed = open_feed(env).await;
    let post_id = feed
        .create(&NewPost {
            title: title.to_string(),
            content: "details".to_string(),
            area: Some(Area::Gasabo),
            ..NewPost::default()
        })
        .await
        .unwrap();
    let thread = CommentThread::new(
        env.store.clone() as Arc<dyn DocumentStore>,
        env.resolver.subscribe(),
        env.collections.comments.clone(),
        env.collections.posts.clone(),
        post_id.clone(),
    );
    (post_id, thread)
}

async fn comment_count(env: &TestEnv, post_id: &str) -> i64 {
    env.store
        .get(&env.collections.posts, post_id)
        .await
        .unwrap()
        .expect("post missing")
        .get("comment_count")
        .and_then(|v| v.as_i64())
        .unwrap_or(0)
}

#[tokio::test]
async fn add_increments_the_parent_count_by_one() {
    let env = test_env();
    let alice = sign_up(&env, "alice").await;
    let (post_id, thread) = post_with_thread(&env, "Street light").await;

    let comment = thread.add("Same on our street").await.unwrap();
    assert_eq!(comment.post_id, post_id);
    assert_eq!(comment.author_id, alice.uid);
    assert_eq!(comment.author_name, "alice");
    assert_eq!(comment_count(&env, &post_id).await, 1);

    thread.add("Reported last month too").await.unwrap();
    assert_eq!(comment_count(&env, &post_id).await, 2);
}

#[tokio::test]
async fn fetch_returns_newest_first() {
    let env = test_env();
    sign_up(&env, "alice").await;
    let (_post_id, thread) = post_with_thread(&env, "Street light").await;

    thread.add("first").await.unwrap();
    thread.add("second").await.unwrap();
    thread.add("third").await.unwrap();

    let texts: Vec<String> = thread
        .fetch()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.text)
        .collect();
    assert_eq!(texts, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn delete_decrements_the_parent_count_by_one() {
    let env = test_env();
    sign_up(&env, "alice").await;
    let (post_id, thread) = post_with_thread(&env, "Street light").await;

    let comment = thread.add("will be removed").await.unwrap();
    thread.add("stays").await.unwrap();
    assert_eq!(comment_count(&env, &post_id).await, 2);

    thread.delete(&comment.id).await.unwrap();
    assert_eq!(comment_count(&env, &post_id).await, 1);

    let remaining = thread.fetch().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].text, "stays");
}

#[tokio::test]
async fn delete_requires_authorship_or_admin() {
    let env = test_env();
    sign_up(&env, "alice").await;
    let (post_id, thread) = post_with_thread(&env, "Street light").await;
    let comment = thread.add("alice's comment").await.unwrap();

    sign_up(&env, "bob").await;
    let err = thread.delete(&comment.id).await.unwrap_err();
    assert!(matches!(err, AppError::AuthorizationDenied));
    assert_eq!(comment_count(&env, &post_id).await, 1);

    sign_up_admin(&env, "moderator").await;
    thread.delete(&comment.id).await.unwrap();
    assert_eq!(comment_count(&env, &post_id).await, 0);
}

#[tokio::test]
async fn add_to_a_missing_post_is_not_found() {
    let env = test_env();
    sign_up(&env, "alice").await;
    let thread = CommentThread::new(
        env.store.clone() as Arc<dyn DocumentStore>,
        env.resolver.subscribe(),
        env.collections.comments.clone(),
        env.collections.posts.clone(),
        "no-such-post",
    );

    let err = thread.add("hello?").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(thread.fetch().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_requires_a_signed_in_actor() {
    let env = test_env();
    sign_up(&env, "alice").await;
    let (_post_id, thread) = post_with_thread(&env, "Street light").await;

    env.resolver.sign_out().await.unwrap();
    wait_for_session(&env.resolver, |session| session.actor().is_none()).await;

    let err = thread.add("anonymous?").await.unwrap_err();
    assert!(matches!(err, AppError::AuthenticationRequired));

    let err = thread.add("   ").await.unwrap_err();
    assert!(matches!(err, AppError::AuthenticationRequired));
}

#[tokio::test]
async fn delete_aborts_atomically_when_the_parent_vanished() {
    let env = test_env();
    sign_up(&env, "alice").await;
    let (post_id, thread) = post_with_thread(&env, "Street light").await;
    let comment = thread.add("orphaned soon").await.unwrap();

    // The post disappears out from under the thread.
    env.store
        .delete(&env.collections.posts, &post_id)
        .await
        .unwrap();

    let err = thread.delete(&comment.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // The batch aborted: the comment record is still there.
    let remaining = thread.fetch().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, comment.id);
}

#[tokio::test]
async fn blank_comments_are_rejected() {
    let env = test_env();
    sign_up(&env, "alice").await;
    let (post_id, thread) = post_with_thread(&env, "Street light").await;

    let err = thread.add("   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(comment_count(&env, &post_id).await, 0);
}
