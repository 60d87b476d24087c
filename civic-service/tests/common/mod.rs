#![allow(dead_code)]

use civic_service::auth::{register, AuthProvider, MemoryAuthProvider};
use civic_service::config::CollectionsConfig;
use civic_service::models::{Actor, Post};
use civic_service::services::{PostFeed, Session, SessionResolver};
use document_store::{DocumentStore, MemoryStore};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

pub const PASSWORD: &str = "long enough secret";

const WAIT: Duration = Duration::from_secs(2);

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<MemoryAuthProvider>,
    pub resolver: SessionResolver,
    pub collections: CollectionsConfig,
}

pub fn test_env() -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MemoryAuthProvider::new());
    let collections = CollectionsConfig::default();
    let resolver = SessionResolver::new(
        provider.clone() as Arc<dyn AuthProvider>,
        store.clone() as Arc<dyn DocumentStore>,
        collections.profiles.clone(),
    );
    TestEnv {
        store,
        provider,
        resolver,
        collections,
    }
}

pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Block until the resolver publishes a session matching the predicate.
pub async fn wait_for_session(resolver: &SessionResolver, f: impl Fn(&Session) -> bool) {
    let mut rx = resolver.subscribe();
    tokio::time::timeout(WAIT, async {
        loop {
            if f(&rx.borrow()) {
                return;
            }
            rx.changed().await.expect("session channel closed");
        }
    })
    .await
    .expect("timed out waiting for session state");
}

/// Register a citizen account and wait until its session is resolved.
pub async fn sign_up(env: &TestEnv, username: &str) -> Actor {
    let actor = register(
        env.provider.as_ref(),
        env.store.as_ref(),
        &env.collections.profiles,
        username,
        PASSWORD,
    )
    .await
    .expect("registration failed");

    let uid = actor.uid.clone();
    wait_for_session(&env.resolver, |session| {
        session.actor().map(|a| a.uid == uid).unwrap_or(false)
    })
    .await;
    actor
}

/// Register an account, promote its profile to admin, and sign back in so
/// the resolver picks the promotion up.
pub async fn sign_up_admin(env: &TestEnv, username: &str) -> Actor {
    let actor = sign_up(env, username).await;
    env.store
        .update(
            &env.collections.profiles,
            &actor.uid,
            fields(serde_json::json!({ "is_admin": true })),
        )
        .await
        .expect("profile promotion failed");
    env.provider
        .sign_in(&format!("{}@linkgov.rw", username), PASSWORD)
        .await
        .expect("re-sign-in failed");

    let uid = actor.uid.clone();
    wait_for_session(&env.resolver, |session| {
        session
            .actor()
            .map(|a| a.uid == uid && a.is_admin)
            .unwrap_or(false)
    })
    .await;
    env.resolver.actor().expect("admin session missing")
}

pub async fn open_feed(env: &TestEnv) -> PostFeed {
    PostFeed::new(
        env.store.clone() as Arc<dyn DocumentStore>,
        env.resolver.subscribe(),
        env.collections.posts.clone(),
        10,
    )
    .await
    .expect("feed subscription failed")
}

/// Block until the feed's filtered snapshot matches the predicate.
pub async fn wait_for_posts(feed: &mut PostFeed, f: impl Fn(&[Post]) -> bool) {
    tokio::time::timeout(WAIT, async {
        loop {
            if f(&feed.posts()) {
                return;
            }
            feed.changed().await.expect("feed subscription closed");
        }
    })
    .await
    .expect("timed out waiting for feed snapshot");
}
