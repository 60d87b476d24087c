/// Session resolver - derives the current actor from the provider session
///
/// One task watches the provider's session stream. On every change it looks
/// up the profile record for the signed-in identity and publishes the
/// resolved [`Session`] through a watch channel. That receiver is the
/// explicit session context threaded into every entity service; there is no
/// ambient global.
use crate::auth::{AuthProvider, AuthUser};
use crate::error::Result;
use crate::models::{Actor, Profile, Role};
use document_store::DocumentStore;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    /// First resolution has not completed yet.
    #[default]
    Loading,
    SignedOut,
    SignedIn(Actor),
}

impl Session {
    pub fn actor(&self) -> Option<&Actor> {
        match self {
            Session::SignedIn(actor) => Some(actor),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Session::Loading)
    }
}

pub struct SessionResolver {
    provider: Arc<dyn AuthProvider>,
    rx: watch::Receiver<Session>,
    task: JoinHandle<()>,
}

impl SessionResolver {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        profiles_collection: impl Into<String>,
    ) -> Self {
        let profiles = profiles_collection.into();
        let (tx, rx) = watch::channel(Session::Loading);
        let mut sessions = provider.sessions();

        let task = tokio::spawn(async move {
            loop {
                let user = sessions.borrow_and_update().clone();
                let state = match user {
                    Some(user) => resolve(store.as_ref(), &profiles, user).await,
                    None => Session::SignedOut,
                };
                if tx.send(state).is_err() {
                    break;
                }
                if sessions.changed().await.is_err() {
                    break;
                }
            }
        });

        Self { provider, rx, task }
    }

    /// The session context consumed by entity services.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.rx.clone()
    }

    pub fn current(&self) -> Session {
        self.rx.borrow().clone()
    }

    pub fn actor(&self) -> Option<Actor> {
        self.current().actor().cloned()
    }

    /// Terminates the provider session. Entity feeds keep their lists; their
    /// next write re-authorizes against the new session state.
    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await
    }
}

impl Drop for SessionResolver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn resolve(store: &dyn DocumentStore, profiles: &str, user: AuthUser) -> Session {
    match store.get(profiles, &user.uid).await {
        Ok(Some(doc)) => match doc.to::<Profile>() {
            Ok(profile) => Session::SignedIn(Actor {
                uid: user.uid,
                username: profile.username,
                email: profile.email,
                role: profile.role,
                is_admin: profile.is_admin,
                photo_url: user.photo_url,
            }),
            Err(err) => {
                warn!(uid = %user.uid, "malformed profile record: {}", err);
                Session::SignedOut
            }
        },
        // Accounts created out-of-band have no profile record yet.
        Ok(None) => Session::SignedIn(fallback_actor(user)),
        Err(err) => {
            // Degrade to signed-out rather than failing closed.
            warn!(uid = %user.uid, "profile lookup failed: {}", err);
            Session::SignedOut
        }
    }
}

fn fallback_actor(user: AuthUser) -> Actor {
    let derived = user
        .login_handle
        .split('@')
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    let username = match user.display_name {
        Some(name) if !name.trim().is_empty() => name,
        _ if !derived.is_empty() => derived,
        _ => "User".to_string(),
    };
    Actor {
        uid: user.uid,
        username,
        email: user.login_handle,
        role: Role::default(),
        is_admin: false,
        photo_url: user.photo_url,
    }
}
