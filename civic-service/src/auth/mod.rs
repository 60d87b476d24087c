/// Authentication provider boundary
///
/// Identity comes from a hosted authentication service. The core consumes it
/// through [`AuthProvider`]: credential sign-in/sign-up, sign-out, and a
/// session-change subscription publishing the current opaque identity.
pub mod memory;

pub use memory::MemoryAuthProvider;

use crate::error::Result;
use crate::models::{Actor, Profile, Role};
use async_trait::async_trait;
use document_store::{DocumentStore, WriteOp};
use tokio::sync::watch;

/// The provider's view of a signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub login_handle: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, handle: &str, password: &str) -> Result<AuthUser>;

    async fn sign_in(&self, handle: &str, password: &str) -> Result<AuthUser>;

    async fn sign_out(&self) -> Result<()>;

    /// Session-change subscription. `None` means signed out.
    fn sessions(&self) -> watch::Receiver<Option<AuthUser>>;
}

/// Sign-up flow: create the account, then write the profile record the
/// session resolver enriches from. New accounts start as non-admin citizens.
pub async fn register(
    provider: &dyn AuthProvider,
    store: &dyn DocumentStore,
    profiles_collection: &str,
    username: &str,
    password: &str,
) -> Result<Actor> {
    let username = username.trim();
    if username.is_empty() {
        return Err(crate::error::AppError::Validation(
            "Username is required".to_string(),
        ));
    }

    let handle = format!("{}@linkgov.rw", username);
    let user = provider.sign_up(&handle, password).await?;

    let profile = Profile {
        username: username.to_string(),
        email: handle.clone(),
        role: Role::Citizen,
        is_admin: false,
    };
    store
        .commit(vec![WriteOp::Create {
            collection: profiles_collection.to_string(),
            id: user.uid.clone(),
            fields: crate::models::document_fields(&profile)?,
        }])
        .await?;

    Ok(Actor {
        uid: user.uid,
        username: profile.username,
        email: profile.email,
        role: profile.role,
        is_admin: profile.is_admin,
        photo_url: user.photo_url,
    })
}
