/// In-memory authentication provider
///
/// Reference implementation of [`AuthProvider`] for tests and local
/// development. Accounts live in a concurrent map; passwords are stored as
/// Argon2id PHC hashes; the ambient session is published through a watch
/// channel exactly like the hosted provider's session-change callback.
use crate::auth::{AuthProvider, AuthUser};
use crate::error::{AppError, Result};
use crate::security::password::{hash_password, verify_password};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;

struct Account {
    uid: String,
    password_hash: String,
    display_name: Option<String>,
    photo_url: Option<String>,
}

pub struct MemoryAuthProvider {
    accounts: DashMap<String, Account>,
    session: watch::Sender<Option<AuthUser>>,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: DashMap::new(),
            session,
        }
    }

    fn auth_user(handle: &str, account: &Account) -> AuthUser {
        AuthUser {
            uid: account.uid.clone(),
            login_handle: handle.to_string(),
            display_name: account.display_name.clone(),
            photo_url: account.photo_url.clone(),
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_up(&self, handle: &str, password: &str) -> Result<AuthUser> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(AppError::Validation("Login handle is required".to_string()));
        }
        if self.accounts.contains_key(handle) {
            return Err(AppError::UsernameTaken);
        }

        let account = Account {
            uid: uuid::Uuid::new_v4().to_string(),
            password_hash: hash_password(password)?,
            display_name: None,
            photo_url: None,
        };
        let user = Self::auth_user(handle, &account);
        self.accounts.insert(handle.to_string(), account);

        // Creating an account also signs it in, like the hosted provider.
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, handle: &str, password: &str) -> Result<AuthUser> {
        let user = {
            let account = self
                .accounts
                .get(handle)
                .ok_or(AppError::InvalidCredentials)?;
            if !verify_password(password, &account.password_hash)? {
                return Err(AppError::InvalidCredentials);
            }
            Self::auth_user(handle, &account)
        };

        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.session.send_replace(None);
        Ok(())
    }

    fn sessions(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_rejects_duplicate_handles() {
        let provider = MemoryAuthProvider::new();
        provider
            .sign_up("claudine@linkgov.rw", "long enough secret")
            .await
            .unwrap();
        let err = provider
            .sign_up("claudine@linkgov.rw", "another long secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UsernameTaken));
    }

    #[tokio::test]
    async fn sign_in_publishes_the_session() {
        let provider = MemoryAuthProvider::new();
        let mut sessions = provider.sessions();
        assert!(sessions.borrow_and_update().is_none());

        let user = provider
            .sign_up("eric@linkgov.rw", "long enough secret")
            .await
            .unwrap();
        sessions.changed().await.unwrap();
        assert_eq!(sessions.borrow_and_update().as_ref(), Some(&user));

        provider.sign_out().await.unwrap();
        sessions.changed().await.unwrap();
        assert!(sessions.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_passwords() {
        let provider = MemoryAuthProvider::new();
        provider
            .sign_up("eric@linkgov.rw", "long enough secret")
            .await
            .unwrap();
        let err = provider
            .sign_in("eric@linkgov.rw", "wrong password!!")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = provider
            .sign_in("nobody@linkgov.rw", "long enough secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }
}
