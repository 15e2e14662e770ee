//! Authenticated session: token and profile, loaded from and saved to a credential store.

pub mod jwt;
mod sqlite;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::{LoginResponse, User, ROLE_ADMIN};

pub use sqlite::{SqliteStore, StoredCredential};
pub use store::{CredentialStore, MemoryStore};

pub const TOKEN_KEY: &str = "jwt_token";
pub const USER_KEY: &str = "user_info";

#[derive(Debug, Clone, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// Explicit session object shared by the API client and the front end.
pub struct Session<S> {
    store: S,
    state: RwLock<SessionState>,
}

impl<S: CredentialStore> Session<S> {
    /// Restore the session saved in `store`.
    ///
    /// An expired token or an unreadable profile clears the store and
    /// yields a signed-out session.
    pub async fn load(store: S) -> Result<Self> {
        let token = store
            .get(TOKEN_KEY)
            .await
            .context("Failed to read stored token")?;
        let user_json = store
            .get(USER_KEY)
            .await
            .context("Failed to read stored profile")?;

        let session = Self {
            store,
            state: RwLock::new(SessionState::default()),
        };

        let Some(token) = token else {
            if user_json.is_some() {
                session.clear_store().await?;
            }
            return Ok(session);
        };

        if jwt::is_expired(&token, Utc::now()) {
            info!("Stored token has expired, clearing credentials");
            session.clear_store().await?;
            return Ok(session);
        }

        let user = match user_json.as_deref().map(serde_json::from_str::<User>) {
            Some(Ok(user)) => Some(user),
            Some(Err(e)) => {
                warn!(error = %e, "Stored profile is unreadable, clearing credentials");
                session.clear_store().await?;
                return Ok(session);
            }
            None => None,
        };

        *session.state.write().await = SessionState {
            token: Some(token),
            user,
        };
        Ok(session)
    }

    /// Adopt a freshly issued token and profile, and persist them.
    pub async fn sign_in(&self, login: &LoginResponse) -> Result<()> {
        let user_json =
            serde_json::to_string(&login.user).context("Failed to serialize user profile")?;

        *self.state.write().await = SessionState {
            token: Some(login.token.clone()),
            user: Some(login.user.clone()),
        };

        // Profile first: a stored token must never sit beside another user's profile.
        self.store
            .set(USER_KEY, &user_json)
            .await
            .context("Failed to persist profile")?;
        if let Err(e) = self.store.set(TOKEN_KEY, &login.token).await {
            if let Err(clear) = self.clear_store().await {
                warn!(error = %clear, "Failed to clear credentials after a partial save");
            }
            return Err(e).context("Failed to persist token");
        }

        info!(user = %login.user.username, "Signed in");
        Ok(())
    }

    /// Forget the token and profile, in memory and in the store.
    pub async fn sign_out(&self) -> Result<()> {
        *self.state.write().await = SessionState::default();
        self.clear_store().await?;
        info!("Signed out");
        Ok(())
    }

    async fn clear_store(&self) -> Result<()> {
        self.store
            .remove(TOKEN_KEY)
            .await
            .context("Failed to remove token")?;
        self.store
            .remove(USER_KEY)
            .await
            .context("Failed to remove profile")?;
        Ok(())
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.token.is_some()
    }

    pub async fn has_role(&self, role: &str) -> bool {
        self.state
            .read()
            .await
            .user
            .as_ref()
            .is_some_and(|user| user.has_role(role))
    }

    pub async fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN).await
    }

    /// True when signed out or the token's expiry has passed.
    pub async fn is_token_expired(&self) -> bool {
        match self.state.read().await.token.as_deref() {
            Some(token) => jwt::is_expired(token, Utc::now()),
            None => true,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
