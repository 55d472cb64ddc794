//! Application State
//!
//! Configuration, the API client and the session store, owned together and
//! passed to whatever needs to talk to the backend.

use tokio::sync::RwLock;
use zhicuoti_client::ApiClient;
use zhicuoti_core::{SessionContext, SessionStore};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};

/// Application state
pub struct AppState {
    config: AppConfig,
    api: ApiClient,
    sessions: RwLock<SessionStore>,
}

impl AppState {
    /// Build state from an already validated configuration
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::validation)?;
        let api = ApiClient::new(config.to_client_settings())?;
        Ok(Self {
            config,
            api,
            sessions: RwLock::new(SessionStore::new()),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Log in with phone number and password and start a session
    pub async fn login(&self, phone_number: &str, password: &str) -> AppResult<SessionContext> {
        let session = self.api.open_session(phone_number, password).await?;
        self.sessions.write().await.login(session.clone());
        Ok(session)
    }

    /// Start a session from an existing token, resolving its user
    pub async fn resume(&self, token: &str) -> AppResult<SessionContext> {
        let session = SessionContext::new(token);
        let user = self.api.get_me(&session).await?;
        let session = session.with_user(user);
        self.sessions.write().await.login(session.clone());
        Ok(session)
    }

    /// End the current session. Returns whether one was active.
    pub async fn logout(&self) -> bool {
        self.sessions.write().await.logout()
    }

    /// The current session, or `NotAuthenticated`
    pub async fn session(&self) -> AppResult<SessionContext> {
        let store = self.sessions.read().await;
        Ok(store.current()?.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.sessions.read().await.is_authenticated()
    }
}
