//! Session Context
//!
//! The bearer token and current user, held in an explicit object that is
//! passed to whatever issues HTTP calls. `SessionStore` gives it a lifecycle:
//! created on login, torn down on logout.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Role of the logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
}

/// An `{ id, name }` reference to a class or subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// The current user as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub phone_number: String,
    /// Subject taught (teachers only)
    #[serde(default)]
    pub subject: Option<NamedRef>,
    /// Class joined (students only)
    #[serde(rename = "class_", default)]
    pub class: Option<NamedRef>,
    #[serde(default)]
    pub owned_classes: Vec<NamedRef>,
}

/// Token plus the user it belongs to.
#[derive(Clone)]
pub struct SessionContext {
    token: String,
    user: Option<CurrentUser>,
}

impl SessionContext {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: CurrentUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self.user.as_ref().map(|u| u.role), Some(UserRole::Teacher))
    }
}

// Keep the token out of logs.
impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &"<redacted>")
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .finish()
    }
}

/// Holds at most one live session.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: Option<SessionContext>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, replacing any previous one.
    pub fn login(&mut self, session: SessionContext) {
        tracing::info!(
            user = session.user().map(|u| u.id.as_str()).unwrap_or("<unknown>"),
            "session started"
        );
        self.current = Some(session);
    }

    /// End the current session. Returns whether one was active.
    pub fn logout(&mut self) -> bool {
        let was_active = self.current.take().is_some();
        if was_active {
            tracing::info!("session ended");
        }
        was_active
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> CoreResult<&SessionContext> {
        self.current
            .as_ref()
            .ok_or_else(|| CoreError::not_authenticated("login required"))
    }
}
