//! Session resolution
//!
//! The orchestrator asks an `AuthProvider` who the caller is before it
//! writes anything. `StaticAuth` serves a fixed session (local CLI, tests);
//! `RestAuth` asks the hosted auth service.

mod rest;

pub use rest::RestAuth;

use crate::model::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from resolving the current user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no active session")]
    NoSession,

    #[error("session rejected: {0}")]
    InvalidSession(String),

    #[error("auth service unreachable: {0}")]
    Transport(String),
}

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Source of the current session
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the signed-in user, or fail when there is none
    async fn current_user(&self) -> Result<UserIdentity, AuthError>;
}

/// Fixed session, resolved without I/O
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user: Option<UserIdentity>,
}

impl StaticAuth {
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }

    /// Signed in as `name` when it is present and non-blank
    pub fn from_user_name(name: Option<&str>) -> Self {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Self::signed_in(UserIdentity::new(name)),
            None => Self::signed_out(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user(&self) -> Result<UserIdentity, AuthError> {
        self.user.clone().ok_or(AuthError::NoSession)
    }
}
