//! Authentication context shared by backends and query layers.
//!
//! [`AuthContext`] answers "who is the current user, if anyone". The read
//! path consults it only to decide whether hidden categories are requested;
//! mutations require a signed-in user.

use std::sync::{Arc, PoisonError, RwLock};

use folio_core::error::CoreError;
use folio_core::types::DbId;
use serde::{Deserialize, Serialize};

/// The signed-in site owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: DbId,
    pub email: Option<String>,
}

#[derive(Debug, Default)]
struct Session {
    user: Option<AuthUser>,
    access_token: Option<String>,
}

/// Cheaply cloneable handle to the current session.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    session: Arc<RwLock<Session>>,
}

impl AuthContext {
    /// A context with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A context already signed in as `user`.
    pub fn signed_in(user: AuthUser, access_token: Option<String>) -> Self {
        let ctx = Self::default();
        ctx.set_session(user, access_token);
        ctx
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .is_some()
    }

    /// Bearer token of the current session, if any.
    pub fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    pub fn set_session(&self, user: AuthUser, access_token: Option<String>) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        session.user = Some(user);
        session.access_token = access_token;
    }

    pub fn sign_out(&self) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        session.user = None;
        session.access_token = None;
    }

    /// Return the current user or an `Unauthorized` error.
    pub fn require_user(&self) -> Result<AuthUser, CoreError> {
        self.current_user().ok_or_else(|| {
            CoreError::Unauthorized("Sign in to edit portfolio content".to_string())
        })
    }
}
