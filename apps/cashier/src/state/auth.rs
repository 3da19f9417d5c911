//! # Auth State
//!
//! The signed-in user and bearer token of this session.
//!
//! ```text
//! signed out ──login──► signed in ──logout / 401 / expiry──► signed out
//! ```

use std::sync::{Mutex, PoisonError};

use chrono::Utc;

use kasir_client::AuthSession;
use kasir_core::User;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Default)]
pub struct AuthState {
    session: Mutex<Option<AuthSession>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Option<AuthSession>) -> R) -> R {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    pub fn set(&self, session: AuthSession) {
        self.with(|s| *s = Some(session));
    }

    /// Drops the session; returns whether one was present.
    pub fn clear(&self) -> bool {
        self.with(|s| s.take().is_some())
    }

    /// True while a token is held and has not expired.
    pub fn is_authenticated(&self) -> bool {
        self.with(|s| s.as_ref().is_some_and(|a| !a.is_expired_at(Utc::now())))
    }

    pub fn user(&self) -> Option<User> {
        self.with(|s| s.as_ref().map(|a| a.user.clone()))
    }

    pub fn snapshot(&self) -> Option<AuthSession> {
        self.with(|s| s.clone())
    }

    /// The bearer token, or `NOT_AUTHENTICATED`.
    ///
    /// An expired session is dropped on the way.
    pub fn require_token(&self) -> ApiResult<String> {
        self.with(|s| {
            if s.as_ref().is_some_and(|a| a.is_expired_at(Utc::now())) {
                *s = None;
            }
            s.as_ref()
                .map(|a| a.token.clone())
                .ok_or_else(ApiError::not_authenticated)
        })
    }
}
