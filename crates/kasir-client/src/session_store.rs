//! # Session Store
//!
//! Keeps the auth token, signed-in user and active outlet across restarts.
//! The cart is never written here.
//!
//! ## File Layout
//! ```text
//! ~/.local/share/kasir-pos/session.json
//! {
//!   "auth":  { "token": "...", "user": {...}, "expires_at": "2026-10-17T09:00:00Z" },
//!   "store": { "id": "...", "name": "Toko Makmur", ... }
//! }
//! ```
//!
//! Writes go to a sibling `.tmp` file first and are renamed into place, so a
//! crash mid-write leaves the previous session intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use kasir_core::{Store, User};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// A signed-in session returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Everything persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub auth: Option<AuthSession>,
    #[serde(default)]
    pub store: Option<Store>,
}

/// JSON file backing [`PersistedSession`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    /// Store at the configured (or platform default) session path.
    pub fn from_config(config: &ClientConfig) -> Option<Self> {
        config.session_path().map(SessionStore::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the session file.
    ///
    /// A missing file is an empty session. A corrupt file is logged and
    /// treated as empty so a bad write never locks the cashier out.
    pub fn load(&self) -> ClientResult<PersistedSession> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No session file, starting signed out");
                return Ok(PersistedSession::default());
            }
            Err(e) => return Err(ClientError::Storage(e.to_string())),
        };

        match serde_json::from_str(&contents) {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Session file is corrupt, ignoring it");
                Ok(PersistedSession::default())
            }
        }
    }

    /// Writes the session file atomically.
    pub fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClientError::Storage(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(session)
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| ClientError::Storage(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| ClientError::Storage(e.to_string()))?;

        debug!(path = ?self.path, "Session saved");
        Ok(())
    }

    /// Deletes the session file; a missing file is fine.
    pub fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }
}
