//! Login gate and token persistence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{ApiError, InventoryService, LoginRequest};

pub const ACCESS_DENIED_MESSAGE: &str = "Access Denied";
pub const SERVER_UNREACHABLE_MESSAGE: &str = "Server connection failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session has not been initialized")]
    NotInitialized,
    #[error("username and password are required")]
    MissingCredentials,
    /// The service refused the credentials.
    #[error("{0}")]
    Denied(String),
    /// No usable answer from the service.
    #[error("{0}")]
    Unreachable(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid session file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the session token lives between runs.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, SessionError>;
    fn save(&self, session: &StoredSession) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let payload = serde_json::to_vec_pretty(session).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, payload).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            session: Mutex::new(Some(StoredSession {
                token: token.into(),
                saved_at: Utc::now(),
            })),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        Ok(self.session.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The store has not been checked yet.
    Uninitialized,
    Anonymous,
    Authenticated,
}

/// Gate in front of the movement form.
///
/// A stored token is trusted as-is; the service is the one that decides
/// whether it still works.
pub struct Session {
    store: Box<dyn TokenStore>,
    state: SessionState,
    token: Option<String>,
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            state: SessionState::Uninitialized,
            token: None,
        }
    }

    /// Check the store once. Later calls change nothing.
    pub fn initialize(&mut self) -> SessionState {
        if self.state != SessionState::Uninitialized {
            tracing::debug!(state = ?self.state, "session already initialized");
            return self.state;
        }

        match self.store.load() {
            Ok(Some(stored)) => {
                tracing::info!(saved_at = %stored.saved_at, "restored saved session");
                self.token = Some(stored.token);
                self.state = SessionState::Authenticated;
            }
            Ok(None) => {
                self.state = SessionState::Anonymous;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved session; starting signed out");
                self.state = SessionState::Anonymous;
            }
        }
        self.state
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Exchange credentials for a token and remember it.
    ///
    /// The returned error's `Display` is the text to show the user.
    pub async fn login(
        &mut self,
        service: &dyn InventoryService,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        if self.state == SessionState::Uninitialized {
            return Err(SessionError::NotInitialized);
        }
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = service.login(&request).await.map_err(|e| {
            tracing::warn!(username, error = %e, "login failed");
            login_error(e)
        })?;

        let stored = StoredSession {
            token: response.token,
            saved_at: Utc::now(),
        };
        if let Err(e) = self.store.save(&stored) {
            tracing::warn!(error = %e, "signed in, but the session could not be saved");
        }

        tracing::info!(username, "signed in");
        self.token = Some(stored.token);
        self.state = SessionState::Authenticated;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.token = None;
        self.state = SessionState::Anonymous;
        self.store.clear()?;
        tracing::info!("signed out");
        Ok(())
    }
}

fn login_error(err: ApiError) -> SessionError {
    match err {
        ApiError::Rejected { detail, .. } if !detail.trim().is_empty() => SessionError::Denied(detail),
        ApiError::Rejected { .. } | ApiError::Unexpected { .. } => {
            SessionError::Denied(ACCESS_DENIED_MESSAGE.to_string())
        }
        ApiError::Network(_) | ApiError::Parse(_) => {
            SessionError::Unreachable(SERVER_UNREACHABLE_MESSAGE.to_string())
        }
    }
}
