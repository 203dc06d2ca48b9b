//! Token and session state
//!
//! One [`Session`] per client. Tokens are replaced wholesale by a successful
//! login or refresh; the only partial update is the provisional expiry
//! extension taken while a refresh is in flight.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Current OAuth tokens
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

impl TokenState {
    /// Non-empty access token present.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|token| !token.is_empty())
    }

    /// A token without an expiry never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Whether the access token has expired; a missing expiry never expires.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Body of a successful `/oauth/token` response
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "deserialize_seconds")]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

impl TokenResponse {
    /// Token state with the expiry anchored at `now`.
    ///
    /// # Errors
    /// Returns a message when `expires_in` does not fit a timestamp.
    pub fn into_state(self, now: DateTime<Utc>) -> Result<TokenState, String> {
        let expires_at = match self.expires_in {
            Some(secs) => Some(
                Duration::try_seconds(secs)
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
                    .ok_or_else(|| format!("expires_in {secs} is out of range"))?,
            ),
            None => None,
        };
        Ok(TokenState {
            access_token: Some(self.access_token),
            refresh_token: self.refresh_token,
            expires_at,
            scope: self.scope,
        })
    }
}

/// Some servers send `expires_in` as a string.
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            n.as_i64().map(Some).ok_or_else(|| serde::de::Error::custom("expires_in out of range"))
        }
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid expires_in '{s}'"))),
        Some(other) => Err(serde::de::Error::custom(format!("invalid expires_in {other}"))),
    }
}

/// Shared session of one client
#[derive(Debug)]
pub struct Session {
    tokens: RwLock<TokenState>,
    refresh_lock: Mutex<()>,
    open: AtomicBool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Open session without tokens.
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(TokenState::default()),
            refresh_lock: Mutex::new(()),
            open: AtomicBool::new(true),
        }
    }

    /// Copy of the tokens.
    pub async fn snapshot(&self) -> TokenState {
        self.tokens.read().await.clone()
    }

    /// Replace the tokens.
    pub async fn replace(&self, state: TokenState) {
        *self.tokens.write().await = state;
    }

    /// Forget all tokens.
    pub async fn clear(&self) {
        self.replace(TokenState::default()).await;
    }

    /// Push the expiry out by `by` from now, returning the previous value.
    pub async fn extend_expiry(&self, by: Duration) -> Option<DateTime<Utc>> {
        let mut tokens = self.tokens.write().await;
        std::mem::replace(&mut tokens.expires_at, Some(Utc::now() + by))
    }

    /// Undo [`Session::extend_expiry`].
    pub async fn restore_expiry(&self, previous: Option<DateTime<Utc>>) {
        self.tokens.write().await.expires_at = previous;
    }

    /// Serializes refreshes; hold the guard for the whole refresh.
    pub async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }

    /// Whether the session accepts requests.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Accept requests again.
    pub fn reopen(&self) {
        self.open.store(true, Ordering::Release);
    }

    /// Reject requests until reopened.
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }
}
