//! Session token storage.
//!
//! Tokens are opaque random strings held in memory. Each one maps to a user
//! id and expires after a configurable time. Unlike one-shot tokens, a
//! session token stays valid across requests until it expires or is revoked
//! at logout. Restarting the server invalidates every session.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Longest lifetime a token may have; larger configured values are clamped.
const MAX_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct Session {
    user_id: Uuid,
    expires_at: Instant,
}

/// In-memory session store with expiry.
///
/// Thread-safe via internal RwLock.
#[derive(Debug)]
pub struct TokenStore {
    sessions: RwLock<HashMap<String, Session>>,
    lifetime: Duration,
}

impl TokenStore {
    /// Creates a store whose tokens live for `expiry_minutes`.
    pub fn new(expiry_minutes: u64) -> Self {
        Self::with_lifetime(Duration::from_secs(expiry_minutes.saturating_mul(60)))
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            lifetime: lifetime.min(MAX_LIFETIME),
        }
    }

    /// Issues a new token for the user.
    ///
    /// Returns the token string (32 bytes, base64url encoded).
    pub fn issue(&self, user_id: Uuid) -> String {
        let token = generate_token();
        let session = Session {
            user_id,
            expires_at: Instant::now() + self.lifetime,
        };
        self.write().insert(token.clone(), session);
        token
    }

    /// Returns the user a token belongs to.
    ///
    /// Returns `None` if the token is unknown or expired. The token is not
    /// consumed.
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        let sessions = self.read();
        let session = sessions.get(token)?;

        if Instant::now() >= session.expires_at {
            return None;
        }
        Some(session.user_id)
    }

    /// Revokes a token. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.write().remove(token).is_some()
    }

    /// Removes all expired tokens.
    ///
    /// Returns the number of tokens removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.write();
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Generates a secure random token.
fn generate_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
