//! Server-side login sessions.
//!
//! The browser only ever holds an opaque random token; the store keys
//! sessions by the token's SHA-256 so a leaked store dump cannot be
//! replayed as cookies.
//!
//! Key properties:
//! - Sessions live only in memory; a restart logs everyone out
//! - Idle sessions expire (sliding window, refreshed on every lookup)
//! - Each session carries a flash queue drained by the next page view

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::models::enums::Role;

/// Purge expired entries whenever the store grows past this size.
const PURGE_THRESHOLD: usize = 1000;

// ═══════════════════════════════════════════════════════════
// Identity: who the session belongs to
// ═══════════════════════════════════════════════════════════

/// Authenticated identity carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    Patient {
        patient_id: i64,
        name: String,
        /// Logged in through the caregiver role on the patient's account.
        is_caregiver: bool,
    },
    Doctor {
        doctor_id: i64,
        name: String,
    },
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Self::Patient { is_caregiver: true, .. } => Role::Caregiver,
            Self::Patient { .. } => Role::Patient,
            Self::Doctor { .. } => Role::Doctor,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Patient { name, .. } | Self::Doctor { name, .. } => name,
        }
    }

    /// Dashboard this identity lands on after login.
    pub fn home_path(&self) -> &'static str {
        match self {
            Self::Patient { .. } => "/patient",
            Self::Doctor { .. } => "/doctor",
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tokens
// ═══════════════════════════════════════════════════════════

/// Hash a session token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random session token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

// ═══════════════════════════════════════════════════════════
// SessionStore
// ═══════════════════════════════════════════════════════════

struct Session {
    identity: Identity,
    flashes: Vec<String>,
    last_seen: Instant,
}

/// All live sessions, keyed by token hash.
pub struct SessionStore {
    sessions: HashMap<[u8; 32], Session>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            idle_timeout,
        }
    }

    /// Start a session and return the raw token for the cookie.
    pub fn create(&mut self, identity: Identity) -> String {
        if self.sessions.len() > PURGE_THRESHOLD {
            self.purge_expired();
        }
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            Session {
                identity,
                flashes: Vec::new(),
                last_seen: Instant::now(),
            },
        );
        token
    }

    /// Resolve a token, refreshing its idle timer. Expired sessions are
    /// dropped and behave exactly like unknown tokens.
    pub fn get(&mut self, token: &str) -> Option<Identity> {
        let key = hash_token(token);
        let now = Instant::now();
        let expired = match self.sessions.get_mut(&key) {
            None => return None,
            Some(session) if now.duration_since(session.last_seen) >= self.idle_timeout => true,
            Some(session) => {
                session.last_seen = now;
                return Some(session.identity.clone());
            }
        };
        if expired {
            self.sessions.remove(&key);
        }
        None
    }

    /// Queue a one-shot message for the next page view.
    pub fn push_flash(&mut self, token: &str, message: impl Into<String>) {
        if let Some(session) = self.sessions.get_mut(&hash_token(token)) {
            session.flashes.push(message.into());
        }
    }

    /// Drain queued flash messages.
    pub fn take_flashes(&mut self, token: &str) -> Vec<String> {
        self.sessions
            .get_mut(&hash_token(token))
            .map(|s| std::mem::take(&mut s.flashes))
            .unwrap_or_default()
    }

    /// End a session. Returns `true` if it existed.
    pub fn remove(&mut self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    pub fn purge_expired(&mut self) {
        let now = Instant::now();
        let idle = self.idle_timeout;
        self.sessions
            .retain(|_, s| now.duration_since(s.last_seen) < idle);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
