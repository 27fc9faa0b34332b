//! In-memory store of live checkout sessions.
//!
//! Sessions are cached with `moka` and expire after a period of inactivity.

use std::sync::Arc;
use std::time::Duration;

use gearline_core::CheckoutSessionId;
use moka::future::Cache;
use tokio::sync::Mutex;

use super::session::CheckoutSession;

/// A session shared between concurrent requests.
///
/// Never hold the lock across a gateway call.
pub type SharedSession = Arc<Mutex<CheckoutSession>>;

/// Maximum number of live checkout sessions kept in memory.
const MAX_SESSIONS: u64 = 10_000;

/// TTL'd map from session id to session.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<CheckoutSessionId, SharedSession>,
}

impl SessionStore {
    /// Create a store whose sessions expire after `idle_ttl` without access.
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle_ttl)
            .build();
        Self { cache }
    }

    /// Store a session and return its shared handle.
    pub async fn insert(&self, session: CheckoutSession) -> SharedSession {
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.cache.insert(id, Arc::clone(&shared)).await;
        shared
    }

    /// Look up a live session.
    pub async fn get(&self, id: CheckoutSessionId) -> Option<SharedSession> {
        self.cache.get(&id).await
    }
}
