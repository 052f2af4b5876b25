use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bulkrooms_core::wizard::{SessionId, WizardSession};
use chrono::{Duration, Utc};
use tracing::debug;

/// Live wizard sessions keyed by id. Each access holds the lock only for the
/// closure passed in; nothing awaits while it is held.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<SessionId, WizardSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self { inner: Arc::default(), ttl }
    }

    /// Sweeps idle sessions, then registers a fresh one. A session with a send
    /// in flight is kept until the send settles.
    pub fn create(&self) -> SessionId {
        let session = WizardSession::default();
        let id = session.id().clone();
        let ttl = self.ttl;

        let swept = self.with_map(|sessions| {
            let now = Utc::now();
            let before = sessions.len();
            sessions.retain(|_, session| {
                session.is_submitting() || !session.is_idle_longer_than(ttl, now)
            });
            let swept = before - sessions.len();
            sessions.insert(id.clone(), session);
            swept
        });

        if swept > 0 {
            debug!(
                event_name = "server.sessions.swept",
                swept_sessions = swept,
                "expired wizard sessions removed"
            );
        }
        id
    }

    pub fn with_session<T>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut WizardSession) -> T,
    ) -> Option<T> {
        self.with_map(|sessions| sessions.get_mut(id).map(f))
    }

    pub fn len(&self) -> usize {
        self.with_map(|sessions| sessions.len())
    }

    fn with_map<T>(&self, f: impl FnOnce(&mut HashMap<SessionId, WizardSession>) -> T) -> T {
        match self.inner.lock() {
            Ok(mut sessions) => f(&mut sessions),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}
