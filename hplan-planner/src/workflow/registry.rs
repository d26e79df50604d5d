//! In-memory session registry
//!
//! Each session sits behind its own async mutex so that one user action is
//! applied atomically before the next one for the same session starts.
//! Sessions live for the lifetime of the process at most: every lookup
//! refreshes a session's last-activity time, and sessions idle for longer
//! than the configured timeout are dropped when the next one is created.

use super::SessionWorkflow;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hplan_common::Clock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<SessionWorkflow>>;

struct SessionEntry {
    session: SharedSession,
    /// Milliseconds since the epoch; atomic so lookups can touch it under the read lock
    last_active_ms: AtomicI64,
}

impl SessionEntry {
    fn new(session: SessionWorkflow, now: DateTime<Utc>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            last_active_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    fn touch(&self, now: DateTime<Utc>) {
        self.last_active_ms
            .store(now.timestamp_millis(), Ordering::Relaxed);
    }

    fn is_idle(&self, now: DateTime<Utc>, idle_timeout: ChronoDuration) -> bool {
        let idle_ms = now.timestamp_millis() - self.last_active_ms.load(Ordering::Relaxed);
        idle_ms > idle_timeout.num_milliseconds()
    }
}

pub struct SessionRegistry {
    clock: Arc<dyn Clock>,
    idle_timeout: ChronoDuration,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>, idle_timeout: Duration) -> Self {
        let idle_timeout =
            ChronoDuration::from_std(idle_timeout).unwrap_or_else(|_| ChronoDuration::days(36_500));
        Self {
            clock,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a fresh session in ENTERING
    ///
    /// Idle sessions are pruned while the write lock is held.
    pub async fn create(&self) -> Uuid {
        let now = self.clock.now();
        let session = SessionWorkflow::new();
        let session_id = session.session_id();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let idle_timeout = self.idle_timeout;
        sessions.retain(|_, entry| !entry.is_idle(now, idle_timeout));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Dropped idle sessions");
        }

        sessions.insert(session_id, SessionEntry::new(session, now));
        info!(session_id = %session_id, "Session created");
        session_id
    }

    /// Look up a session and mark it active; idle sessions count as gone
    pub async fn get(&self, session_id: &Uuid) -> Option<SharedSession> {
        let now = self.clock.now();
        let sessions = self.sessions.read().await;
        let entry = sessions.get(session_id)?;
        if entry.is_idle(now, self.idle_timeout) {
            debug!(session_id = %session_id, "Session expired");
            return None;
        }
        entry.touch(now);
        Some(entry.session.clone())
    }

    pub async fn remove(&self, session_id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            info!(session_id = %session_id, "Session removed");
        }
        removed
    }

    /// Stored sessions, including idle ones not yet pruned
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::SessionState;
    use hplan_common::ManualClock;

    const IDLE: Duration = Duration::from_secs(600);

    fn registry() -> (SessionRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (SessionRegistry::new(clock.clone(), IDLE), clock)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (registry, _) = registry();
        assert!(registry.is_empty().await);

        let id = registry.create().await;
        let session = registry.get(&id).await.unwrap();
        let session = session.lock().await;
        assert_eq!(session.session_id(), id);
        assert_eq!(session.state(), SessionState::Entering);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let (registry, _) = registry();
        let a = registry.create().await;
        let b = registry.create().await;
        assert_ne!(a, b);

        registry.get(&a).await.unwrap().lock().await.edit_size(700);

        let b_session = registry.get(&b).await.unwrap();
        assert_eq!(b_session.lock().await.plot().size_square_meters, 0);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_remove() {
        let (registry, _) = registry();
        let id = registry.create().await;

        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(registry.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_idle_sessions_dropped_on_create() {
        let (registry, clock) = registry();
        for _ in 0..50 {
            registry.create().await;
        }
        assert_eq!(registry.len().await, 50);

        clock.advance(ChronoDuration::seconds(601));
        let fresh = registry.create().await;

        assert_eq!(registry.len().await, 1);
        assert!(registry.get(&fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_activity_keeps_session_alive() {
        let (registry, clock) = registry();
        let active = registry.create().await;
        let abandoned = registry.create().await;

        // Touched every 5 minutes, never idle for the full 10
        for _ in 0..4 {
            clock.advance(ChronoDuration::seconds(300));
            assert!(registry.get(&active).await.is_some());
        }
        registry.create().await;

        assert!(registry.get(&active).await.is_some());
        assert!(registry.get(&abandoned).await.is_none());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_idle_session_not_returned_before_pruning() {
        let (registry, clock) = registry();
        let id = registry.create().await;

        clock.advance(ChronoDuration::seconds(600));
        assert!(registry.get(&id).await.is_some());

        clock.advance(ChronoDuration::seconds(601));
        assert!(registry.get(&id).await.is_none());
        assert_eq!(registry.len().await, 1);
    }
}
