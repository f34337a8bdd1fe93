//! Owner of every live session, keyed by short random ids.

use std::{
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::{Duration, SystemTime},
};

use dashmap::{DashMap, mapref::entry::Entry};
use rand::{RngCore, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::state::{
    game::{GameSession, SessionError, SessionId},
    state_machine::SessionPhase,
};

/// Length of generated session ids.
pub const SESSION_ID_LEN: usize = 6;

const SESSION_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Session handle; the mutex serialises every mutation of one session.
pub type SessionHandle = Arc<Mutex<GameSession>>;

/// Concurrent map of sessions with lazy idle eviction.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionHandle>,
    ids: StdMutex<Box<dyn RngCore + Send>>,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self::with_rng(idle_ttl, Box::new(StdRng::from_os_rng()))
    }

    /// Registry drawing session ids from `rng`.
    pub fn with_rng(idle_ttl: Duration, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            sessions: DashMap::new(),
            ids: StdMutex::new(rng),
            idle_ttl,
        }
    }

    /// Create a session under a fresh id. `build` receives the id.
    pub fn create(&self, build: impl FnOnce(SessionId) -> GameSession) -> (SessionId, SessionHandle) {
        loop {
            let id = self.next_id();
            if let Entry::Vacant(slot) = self.sessions.entry(id.clone()) {
                let handle = Arc::new(Mutex::new(build(id.clone())));
                slot.insert(handle.clone());
                info!(session_id = %id, "session created");
                return (id, handle);
            }
            debug!(session_id = %id, "session id collision; drawing again");
        }
    }

    pub fn get(&self, id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::NotFound(id.to_owned()))
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!(session_id = %id, "session removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle for longer than the ttl, plus closed ones.
    ///
    /// Sessions locked by an in-flight operation are skipped. Returns the number evicted.
    pub fn evict_idle(&self, now: SystemTime) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, handle| match handle.try_lock() {
            Ok(session) => {
                let keep =
                    session.phase() != SessionPhase::Closed && !session.is_idle(now, self.idle_ttl);
                if !keep {
                    debug!(session_id = %id, "evicting session");
                }
                keep
            }
            Err(_) => true,
        });

        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    fn next_id(&self) -> SessionId {
        let mut rng = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        (0..SESSION_ID_LEN)
            .filter_map(|_| SESSION_ID_ALPHABET.choose(&mut *rng))
            .map(|&byte| char::from(byte))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;
    use crate::state::{
        game::GameRules,
        players::tests::sample_database,
        prompt::tests::{ScriptedPrompts, arsenal_forward},
    };

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::with_rng(Duration::from_secs(60), Box::new(StdRng::seed_from_u64(3)))
    }

    fn build(created: SystemTime) -> impl FnOnce(SessionId) -> GameSession {
        move |id| {
            GameSession::new(
                id,
                Arc::new(sample_database()),
                Box::new(ScriptedPrompts::new([arsenal_forward()])),
                GameRules::default(),
                created,
            )
        }
    }

    #[test]
    fn created_sessions_get_distinct_well_formed_ids() {
        let registry = registry();
        let mut ids = Vec::new();
        for _ in 0..50 {
            let (id, _) = registry.create(build(at(0)));
            assert_eq!(id.len(), SESSION_ID_LEN);
            assert!(id.bytes().all(|byte| SESSION_ID_ALPHABET.contains(&byte)));
            ids.push(id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
        assert_eq!(registry.len(), 50);
    }

    #[tokio::test]
    async fn lookups_return_the_shared_session() {
        let registry = registry();
        let (id, handle) = registry.create(build(at(0)));

        handle
            .lock()
            .await
            .join(None, "Ada".into(), at(1))
            .unwrap();

        let same = registry.get(&id).unwrap();
        assert!(same.lock().await.slot(0).is_some());
        assert_eq!(same.lock().await.id(), id);
        assert!(matches!(
            registry.get("NOPE00"),
            Err(SessionError::NotFound(missing)) if missing == "NOPE00"
        ));

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn eviction_drops_idle_and_closed_sessions() {
        let registry = registry();
        let (stale, _) = registry.create(build(at(0)));
        let (fresh, fresh_handle) = registry.create(build(at(0)));
        let (closed, closed_handle) = registry.create(build(at(100)));

        fresh_handle
            .lock()
            .await
            .join(Some("u1".into()), "Ada".into(), at(90))
            .unwrap();
        {
            let mut session = closed_handle.lock().await;
            session.join(Some("u2".into()), "Bob".into(), at(100)).unwrap();
            session.leave("u2", at(100)).unwrap();
        }

        assert_eq!(registry.evict_idle(at(120)), 2);
        assert!(registry.get(&stale).is_err());
        assert!(registry.get(&closed).is_err());
        assert!(registry.get(&fresh).is_ok());
    }

    #[tokio::test]
    async fn locked_sessions_survive_eviction() {
        let registry = registry();
        let (id, handle) = registry.create(build(at(0)));

        let guard = handle.lock().await;
        assert_eq!(registry.evict_idle(at(1000)), 0);
        drop(guard);

        assert_eq!(registry.evict_idle(at(1000)), 1);
        assert!(registry.get(&id).is_err());
    }
}
