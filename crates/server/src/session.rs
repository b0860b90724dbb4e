//! WebSocket connection bookkeeping.
//!
//! `VoiceAgent` is one shared handle for the whole shop process (see
//! `state.rs`), so a `Session` here carries only what varies per
//! connection: identity, activity timestamps, and the lifecycle stage the
//! Session Controller is currently in. Turn state itself lives in Redis via
//! `ConversationStore`, keyed by this same session id.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::error::ServerError;

/// The Session Controller's state machine
/// (IDLE → LISTENING → TRANSCRIBING → CLASSIFYING → EXECUTING → RESPONDING → IDLE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    Idle,
    Listening,
    Transcribing,
    Classifying,
    Executing,
    Responding,
}

impl SessionStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Transcribing => "transcribing",
            Self::Classifying => "classifying",
            Self::Executing => "executing",
            Self::Responding => "responding",
        }
    }
}

pub struct Session {
    pub id: String,
    pub created_at: Instant,
    last_activity: RwLock<Instant>,
    active: RwLock<bool>,
    stage: RwLock<SessionStage>,
    turn_count: AtomicU64,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
            active: RwLock::new(true),
            stage: RwLock::new(SessionStage::Idle),
            turn_count: AtomicU64::new(0),
        }
    }

    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    pub fn close(&self) {
        *self.active.write() = false;
    }

    pub fn is_active(&self) -> bool {
        *self.active.read()
    }

    pub fn stage(&self) -> SessionStage {
        *self.stage.read()
    }

    pub fn set_stage(&self, stage: SessionStage) {
        *self.stage.write() = stage;
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count.load(Ordering::Relaxed)
    }

    pub fn increment_turn_count(&self) {
        self.turn_count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Bounds how many WebSocket connections can be live at once and evicts
/// idle ones on a timer, the same shape the teacher uses for connection
/// bookkeeping.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(max_sessions, Duration::from_secs(3600), Duration::from_secs(300))
    }

    pub fn with_config(max_sessions: usize, session_timeout: Duration, cleanup_interval: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    /// Spawns a background task that evicts sessions idle past
    /// `session_timeout` every `cleanup_interval`. Returns a sender the
    /// caller uses to shut the task down.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let before = manager.count();
                        manager.cleanup_expired();
                        let after = manager.count();
                        if before != after {
                            tracing::info!(removed = before - after, remaining = after, "session cleanup");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    pub fn create(&self) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);
            if sessions.len() >= self.max_sessions {
                return Err(ServerError::Session("max connections reached".to_string()));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(&id));
        sessions.insert(id.clone(), session.clone());
        tracing::info!(session_id = %id, "created session");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.remove(id) {
            session.close();
            tracing::info!(session_id = %id, "removed session");
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions);
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) {
        let timeout = self.session_timeout;
        let expired: Vec<String> = sessions.iter().filter(|(_, s)| s.is_expired(timeout)).map(|(id, _)| id.clone()).collect();
        for id in expired {
            if let Some(session) = sessions.remove(&id) {
                session.close();
                tracing::info!(session_id = %id, "expired session");
            }
        }
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_creation_starts_active_and_idle() {
        let manager = SessionManager::new(10);
        let session = manager.create().unwrap();
        assert!(session.is_active());
        assert_eq!(session.stage(), SessionStage::Idle);
        assert!(!session.is_expired(Duration::from_secs(60)));
    }

    #[test]
    fn session_get_roundtrips() {
        let manager = SessionManager::new(10);
        let session = manager.create().unwrap();
        let id = session.id.clone();
        let retrieved = manager.get(&id);
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().id, id);
    }

    #[test]
    fn session_remove_deactivates_and_drops() {
        let manager = SessionManager::new(10);
        let session = manager.create().unwrap();
        let id = session.id.clone();
        manager.remove(&id);
        assert!(manager.get(&id).is_none());
    }

    #[test]
    fn capacity_is_enforced() {
        let manager = SessionManager::new(1);
        manager.create().unwrap();
        assert!(manager.create().is_err());
    }

    #[test]
    fn stage_transitions_are_observable() {
        let manager = SessionManager::new(10);
        let session = manager.create().unwrap();
        session.set_stage(SessionStage::Listening);
        assert_eq!(session.stage(), SessionStage::Listening);
        session.increment_turn_count();
        assert_eq!(session.turn_count(), 1);
    }
}
