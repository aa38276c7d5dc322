//! Session Management
//!
//! Each session owns one `ConversationState` behind its own async mutex, so
//! sessions never share state and a session runs at most one turn at a time.
//! A turn holds an owned guard, so it can outlive the request that started it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, MutexGuard, OwnedMutexGuard, TryLockError};

use tutor_agent::ConversationState;

use crate::ServerError;

/// Session state
pub struct Session {
    /// Session ID
    pub id: String,
    conversation: Arc<Mutex<ConversationState>>,
    /// Creation time
    pub created_at: Instant,
    /// Last activity
    pub last_activity: RwLock<Instant>,
    /// Is active
    pub active: RwLock<bool>,
}

impl Session {
    pub fn new(conversation: ConversationState) -> Self {
        Self {
            id: conversation.id().to_string(),
            conversation: Arc::new(Mutex::new(conversation)),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
            active: RwLock::new(true),
        }
    }

    /// Wait for the conversation, e.g. to read it
    pub async fn conversation(&self) -> MutexGuard<'_, ConversationState> {
        self.conversation.lock().await
    }

    /// Claim the conversation for a turn
    ///
    /// Fails instead of queueing when another turn holds it.
    pub fn begin_turn(&self) -> Result<OwnedMutexGuard<ConversationState>, ServerError> {
        Arc::clone(&self.conversation)
            .try_lock_owned()
            .map_err(|_: TryLockError| ServerError::TurnInProgress(self.id.clone()))
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    /// Close session
    pub fn close(&self) {
        *self.active.write() = false;
    }

    /// Is session active
    pub fn is_active(&self) -> bool {
        *self.active.read()
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    limits: RwLock<SessionLimits>,
    cleanup_interval: Duration,
}

/// Limits that can change while the server runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub session_timeout: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(
            max_sessions,
            Duration::from_secs(3600),
            Duration::from_secs(300),
        )
    }

    /// Create a new session manager with custom timeout and cleanup interval
    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            limits: RwLock::new(SessionLimits {
                max_sessions,
                session_timeout,
            }),
            cleanup_interval,
        }
    }

    /// Start a background task that periodically removes expired sessions.
    ///
    /// Returns a shutdown sender that stops the task.
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
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                "Session cleanup: removed {} expired sessions ({} remaining)",
                                removed,
                                manager.count()
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Check capacity before doing any work for a new session
    pub fn ensure_capacity(&self) -> Result<(), ServerError> {
        let mut sessions = self.sessions.write();
        self.ensure_capacity_internal(&mut sessions)
    }

    /// Register an opened conversation as a new session
    pub fn insert(&self, conversation: ConversationState) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();
        self.ensure_capacity_internal(&mut sessions)?;

        let session = Arc::new(Session::new(conversation));
        sessions.insert(session.id.clone(), session.clone());

        tracing::info!(session_id = %session.id, "Created session");
        Ok(session)
    }

    /// Current limits
    pub fn limits(&self) -> SessionLimits {
        *self.limits.read()
    }

    /// Replace the session cap and idle timeout
    ///
    /// Existing sessions are kept even when the new cap is lower.
    pub fn set_limits(&self, limits: SessionLimits) {
        let mut current = self.limits.write();
        if *current != limits {
            tracing::info!(
                max_sessions = limits.max_sessions,
                session_timeout_secs = limits.session_timeout.as_secs(),
                "Session limits updated"
            );
            *current = limits;
        }
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session, returning whether it existed
    pub fn remove(&self, id: &str) -> bool {
        match self.sessions.write().remove(id) {
            Some(session) => {
                session.close();
                tracing::info!("Removed session: {}", id);
                true
            }
            None => false,
        }
    }

    /// Get active session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove expired sessions, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    /// List all session IDs
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    fn ensure_capacity_internal(
        &self,
        sessions: &mut HashMap<String, Arc<Session>>,
    ) -> Result<(), ServerError> {
        let max_sessions = self.limits.read().max_sessions;
        if sessions.len() >= max_sessions {
            self.cleanup_expired_internal(sessions);

            if sessions.len() >= max_sessions {
                return Err(ServerError::SessionLimit);
            }
        }
        Ok(())
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let timeout = self.limits.read().session_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(session) = sessions.remove(id) {
                session.close();
                tracing::info!("Expired session: {}", id);
            }
        }

        if !expired.is_empty() {
            crate::metrics::record_sessions_expired(expired.len());
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_insert_and_get() {
        let manager = SessionManager::new(10);
        let session = manager.insert(ConversationState::new("s1")).unwrap();

        assert!(session.is_active());
        assert!(!session.is_expired(Duration::from_secs(60)));
        assert_eq!(manager.get("s1").unwrap().id, "s1");
        assert_eq!(manager.list(), vec!["s1".to_string()]);
    }

    #[test]
    fn test_session_remove() {
        let manager = SessionManager::new(10);
        let session = manager.insert(ConversationState::new("s1")).unwrap();

        assert!(manager.remove("s1"));
        assert!(!manager.remove("s1"));
        assert!(manager.get("s1").is_none());
        assert!(!session.is_active());
    }

    #[test]
    fn test_session_limit() {
        let manager = SessionManager::new(1);
        manager.insert(ConversationState::new("s1")).unwrap();

        assert!(matches!(manager.ensure_capacity(), Err(ServerError::SessionLimit)));
        assert!(matches!(
            manager.insert(ConversationState::new("s2")),
            Err(ServerError::SessionLimit)
        ));
    }

    #[test]
    fn test_expired_sessions_free_capacity() {
        let manager = SessionManager::with_config(1, Duration::ZERO, Duration::from_secs(60));
        manager.insert(ConversationState::new("old")).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        manager.insert(ConversationState::new("new")).unwrap();
        assert!(manager.get("old").is_none());
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_limits_can_change() {
        let manager = SessionManager::new(1);
        manager.insert(ConversationState::new("s1")).unwrap();
        assert!(manager.ensure_capacity().is_err());

        manager.set_limits(SessionLimits {
            max_sessions: 2,
            session_timeout: Duration::from_secs(60),
        });
        assert_eq!(manager.limits().max_sessions, 2);
        manager.insert(ConversationState::new("s2")).unwrap();

        manager.set_limits(SessionLimits {
            max_sessions: 1,
            session_timeout: Duration::from_secs(60),
        });
        assert_eq!(manager.count(), 2);
        assert!(matches!(manager.ensure_capacity(), Err(ServerError::SessionLimit)));
    }

    #[tokio::test]
    async fn test_turn_outlives_session_borrow() {
        let manager = SessionManager::new(10);
        let session = manager.insert(ConversationState::new("s1")).unwrap();

        let mut guard = session.begin_turn().unwrap();
        let turn = tokio::spawn(async move {
            guard.record_user_message("Alex").unwrap();
        });
        drop(session);

        turn.await.unwrap();
        let session = manager.get("s1").unwrap();
        assert_eq!(session.conversation().await.user().name(), Some("Alex"));
        assert!(session.begin_turn().is_ok());
    }

    #[tokio::test]
    async fn test_one_turn_at_a_time() {
        let manager = SessionManager::new(10);
        let session = manager.insert(ConversationState::new("s1")).unwrap();

        let guard = session.begin_turn().unwrap();
        assert!(matches!(
            session.begin_turn(),
            Err(ServerError::TurnInProgress(ref id)) if id == "s1"
        ));
        drop(guard);
        assert!(session.begin_turn().is_ok());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let manager = SessionManager::new(10);
        let a = manager.insert(ConversationState::new("a")).unwrap();
        let b = manager.insert(ConversationState::new("b")).unwrap();

        a.conversation().await.record_user_message("Alex").unwrap();

        let _busy = a.begin_turn().unwrap();
        assert!(b.begin_turn().is_ok());
        assert!(b.conversation().await.user().name().is_none());
    }
}
