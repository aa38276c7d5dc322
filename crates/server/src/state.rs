//! Application State
//!
//! Shared state across all handlers.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tutor_agent::DialogueOrchestrator;
use tutor_config::{load_settings_from, ConfigError, Settings};

use crate::session::{SessionLimits, SessionManager};

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration, reloadable at runtime
    pub config: Arc<RwLock<Settings>>,
    /// Session manager
    pub sessions: Arc<SessionManager>,
    /// Turn runner shared by every session
    pub orchestrator: Arc<DialogueOrchestrator>,
    /// Environment name for config reload
    env: Option<String>,
    /// Directory reloads read from
    config_dir: PathBuf,
}

impl AppState {
    /// Session limits come from `server` settings
    pub fn new(config: Settings, orchestrator: Arc<DialogueOrchestrator>) -> Self {
        let sessions = SessionManager::with_config(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_timeout_seconds),
            Duration::from_secs(config.server.cleanup_interval_seconds),
        );

        Self {
            config: Arc::new(RwLock::new(config)),
            sessions: Arc::new(sessions),
            orchestrator,
            env: None,
            config_dir: PathBuf::from("config"),
        }
    }

    /// Remember the environment name so reloads read the same overlay
    pub fn with_env(mut self, env: Option<String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Reload configuration from files
    ///
    /// Applies the session cap, session idle timeout and readiness timeout.
    /// Persona, backends, CORS, the request timeout and the cleanup interval
    /// are fixed at startup.
    pub fn reload_config(&self) -> Result<(), ConfigError> {
        let new_config = load_settings_from(&self.config_dir, self.env.as_deref())?;

        self.sessions.set_limits(SessionLimits {
            max_sessions: new_config.server.max_sessions,
            session_timeout: Duration::from_secs(new_config.server.session_timeout_seconds),
        });
        *self.config.write() = new_config;

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
