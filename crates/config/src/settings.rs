//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use tutor_core::AudioFormat;

use crate::{ConfigError, PersonaConfig};

/// Prefix for environment overrides, e.g. `CAFE_TUTOR__SERVER__PORT`
const ENV_PREFIX: &str = "CAFE_TUTOR";

/// Conventional variable holding the API credential
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted API connection shared by completion and synthesis
    #[serde(default)]
    pub openai: ApiConfig,

    /// Chat completion parameters
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Speech synthesis parameters
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Startup checks
    #[serde(default)]
    pub startup: StartupConfig,

    /// Tutor persona and fixed texts
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill `openai.api_key` from `OPENAI_API_KEY` when not configured
    pub fn apply_credential_fallback(&mut self) {
        if self.openai.credential().is_none() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                if !key.trim().is_empty() {
                    tracing::debug!("Using API credential from {}", API_KEY_ENV);
                    self.openai.api_key = Some(key);
                }
            }
        }
    }

    /// Validate settings
    ///
    /// A missing credential is not a validation error; the server reports it
    /// as a startup failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_api()?;
        self.validate_completion()?;
        self.validate_speech()?;
        self.validate_startup()?;
        self.validate_persona()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_sessions".to_string(),
                message: "Max sessions must be at least 1".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if server.cleanup_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.cleanup_interval_seconds".to_string(),
                message: "Cleanup interval must be at least 1 second".to_string(),
            });
        }

        // A turn makes one completion call then one synthesis call
        let turn_budget = self.openai.timeout_seconds.saturating_mul(2);
        if server.timeout_seconds <= turn_budget {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: format!(
                    "Must exceed two backend calls ({}s with openai.timeout_seconds = {})",
                    turn_budget, self.openai.timeout_seconds
                ),
            });
        }

        if server.readiness_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.readiness_timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if server.session_timeout_seconds < server.cleanup_interval_seconds {
            return Err(ConfigError::InvalidValue {
                field: "server.session_timeout_seconds".to_string(),
                message: format!(
                    "Must not be shorter than the cleanup interval ({}s)",
                    server.cleanup_interval_seconds
                ),
            });
        }

        Ok(())
    }

    fn validate_api(&self) -> Result<(), ConfigError> {
        let endpoint = &self.openai.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "openai.endpoint".to_string(),
                message: format!("Must be an http(s) URL, got '{}'", endpoint),
            });
        }

        if self.openai.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "openai.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    fn validate_completion(&self) -> Result<(), ConfigError> {
        let completion = &self.completion;

        if completion.model.trim().is_empty() {
            return Err(ConfigError::MissingField("completion.model".to_string()));
        }

        if let Some(temperature) = completion.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidValue {
                    field: "completion.temperature".to_string(),
                    message: format!("Must be between 0.0 and 2.0, got {}", temperature),
                });
            }
        }

        if completion.max_tokens == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "completion.max_tokens".to_string(),
                message: "Must be at least 1 when set".to_string(),
            });
        }

        Ok(())
    }

    fn validate_speech(&self) -> Result<(), ConfigError> {
        let speech = &self.speech;

        if speech.model.trim().is_empty() {
            return Err(ConfigError::MissingField("speech.model".to_string()));
        }

        if speech.voice.trim().is_empty() {
            return Err(ConfigError::MissingField("speech.voice".to_string()));
        }

        if let Some(speed) = speech.speed {
            if !(0.25..=4.0).contains(&speed) {
                return Err(ConfigError::InvalidValue {
                    field: "speech.speed".to_string(),
                    message: format!("Must be between 0.25 and 4.0, got {}", speed),
                });
            }
        }

        Ok(())
    }

    fn validate_startup(&self) -> Result<(), ConfigError> {
        if self.environment.is_strict() && !self.startup.probe_enabled {
            return Err(ConfigError::InvalidValue {
                field: "startup.probe_enabled".to_string(),
                message: format!(
                    "Connectivity probe cannot be disabled in {:?}",
                    self.environment
                ),
            });
        }

        if self.startup.probe_max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "startup.probe_max_tokens".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_persona(&self) -> Result<(), ConfigError> {
        if self.persona.system_prompt.trim().is_empty() {
            return Err(ConfigError::MissingField("persona.system_prompt".to_string()));
        }

        if self.persona.greeting.trim().is_empty() {
            return Err(ConfigError::MissingField("persona.greeting".to_string()));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// How long /ready waits for the completion backend
    #[serde(default = "default_readiness_timeout")]
    pub readiness_timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum concurrent sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time after which a session expires
    #[serde(default = "default_session_timeout")]
    pub session_timeout_seconds: u64,

    /// How often expired sessions are swept
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    90
}
fn default_readiness_timeout() -> u64 {
    2
}
fn default_true() -> bool {
    true
}
fn default_max_sessions() -> usize {
    100
}
fn default_session_timeout() -> u64 {
    3600
}
fn default_cleanup_interval() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            readiness_timeout_seconds: default_readiness_timeout(),
            cors_enabled: default_true(),
            // Empty by default; localhost:3000 is allowed when nothing is configured
            cors_origins: Vec::new(),
            max_sessions: default_max_sessions(),
            session_timeout_seconds: default_session_timeout(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

/// Hosted API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. https://api.openai.com/v1
    #[serde(default = "default_api_endpoint")]
    pub endpoint: String,

    /// Secret credential
    #[serde(default)]
    pub api_key: Option<String>,

    /// Organization ID
    #[serde(default)]
    pub organization: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_api_endpoint(),
            api_key: None,
            organization: None,
            timeout_seconds: default_api_timeout(),
        }
    }
}

impl ApiConfig {
    /// The credential, if present and not blank
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Chat completion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Provider default when unset
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Provider default when unset
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_completion_model() -> String {
    "gpt-3.5-turbo".to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Speech synthesis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_model")]
    pub model: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default)]
    pub format: AudioFormat,

    #[serde(default)]
    pub speed: Option<f32>,
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}
fn default_voice() -> String {
    "nova".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model: default_speech_model(),
            voice: default_voice(),
            format: AudioFormat::Mp3,
            speed: None,
        }
    }
}

/// Startup checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    /// Send a tiny completion request before serving
    #[serde(default = "default_true")]
    pub probe_enabled: bool,

    #[serde(default = "default_probe_prompt")]
    pub probe_prompt: String,

    #[serde(default = "default_probe_max_tokens")]
    pub probe_max_tokens: u32,
}

fn default_probe_prompt() -> String {
    "test".to_string()
}
fn default_probe_max_tokens() -> u32 {
    5
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            probe_enabled: default_true(),
            probe_prompt: default_probe_prompt(),
            probe_max_tokens: default_probe_max_tokens(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable the Prometheus endpoint
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` relative to the working directory
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from files in `dir` and the environment
///
/// Priority: env vars > `{dir}/{env}.*` > `{dir}/default.*` > defaults
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    settings.apply_credential_fallback();
    settings.persona.load_prompt_file()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.completion.model, "gpt-3.5-turbo");
        assert_eq!(settings.speech.model, "tts-1");
        assert_eq!(settings.speech.voice, "nova");
        assert_eq!(settings.speech.format, AudioFormat::Mp3);
        assert_eq!(settings.startup.probe_prompt, "test");
        assert_eq!(settings.startup.probe_max_tokens, 5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_credential_blank_is_none() {
        let mut api = ApiConfig::default();
        assert!(api.credential().is_none());

        api.api_key = Some("   ".to_string());
        assert!(api.credential().is_none());

        api.api_key = Some(" sk-test ".to_string());
        assert_eq!(api.credential(), Some("sk-test"));
    }

    #[test]
    fn test_server_validation() {
        let mut settings = Settings::default();

        settings.server.port = 0;
        assert!(settings.validate_server().is_err());
        settings.server.port = 8080;

        settings.server.max_sessions = 0;
        assert!(settings.validate_server().is_err());
        settings.server.max_sessions = 10;

        settings.server.session_timeout_seconds = 10;
        settings.server.cleanup_interval_seconds = 60;
        assert!(settings.validate_server().is_err());

        settings.server.session_timeout_seconds = 600;
        assert!(settings.validate_server().is_ok());

        settings.server.readiness_timeout_seconds = 0;
        assert!(settings.validate_server().is_err());
    }

    #[test]
    fn test_request_timeout_covers_both_backend_calls() {
        let mut settings = Settings::default();
        settings.openai.timeout_seconds = 30;

        settings.server.timeout_seconds = 60;
        match settings.validate_server() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "server.timeout_seconds")
            }
            other => panic!("expected invalid timeout, got {:?}", other),
        }

        settings.server.timeout_seconds = 61;
        assert!(settings.validate_server().is_ok());

        settings.openai.timeout_seconds = 45;
        assert!(settings.validate_server().is_err());
    }

    #[test]
    fn test_api_validation() {
        let mut settings = Settings::default();
        settings.openai.endpoint = "api.openai.com".to_string();
        assert!(settings.validate_api().is_err());

        settings.openai.endpoint = "http://localhost:8000/v1".to_string();
        assert!(settings.validate_api().is_ok());
    }

    #[test]
    fn test_completion_validation() {
        let mut settings = Settings::default();

        settings.completion.temperature = Some(2.5);
        assert!(settings.validate_completion().is_err());
        settings.completion.temperature = Some(0.7);

        settings.completion.max_tokens = Some(0);
        assert!(settings.validate_completion().is_err());
        settings.completion.max_tokens = Some(256);

        settings.completion.model = " ".to_string();
        assert!(matches!(
            settings.validate_completion(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_speech_validation() {
        let mut settings = Settings::default();
        settings.speech.speed = Some(5.0);
        assert!(settings.validate_speech().is_err());

        settings.speech.speed = Some(1.25);
        assert!(settings.validate_speech().is_ok());

        settings.speech.voice.clear();
        assert!(settings.validate_speech().is_err());
    }

    #[test]
    fn test_probe_required_in_production() {
        let mut settings = Settings::default();
        settings.startup.probe_enabled = false;
        assert!(settings.validate_startup().is_ok());

        settings.environment = RuntimeEnvironment::Production;
        assert!(settings.validate_startup().is_err());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            r#"
[server]
port = 9100
max_sessions = 5

[speech]
voice = "shimmer"
format = "opus"

[persona]
tutor_name = "Mei"
"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            r#"
[server]
port = 9200
"#,
        )
        .unwrap();

        let settings = load_settings_from(dir.path(), None).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.max_sessions, 5);
        assert_eq!(settings.speech.voice, "shimmer");
        assert_eq!(settings.speech.format, AudioFormat::Opus);
        assert_eq!(settings.persona.tutor_name, "Mei");
        assert_eq!(settings.completion.model, "gpt-3.5-turbo");

        let staged = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(staged.server.port, 9200);
        assert_eq!(staged.server.max_sessions, 5);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            r#"
[completion]
temperature = 9.0
"#,
        )
        .unwrap();

        assert!(matches!(
            load_settings_from(dir.path(), None),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
