//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{endpoints, timeouts};
use crate::{ConfigError, ScoringSettings};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
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
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model backend used for critiques
    #[serde(default)]
    pub llm: LlmSettings,

    /// Speech-to-text and text analysis sidecars
    #[serde(default)]
    pub services: ServiceSettings,

    /// Analyzer weights and thresholds
    #[serde(default)]
    pub scoring: ScoringSettings,

    /// Optional YAML lexicon replacing the built-in word tiers
    #[serde(default)]
    pub lexicon_path: Option<String>,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_services()?;
        self.scoring.validate()?;
        self.validate_lexicon_path()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::invalid("server.port", "Port cannot be 0"));
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "server.timeout_seconds",
                "Timeout must be at least 1 second",
            ));
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;
        if !llm.enabled {
            return Ok(());
        }

        match llm.provider.as_str() {
            "ollama" | "openai" => {},
            other => {
                return Err(ConfigError::invalid(
                    "llm.provider",
                    format!("Unknown provider '{}', expected 'ollama' or 'openai'", other),
                ));
            },
        }

        if llm.model.trim().is_empty() {
            return Err(ConfigError::invalid("llm.model", "Model name must be set"));
        }

        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(ConfigError::invalid(
                "llm.temperature",
                format!("Must be between 0.0 and 2.0, got {}", llm.temperature),
            ));
        }

        if llm.timeout_ms == 0 {
            return Err(ConfigError::invalid("llm.timeout_ms", "Must be at least 1ms"));
        }

        if llm.provider == "openai" && llm.api_key.is_none() {
            if self.environment.is_strict() {
                return Err(ConfigError::invalid(
                    "llm.api_key",
                    "API key must be set for the openai provider",
                ));
            }
            tracing::warn!("llm.provider is openai but no api_key is configured");
        }

        Ok(())
    }

    fn validate_services(&self) -> Result<(), ConfigError> {
        for (field, service) in [
            ("services.stt", &self.services.stt),
            ("services.text_analysis", &self.services.text_analysis),
        ] {
            if !service.enabled {
                continue;
            }
            if !(service.endpoint.starts_with("http://") || service.endpoint.starts_with("https://"))
            {
                return Err(ConfigError::invalid(
                    format!("{}.endpoint", field),
                    format!("Must be an http(s) URL, got '{}'", service.endpoint),
                ));
            }
            if service.timeout_ms == 0 {
                return Err(ConfigError::invalid(
                    format!("{}.timeout_ms", field),
                    "Must be at least 1ms",
                ));
            }
        }
        Ok(())
    }

    /// A missing lexicon file is fatal outside development
    fn validate_lexicon_path(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.lexicon_path else {
            return Ok(());
        };

        if Path::new(path).is_file() {
            return Ok(());
        }

        if self.environment.is_strict() {
            return Err(ConfigError::FileNotFound(path.clone()));
        }
        tracing::warn!(path = %path, "Lexicon file not found, using built-in lexicon");
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Language model backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// When false the analyzers run on local rules only
    pub enabled: bool,
    /// `ollama` or `openai`
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "ollama".to_string(),
            endpoint: endpoints::OLLAMA_DEFAULT.to_string(),
            model: "qwen2.5:3b-instruct-q4_K_M".to_string(),
            api_key: None,
            max_tokens: 512,
            temperature: 0.2,
            timeout_ms: timeouts::LLM_REQUEST_MS,
            max_retries: 2,
            initial_backoff_ms: 100,
        }
    }
}

/// Remote sidecar services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default = "default_stt_endpoint")]
    pub stt: ServiceEndpoint,

    #[serde(default = "default_text_analysis_endpoint")]
    pub text_analysis: ServiceEndpoint,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            stt: default_stt_endpoint(),
            text_analysis: default_text_analysis_endpoint(),
        }
    }
}

fn default_stt_endpoint() -> ServiceEndpoint {
    ServiceEndpoint::new(endpoints::STT_DEFAULT, timeouts::STT_REQUEST_MS)
}

fn default_text_analysis_endpoint() -> ServiceEndpoint {
    ServiceEndpoint::new(
        endpoints::TEXT_ANALYSIS_DEFAULT,
        timeouts::TEXT_ANALYSIS_REQUEST_MS,
    )
}

/// One HTTP sidecar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub endpoint: String,
    #[serde(default = "default_service_timeout")]
    pub timeout_ms: u64,
}

fn default_service_timeout() -> u64 {
    timeouts::TEXT_ANALYSIS_REQUEST_MS
}

impl ServiceEndpoint {
    pub fn new(endpoint: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            enabled: true,
            endpoint: endpoint.into(),
            timeout_ms,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics on /metrics
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

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (TUTOR__ prefix, e.g. `TUTOR__SERVER__PORT`)
/// 2. config/{env}.toml|yaml (if env specified)
/// 3. config/default.toml|yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder =
            builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("TUTOR")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
