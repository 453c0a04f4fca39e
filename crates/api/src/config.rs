use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use domain::services::{PredictionPolicy, ScoringConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub predictions: PredictionSettings,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub match_feed: MatchFeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins; empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_winner_points")]
    pub winner_points: i32,

    #[serde(default = "default_exact_score_bonus")]
    pub exact_score_bonus: i32,

    /// How long a scoring request waits for a concurrent run of the same match.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            winner_points: default_winner_points(),
            exact_score_bonus: default_exact_score_bonus(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl ScoringSettings {
    pub fn rules(&self) -> ScoringConfig {
        ScoringConfig {
            winner_points: self.winner_points,
            exact_score_bonus: self.exact_score_bonus,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionSettings {
    #[serde(default)]
    pub allow_live_edits: bool,
}

impl PredictionSettings {
    pub fn policy(&self) -> PredictionPolicy {
        PredictionPolicy {
            allow_live_edits: self.allow_live_edits,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_match_poll_interval")]
    pub match_poll_interval_secs: u64,

    #[serde(default)]
    pub simulation_enabled: bool,

    #[serde(default = "default_simulation_interval")]
    pub simulation_interval_secs: u64,

    #[serde(default = "default_simulation_winning_score")]
    pub simulation_winning_score: i32,

    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            match_poll_interval_secs: default_match_poll_interval(),
            simulation_enabled: false,
            simulation_interval_secs: default_simulation_interval(),
            simulation_winning_score: default_simulation_winning_score(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

/// Upstream match data service.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchFeedConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_feed_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for MatchFeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            timeout_ms: default_feed_timeout_ms(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_winner_points() -> i32 {
    domain::services::scoring::DEFAULT_WINNER_POINTS
}
fn default_exact_score_bonus() -> i32 {
    domain::services::scoring::DEFAULT_EXACT_SCORE_BONUS
}
fn default_lock_timeout_ms() -> u64 {
    5000
}
fn default_match_poll_interval() -> u64 {
    10
}
fn default_simulation_interval() -> u64 {
    60
}
fn default_simulation_winning_score() -> i32 {
    domain::services::simulation::DEFAULT_WINNING_SCORE
}
fn default_shutdown_timeout() -> u64 {
    10
}
fn default_feed_timeout_ms() -> u64 {
    5000
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PRONO__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PRONO").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on the working directory.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []

            [scoring]
            winner_points = 3
            exact_score_bonus = 2
            lock_timeout_ms = 5000

            [predictions]
            allow_live_edits = false

            [jobs]
            match_poll_interval_secs = 10
            simulation_enabled = false
            simulation_interval_secs = 60
            simulation_winning_score = 10
            shutdown_timeout_secs = 10

            [match_feed]
            enabled = false
            base_url = ""
            timeout_ms = 5000
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Validation is left to the caller so tests can build partial configs.
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PRONO__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.scoring.winner_points < 0 || self.scoring.exact_score_bonus < 0 {
            return Err(ConfigValidationError::InvalidValue(
                "scoring points cannot be negative".to_string(),
            ));
        }

        if self.jobs.simulation_winning_score < 1 {
            return Err(ConfigValidationError::InvalidValue(
                "simulation_winning_score must be at least 1".to_string(),
            ));
        }

        if self.jobs.match_poll_interval_secs == 0 || self.jobs.simulation_interval_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "job intervals must be at least one second".to_string(),
            ));
        }

        if self.match_feed.enabled && self.match_feed.base_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "match_feed.base_url must be set when the match feed is enabled".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
