use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::balancer::{BalancerSettings, SQUAD_SIZE};
use crate::roster::{RatingTable, Roster, DEFAULT_PLAYERS, DEFAULT_RATING};

pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["pelada.toml", "config/pelada.toml"];

/// Upper bound for exhaustive ten-player selection; C(24,10) is already ~2M subsets.
pub const MAX_EXHAUSTIVE_LIMIT: usize = 24;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub roster: RosterConfig,
    pub ratings: RatingsConfig,
    pub balancer: BalancerSettings,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub app_token: SecretString,
    pub bot_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterConfig {
    /// Poll order.
    pub players: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RatingsConfig {
    pub default_rating: f64,
    pub players: BTreeMap<String, f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub slack_app_token: Option<String>,
    pub slack_bot_token: Option<String>,
    pub roster_players: Option<Vec<String>>,
    pub exhaustive_limit: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    /// Skip the slack token checks for tools that never open a socket.
    pub skip_slack_validation: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig { app_token: String::new().into(), bot_token: String::new().into() },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            roster: RosterConfig {
                players: DEFAULT_PLAYERS.iter().map(|(name, _)| (*name).to_string()).collect(),
            },
            ratings: RatingsConfig {
                default_rating: DEFAULT_RATING,
                players: DEFAULT_PLAYERS
                    .iter()
                    .map(|(name, rating)| ((*name).to_string(), *rating))
                    .collect(),
            },
            balancer: BalancerSettings::default(),
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        if options.skip_slack_validation {
            config.validate_game()?;
        } else {
            config.validate()?;
        }

        Ok(config)
    }

    /// Poll roster built from the `roster` section.
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        Roster::new(self.roster.players.iter().cloned())
            .map_err(|error| ConfigError::Validation(format!("roster.players is invalid: {error}")))
    }

    pub fn rating_table(&self) -> RatingTable {
        RatingTable::new(self.ratings.players.clone(), self.ratings.default_rating)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(slack_app_token_value) = slack.app_token {
                self.slack.app_token = secret_value(slack_app_token_value);
            }
            if let Some(slack_bot_token_value) = slack.bot_token {
                self.slack.bot_token = secret_value(slack_bot_token_value);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(roster) = patch.roster {
            if let Some(players) = roster.players {
                self.roster.players = players;
            }
        }

        if let Some(ratings) = patch.ratings {
            if let Some(default_rating) = ratings.default_rating {
                self.ratings.default_rating = default_rating;
            }
            if let Some(players) = ratings.players {
                self.ratings.players = players;
            }
        }

        if let Some(balancer) = patch.balancer {
            if let Some(exhaustive_limit) = balancer.exhaustive_limit {
                self.balancer.exhaustive_limit = exhaustive_limit;
            }
            if let Some(random_samples) = balancer.random_samples {
                self.balancer.random_samples = random_samples;
            }
            if let Some(early_exit_threshold) = balancer.early_exit_threshold {
                self.balancer.early_exit_threshold = early_exit_threshold;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PELADA_SLACK_APP_TOKEN") {
            self.slack.app_token = secret_value(value);
        }
        if let Some(value) = read_env("PELADA_SLACK_BOT_TOKEN") {
            self.slack.bot_token = secret_value(value);
        }

        if let Some(value) = read_env("PELADA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PELADA_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("PELADA_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("PELADA_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("PELADA_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("PELADA_LOGGING_LEVEL").or_else(|| read_env("PELADA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PELADA_LOGGING_FORMAT").or_else(|| read_env("PELADA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("PELADA_ROSTER_PLAYERS") {
            self.roster.players = split_list(&value);
        }
        if let Some(value) = read_env("PELADA_RATINGS_DEFAULT") {
            self.ratings.default_rating = parse_f64("PELADA_RATINGS_DEFAULT", &value)?;
        }

        if let Some(value) = read_env("PELADA_BALANCER_EXHAUSTIVE_LIMIT") {
            self.balancer.exhaustive_limit =
                parse_usize("PELADA_BALANCER_EXHAUSTIVE_LIMIT", &value)?;
        }
        if let Some(value) = read_env("PELADA_BALANCER_RANDOM_SAMPLES") {
            self.balancer.random_samples = parse_usize("PELADA_BALANCER_RANDOM_SAMPLES", &value)?;
        }
        if let Some(value) = read_env("PELADA_BALANCER_EARLY_EXIT_THRESHOLD") {
            self.balancer.early_exit_threshold =
                parse_f64("PELADA_BALANCER_EARLY_EXIT_THRESHOLD", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(slack_app_token) = overrides.slack_app_token {
            self.slack.app_token = secret_value(slack_app_token);
        }
        if let Some(slack_bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = secret_value(slack_bot_token);
        }
        if let Some(players) = overrides.roster_players {
            self.roster.players = players;
        }
        if let Some(exhaustive_limit) = overrides.exhaustive_limit {
            self.balancer.exhaustive_limit = exhaustive_limit;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slack(&self.slack)?;
        self.validate_game()
    }

    /// Everything except the slack tokens.
    pub fn validate_game(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        self.roster()?;
        validate_ratings(&self.ratings)?;
        validate_balancer(&self.balancer)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    let app_token = slack.app_token.expose_secret();
    if app_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.app_token is required. Get it from https://api.slack.com/apps > Your App > Basic Information > App-Level Tokens".to_string()
        ));
    }
    if !app_token.starts_with("xapp-") {
        let hint = if app_token.starts_with("xoxb-") {
            " (hint: you may have used the bot token instead of the app token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.app_token must start with `xapp-`{hint}. Get it from https://api.slack.com/apps"
        )));
    }

    let bot_token = slack.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.bot_token is required. Get it from https://api.slack.com/apps > Your App > OAuth & Permissions > Bot User OAuth Token".to_string()
        ));
    }
    if !bot_token.starts_with("xoxb-") {
        let hint = if bot_token.starts_with("xapp-") {
            " (hint: you may have used the app token instead of the bot token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.bot_token must start with `xoxb-`{hint}. Get it from https://api.slack.com/apps"
        )));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_ratings(ratings: &RatingsConfig) -> Result<(), ConfigError> {
    if !ratings.default_rating.is_finite() || ratings.default_rating < 0.0 {
        return Err(ConfigError::Validation(
            "ratings.default_rating must be a finite, non-negative number".to_string(),
        ));
    }

    if let Some((name, _)) =
        ratings.players.iter().find(|(_, rating)| !rating.is_finite() || **rating < 0.0)
    {
        return Err(ConfigError::Validation(format!(
            "ratings.players.{name} must be a finite, non-negative number"
        )));
    }

    Ok(())
}

fn validate_balancer(balancer: &BalancerSettings) -> Result<(), ConfigError> {
    if !(SQUAD_SIZE..=MAX_EXHAUSTIVE_LIMIT).contains(&balancer.exhaustive_limit) {
        return Err(ConfigError::Validation(format!(
            "balancer.exhaustive_limit must be in range {SQUAD_SIZE}..={MAX_EXHAUSTIVE_LIMIT}"
        )));
    }

    if balancer.random_samples == 0 {
        return Err(ConfigError::Validation(
            "balancer.random_samples must be greater than zero".to_string(),
        ));
    }

    if !balancer.early_exit_threshold.is_finite() || balancer.early_exit_threshold < 0.0 {
        return Err(ConfigError::Validation(
            "balancer.early_exit_threshold must be a finite, non-negative number".to_string(),
        ));
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
    roster: Option<RosterPatch>,
    ratings: Option<RatingsPatch>,
    balancer: Option<BalancerPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    app_token: Option<String>,
    bot_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct RosterPatch {
    players: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RatingsPatch {
    default_rating: Option<f64>,
    players: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct BalancerPatch {
    exhaustive_limit: Option<usize>,
    random_samples: Option<usize>,
    early_exit_threshold: Option<f64>,
}
