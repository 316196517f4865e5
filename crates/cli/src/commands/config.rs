use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pelada_core::config::{AppConfig, DEFAULT_CONFIG_PATHS};
use secrecy::ExposeSecret;
use toml::Value;

use super::{load_offline_config, CommandResult, EXIT_CONFIG, EXIT_OK};

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match load_offline_config() {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::text(EXIT_CONFIG, format!("config validation failed: {error}"))
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    CommandResult::text(EXIT_OK, lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let rated = config.ratings.players.len();
    vec![
        Field {
            key: "slack.app_token",
            value: redact_token(config.slack.app_token.expose_secret()),
            env_keys: &["PELADA_SLACK_APP_TOKEN"],
        },
        Field {
            key: "slack.bot_token",
            value: redact_token(config.slack.bot_token.expose_secret()),
            env_keys: &["PELADA_SLACK_BOT_TOKEN"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["PELADA_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.health_check_port",
            value: config.server.health_check_port.to_string(),
            env_keys: &["PELADA_SERVER_HEALTH_CHECK_PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["PELADA_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["PELADA_LOGGING_LEVEL", "PELADA_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: config.logging.format.as_str().to_string(),
            env_keys: &["PELADA_LOGGING_FORMAT", "PELADA_LOG_FORMAT"],
        },
        Field {
            key: "roster.players",
            value: config.roster.players.join(", "),
            env_keys: &["PELADA_ROSTER_PLAYERS"],
        },
        Field {
            key: "ratings.default_rating",
            value: config.ratings.default_rating.to_string(),
            env_keys: &["PELADA_RATINGS_DEFAULT"],
        },
        Field {
            key: "ratings.players",
            value: format!("{rated} rated players"),
            env_keys: &[],
        },
        Field {
            key: "balancer.exhaustive_limit",
            value: config.balancer.exhaustive_limit.to_string(),
            env_keys: &["PELADA_BALANCER_EXHAUSTIVE_LIMIT"],
        },
        Field {
            key: "balancer.random_samples",
            value: config.balancer.random_samples.to_string(),
            env_keys: &["PELADA_BALANCER_RANDOM_SAMPLES"],
        },
        Field {
            key: "balancer.early_exit_threshold",
            value: config.balancer.early_exit_threshold.to_string(),
            env_keys: &["PELADA_BALANCER_EARLY_EXIT_THRESHOLD"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
