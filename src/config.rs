//! Application-level configuration loading, including the event timing set.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCHDAY_BACK_CONFIG_PATH";

/// Robot-game match length.
const DEFAULT_MATCH_LENGTH_SECONDS: u64 = 150;
/// How long before the end of a match the endgame warning fires.
const DEFAULT_ENDGAME_OFFSET_SECONDS: u64 = 30;
/// Judging session length.
const DEFAULT_SESSION_LENGTH_SECONDS: u64 = 1620;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Duration of a robot-game match, from start to the completion timer.
    pub match_length: Duration,
    /// Offset before match end at which the endgame warning is broadcast.
    pub endgame_offset: Duration,
    /// Duration of a judging session, from start to the completion timer.
    pub session_length: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in timing defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        match_length_s = config.match_length.as_secs(),
                        session_length_s = config.session_length.as_secs(),
                        "loaded event timing from config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            match_length: Duration::from_secs(DEFAULT_MATCH_LENGTH_SECONDS),
            endgame_offset: Duration::from_secs(DEFAULT_ENDGAME_OFFSET_SECONDS),
            session_length: Duration::from_secs(DEFAULT_SESSION_LENGTH_SECONDS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    match_length_seconds: Option<u64>,
    endgame_offset_seconds: Option<u64>,
    session_length_seconds: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            match_length: raw
                .match_length_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.match_length),
            endgame_offset: raw
                .endgame_offset_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.endgame_offset),
            session_length: raw
                .session_length_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_length),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let raw: RawConfig = serde_json::from_str(r#"{"match_length_seconds": 120}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.match_length, Duration::from_secs(120));
        assert_eq!(
            config.endgame_offset,
            Duration::from_secs(DEFAULT_ENDGAME_OFFSET_SECONDS)
        );
        assert_eq!(
            config.session_length,
            Duration::from_secs(DEFAULT_SESSION_LENGTH_SECONDS)
        );
    }
}
