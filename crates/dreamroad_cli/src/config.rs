//! Runtime configuration resolved from flags, environment and defaults.

use crate::cli::Cli;
use crate::error::CliError;
use dreamroad_core::{default_log_level, LogLevel};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "dreamroad.sqlite3";
pub const DEFAULT_API_URL: &str = "https://road-to-your-dream-app-imtd.onrender.com";
pub const DEFAULT_ADVICE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub api_url: String,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub log_level: LogLevel,
    pub advice_timeout: Duration,
}

impl CliConfig {
    /// Fills unset values with defaults. Environment fallbacks are already
    /// applied by clap.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let log_level = match cli.log_level.as_deref() {
            Some(level) => level.parse::<LogLevel>()?,
            None => default_log_level(),
        };
        let api_url = cli
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            db_path: cli
                .db
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            api_url,
            log_dir: cli.log_dir.clone(),
            log_level,
            advice_timeout: Duration::from_secs(
                cli.timeout_secs.unwrap_or(DEFAULT_ADVICE_TIMEOUT_SECS),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CliConfig, DEFAULT_ADVICE_TIMEOUT_SECS, DEFAULT_API_URL};
    use crate::cli::Cli;
    use clap::Parser;
    use dreamroad_core::LogLevel;
    use std::time::Duration;

    #[test]
    fn explicit_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "dreamroad",
            "--db",
            "/tmp/custom.sqlite3",
            "--api-url",
            "http://localhost:8000/",
            "--log-level",
            "WARN",
            "--timeout-secs",
            "5",
            "maps",
        ])
        .unwrap();
        let config = CliConfig::from_cli(&cli).unwrap();

        assert_eq!(config.db_path.to_str(), Some("/tmp/custom.sqlite3"));
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.advice_timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_api_url_falls_back_to_default() {
        let cli = Cli::try_parse_from(["dreamroad", "--api-url", " ", "maps"]).unwrap();
        let config = CliConfig::from_cli(&cli).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(
            config.advice_timeout,
            Duration::from_secs(DEFAULT_ADVICE_TIMEOUT_SECS)
        );
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let cli = Cli::try_parse_from(["dreamroad", "--log-level", "loud", "maps"]).unwrap();
        assert!(CliConfig::from_cli(&cli).is_err());
    }
}
