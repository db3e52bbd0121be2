//! Configuration loading and validation
//!
//! Every option can be given as a flag or an environment variable (a `.env`
//! file is loaded first). [`Settings`] is the raw surface; the typed configs
//! it produces are what the commands run on. Validation happens before any
//! task starts, so a misconfigured process never reaches the poll loop.

use clap::Args;
use reqwest::Url;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use sw_core::{CoreError, Locale, RangeSpec};
use thiserror::Error;
use watcher::{DiffBase, EngineConfig, SheetsAuth};

/// Configuration errors; all of them are fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("set exactly one of GOOGLE_API_KEY or GOOGLE_ACCESS_TOKEN")]
    AmbiguousCredentials,

    #[error("invalid range: {0}")]
    Range(#[from] CoreError),

    #[error("invalid DISCORD_WEBHOOK: {0}")]
    Webhook(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Raw settings as parsed from flags and environment
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Spreadsheet ID (the long token in the sheet URL)
    #[arg(long, env = "SPREADSHEET_ID", global = true)]
    pub spreadsheet_id: Option<String>,

    /// Sheet (tab) to watch; also shown in notifications
    #[arg(long, env = "SHEET_NAME", default_value = "Sheet1", global = true)]
    pub sheet_name: String,

    /// Watched cells in A1 notation; the row span sets the grid size
    #[arg(long, env = "RANGE", default_value = "A1:C100", global = true)]
    pub range: String,

    /// Webhook that receives notifications
    #[arg(long, env = "DISCORD_WEBHOOK", hide_env_values = true, global = true)]
    pub webhook: Option<String>,

    /// Google API key (for link-shared sheets)
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// OAuth access token with the spreadsheets.readonly scope
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub access_token: Option<String>,

    /// Seconds between polls
    #[arg(long, env = "POLL_SECONDS", default_value_t = 2, global = true)]
    pub poll_seconds: u64,

    /// Seconds without further changes before notifying
    #[arg(long, env = "QUIET_SECONDS", default_value_t = 5, global = true)]
    pub quiet_seconds: u64,

    /// Seconds to pause after a failed poll
    #[arg(long, env = "ERROR_BACKOFF_SECONDS", default_value_t = 2, global = true)]
    pub error_backoff_seconds: u64,

    /// Timeout for one fetch from the Sheets API
    #[arg(long, env = "FETCH_TIMEOUT_SECONDS", default_value_t = 30, global = true)]
    pub fetch_timeout_seconds: u64,

    /// Timeout for one webhook post
    #[arg(long, env = "NOTIFY_TIMEOUT_SECONDS", default_value_t = 10, global = true)]
    pub notify_timeout_seconds: u64,

    /// Port for the health endpoint
    #[arg(long, env = "PORT", default_value_t = 10000, global = true)]
    pub port: u16,

    /// Address for the health endpoint
    #[arg(long, env = "BIND_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED), global = true)]
    pub bind: IpAddr,

    /// Notification language: vi or en
    #[arg(long, env = "LOCALE", default_value = "vi", global = true)]
    pub locale: Locale,

    /// Diff a burst against the last transition (last) or the burst start (burst)
    #[arg(long, env = "DIFF_BASE", default_value = "last", global = true)]
    pub diff_base: DiffBase,

    /// Also write daily-rotated logs to this directory
    #[arg(long, env = "LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

/// Everything needed to fetch the watched range
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub spreadsheet_id: String,
    pub auth: SheetsAuth,
    pub range: RangeSpec,
    pub fetch_timeout: Duration,
}

/// Everything needed to run the watcher daemon
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub source: SourceConfig,
    pub webhook_url: String,
    pub notify_timeout: Duration,
    pub engine: EngineConfig,
    pub locale: Locale,
    pub listen: SocketAddr,
}

impl Settings {
    /// Validate the settings needed to read the sheet
    pub fn source_config(&self) -> Result<SourceConfig, ConfigError> {
        let spreadsheet_id = required(&self.spreadsheet_id, "SPREADSHEET_ID")?;

        let auth = match (present(&self.api_key), present(&self.access_token)) {
            (Some(key), None) => SheetsAuth::ApiKey(key.to_string()),
            (None, Some(token)) => SheetsAuth::BearerToken(token.to_string()),
            (None, None) => return Err(ConfigError::Missing("GOOGLE_API_KEY or GOOGLE_ACCESS_TOKEN")),
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousCredentials),
        };

        Ok(SourceConfig {
            spreadsheet_id: spreadsheet_id.to_string(),
            auth,
            range: RangeSpec::parse(&self.sheet_name, &self.range)?,
            fetch_timeout: seconds(self.fetch_timeout_seconds, "FETCH_TIMEOUT_SECONDS")?,
        })
    }

    /// Validate the full daemon configuration
    pub fn watch_config(&self) -> Result<WatchConfig, ConfigError> {
        let source = self.source_config()?;

        let webhook_url = required(&self.webhook, "DISCORD_WEBHOOK")?;
        let parsed = Url::parse(webhook_url).map_err(|e| ConfigError::Webhook(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Webhook(format!("unsupported scheme '{}'", parsed.scheme())));
        }

        let engine = EngineConfig {
            poll_interval: seconds(self.poll_seconds, "POLL_SECONDS")?,
            // Zero is allowed: flush on the first quiet tick
            quiet_period: Duration::from_secs(self.quiet_seconds),
            error_backoff: Duration::from_secs(self.error_backoff_seconds),
            diff_base: self.diff_base,
        };

        Ok(WatchConfig {
            source,
            webhook_url: webhook_url.to_string(),
            notify_timeout: seconds(self.notify_timeout_seconds, "NOTIFY_TIMEOUT_SECONDS")?,
            engine,
            locale: self.locale,
            listen: SocketAddr::new(self.bind, self.port),
        })
    }
}

/// Treat unset and blank values alike
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    present(value).ok_or(ConfigError::Missing(name))
}

fn seconds(value: u64, name: &'static str) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero(name));
    }
    Ok(Duration::from_secs(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Command, CommandFactory, FromArgMatches, Parser};

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    /// The settings command with env lookups removed, so an exported
    /// `.env` cannot leak into the tests
    fn command() -> Command {
        TestCli::command().mut_args(|arg| arg.env(None::<&'static str>))
    }

    fn try_parse(args: &[&str]) -> Result<Settings, clap::Error> {
        let mut argv = vec!["sheetwatch"];
        argv.extend_from_slice(args);
        let matches = command().try_get_matches_from(argv)?;
        Settings::from_arg_matches(&matches)
    }

    fn parse(args: &[&str]) -> Settings {
        try_parse(args).unwrap()
    }

    const BASE: &[&str] = &[
        "--spreadsheet-id",
        "sheet-id",
        "--webhook",
        "https://discord.com/api/webhooks/1/abc",
        "--api-key",
        "key",
    ];

    fn with(extra: &[&str]) -> Settings {
        let mut args = BASE.to_vec();
        args.extend_from_slice(extra);
        parse(&args)
    }

    #[test]
    fn test_defaults() {
        let config = with(&[]).watch_config().unwrap();
        assert_eq!(config.engine.poll_interval, Duration::from_secs(2));
        assert_eq!(config.engine.quiet_period, Duration::from_secs(5));
        assert_eq!(config.engine.diff_base, DiffBase::LastTransition);
        assert_eq!(config.listen.port(), 10000);
        assert_eq!(config.source.range.qualified(), "Sheet1!A1:C100");
        assert_eq!(config.source.range.expected_rows(), 100);
        assert_eq!(config.locale, Locale::Vi);
        assert!(matches!(config.source.auth, SheetsAuth::ApiKey(ref k) if k == "key"));
    }

    #[test]
    fn test_overrides() {
        let config = with(&[
            "--sheet-name",
            "Orders",
            "--range",
            "A2:C51",
            "--poll-seconds",
            "10",
            "--quiet-seconds",
            "30",
            "--port",
            "8080",
            "--locale",
            "en",
            "--diff-base",
            "burst",
        ])
        .watch_config()
        .unwrap();

        assert_eq!(config.source.range.qualified(), "Orders!A2:C51");
        assert_eq!(config.source.range.expected_rows(), 50);
        assert_eq!(config.engine.poll_interval, Duration::from_secs(10));
        assert_eq!(config.engine.quiet_period, Duration::from_secs(30));
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.engine.diff_base, DiffBase::BurstStart);
    }

    #[test]
    fn test_missing_required_settings() {
        let settings = parse(&["--webhook", "https://example.com/hook", "--api-key", "k"]);
        assert!(matches!(
            settings.watch_config(),
            Err(ConfigError::Missing("SPREADSHEET_ID"))
        ));

        let settings = parse(&["--spreadsheet-id", "id", "--api-key", "k"]);
        assert!(matches!(
            settings.watch_config(),
            Err(ConfigError::Missing("DISCORD_WEBHOOK"))
        ));
        // Reading the sheet alone does not need a webhook
        assert!(settings.source_config().is_ok());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let settings = parse(&["--spreadsheet-id", "  ", "--api-key", "k"]);
        assert!(matches!(
            settings.source_config(),
            Err(ConfigError::Missing("SPREADSHEET_ID"))
        ));
    }

    #[test]
    fn test_credentials_must_be_exactly_one() {
        let settings = parse(&["--spreadsheet-id", "id"]);
        assert!(matches!(settings.source_config(), Err(ConfigError::Missing(_))));

        let settings = with(&["--access-token", "tok"]);
        assert!(matches!(
            settings.source_config(),
            Err(ConfigError::AmbiguousCredentials)
        ));

        let settings = parse(&["--spreadsheet-id", "id", "--access-token", "tok"]);
        let config = settings.source_config().unwrap();
        assert!(matches!(config.auth, SheetsAuth::BearerToken(_)));
    }

    #[test]
    fn test_invalid_webhook_rejected() {
        let mut settings = with(&[]);
        settings.webhook = Some("not a url".into());
        assert!(matches!(settings.watch_config(), Err(ConfigError::Webhook(_))));

        settings.webhook = Some("mailto:ops@example.com".into());
        assert!(matches!(settings.watch_config(), Err(ConfigError::Webhook(_))));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let settings = with(&["--poll-seconds", "0"]);
        assert!(matches!(
            settings.watch_config(),
            Err(ConfigError::Zero("POLL_SECONDS"))
        ));

        let settings = with(&["--quiet-seconds", "0"]);
        assert_eq!(settings.watch_config().unwrap().engine.quiet_period, Duration::ZERO);
    }

    #[test]
    fn test_empty_range_rejected() {
        let settings = with(&["--range", " "]);
        assert!(matches!(
            settings.source_config(),
            Err(ConfigError::Range(CoreError::EmptyRange))
        ));
    }

    #[test]
    fn test_oversized_range_rejected() {
        let settings = with(&["--range", "A1:C4000000000"]);
        assert!(matches!(
            settings.source_config(),
            Err(ConfigError::Range(CoreError::RangeTooLarge { .. }))
        ));
    }

    #[test]
    fn test_env_is_ignored_by_test_command() {
        let names: Vec<_> = command()
            .get_arguments()
            .filter_map(|arg| arg.get_env().map(|e| e.to_os_string()))
            .collect();
        assert!(names.is_empty(), "{names:?}");

        // The real surface still reads the environment
        let spreadsheet_id = TestCli::command()
            .get_arguments()
            .find(|arg| arg.get_id().as_str() == "spreadsheet_id")
            .and_then(|arg| arg.get_env().map(|e| e.to_os_string()));
        assert_eq!(spreadsheet_id.as_deref(), Some(std::ffi::OsStr::new("SPREADSHEET_ID")));
    }

    #[test]
    fn test_bad_locale_is_a_parse_error() {
        let mut argv = vec!["--locale", "fr"];
        argv.extend_from_slice(BASE);
        assert!(try_parse(&argv).is_err());
    }
}
