//! Log level and format resolution.
//!
//! `HC_LOG` names a level for hc-core alone; without it the most verbose level
//! mentioned in `RUST_LOG` is used. `HC_LOG_FORMAT` picks human or JSONL
//! output and `HC_LOG_TIMESTAMPS=0` drops timestamps from human output. CLI
//! flags win over all of them.

use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Human,
    #[value(alias = "json")]
    Jsonl,
}

/// Verbosity of hc-core events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn parse(text: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(text.trim(), true).ok()
    }

    /// Most verbose level named by a `RUST_LOG`-style directive list.
    fn most_verbose_in(directives: &str) -> Option<Self> {
        directives
            .split(',')
            .filter_map(|directive| Self::parse(directive.rsplit('=').next().unwrap_or(directive)))
            .max()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&LevelFilter::from(*self).to_string().to_lowercase())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// [`LogConfig::from_env`] over an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_level = match lookup("HC_LOG") {
            Some(value) => LogLevel::parse(&value),
            None => lookup("RUST_LOG").and_then(|value| LogLevel::most_verbose_in(&value)),
        };
        let env_format = lookup("HC_LOG_FORMAT")
            .and_then(|value| <LogFormat as ValueEnum>::from_str(value.trim(), true).ok());
        let timestamps = lookup("HC_LOG_TIMESTAMPS")
            .map_or(true, |value| !matches!(value.trim(), "0" | "false" | "off"));

        LogConfig {
            format: cli_format.or(env_format).unwrap_or_default(),
            level: cli_level.or(env_level).unwrap_or_default(),
            timestamps,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}
