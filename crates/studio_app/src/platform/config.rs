//! Settings from `studio.ron` merged with command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use engine_logging::LogDestination;
use log::LevelFilter;
use serde::Deserialize;
use studio_engine::StreamSettings;

pub const DEFAULT_CONFIG_FILENAME: &str = "studio.ron";
const DEFAULT_LOG_FILENAME: &str = "studio.log";

#[derive(Debug, Parser)]
#[command(
    name = "studio",
    version,
    about = "Generate a newsletter from a search query, streaming each pipeline step"
)]
pub struct Cli {
    /// Query to run. Without one, queries are read from stdin.
    pub query: Option<String>,

    /// Backend base URL.
    #[arg(long, env = "STUDIO_BASE_URL")]
    pub base_url: Option<String>,

    /// Settings file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Directory to write the finished newsletter into.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Add a timestamp to the newsletter filename.
    #[arg(long)]
    pub timestamped: bool,

    /// Keep reading queries from stdin after the first one finishes.
    #[arg(long, short)]
    pub interactive: bool,

    /// Check the backend health endpoint and exit.
    #[arg(long)]
    pub health: bool,

    /// Give up on a stream after this many seconds without data.
    #[arg(long)]
    pub idle_timeout: Option<u64>,

    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    #[arg(long, value_enum)]
    pub log_to: Option<LogTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

/// On-disk settings; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub log_to: Option<LogTarget>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub stream: StreamSettings,
    pub output_dir: Option<PathBuf>,
    pub timestamped: bool,
    pub log_level: LevelFilter,
    pub log_to: LogDestination,
    pub log_file: PathBuf,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Self {
        let defaults = StreamSettings::default();
        let stream = StreamSettings {
            base_url: cli
                .base_url
                .clone()
                .or(file.base_url)
                .unwrap_or(defaults.base_url),
            connect_timeout: file
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            idle_timeout: cli
                .idle_timeout
                .or(file.idle_timeout_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            terminal_events: defaults.terminal_events,
        };

        Self {
            stream,
            output_dir: cli.output.clone().or(file.output_dir),
            timestamped: cli.timestamped,
            log_level: cli.log_level.or(file.log_level).unwrap_or(LogLevel::Warn).into(),
            log_to: cli.log_to.or(file.log_to).unwrap_or(LogTarget::File).into(),
            log_file: file
                .log_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILENAME)),
        }
    }
}

/// Reads `path`. A missing file yields defaults; an unreadable or invalid file
/// is an error, left for the caller to report once logging is up.
pub fn load_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read settings from {path:?}"));
        }
    };
    ron::from_str(&content).with_context(|| format!("failed to parse settings from {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("studio").chain(args.iter().copied()))
    }

    #[test]
    fn cli_overrides_file_settings() {
        let file = FileConfig {
            base_url: Some("http://backend:8000".to_string()),
            idle_timeout_secs: Some(600),
            output_dir: Some(PathBuf::from("from-file")),
            ..FileConfig::default()
        };
        let settings = Settings::resolve(
            &cli(&["--base-url", "http://cli:9000", "--output", "out", "ai news"]),
            file,
        );

        assert_eq!(settings.stream.base_url, "http://cli:9000");
        assert_eq!(settings.stream.idle_timeout, Some(Duration::from_secs(600)));
        assert_eq!(settings.output_dir, Some(PathBuf::from("out")));
        assert_eq!(settings.log_level, LevelFilter::Warn);
    }

    #[test]
    fn zero_idle_timeout_disables_it() {
        let settings = Settings::resolve(&cli(&["--idle-timeout", "0"]), FileConfig::default());
        assert_eq!(settings.stream.idle_timeout, None);
        assert_eq!(settings.stream.base_url, StreamSettings::default().base_url);
    }

    #[test]
    fn ron_file_is_loaded_and_bad_files_are_errors() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("studio.ron");
        fs::write(
            &good,
            r#"(base_url: Some("http://ron:8000"), log_level: Some(debug), connect_timeout_secs: Some(3))"#,
        )
        .unwrap();
        let loaded = load_file_config(&good).unwrap();
        assert_eq!(loaded.base_url.as_deref(), Some("http://ron:8000"));
        assert_eq!(loaded.log_level, Some(LogLevel::Debug));
        assert_eq!(loaded.connect_timeout_secs, Some(3));

        let bad = temp.path().join("bad.ron");
        fs::write(&bad, "(base_url: ").unwrap();
        let err = load_file_config(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse settings"));
        assert_eq!(
            load_file_config(&temp.path().join("missing.ron")).unwrap(),
            FileConfig::default()
        );
    }
}
