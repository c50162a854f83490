/*!
 * Configuration types for s3pull
 */

use crate::error::{PullError, Result};
use crate::protocol::s3::{S3Config, DEFAULT_REGION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default size of the bulk download worker pool
pub const DEFAULT_WORKERS: usize = 10;

/// Default number of keys requested per listing page
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Default pause between incremental backups, in seconds
pub const DEFAULT_BACKUP_INTERVAL_SECS: u64 = 3600;

/// Settings shared by every command
///
/// Credentials are deliberately absent; they only ever come from flags or the
/// environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullConfig {
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3-compatible endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Path-style addressing (MinIO, LocalStack)
    #[serde(default)]
    pub force_path_style: bool,

    /// Per-operation SDK timeout
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Bulk download pool size
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Keys requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Interval between incremental backups
    #[serde(default = "default_backup_interval")]
    pub backup_interval_secs: u64,

    /// How the backup interval is measured
    #[serde(default)]
    pub cadence: Cadence,

    /// Draw a progress bar during bulk downloads
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// Diagnostic log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Write JSON logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Force debug logging
    #[serde(default)]
    pub verbose: bool,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            force_path_style: false,
            timeout_seconds: None,
            workers: DEFAULT_WORKERS,
            page_size: DEFAULT_PAGE_SIZE,
            backup_interval_secs: DEFAULT_BACKUP_INTERVAL_SECS,
            cadence: Cadence::default(),
            show_progress: true,
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
        }
    }
}

/// Sleep policy between backup cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Cadence {
    /// Sleep for the time the cycle took plus the interval
    #[default]
    ElapsedPlusInterval,

    /// Start a cycle every interval, measured from cycle start
    FixedRate,
}

impl Cadence {
    /// Time to sleep after a cycle that took `elapsed`
    pub fn sleep_after(&self, elapsed: Duration, interval: Duration) -> Duration {
        match self {
            Cadence::ElapsedPlusInterval => elapsed + interval,
            Cadence::FixedRate => interval.saturating_sub(elapsed),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_backup_interval() -> u64 {
    DEFAULT_BACKUP_INTERVAL_SECS
}

impl PullConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| PullError::local_io(path, e))?;
        let config: PullConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Per-user config file location, e.g. `~/.config/s3pull/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("s3pull").join("config.toml"))
    }

    /// Load `explicit` if given, else the per-user file when it exists, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PullError::Config("workers must be at least 1".to_string()));
        }
        if self.page_size == 0 || self.page_size > i32::MAX as usize {
            return Err(PullError::Config(format!(
                "page_size out of range: {}",
                self.page_size
            )));
        }
        if self.backup_interval_secs == 0 {
            return Err(PullError::Config(
                "backup_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective log level, with `verbose` forcing debug
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }

    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs)
    }

    /// Combine with explicit credentials into an S3 client configuration
    ///
    /// `session_token` is only needed for temporary (STS) credentials; a blank
    /// token counts as none.
    pub fn to_s3_config(
        &self,
        access_key: &str,
        secret_key: &str,
        session_token: Option<&str>,
    ) -> Result<S3Config> {
        if access_key.trim().is_empty() || secret_key.trim().is_empty() {
            return Err(PullError::Config(
                "missing credentials: set --access-key/--secret-key or AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY"
                    .to_string(),
            ));
        }

        let mut s3 = S3Config::new(access_key, secret_key);
        s3.region = self.region.clone();
        s3.endpoint = self.endpoint.clone();
        s3.force_path_style = self.force_path_style;
        s3.timeout_seconds = self.timeout_seconds;
        s3.session_token = session_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        s3.validate()
            .map_err(|e| PullError::Config(e.to_string()))?;
        Ok(s3)
    }
}
