/*!
 * s3pull CLI - Command Line Interface
 */

use clap::{Parser, Subcommand, ValueEnum};
use s3pull::{
    cli_style::{self, print_banner, print_error},
    commands::{shell, BackupOptions, Session},
    config::{Cadence, LogLevel, PullConfig},
    error::{PullError, Result, EXIT_PARTIAL, EXIT_SUCCESS},
    logging,
    protocol::s3::S3Config,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::error;

#[derive(Parser)]
#[command(name = "s3pull")]
#[command(version, about = "List S3 buckets and download them, once or as hourly incremental backups", long_about = None)]
struct Cli {
    /// Access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true, global = true)]
    access_key: Option<String>,

    /// Secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true, global = true)]
    secret_key: Option<String>,

    /// Session token for temporary credentials
    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true, global = true)]
    session_token: Option<String>,

    /// AWS region [default: us-east-1]
    #[arg(long, env = "AWS_REGION", global = true)]
    region: Option<String>,

    /// Custom S3-compatible endpoint URL (MinIO, LocalStack, ...)
    #[arg(long, value_name = "URL", global = true)]
    endpoint: Option<String>,

    /// Use path-style addressing
    #[arg(long, global = true)]
    force_path_style: bool,

    /// Bulk download pool size [default: 10]
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write JSON logs to this file instead of stderr
    #[arg(long, value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell (default)
    Shell,

    /// List buckets
    BucketLs,

    /// List the objects in a bucket, optionally only those under a prefix
    ObjectLs {
        bucket: String,
        prefix: Option<String>,
    },

    /// Download a single object
    ObjectDl {
        bucket: String,
        key: String,
        local_file: PathBuf,
    },

    /// Download a bucket into a local directory
    BucketDl {
        bucket: String,
        local_dir: PathBuf,

        /// Only objects modified after this date (yyyy-mm-dd)
        modified_after: Option<String>,

        /// Print only the summary
        #[arg(long)]
        quiet: bool,
    },

    /// Download a bucket, then keep downloading what changed every interval
    BackupBucketHourly {
        bucket: String,
        local_dir: PathBuf,

        /// First cycle only takes objects modified after this date (yyyy-mm-dd)
        since: Option<String>,

        /// Seconds between cycles [default: 3600]
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: Option<u64>,

        /// Measure the interval from cycle start instead of cycle end
        #[arg(long)]
        fixed_rate: bool,

        /// Stop after this many cycles
        #[arg(long)]
        max_cycles: Option<u64>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            error!(category = %e.category(), error = %e, "Command failed");
            print_error(&e.to_string(), hint_for(&e));
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn hint_for(error: &PullError) -> Option<&'static str> {
    match error {
        PullError::Config(msg) if msg.contains("credentials") => {
            Some("pass --access-key and --secret-key, or export AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY")
        }
        PullError::InvalidArgument(msg) if msg.contains("date") => {
            Some("date parameter should be in format 2017-12-31")
        }
        _ => None,
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "s3pull", &mut std::io::stdout());
        return Ok(EXIT_SUCCESS);
    }

    let config = resolve_config(&cli)?;

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let s3 = config.to_s3_config(
        cli.access_key.as_deref().unwrap_or_default(),
        cli.secret_key.as_deref().unwrap_or_default(),
        cli.session_token.as_deref(),
    )?;
    let session = Session::new(s3, config);

    let runtime = tokio::runtime::Runtime::new()?;
    let command = cli.command.unwrap_or(Commands::Shell);
    handle_command(&runtime, &session, command)
}

/// Config file first, then command line flags on top
fn resolve_config(cli: &Cli) -> Result<PullConfig> {
    let mut config = PullConfig::load(cli.config.as_deref())?;

    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if cli.endpoint.is_some() {
        config.endpoint = cli.endpoint.clone();
    }
    if cli.force_path_style {
        config.force_path_style = true;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    config.verbose |= cli.verbose;

    config.validate()?;
    Ok(config)
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    session: &Session<S3Config>,
    command: Commands,
) -> Result<i32> {
    match command {
        Commands::Shell => {
            print_banner();
            let stdin = BufReader::new(tokio::io::stdin());
            runtime.block_on(shell::run_shell(session, stdin))?;
        }
        Commands::BucketLs => {
            runtime.block_on(session.bucket_ls())?;
        }
        Commands::ObjectLs { bucket, prefix } => {
            runtime.block_on(session.object_ls(&bucket, prefix.as_deref()))?;
        }
        Commands::ObjectDl {
            bucket,
            key,
            local_file,
        } => {
            runtime.block_on(session.object_dl(&bucket, &key, &local_file))?;
        }
        Commands::BucketDl {
            bucket,
            local_dir,
            modified_after,
            quiet,
        } => {
            let report = runtime.block_on(session.bucket_dl(
                &bucket,
                &local_dir,
                modified_after.as_deref(),
                quiet,
            ))?;
            if !report.is_success() {
                cli_style::print_warning(&format!(
                    "{} files could not be downloaded",
                    report.files_failed()
                ));
                return Ok(EXIT_PARTIAL);
            }
        }
        Commands::BackupBucketHourly {
            bucket,
            local_dir,
            since,
            interval_secs,
            fixed_rate,
            max_cycles,
        } => {
            let mut options = BackupOptions::from_config(session.config());
            if let Some(secs) = interval_secs {
                options.interval = Duration::from_secs(secs);
            }
            if fixed_rate {
                options.cadence = Cadence::FixedRate;
            }
            options.max_cycles = max_cycles;

            runtime.block_on(session.backup_bucket(
                &bucket,
                &local_dir,
                since.as_deref(),
                &options,
            ))?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_exits_early() {
        assert!(Cli::try_parse_from(["s3pull", "--help"]).is_err());
    }

    #[test]
    fn test_backup_interval_must_be_positive() {
        assert!(Cli::try_parse_from([
            "s3pull",
            "backup-bucket-hourly",
            "bkt",
            "/tmp/out",
            "--interval-secs",
            "0",
            "--fixed-rate",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "s3pull",
            "backup-bucket-hourly",
            "bkt",
            "/tmp/out",
            "2024-01-01",
            "--interval-secs",
            "60",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::BackupBucketHourly {
                interval_secs,
                since,
                fixed_rate,
                ..
            }) => {
                assert_eq!(interval_secs, Some(60));
                assert_eq!(since.as_deref(), Some("2024-01-01"));
                assert!(!fixed_rate);
            }
            _ => panic!("expected backup-bucket-hourly"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "s3pull",
            "bucket-ls",
            "--access-key",
            "ASIA",
            "--secret-key",
            "secret",
            "--session-token",
            "token",
            "--workers",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.session_token.as_deref(), Some("token"));
        assert_eq!(cli.workers, Some(4));
        assert!(matches!(cli.command, Some(Commands::BucketLs)));
    }
}
