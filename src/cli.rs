use crate::admin::{AdminTask, DEFAULT_EXCLUDE_PREFIX, DEFAULT_MAX_EVENTS, TaskParams};
use crate::config::AuditConfig;
use crate::types::{DEFAULT_EXTENSION, ScanRequest};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

/// Recursively scan a directory for text files
#[derive(Parser, Debug)]
#[command(name = "txt-scan", version, about, long_about = None)]
pub struct ScanArgs {
    /// Path to directory to scan
    pub path: PathBuf,

    /// Minimum file size in kilobytes [default: 0]
    #[arg(long, value_name = "KB", value_parser = parse_min_size)]
    pub min_size: Option<f64>,

    /// File extension to look for [default: txt]
    #[arg(long, value_name = "EXT")]
    pub ext: Option<String>,

    /// Config file with KEY=VALUE defaults
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl ScanArgs {
    #[must_use]
    pub fn to_request(&self, config: &AuditConfig) -> ScanRequest {
        let min_size = self.min_size.or(config.min_size_kb).unwrap_or(0.0);
        let ext = self
            .ext
            .as_deref()
            .or(config.extension.as_deref())
            .unwrap_or(DEFAULT_EXTENSION);
        ScanRequest::new(&self.path, min_size).with_extension(ext)
    }
}

/// Windows system analyzer
#[derive(Parser, Debug)]
#[command(name = "win-admin", version, about, long_about = None)]
pub struct AdminArgs {
    /// Task to execute
    #[arg(long, value_enum)]
    pub task: AdminTask,

    /// Services to check (service-status)
    #[arg(long, value_name = "NAME", num_args = 1..)]
    pub watch: Vec<String>,

    /// Start watched services that are stopped (service-status)
    #[arg(long)]
    pub fix: bool,

    /// Only show events from the last N hours (recent-events)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=876_000))]
    pub hours: Option<u32>,

    /// Maximum number of events to show (recent-events) [default: 5]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_events: Option<u32>,

    /// Hide scheduled tasks whose name starts with this prefix [default: \Microsoft]
    #[arg(long, value_name = "PREFIX")]
    pub exclude_prefix: Option<String>,

    /// Config file with KEY=VALUE defaults
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl AdminArgs {
    #[must_use]
    pub fn to_params(&self, config: &AuditConfig) -> TaskParams {
        TaskParams {
            watch: if self.watch.is_empty() {
                config.watch_services.clone()
            } else {
                self.watch.clone()
            },
            fix: self.fix,
            hours: self.hours,
            max_events: self
                .max_events
                .or(config.max_events)
                .unwrap_or(DEFAULT_MAX_EVENTS),
            exclude_prefix: self
                .exclude_prefix
                .clone()
                .or_else(|| config.exclude_prefix.clone())
                .unwrap_or_else(|| DEFAULT_EXCLUDE_PREFIX.to_string()),
        }
    }
}

fn parse_min_size(s: &str) -> Result<f64, String> {
    let kb: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if !kb.is_finite() || kb < 0.0 {
        return Err(format!("`{s}` must be a non-negative number"));
    }
    Ok(kb)
}

/// Sets up `env_logger` on stderr. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
