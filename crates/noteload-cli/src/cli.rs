use clap::{Parser, ValueEnum};
use noteload_config::{ConfigOverrides, Profile};
use noteload_pipeline::RunArgs;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
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

/// How the run summary is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line
    #[default]
    Text,
    /// The summary counters as JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "noteload")]
#[command(about = "noteload - load annotation notes for typed objects from a tab-delimited file")]
#[command(version)]
pub struct Cli {
    /// Database server
    #[arg(short = 'S', long)]
    pub server: String,

    /// Database name (also the SQLite file when no path is configured)
    #[arg(short = 'D', long)]
    pub database: String,

    /// Login user; owns every created record
    #[arg(short = 'U', long)]
    pub user: String,

    /// File holding the database password
    #[arg(short = 'P', long = "password-file")]
    pub password_file: PathBuf,

    /// Processing mode: load, incremental or preview
    #[arg(short = 'M', long)]
    pub mode: String,

    /// Tab-delimited annotation file
    #[arg(short = 'I', long = "input-file")]
    pub input_file: PathBuf,

    /// Object type the notes attach to, e.g. "Allele"
    #[arg(short = 'O', long = "object-type")]
    pub object_type: String,

    /// Note type, e.g. "Molecular"
    #[arg(short = 'T', long = "note-type")]
    pub note_type: String,

    /// Config file path (defaults to $NOTELOAD_CONFIG, then ~/.config/noteload/config.toml)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Defaults bundle (mgi, allele); overrides the config file
    #[arg(long)]
    pub profile: Option<Profile>,

    /// Directory for artifacts and diagnostics; overrides the config file
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Fail the run when any identifier does not resolve
    #[arg(long)]
    pub strict: bool,

    /// Summary output format (text, json)
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(short = 'l', long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Level used when `RUST_LOG` is not set
    pub fn level_filter(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.into(),
            (None, true) => LevelFilter::DEBUG,
            (None, false) => LevelFilter::WARN,
        }
    }

    /// Command-line values that win over the config file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            profile: self.profile,
            output_directory: self.output_dir.clone(),
            strict_identifiers: self.strict.then_some(true),
        }
    }

    /// The run arguments handed to the pipeline
    pub fn run_args(&self) -> RunArgs {
        RunArgs {
            server: self.server.clone(),
            database: self.database.clone(),
            user: self.user.clone(),
            password_file: self.password_file.clone(),
            mode: self.mode.clone(),
            input_file: self.input_file.clone(),
            object_type: self.object_type.clone(),
            note_type: self.note_type.clone(),
        }
    }
}
