//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::MetricKind;

/// vio-align - time sync and rigid alignment of VIO recordings against a tracker
#[derive(Parser, Debug)]
#[command(
    name = "vio-align",
    author,
    version,
    about = "Align VIO device trajectories to a motion-tracker recording",
    long_about = "Finds the time offset between a VIO device recording and a motion-tracker \n\
                  recording, recovers the rigid transform between their frames, and exports \n\
                  the device trajectory expressed in tracker time and space."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "VIO_ALIGN_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "VIO_ALIGN_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the sync offset and export aligned trajectories
    Align(AlignArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Summarize the recordings named by a plan
    Info(InfoArgs),
}

/// Inputs and search settings, from a config file and/or flags
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "VIO_ALIGN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tracker (ground-truth) pose log
    #[arg(long, env = "VIO_ALIGN_TRACKER")]
    pub tracker: Option<PathBuf>,

    /// Device pose log to align; repeat for several devices
    #[arg(long = "device", value_name = "PATH")]
    pub devices: Vec<PathBuf>,

    /// Device records carry a 3x4 pose matrix under this key
    #[arg(long, env = "VIO_ALIGN_POSE_FIELD")]
    pub pose_field: Option<String>,

    /// Tracker records carry a 3x4 pose matrix under this key
    #[arg(long, env = "VIO_ALIGN_TRACKER_POSE_FIELD")]
    pub tracker_pose_field: Option<String>,

    /// Alignment quality metric
    #[arg(long, value_enum, env = "VIO_ALIGN_METRIC")]
    pub metric: Option<MetricArg>,

    /// Number of offset candidates to evaluate
    #[arg(long, env = "VIO_ALIGN_CANDIDATES")]
    pub candidates: Option<usize>,

    /// Evaluate offset candidates on all cores
    #[arg(long, env = "VIO_ALIGN_PARALLEL")]
    pub parallel: bool,
}

/// Arguments for the `align` command
#[derive(Parser, Debug, Clone)]
pub struct AlignArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Write `<device>.aligned.jsonl` for every device into this directory
    #[arg(long, env = "VIO_ALIGN_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write a JSON report of all alignments to this path
    #[arg(long, env = "VIO_ALIGN_REPORT")]
    pub report: Option<PathBuf>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "VIO_ALIGN_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "align.toml", env = "VIO_ALIGN_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Also read every pose log and summarize it
    #[arg(long)]
    pub streams: bool,
}

/// Alignment metric as spelled on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricArg {
    /// Position residual after rigid fit (lower is better)
    PositionError,
    /// Angular-speed cosine similarity (higher is better)
    RotationCorrelation,
    /// Variance of relative orientation angle (lower is better)
    OrientationVariance,
}

impl From<MetricArg> for MetricKind {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::PositionError => Self::PositionError,
            MetricArg::RotationCorrelation => Self::RotationCorrelation,
            MetricArg::OrientationVariance => Self::OrientationVariance,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
