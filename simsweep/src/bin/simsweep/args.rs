//! Arguments

// Imports
use {
	simsweep::FlagStyle,
	std::{num::NonZeroUsize, path::PathBuf},
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Sub-command
	#[command(subcommand)]
	pub sub_cmd: SubCmd,
}

/// Sub-command
#[derive(Debug, clap::Subcommand)]
pub enum SubCmd {
	#[clap(name = "run")]
	Run(Run),

	#[clap(name = "list")]
	List(List),

	#[clap(name = "hash")]
	Hash(Hash),

	#[clap(name = "bandwidth")]
	Bandwidth(Bandwidth),

	#[clap(name = "metric")]
	Metric(Metric),

	#[clap(name = "series")]
	Series(Series),
}

/// Runs every configuration of a sweep, caching their logs
#[derive(Debug, clap::Args)]
pub struct Run {
	/// Sweep file
	#[clap(long = "config")]
	pub config_file: PathBuf,

	/// Deletes the output directory before running
	#[clap(long = "clear")]
	pub clear: bool,

	/// Overrides the maximum concurrent runs
	#[clap(long = "jobs")]
	pub jobs: Option<NonZeroUsize>,

	/// Overrides the per-run timeout (in seconds)
	#[clap(long = "timeout-secs")]
	pub timeout_secs: Option<f64>,

	/// Overrides the simulator flag style
	#[clap(long = "flag-style")]
	pub flag_style: Option<FlagStyle>,
}

/// Lists every configuration of a sweep with its cached log
#[derive(Debug, clap::Args)]
pub struct List {
	/// Sweep file
	#[clap(long = "config")]
	pub config_file: PathBuf,
}

/// Prints the run identifier of a configuration
#[derive(Debug, clap::Args)]
pub struct Hash {
	/// Parameters, as `key=value`
	#[clap(required = true)]
	pub params: Vec<String>,
}

/// Extracts the bandwidth telemetry of a unit from a log
#[derive(Debug, clap::Args)]
pub struct Bandwidth {
	/// Input
	pub input_file: PathBuf,

	/// Unit
	#[clap(long = "unit", default_value = "DRAM")]
	pub unit: String,
}

/// Extracts a scalar metric from a log
#[derive(Debug, clap::Args)]
pub struct Metric {
	/// Input
	pub input_file: PathBuf,

	/// Metric name
	#[clap(long = "name", default_value = "MRays/s")]
	pub name: String,
}

/// Extracts a per-cycle series from a log
#[derive(Debug, clap::Args)]
pub struct Series {
	/// Input
	pub input_file: PathBuf,

	/// Series key
	#[clap(long = "key")]
	pub key: String,
}
