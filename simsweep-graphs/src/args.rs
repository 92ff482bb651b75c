//! Arguments

// Imports
use std::path::PathBuf;

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
	#[clap(name = "bandwidth")]
	Bandwidth(Bandwidth),

	#[clap(name = "bandwidth-compare")]
	BandwidthCompare(BandwidthCompare),

	#[clap(name = "metric")]
	Metric(Metric),
}

/// Plots the bandwidth timelines of a unit
#[derive(Debug, clap::Args)]
pub struct Bandwidth {
	/// Input
	pub input_file: PathBuf,

	/// Unit
	#[clap(long = "unit", default_value = "DRAM")]
	pub unit: String,

	/// Smoothing
	#[clap(flatten)]
	pub smoothing: Smoothing,

	/// Minimum peak bandwidth for a series to be plotted
	#[clap(long = "min-peak", default_value_t = 1.0)]
	pub min_peak: f64,

	/// Output
	#[clap(flatten)]
	pub output: Output,
}

/// Plots the total bandwidth of a unit across multiple logs
#[derive(Debug, clap::Args)]
pub struct BandwidthCompare {
	/// Input files
	#[clap(required = true)]
	pub input_files: Vec<PathBuf>,

	/// Labels for each input file, defaulting to the file names
	#[clap(long = "label")]
	pub labels: Vec<String>,

	/// Unit
	#[clap(long = "unit", default_value = "DRAM")]
	pub unit: String,

	/// Smoothing
	#[clap(flatten)]
	pub smoothing: Smoothing,

	/// Output
	#[clap(flatten)]
	pub output: Output,
}

/// Compares a scalar metric across a cached sweep
#[derive(Debug, clap::Args)]
pub struct Metric {
	/// Sweep file
	#[clap(long = "config")]
	pub config_file: PathBuf,

	/// Metric name
	#[clap(long = "name", default_value = "MRays/s")]
	pub name: String,

	/// Parameter giving one bar per value within each group
	#[clap(long = "group-by")]
	pub group_by: String,

	/// Parameter giving one group per value
	#[clap(long = "across")]
	pub across: String,

	/// Fixes a parameter to a subset of its values, as `key=value[,value...]`
	#[clap(long = "fix")]
	pub fix: Vec<String>,

	/// Output
	#[clap(flatten)]
	pub output: Output,
}

/// Smoothing
#[derive(Debug, clap::Args)]
pub struct Smoothing {
	/// Maximum gaussian kernel size
	#[clap(long = "kernel-size", default_value_t = 31)]
	pub kernel_size: usize,

	/// Gaussian kernel sigma
	#[clap(long = "sigma", default_value_t = 5.0)]
	pub sigma: f64,

	/// Disables smoothing
	#[clap(long = "no-smoothing")]
	pub disabled: bool,
}

/// Output
#[derive(Debug, clap::Args)]
pub struct Output {
	/// Interactive mode
	#[clap(long = "interactive")]
	pub interactive: bool,

	/// Output file
	#[clap(short = 'o', long = "output", group = "output-file")]
	pub file: Option<PathBuf>,

	/// Output file width
	#[clap(long = "output-width", requires = "output-file", default_value_t = 640)]
	pub width: u32,

	/// Output file height
	#[clap(long = "output-height", requires = "output-file", default_value_t = 480)]
	pub height: u32,
}
