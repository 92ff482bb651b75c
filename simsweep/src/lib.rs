//! Simulator sweeps (`simsweep`)
//!
//! Runs a simulator over every configuration of a sweep, caching each run's
//! log under an identifier derived from its configuration, and extracts
//! bandwidth timelines and scalar metrics from those logs.

// Modules
pub mod artifact;
pub mod cache;
pub mod command;
pub mod config;
pub mod error;
pub mod launcher;
pub mod metric;
pub mod run_id;
pub mod scan;
pub mod smooth;
pub mod sweep;

// Exports
pub use self::{
	cache::{RunCache, RunCacheOptions, RunOutcome, RunRecord, SweepReport},
	command::{FlagStyle, Invocation},
	config::{ConfigSpace, Configuration, ParamName, ParamValue},
	error::Error,
	launcher::{Launcher, ProcessLauncher},
	metric::ScalarExtractor,
	run_id::RunId,
	scan::{BandwidthReport, LogSectionScanner, TelemetryKey},
	sweep::SweepFile,
};
