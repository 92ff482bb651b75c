//! Sweep files
//!
//! A sweep file is a json document describing what to run and where to
//! cache it. Relative paths are resolved against the file's directory.

// Imports
use {
	crate::{command::FlagStyle, config::ConfigSpace, Error, RunCacheOptions},
	std::{
		fs,
		io,
		num::NonZeroUsize,
		path::{Path, PathBuf},
		time::Duration,
	},
};

/// Sweep file
#[derive(Debug)]
#[derive(serde::Deserialize)]
pub struct SweepFile {
	/// Simulator executable
	pub exe_path: PathBuf,

	/// Directory to cache logs in
	pub output_dir: PathBuf,

	/// Flag style
	#[serde(default)]
	pub flag_style: FlagStyle,

	/// Per-run timeout (in seconds)
	#[serde(default)]
	pub timeout_secs: Option<f64>,

	/// Maximum concurrent runs
	#[serde(default = "default_jobs")]
	pub jobs: NonZeroUsize,

	/// Parameters, validated by [`ConfigSpace::from_json`]
	pub params: serde_json::Value,
}

fn default_jobs() -> NonZeroUsize {
	NonZeroUsize::MIN
}

impl SweepFile {
	/// Loads a sweep file
	///
	/// # Errors
	/// Returns [`Error::InvalidSweepFile`] if the file isn't a valid sweep file.
	pub fn load(path: &Path) -> Result<Self, Error> {
		let file = fs::File::open(path)?;
		let mut sweep = serde_json::from_reader::<_, Self>(io::BufReader::new(file)).map_err(|source| {
			Error::InvalidSweepFile {
				path: path.to_path_buf(),
				source,
			}
		})?;

		if let Some(base_dir) = path.parent() {
			sweep.exe_path = base_dir.join(&sweep.exe_path);
			sweep.output_dir = base_dir.join(&sweep.output_dir);
		}

		Ok(sweep)
	}

	/// Returns the configuration space
	pub fn space(&self) -> Result<ConfigSpace, Error> {
		ConfigSpace::from_json(&self.params)
	}

	/// Returns the run cache options.
	///
	/// Clearing is never read from the file and must be requested explicitly.
	pub fn options(&self, clear: bool) -> Result<RunCacheOptions, Error> {
		let timeout = self
			.timeout_secs
			.map(|secs| Duration::try_from_secs_f64(secs).map_err(|_| Error::InvalidTimeout(secs)))
			.transpose()?;

		Ok(RunCacheOptions {
			clear,
			flag_style: self.flag_style,
			timeout,
			jobs: self.jobs,
		})
	}
}
