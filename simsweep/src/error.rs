//! Errors

// Imports
use std::{io, path::PathBuf};

/// Error type for sweep setup, caching and log extraction
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Sweep definition was malformed
	#[error("invalid config space at {location}: {reason}")]
	InvalidConfigSpace { location: String, reason: String },

	/// Simulator executable was missing
	#[error("executable {0:?} does not exist")]
	ExecutableNotFound(PathBuf),

	/// Cached log was missing
	#[error("log {0:?} does not exist")]
	LogNotFound(PathBuf),

	/// Scalar metric was absent from a log
	#[error("metric {0:?} not found in log")]
	MetricNotFound(String),

	/// Configuration could not be canonically serialized
	#[error("configuration cannot be serialized: {0}")]
	UnserializableConfig(String),

	/// Sweep file could not be parsed
	#[error("invalid sweep file {path:?}")]
	InvalidSweepFile {
		path:   PathBuf,
		#[source]
		source: serde_json::Error,
	},

	/// Timeout was negative, non-finite or too large
	#[error("invalid timeout of {0}s")]
	InvalidTimeout(f64),

	#[error(transparent)]
	Io(#[from] io::Error),

	#[error(transparent)]
	Regex(#[from] regex::Error),
}

impl Error {
	/// Creates an [`Error::InvalidConfigSpace`]
	pub(crate) fn invalid_space(location: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::InvalidConfigSpace {
			location: location.into(),
			reason:   reason.into(),
		}
	}
}
