//! Cached log artifacts

// Imports
use {
	crate::Error,
	std::{fs, io, path::Path},
};

/// Reads a cached log
///
/// # Errors
/// Returns [`Error::LogNotFound`] if `path` doesn't exist.
pub fn read_log(path: &Path) -> Result<String, Error> {
	match fs::read(path) {
		Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
		Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Error::LogNotFound(path.to_path_buf())),
		Err(err) => Err(err.into()),
	}
}
