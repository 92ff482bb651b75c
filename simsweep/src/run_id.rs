//! Run identifiers
//!
//! A run is identified by the SHA-256 of its configuration, serialized with
//! sorted keys. The serialization matches python's
//! `json.dumps(config, sort_keys=True)`, so caches written by older tooling
//! stay addressable.

// Imports
use {
	crate::{
		config::{Configuration, ParamValue},
		Error,
	},
	sha2::{Digest, Sha256},
	std::fmt,
};

/// Run identifier (lowercase hex SHA-256)
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Debug)]
#[derive(serde::Serialize)]
pub struct RunId(String);

impl RunId {
	/// Derives the identifier of a configuration
	pub fn of(config: &Configuration) -> Result<Self, Error> {
		let canonical = self::canonical_json(config)?;
		let digest = Sha256::digest(canonical.as_bytes());

		Ok(Self(hex::encode(digest)))
	}

	/// Returns the identifier as a string
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns the cached log file name for this run
	#[must_use]
	pub fn file_name(&self) -> String {
		format!("{}.txt", self.0)
	}
}

impl fmt::Display for RunId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Serializes a configuration with sorted keys
pub fn canonical_json(config: &Configuration) -> Result<String, Error> {
	let mut output = String::from("{");
	for (idx, (name, value)) in config.sorted().into_iter().enumerate() {
		if idx != 0 {
			output.push_str(", ");
		}
		self::push_json_str(&mut output, name.as_str())?;
		output.push_str(": ");

		match value {
			ParamValue::Str(value) => self::push_json_str(&mut output, value)?,
			ParamValue::Int(value) => output.push_str(&value.to_string()),
			ParamValue::Float(value) if value.is_finite() => {
				let value = serde_json::to_string(value).map_err(|err| Error::UnserializableConfig(err.to_string()))?;
				output.push_str(&value);
			},
			ParamValue::Float(value) => {
				return Err(Error::UnserializableConfig(format!(
					"parameter {name} has non-finite value {value}"
				)))
			},
		}
	}
	output.push('}');

	Ok(output)
}

/// Pushes a json string literal, escaping all non-ascii characters and `DEL`
fn push_json_str(output: &mut String, value: &str) -> Result<(), Error> {
	let escaped = serde_json::to_string(value).map_err(|err| Error::UnserializableConfig(err.to_string()))?;
	for ch in escaped.chars() {
		match ch.is_ascii() && ch != '\u{7f}' {
			true => output.push(ch),
			false =>
				for unit in ch.encode_utf16(&mut [0; 2]) {
					output.push_str(&format!("\\u{unit:04x}"));
				},
		}
	}

	Ok(())
}
