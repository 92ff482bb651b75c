//! Metric extraction
//!
//! Scalars are read from standalone `<Metric>: <number>` lines, e.g.
//! `MRays/s: 123`.

// Imports
use {
	crate::{artifact, scan::CYCLE_PATTERN, Error},
	regex::{Regex, RegexBuilder},
	std::path::Path,
};

/// Extracts a single named scalar from logs
#[derive(Clone, Debug)]
pub struct ScalarExtractor {
	/// Metric name
	name: String,

	/// Pattern
	pattern: Regex,
}

impl ScalarExtractor {
	/// Creates an extractor for `name`, matched case-insensitively
	pub fn new(name: &str) -> Result<Self, Error> {
		let pattern = RegexBuilder::new(&format!(
			r"{}:[ \t]*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)",
			regex::escape(name)
		))
		.case_insensitive(true)
		.build()?;

		Ok(Self {
			name: name.to_owned(),
			pattern,
		})
	}

	/// Extracts the metric from a log's text.
	///
	/// When several lines match, the last one wins.
	///
	/// # Errors
	/// Returns [`Error::MetricNotFound`] if no line matches.
	pub fn extract(&self, text: &str) -> Result<f64, Error> {
		text.lines()
			.filter_map(|line| self.pattern.captures(line))
			.filter_map(|captures| captures[1].parse::<f64>().ok())
			.last()
			.ok_or_else(|| Error::MetricNotFound(self.name.clone()))
	}

	/// Extracts the metric from a cached log
	pub fn extract_file(&self, path: &Path) -> Result<f64, Error> {
		let text = artifact::read_log(path)?;
		self.extract(&text)
	}
}

/// Per-cycle series read from `<key>: <value>` lines
#[derive(Clone, Debug, Default)]
#[derive(serde::Serialize)]
pub struct Series {
	/// Key
	pub key: String,

	/// Cycles found
	pub cycles: Vec<u64>,

	/// Samples found
	pub samples: Vec<f64>,
}

impl Series {
	/// Returns if there's a sample for every cycle
	pub fn is_aligned(&self) -> bool {
		self.samples.len() == self.cycles.len()
	}
}

/// Extracts the series of `key` from a log.
///
/// Every line containing `<key>:` contributes its first decimal number.
pub fn extract_series(text: &str, key: &str) -> Result<Series, Error> {
	let cycle = Regex::new(CYCLE_PATTERN)?;
	let decimal = Regex::new(r"\d*\.\d+")?;
	let marker = format!("{key}:");

	let mut series = Series {
		key: key.to_owned(),
		..Series::default()
	};
	for line in text.lines() {
		if let Some(captures) = cycle.captures(line) {
			match captures[1].parse() {
				Ok(cycle) => series.cycles.push(cycle),
				Err(err) => tracing::warn!(?line, ?err, "Ignoring malformed cycle marker"),
			}
		}

		if line.contains(&marker) {
			match decimal.find(line).map(|value| value.as_str().parse()) {
				Some(Ok(value)) => series.samples.push(value),
				Some(Err(err)) => tracing::warn!(?line, ?err, "Ignoring malformed sample"),
				None => tracing::warn!(?line, "Line had no decimal sample"),
			}
		}
	}

	if !series.is_aligned() {
		tracing::debug!(
			key,
			cycles = series.cycles.len(),
			samples = series.samples.len(),
			"Series isn't aligned to cycles"
		);
	}

	Ok(series)
}

#[cfg(test)]
mod tests {
	use super::*;

	const LOG: &str = "\
Cycle: 1024
 DRAM Read:      8.0 bytes/cycle
DRAM Write:      1.5 bytes/cycle
MRays/s: 12

Cycle: 2048
 DRAM Read:     10.5 bytes/cycle
DRAM Write:      2.0 bytes/cycle
  Ray Rate:     33.3 Mrays/s
MRays/s: 14

Frame cycles: 2100
MRays/s: 123
";

	#[test]
	fn last_match_wins() {
		let extractor = ScalarExtractor::new("MRays/s").expect("valid pattern");
		assert_eq!(extractor.extract(LOG).expect("metric present"), 123.0);
	}

	#[test]
	fn match_is_case_insensitive() {
		let extractor = ScalarExtractor::new("mrays/S").expect("valid pattern");
		assert_eq!(extractor.extract("MRays/s: 1.5e2\n").expect("metric present"), 150.0);
	}

	#[test]
	fn missing_metric_is_an_error() {
		let extractor = ScalarExtractor::new("Frame time").expect("valid pattern");
		let err = extractor.extract(LOG).expect_err("metric missing");
		assert!(matches!(err, Error::MetricNotFound(ref name) if name == "Frame time"));

		let err = ScalarExtractor::new("MRays/s")
			.expect("valid pattern")
			.extract("MRays/s: n/a\n")
			.expect_err("non-numeric metric");
		assert!(matches!(err, Error::MetricNotFound(_)));
	}

	#[test]
	fn special_characters_are_literal() {
		let extractor = ScalarExtractor::new("L2$ Hit Rate").expect("valid pattern");
		assert_eq!(extractor.extract("L2$ Hit Rate:     87.5%\n").expect("metric present"), 87.5);
	}

	#[test]
	fn series_follow_cycles() {
		let series = extract_series(LOG, "DRAM Read").expect("valid patterns");
		assert_eq!(series.cycles, [1024, 2048]);
		assert_eq!(series.samples, [8.0, 10.5]);
		assert!(series.is_aligned());

		let series = extract_series(LOG, "L1d$ Read").expect("valid patterns");
		assert!(series.samples.is_empty());
		assert!(!series.is_aligned());
	}
}
