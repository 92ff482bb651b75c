//! Log section scanning.
//!
//! Simulator logs interleave periodic `Cycle: <n>` lines with per-unit
//! sections:
//!
//! ```text
//! Cycle: 1024
//! ------------DRAM------------
//! DRAM Total:     12.5 bytes/cycle
//!
//! Bandwidth Utilization Starts:
//! Unit name: DRAM, Request label: Load Ray, Bandwidth Utilization: 12.5 bytes/cycle
//! Bandwidth Utilization Ends.
//! ```
//!
//! Each occurrence of the scanned unit's header opens a new tick. After the
//! last periodic section, the simulator prints one more section holding the
//! whole-run averages, which is reported separately from the timeline.

// Imports
use {
	crate::{artifact, Error},
	regex::Regex,
	std::{
		collections::{BTreeMap, BTreeSet},
		path::Path,
	},
};

/// Cycle marker pattern
pub const CYCLE_PATTERN: &str = r"Cycle:\s*(\d+)";

/// Telemetry key
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Debug)]
#[derive(serde::Serialize)]
pub struct TelemetryKey {
	/// Unit name
	pub unit: String,

	/// Request label
	pub label: String,
}

impl TelemetryKey {
	/// Creates a new key
	pub fn new(unit: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			unit:  unit.into(),
			label: label.into(),
		}
	}
}

/// Scanner state
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ScanState {
	/// Outside of the scanned unit's section
	Idle,

	/// Inside the scanned unit's section
	InSection,

	/// Inside a detail block of the scanned unit's section
	InDetail,
}

/// Event emitted by [`SectionMachine::step`]
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum ScanEvent<'a> {
	/// A cycle marker
	Cycle(u64),

	/// The scanned unit's section header
	SectionOpened,

	/// A detail record within the scanned unit's detail block
	Record {
		unit:      &'a str,
		label:     &'a str,
		bandwidth: f64,
	},
}

/// Line patterns recognized by the scanner
#[derive(Clone, Debug)]
pub struct Markers {
	/// Header of the scanned unit's section
	section_header: Regex,

	/// Header of any section
	any_section_header: Regex,

	/// Section end
	section_end: Regex,

	/// Detail block start
	detail_start: Regex,

	/// Detail block end
	detail_end: Regex,

	/// Detail record
	detail_record: Regex,

	/// Cycle marker
	cycle: Regex,
}

impl Markers {
	/// Creates the markers for the sections of `unit`
	pub fn new(unit: &str) -> Result<Self, Error> {
		Ok(Self {
			section_header:     Regex::new(&format!(r"-+\s*{}\s*-+", regex::escape(unit)))?,
			any_section_header: Regex::new(r"^\s*-{3,}[^-\s][^-]*-{3,}\s*$")?,
			section_end:        Regex::new(r"^=+\s*$")?,
			detail_start:       Regex::new(
				r"^\s*(?:Bandwidth Utilization Starts:|={2,}\s*Detailed Bandwidth Utilization:\s*={2,})\s*$",
			)?,
			detail_end:         Regex::new(r"^\s*(?:Bandwidth Utilization Ends\.|=+)\s*$")?,
			detail_record:      Regex::new(
				r"Unit name:\s*(.*?),\s*Request label:\s*(.*?),\s*Bandwidth Utilization:\s*(\d+(?:\.\d*)?|\.\d+)\s*bytes/cycle",
			)?,
			cycle:              Regex::new(CYCLE_PATTERN)?,
		})
	}
}

/// Line-by-line state machine over a log
#[derive(Debug)]
pub struct SectionMachine<'m> {
	/// Markers
	markers: &'m Markers,

	/// Current state
	state: ScanState,
}

impl<'m> SectionMachine<'m> {
	/// Creates a new machine, starting idle
	#[must_use]
	pub fn new(markers: &'m Markers) -> Self {
		Self {
			markers,
			state: ScanState::Idle,
		}
	}

	/// Returns the current state
	#[must_use]
	pub fn state(&self) -> ScanState {
		self.state
	}

	/// Advances the machine by one line, emitting any events through `on_event`
	pub fn step<'l>(&mut self, line: &'l str, mut on_event: impl FnMut(ScanEvent<'l>)) {
		let markers = self.markers;

		// Note: Cycle markers are independent of the section state
		if let Some(captures) = markers.cycle.captures(line) {
			match captures[1].parse() {
				Ok(cycle) => on_event(ScanEvent::Cycle(cycle)),
				Err(err) => tracing::warn!(?line, ?err, "Ignoring malformed cycle marker"),
			}
		}

		let prev_state = self.state;
		if markers.section_header.is_match(line) {
			self.state = ScanState::InSection;
			on_event(ScanEvent::SectionOpened);
		} else if markers.any_section_header.is_match(line) {
			self.state = ScanState::Idle;
		} else {
			match self.state {
				ScanState::Idle => (),
				ScanState::InSection if markers.detail_start.is_match(line) => self.state = ScanState::InDetail,
				ScanState::InSection if markers.section_end.is_match(line) => self.state = ScanState::Idle,
				ScanState::InSection => (),
				ScanState::InDetail if markers.detail_end.is_match(line) => self.state = ScanState::Idle,
				ScanState::InDetail =>
					if let Some(captures) = markers.detail_record.captures(line) {
						let (Some(unit), Some(label), Some(bandwidth)) = (captures.get(1), captures.get(2), captures.get(3))
						else {
							return;
						};
						match bandwidth.as_str().parse() {
							Ok(bandwidth) => on_event(ScanEvent::Record {
								unit: unit.as_str(),
								label: label.as_str(),
								bandwidth,
							}),
							Err(err) => tracing::warn!(?line, ?err, "Ignoring malformed detail record"),
						}
					},
			}
		}

		if self.state != prev_state {
			tracing::trace!(?prev_state, state = ?self.state, ?line, "Scanner transition");
		}
	}
}

/// Bandwidth telemetry of a single unit
#[derive(Clone, Debug, Default)]
#[derive(serde::Serialize)]
pub struct BandwidthReport {
	/// Unit scanned
	pub unit: String,

	/// Cycle of each timeline sample
	pub cycles: Vec<u64>,

	/// Number of sections of the unit found
	pub sections: usize,

	/// Total bandwidth, per tick
	pub total: Vec<f64>,

	/// Bandwidth of each key, per tick
	#[serde(serialize_with = "serialize_keyed")]
	pub series: BTreeMap<TelemetryKey, Vec<f64>>,

	/// Whole-run average of each key, if the log has a trailing section
	#[serde(serialize_with = "serialize_keyed")]
	pub averages: BTreeMap<TelemetryKey, f64>,

	/// Whole-run total average, if the log has a trailing section
	pub total_average: Option<f64>,
}

impl BandwidthReport {
	/// Returns if the unit was never found
	pub fn is_empty(&self) -> bool {
		self.sections == 0
	}

	/// Returns all series that have a sample for every cycle
	pub fn aligned_series(&self) -> impl Iterator<Item = (&TelemetryKey, &[f64])> {
		self.series
			.iter()
			.filter(|(_, samples)| samples.len() == self.cycles.len())
			.map(|(key, samples)| (key, samples.as_slice()))
	}

	/// Returns if the total timeline has a sample for every cycle
	pub fn is_total_aligned(&self) -> bool {
		self.total.len() == self.cycles.len()
	}
}

/// Serializes a keyed map as a list of entries
fn serialize_keyed<S, T>(map: &BTreeMap<TelemetryKey, T>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: serde::Serializer,
	T: serde::Serialize,
{
	#[derive(serde::Serialize)]
	struct Entry<'a, T> {
		unit:  &'a str,
		label: &'a str,
		value: &'a T,
	}

	serializer.collect_seq(map.iter().map(|(key, value)| Entry {
		unit: &key.unit,
		label: &key.label,
		value,
	}))
}

/// Scans logs for a unit's bandwidth sections
#[derive(Clone, Debug)]
pub struct LogSectionScanner {
	/// Unit
	unit: String,

	/// Markers
	markers: Markers,
}

impl LogSectionScanner {
	/// Creates a scanner for the sections of `unit`
	pub fn new(unit: &str) -> Result<Self, Error> {
		Ok(Self {
			unit:    unit.to_owned(),
			markers: Markers::new(unit)?,
		})
	}

	/// Scans a cached log
	///
	/// # Errors
	/// Returns [`Error::LogNotFound`] if `path` doesn't exist.
	pub fn scan_file(&self, path: &Path) -> Result<BandwidthReport, Error> {
		let text = artifact::read_log(path)?;
		Ok(self.scan(&text))
	}

	/// Scans a log's text.
	///
	/// If the unit never appears, the report is empty.
	pub fn scan(&self, text: &str) -> BandwidthReport {
		let discovery = self.discover(text);
		if discovery.sections == 0 {
			tracing::debug!(unit = ?self.unit, "Unit never appeared in log");
		}

		// Fill every key with a sample per tick, defaulting to 0
		let mut ticks = 0;
		let mut series = discovery
			.keys
			.into_iter()
			.map(|key| (key, Vec::with_capacity(discovery.sections)))
			.collect::<BTreeMap<_, Vec<f64>>>();
		let mut machine = SectionMachine::new(&self.markers);
		for line in text.lines() {
			machine.step(line, |event| match event {
				ScanEvent::Cycle(_) => (),
				ScanEvent::SectionOpened => {
					ticks += 1;
					for samples in series.values_mut() {
						samples.push(0.0);
					}
				},
				ScanEvent::Record { unit, label, bandwidth } => {
					let key = TelemetryKey::new(unit, label);
					match series.get_mut(&key).and_then(|samples| samples.last_mut()) {
						Some(sample) => *sample = bandwidth,
						None => tracing::warn!(?key, "Record for undiscovered key"),
					}
				},
			});
		}
		debug_assert_eq!(ticks, discovery.sections, "Both passes must see the same sections");

		// Then split off the trailing average section, if any
		let cycles = discovery.cycles;
		let mut averages = BTreeMap::new();
		if ticks > cycles.len() {
			if ticks > cycles.len() + 1 {
				tracing::warn!(
					unit = ?self.unit,
					ticks,
					cycles = cycles.len(),
					"Ignoring sections past the trailing average section"
				);
			}

			for (key, samples) in &mut series {
				averages.insert(key.clone(), samples[cycles.len()]);
				samples.truncate(cycles.len());
			}
		}

		let timeline_len = ticks.min(cycles.len());
		let total = (0..timeline_len)
			.map(|tick| series.values().map(|samples| samples[tick]).sum::<f64>())
			.collect();
		let total_average = (ticks > cycles.len()).then(|| averages.values().sum::<f64>());

		BandwidthReport {
			unit: self.unit.clone(),
			cycles,
			sections: discovery.sections,
			total,
			series,
			averages,
			total_average,
		}
	}

	/// Discovers all cycles, sections and keys of a log
	fn discover(&self, text: &str) -> Discovery {
		let mut discovery = Discovery::default();
		let mut machine = SectionMachine::new(&self.markers);
		for line in text.lines() {
			machine.step(line, |event| match event {
				ScanEvent::Cycle(cycle) => discovery.cycles.push(cycle),
				ScanEvent::SectionOpened => discovery.sections += 1,
				ScanEvent::Record { unit, label, .. } => {
					discovery.keys.insert(TelemetryKey::new(unit, label));
				},
			});
		}

		tracing::debug!(
			unit = ?self.unit,
			cycles = discovery.cycles.len(),
			sections = discovery.sections,
			keys = discovery.keys.len(),
			"Discovered log layout"
		);
		discovery
	}
}

/// Result of the discovery pass
#[derive(Debug, Default)]
struct Discovery {
	cycles:   Vec<u64>,
	sections: usize,
	keys:     BTreeSet<TelemetryKey>,
}
