//! Sweeps a scripted simulator end to end

#![cfg(unix)]

// Imports
use {
	simsweep::{cache, LogSectionScanner, RunCache, RunOutcome, ScalarExtractor, SweepFile, TelemetryKey},
	std::{fs, os::unix::fs::PermissionsExt, path::Path},
};

/// Simulator that logs two cycles plus the average section, failing on the `bad` scene
const SIMULATOR: &str = r#"#!/bin/sh
echo "Args: $*"
for arg in "$@"; do
	if [ "$arg" = "-Dscene_name=bad" ]; then
		echo "Loading scene"
		echo "scene not found" >&2
		exit 3
	fi
done
cat <<'LOG'
Cycle: 1
--------------------------------DRAM--------------------------------
DRAM Total: 12.5 bytes/cycle

Bandwidth Utilization Starts:
Unit name: DRAM, Request label: Load Ray, Bandwidth Utilization: 12.5 bytes/cycle
Bandwidth Utilization Ends.
--------------------------------SRAM--------------------------------
SRAM Total: 3.0 bytes/cycle
Cycle: 2
--------------------------------DRAM--------------------------------

Bandwidth Utilization Starts:
Unit name: DRAM, Request label: Load Ray, Bandwidth Utilization: 6.0 bytes/cycle
Unit name: DRAM, Request label: Store Hit, Bandwidth Utilization: 1.0 bytes/cycle
Bandwidth Utilization Ends.
--------------------------------DRAM--------------------------------

Bandwidth Utilization Starts:
Unit name: DRAM, Request label: Load Ray, Bandwidth Utilization: 9.25 bytes/cycle
Unit name: DRAM, Request label: Store Hit, Bandwidth Utilization: 0.5 bytes/cycle
Bandwidth Utilization Ends.
MRays/s: 42.5
LOG
"#;

fn write_simulator(dir: &Path) -> std::path::PathBuf {
	let path = dir.join("simulator.sh");
	fs::write(&path, SIMULATOR).expect("Unable to write simulator");
	fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("Unable to make simulator executable");
	path
}

#[test]
fn sweep_and_scan() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	self::write_simulator(dir.path());

	let sweep_path = dir.path().join("sweep.json");
	fs::write(
		&sweep_path,
		r#"{
			"exe_path": "simulator.sh",
			"output_dir": "logs",
			"jobs": 2,
			"params": {
				"simulator": ["trax"],
				"scene_name": ["sponza", "bad", "crytek"],
				"size": ["256"]
			}
		}"#,
	)
	.expect("Unable to write sweep file");

	let sweep = SweepFile::load(&sweep_path).expect("Unable to load sweep file");
	assert_eq!(sweep.output_dir, dir.path().join("logs"));
	let space = sweep.space().expect("Invalid space");
	let options = sweep.options(false).expect("Invalid options");
	let cache = RunCache::new(&sweep.output_dir, &sweep.exe_path, options).expect("Unable to create run cache");

	let report = cache.run(&space).expect("Unable to run sweep");
	assert_eq!(report.records.len(), 3);
	assert_eq!(report.succeeded(), 2);
	assert_eq!(report.records[1].outcome, RunOutcome::Failed { code: Some(3) });
	assert_eq!(fs::read_dir(&sweep.output_dir).expect("Unable to read output dir").count(), 3);

	// The failed run keeps its partial output, annotated
	let failed = fs::read_to_string(&report.records[1].path).expect("Unable to read failed log");
	assert!(failed.contains("Loading scene"));
	assert!(failed.contains("\nError: Command failed with exit code 3\n"));
	assert!(failed.contains("\nStderr:\nscene not found"));

	// Successful runs are found again through their configuration
	let config = &report.records[0].configuration;
	let path = cache::cache_path(&sweep.output_dir, config).expect("Unable to identify configuration");
	assert_eq!(path, report.records[0].path);
	let log = fs::read_to_string(&path).expect("Unable to read log");
	assert!(log.starts_with("Args: "));
	assert!(log.contains("-Dframebuffer_width=256"));
	assert!(log.contains("-Dframebuffer_height=256"));
	assert!(!log.contains("-Dsize="));

	let dram = LogSectionScanner::new("DRAM")
		.expect("Valid markers")
		.scan_file(&path)
		.expect("Unable to scan log");
	let load = TelemetryKey::new("DRAM", "Load Ray");
	let store = TelemetryKey::new("DRAM", "Store Hit");
	assert_eq!(dram.cycles, [1, 2]);
	assert_eq!(dram.series[&load], [12.5, 6.0]);
	assert_eq!(dram.series[&store], [0.0, 1.0]);
	assert_eq!(dram.total, [12.5, 7.0]);
	assert_eq!(dram.averages[&load], 9.25);
	assert_eq!(dram.total_average, Some(9.75));

	let sram = LogSectionScanner::new("SRAM")
		.expect("Valid markers")
		.scan_file(&path)
		.expect("Unable to scan log");
	assert_eq!(sram.sections, 1);
	assert!(sram.series.is_empty());

	let mrays = ScalarExtractor::new("MRays/s")
		.expect("Valid pattern")
		.extract_file(&path)
		.expect("Unable to extract metric");
	assert_eq!(mrays, 42.5);

	// Re-running without clearing overwrites the same files
	let cache = RunCache::new(&sweep.output_dir, &sweep.exe_path, sweep.options(false).expect("Invalid options"))
		.expect("Unable to create run cache");
	let rerun = cache.run(&space).expect("Unable to rerun sweep");
	assert_eq!(
		rerun.records.iter().map(|record| &record.path).collect::<Vec<_>>(),
		report.records.iter().map(|record| &record.path).collect::<Vec<_>>()
	);
	assert_eq!(fs::read_dir(&sweep.output_dir).expect("Unable to read output dir").count(), 3);
}
