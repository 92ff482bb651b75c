//! Runs that exceed their timeout

#![cfg(unix)]

// Imports
use {
	simsweep::{ConfigSpace, RunCache, RunCacheOptions, RunOutcome},
	std::{
		fs,
		os::unix::fs::PermissionsExt,
		time::{Duration, Instant},
	},
};

/// Wrapper script whose children inherit its output pipes
const SLOW_SIMULATOR: &str = "#!/bin/sh\necho started\nsleep 10 &\nsleep 10\necho done\n";

#[test]
fn slow_run_is_killed_with_its_children() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	let exe_path = dir.path().join("slow.sh");
	fs::write(&exe_path, SLOW_SIMULATOR).expect("Unable to write simulator");
	fs::set_permissions(&exe_path, fs::Permissions::from_mode(0o755)).expect("Unable to make simulator executable");

	let options = RunCacheOptions {
		timeout: Some(Duration::from_millis(300)),
		..RunCacheOptions::default()
	};
	let cache = RunCache::new(dir.path().join("logs"), &exe_path, options).expect("Unable to create run cache");
	let space = ConfigSpace::new()
		.with_param("scene_name", ["sponza"])
		.expect("Valid parameter");

	let start = Instant::now();
	let report = cache.run(&space).expect("Unable to run sweep");
	assert!(start.elapsed() < Duration::from_secs(5));

	let record = &report.records[0];
	assert_eq!(record.outcome, RunOutcome::TimedOut);
	let log = fs::read_to_string(&record.path).expect("Unable to read log");
	assert!(log.contains("started"));
	assert!(!log.contains("done"));
	assert!(log.contains("\nTimedOut: command exceeded 0.3s\n"));
}
