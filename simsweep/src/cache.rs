//! Run cache
//!
//! Runs every configuration of a [`ConfigSpace`] and stores each run's
//! standard output as `<output_dir>/<run id>.txt`.

// Imports
use {
	crate::{
		command::{FlagStyle, Invocation},
		config::{ConfigSpace, Configuration},
		launcher::{Captured, Exit, Launcher, ProcessLauncher},
		run_id::RunId,
		Error,
	},
	std::{
		fs,
		num::NonZeroUsize,
		path::{Path, PathBuf},
		sync::atomic::{self, AtomicUsize},
		thread,
		time::Duration,
	},
};

/// Run cache options
#[derive(Clone, Debug)]
pub struct RunCacheOptions {
	/// Whether to delete the output directory before running.
	pub clear: bool,

	/// Flag style for the simulator
	pub flag_style: FlagStyle,

	/// Per-run timeout
	pub timeout: Option<Duration>,

	/// Maximum concurrent runs
	pub jobs: NonZeroUsize,
}

impl Default for RunCacheOptions {
	fn default() -> Self {
		Self {
			clear:      false,
			flag_style: FlagStyle::default(),
			timeout:    None,
			jobs:       NonZeroUsize::MIN,
		}
	}
}

/// Run cache
#[derive(Debug)]
pub struct RunCache<L = ProcessLauncher> {
	/// Output directory
	output_dir: PathBuf,

	/// Simulator executable
	exe_path: PathBuf,

	/// Flag style
	flag_style: FlagStyle,

	/// Maximum concurrent runs
	jobs: NonZeroUsize,

	/// Launcher
	launcher: L,
}

impl RunCache {
	/// Creates a run cache that launches `exe_path` as a child process
	pub fn new(
		output_dir: impl Into<PathBuf>,
		exe_path: impl Into<PathBuf>,
		options: RunCacheOptions,
	) -> Result<Self, Error> {
		let launcher = ProcessLauncher::new(options.timeout);
		Self::with_launcher(output_dir, exe_path, options, launcher)
	}
}

impl<L: Launcher> RunCache<L> {
	/// Creates a run cache with a custom launcher.
	///
	/// # Errors
	/// Returns [`Error::ExecutableNotFound`] if `exe_path` doesn't exist, before
	/// the output directory is touched.
	pub fn with_launcher(
		output_dir: impl Into<PathBuf>,
		exe_path: impl Into<PathBuf>,
		options: RunCacheOptions,
		launcher: L,
	) -> Result<Self, Error> {
		let output_dir = output_dir.into();
		let exe_path = exe_path.into();
		if !exe_path.exists() {
			return Err(Error::ExecutableNotFound(exe_path));
		}

		if options.clear && output_dir.exists() {
			tracing::info!(?output_dir, "Clearing output directory");
			fs::remove_dir_all(&output_dir)?;
		}
		fs::create_dir_all(&output_dir)?;

		Ok(Self {
			output_dir,
			exe_path,
			flag_style: options.flag_style,
			jobs: options.jobs,
			launcher,
		})
	}

	/// Returns the output directory
	pub fn output_dir(&self) -> &Path {
		&self.output_dir
	}

	/// Returns where the log of `config` is cached
	pub fn log_path(&self, config: &Configuration) -> Result<PathBuf, Error> {
		self::cache_path(&self.output_dir, config)
	}

	/// Runs every configuration of `space`.
	///
	/// A run that fails still produces its log, annotated with the failure.
	///
	/// # Errors
	/// Returns an error if any configuration can't be identified (before
	/// running anything), or if a log can't be written.
	pub fn run(&self, space: &ConfigSpace) -> Result<SweepReport, Error> {
		let jobs = space
			.configurations()
			.map(|config| {
				let id = RunId::of(&config)?;
				Ok(Job {
					path: self.output_dir.join(id.file_name()),
					invocation: Invocation::new(&self.exe_path, &config, self.flag_style),
					id,
					config,
				})
			})
			.collect::<Result<Vec<_>, Error>>()?;

		let workers = self.jobs.get().min(jobs.len());
		tracing::info!(runs = jobs.len(), workers, output_dir = ?self.output_dir, "Starting sweep");

		let records = match workers {
			0 | 1 => jobs
				.iter()
				.enumerate()
				.map(|(idx, job)| self.run_job(idx, jobs.len(), job))
				.collect::<Result<Vec<_>, _>>()?,
			_ => self.run_parallel(&jobs, workers)?,
		};

		let report = SweepReport { records };
		tracing::info!(
			succeeded = report.succeeded(),
			failed = report.failed().count(),
			"Finished sweep"
		);

		Ok(report)
	}

	/// Runs all jobs on `workers` threads, keeping the records in job order
	fn run_parallel(&self, jobs: &[Job], workers: usize) -> Result<Vec<RunRecord>, Error> {
		let next_job = AtomicUsize::new(0);
		let mut results = thread::scope(|scope| {
			let handles = (0..workers)
				.map(|_| {
					scope.spawn(|| {
						let mut results = vec![];
						loop {
							let idx = next_job.fetch_add(1, atomic::Ordering::Relaxed);
							let Some(job) = jobs.get(idx) else {
								break;
							};
							results.push((idx, self.run_job(idx, jobs.len(), job)));
						}
						results
					})
				})
				.collect::<Vec<_>>();

			handles
				.into_iter()
				.flat_map(|handle| handle.join().unwrap_or_else(|err| std::panic::resume_unwind(err)))
				.collect::<Vec<_>>()
		});

		results.sort_by_key(|&(idx, _)| idx);
		results.into_iter().map(|(_, record)| record).collect()
	}

	/// Runs a single job and writes its log
	fn run_job(&self, idx: usize, total: usize, job: &Job) -> Result<RunRecord, Error> {
		tracing::info!("[{}/{}] Running command: {}", idx + 1, total, job.invocation);

		let (outcome, contents) = match self.launcher.launch(&job.invocation) {
			Ok(captured) => self::annotate(captured),
			Err(err) => (
				RunOutcome::LaunchError { error: err.to_string() },
				format!("\nUnexpected error occurred: {err}\n"),
			),
		};

		fs::write(&job.path, contents)?;
		match &outcome {
			RunOutcome::Success => tracing::debug!(id = %job.id, path = ?job.path, "Finished"),
			outcome => tracing::warn!(id = %job.id, config = %job.config, ?outcome, "Run failed"),
		}

		Ok(RunRecord {
			id: job.id.clone(),
			configuration: job.config.clone(),
			invocation: job.invocation.clone(),
			path: job.path.clone(),
			outcome,
		})
	}
}

/// Returns where the log of `config` is cached within `output_dir`
pub fn cache_path(output_dir: &Path, config: &Configuration) -> Result<PathBuf, Error> {
	let id = RunId::of(config)?;
	Ok(output_dir.join(id.file_name()))
}

/// Builds the log contents and outcome of a finished process
fn annotate(captured: Captured) -> (RunOutcome, String) {
	let Captured { mut stdout, stderr, exit } = captured;
	let outcome = match exit {
		Exit::Exited(Some(0)) => return (RunOutcome::Success, stdout),
		Exit::Exited(Some(code)) => {
			stdout.push_str(&format!("\nError: Command failed with exit code {code}\n"));
			RunOutcome::Failed { code: Some(code) }
		},
		Exit::Exited(None) => {
			stdout.push_str("\nError: Command was terminated by a signal\n");
			RunOutcome::Failed { code: None }
		},
		Exit::TimedOut(timeout) => {
			stdout.push_str(&format!("\nTimedOut: command exceeded {}s\n", timeout.as_secs_f64()));
			RunOutcome::TimedOut
		},
	};

	if !stderr.is_empty() {
		stdout.push_str("\nStderr:\n");
		stdout.push_str(&stderr);
	}

	(outcome, stdout)
}

/// Pending run
#[derive(Debug)]
struct Job {
	config:     Configuration,
	id:         RunId,
	invocation: Invocation,
	path:       PathBuf,
}

/// Outcome of a single run
#[derive(PartialEq, Eq, Clone, Debug)]
#[derive(serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
	/// Exited successfully
	Success,

	/// Exited unsuccessfully
	Failed { code: Option<i32> },

	/// Killed after its timeout
	TimedOut,

	/// Couldn't be launched
	LaunchError { error: String },
}

/// Record of a single run
#[derive(Clone, Debug)]
#[derive(serde::Serialize)]
pub struct RunRecord {
	pub id:            RunId,
	pub configuration: Configuration,
	pub invocation:    Invocation,
	pub path:          PathBuf,
	pub outcome:       RunOutcome,
}

/// Records of a sweep, in enumeration order
#[derive(Clone, Debug)]
#[derive(serde::Serialize)]
pub struct SweepReport {
	pub records: Vec<RunRecord>,
}

impl SweepReport {
	/// Returns the number of successful runs
	pub fn succeeded(&self) -> usize {
		self.records
			.iter()
			.filter(|record| record.outcome == RunOutcome::Success)
			.count()
	}

	/// Returns all unsuccessful runs
	pub fn failed(&self) -> impl Iterator<Item = &RunRecord> {
		self.records
			.iter()
			.filter(|record| record.outcome != RunOutcome::Success)
	}
}
