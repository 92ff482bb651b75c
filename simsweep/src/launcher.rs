//! Simulator process launching

// Imports
use {
	crate::command::Invocation,
	std::{
		io::{self, Read},
		process::{Child, Stdio},
		thread,
		time::{Duration, Instant},
	},
};

/// Interval between checks on a running process with a timeout
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Output captured from a simulator invocation
#[derive(Clone, Debug)]
pub struct Captured {
	/// Standard output
	pub stdout: String,

	/// Standard error
	pub stderr: String,

	/// How the process ended
	pub exit: Exit,
}

/// How a process ended
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Exit {
	/// Process exited by itself.
	///
	/// The code is `None` when the process was terminated by a signal.
	Exited(Option<i32>),

	/// Process was killed after exceeding its timeout
	TimedOut(Duration),
}

/// Launches simulator invocations
pub trait Launcher: Sync {
	/// Runs `invocation` to completion, capturing its output.
	///
	/// # Errors
	/// Returns an error only if the process could not be run at all.
	/// Unsuccessful exits are reported through [`Captured::exit`].
	fn launch(&self, invocation: &Invocation) -> Result<Captured, io::Error>;
}

/// Launches invocations as child processes
#[derive(Clone, Debug, Default)]
pub struct ProcessLauncher {
	/// Timeout
	timeout: Option<Duration>,
}

impl ProcessLauncher {
	/// Creates a new launcher
	#[must_use]
	pub fn new(timeout: Option<Duration>) -> Self {
		Self { timeout }
	}
}

impl Launcher for ProcessLauncher {
	fn launch(&self, invocation: &Invocation) -> Result<Captured, io::Error> {
		let mut cmd = invocation.command();
		cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

		let Some(timeout) = self.timeout else {
			let output = cmd.output()?;
			return Ok(Captured {
				stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
				stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
				exit:   Exit::Exited(output.status.code()),
			});
		};

		// Note: The process leads its own group, so that on timeout any
		//       processes it spawned, which share its pipes, are killed with it.
		#[cfg(unix)]
		std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

		// Note: Both pipes are drained on their own threads so the child
		//       never blocks on a full pipe while we poll it.
		let mut child = cmd.spawn()?;
		let stdout_reader = child.stdout.take().map(|pipe| thread::spawn(move || self::read_pipe(pipe)));
		let stderr_reader = child.stderr.take().map(|pipe| thread::spawn(move || self::read_pipe(pipe)));

		let deadline = Instant::now() + timeout;
		let exit = loop {
			if let Some(status) = child.try_wait()? {
				break Exit::Exited(status.code());
			}

			let now = Instant::now();
			if now >= deadline {
				tracing::warn!(%invocation, ?timeout, "Killing timed out process");
				self::kill_group(&mut child);
				child.wait()?;
				break Exit::TimedOut(timeout);
			}

			thread::sleep(POLL_INTERVAL.min(deadline - now));
		};

		Ok(Captured {
			stdout: self::join_reader(stdout_reader)?,
			stderr: self::join_reader(stderr_reader)?,
			exit,
		})
	}
}

/// Kills a child along with every process in its group
#[cfg(unix)]
fn kill_group(child: &mut Child) {
	// Note: The child hasn't been reaped yet, so its pid is still its group's id.
	let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
		tracing::warn!(pid = child.id(), "Process id out of range, killing only the process");
		return self::kill_child(child);
	};

	// SAFETY: `killpg` only sends a signal, it has no memory safety requirements.
	if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
		let err = io::Error::last_os_error();
		tracing::debug!(?err, "Unable to kill process group");
		self::kill_child(child);
	}
}

/// Kills a child
#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
	self::kill_child(child);
}

/// Kills only the child itself
fn kill_child(child: &mut Child) {
	// Note: The process may have exited since we last checked.
	if let Err(err) = child.kill() {
		tracing::debug!(?err, "Unable to kill process");
	}
}

/// Reads a pipe until it's closed
fn read_pipe(mut pipe: impl Read) -> Result<String, io::Error> {
	let mut bytes = vec![];
	pipe.read_to_end(&mut bytes)?;
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Waits for a pipe reader thread
fn join_reader(reader: Option<thread::JoinHandle<Result<String, io::Error>>>) -> Result<String, io::Error> {
	match reader {
		Some(reader) => reader
			.join()
			.unwrap_or_else(|err| std::panic::resume_unwind(err)),
		None => Ok(String::new()),
	}
}
