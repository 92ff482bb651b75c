//! Logger
//!
//! Two sinks are installed: the terminal (stderr), filtered by `RUST_LOG`,
//! and an optional log file, filtered by `RUST_LOG_FILE`.

// Imports
use {
	std::{fs, io, path::Path, sync::Mutex},
	tracing_subscriber::{prelude::*, EnvFilter},
};

/// Default filter for the terminal
const DEFAULT_TERM_FILTER: &str = "info";

/// Default filter for the log file
const DEFAULT_FILE_FILTER: &str = "debug";

/// Initializes the logger.
///
/// Any messages queued through [`pre_init`] are emitted right after.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let term_layer = tracing_subscriber::fmt::layer()
		.with_writer(io::stderr)
		.with_filter(self::env_filter("RUST_LOG", DEFAULT_TERM_FILTER));

	let file_layer = log_file
		.and_then(|path| {
			let file = fs::OpenOptions::new()
				.create(true)
				.write(true)
				.append(log_file_append)
				.truncate(!log_file_append)
				.open(path);
			match file {
				Ok(file) => Some(file),
				Err(err) => {
					pre_init::warn(format!("Unable to open log file {path:?}: {err}"));
					None
				},
			}
		})
		.map(|file| {
			tracing_subscriber::fmt::layer()
				.with_ansi(false)
				.with_writer(Mutex::new(file))
				.with_filter(self::env_filter("RUST_LOG_FILE", DEFAULT_FILE_FILTER))
		});

	if let Err(err) = tracing_subscriber::registry()
		.with(term_layer)
		.with(file_layer)
		.try_init()
	{
		eprintln!("Unable to initialize logger: {err}");
	}

	for message in pre_init::take() {
		match message.level {
			pre_init::Level::Debug => tracing::debug!("{}", message.text),
			pre_init::Level::Warn => tracing::warn!("{}", message.text),
		}
	}
}

/// Creates an env filter from `var`, falling back to `default`
fn env_filter(var: &str, default: &str) -> EnvFilter {
	EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Messages logged before [`init`] is called
pub mod pre_init {
	// Imports
	use std::sync::Mutex;

	/// Queued messages
	static MESSAGES: Mutex<Vec<Message>> = Mutex::new(Vec::new());

	/// Message level
	#[derive(Clone, Copy, Debug)]
	pub(super) enum Level {
		Debug,
		Warn,
	}

	/// Queued message
	#[derive(Debug)]
	pub(super) struct Message {
		pub level: Level,
		pub text:  String,
	}

	/// Queues a debug message
	pub fn debug(text: impl Into<String>) {
		self::push(Level::Debug, text.into());
	}

	/// Queues a warning
	pub fn warn(text: impl Into<String>) {
		self::push(Level::Warn, text.into());
	}

	fn push(level: Level, text: String) {
		// Note: A poisoned lock only means another thread panicked mid-push,
		//       the queue itself is still usable.
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		messages.push(Message { level, text });
	}

	/// Takes all queued messages
	pub(super) fn take() -> Vec<Message> {
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		std::mem::take(&mut *messages)
	}

	#[cfg(test)]
	mod tests {
		use super::*;

		#[test]
		fn queued_messages_are_taken_in_order() {
			debug("first");
			warn(String::from("second"));

			let messages = take();
			let texts = messages
				.iter()
				.map(|message| message.text.as_str())
				.collect::<Vec<_>>();
			assert_eq!(texts, ["first", "second"]);
			assert!(matches!(messages[1].level, Level::Warn));
			assert!(take().is_empty());
		}
	}
}
