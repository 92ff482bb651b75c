//! Simulator command building

// Imports
use {
	crate::config::{Configuration, ParamName},
	itertools::Itertools,
	std::{
		fmt,
		path::{Path, PathBuf},
		process::Command,
	},
};

/// Flag style expected by the simulator
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FlagStyle {
	/// `-Dkey=value`
	#[default]
	Define,

	/// `--key=value`
	Long,
}

impl FlagStyle {
	/// Formats a single flag
	#[must_use]
	pub fn flag(self, name: &str, value: &str) -> String {
		match self {
			Self::Define => format!("-D{name}={value}"),
			Self::Long => format!("--{name}={value}"),
		}
	}
}

/// Simulator invocation
#[derive(PartialEq, Eq, Clone, Debug)]
#[derive(serde::Serialize)]
pub struct Invocation {
	/// Executable path
	pub program: PathBuf,

	/// Flags, in configuration order
	pub args: Vec<String>,
}

impl Invocation {
	/// Builds the invocation for `config`.
	///
	/// Each parameter becomes one flag, except for `size`, which sets both
	/// `framebuffer_width` and `framebuffer_height`.
	pub fn new(program: &Path, config: &Configuration, style: FlagStyle) -> Self {
		let args = config
			.iter()
			.flat_map(|(name, value)| {
				let value = value.to_string();
				match name {
					ParamName::Size => vec![
						style.flag(ParamName::FramebufferWidth.as_str(), &value),
						style.flag(ParamName::FramebufferHeight.as_str(), &value),
					],
					_ => vec![style.flag(name.as_str(), &value)],
				}
			})
			.collect();

		Self {
			program: program.to_path_buf(),
			args,
		}
	}

	/// Creates a process command for this invocation
	#[must_use]
	pub fn command(&self) -> Command {
		let mut cmd = Command::new(&self.program);
		cmd.args(&self.args);
		cmd
	}
}

impl fmt::Display for Invocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.program.display())?;
		match self.args.is_empty() {
			true => Ok(()),
			false => write!(f, " {}", self.args.iter().join(" ")),
		}
	}
}
