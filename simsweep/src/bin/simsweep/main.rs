//! Simulator sweeps (`simsweep`)

// Modules
mod args;

// Imports
use {
	self::args::{Args, SubCmd},
	anyhow::Context,
	clap::Parser,
	simsweep::{artifact, cache, metric, Configuration, LogSectionScanner, RunCache, RunId, ScalarExtractor, SweepFile},
	simsweep_util::logger,
	std::{io, time::Duration},
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Then check the sub-command
	match args.sub_cmd {
		SubCmd::Run(cmd_args) => {
			let sweep = SweepFile::load(&cmd_args.config_file)
				.with_context(|| format!("Unable to load sweep file {:?}", cmd_args.config_file))?;
			let space = sweep.space().context("Unable to build configuration space")?;

			let mut options = sweep.options(cmd_args.clear).context("Unable to get run options")?;
			if let Some(jobs) = cmd_args.jobs {
				options.jobs = jobs;
			}
			if let Some(timeout_secs) = cmd_args.timeout_secs {
				options.timeout = Some(Duration::try_from_secs_f64(timeout_secs).context("Invalid timeout")?);
			}
			if let Some(flag_style) = cmd_args.flag_style {
				options.flag_style = flag_style;
			}

			let cache = RunCache::new(&sweep.output_dir, &sweep.exe_path, options).context("Unable to create run cache")?;
			let report = cache.run(&space).context("Unable to run sweep")?;

			for record in report.failed() {
				tracing::warn!("Run {} ({}) failed: {:?}", record.id, record.configuration, record.outcome);
			}
			serde_json::to_writer_pretty(io::stdout().lock(), &report).context("Unable to write report")?;
			println!();
		},

		SubCmd::List(cmd_args) => {
			let sweep = SweepFile::load(&cmd_args.config_file)
				.with_context(|| format!("Unable to load sweep file {:?}", cmd_args.config_file))?;
			let space = sweep.space().context("Unable to build configuration space")?;

			for config in space.configurations() {
				let path = cache::cache_path(&sweep.output_dir, &config).context("Unable to identify configuration")?;
				let status = match path.exists() {
					true => "cached",
					false => "missing",
				};
				println!("{}\t{status}\t{config}", path.display());
			}
		},

		SubCmd::Hash(cmd_args) => {
			let config = self::parse_params(&cmd_args.params)?;

			let id = RunId::of(&config).context("Unable to identify configuration")?;
			println!("{id}");
		},

		SubCmd::Bandwidth(cmd_args) => {
			let scanner = LogSectionScanner::new(&cmd_args.unit).context("Unable to create scanner")?;
			let report = scanner
				.scan_file(&cmd_args.input_file)
				.context("Unable to scan log")?;
			if report.is_empty() {
				tracing::warn!("Unit {:?} never appeared in {:?}", cmd_args.unit, cmd_args.input_file);
			}

			serde_json::to_writer_pretty(io::stdout().lock(), &report).context("Unable to write report")?;
			println!();
		},

		SubCmd::Metric(cmd_args) => {
			let extractor = ScalarExtractor::new(&cmd_args.name).context("Unable to create extractor")?;
			let value = extractor
				.extract_file(&cmd_args.input_file)
				.context("Unable to extract metric")?;
			println!("{value}");
		},

		SubCmd::Series(cmd_args) => {
			let text = artifact::read_log(&cmd_args.input_file).context("Unable to read log")?;
			let series = metric::extract_series(&text, &cmd_args.key).context("Unable to extract series")?;
			if !series.is_aligned() {
				tracing::warn!(
					"Series {:?} has {} samples for {} cycles",
					series.key,
					series.samples.len(),
					series.cycles.len()
				);
			}

			serde_json::to_writer_pretty(io::stdout().lock(), &series).context("Unable to write series")?;
			println!();
		},
	}

	Ok(())
}

/// Parses `key=value` parameters into a configuration
fn parse_params(params: &[String]) -> Result<Configuration, anyhow::Error> {
	let mut config = Configuration::new();
	for param in params {
		let (name, value) = param
			.split_once('=')
			.with_context(|| format!("Parameter {param:?} must be `key=value`"))?;
		anyhow::ensure!(
			config.insert(name, value).is_none(),
			"Parameter {name:?} was given more than once"
		);
	}

	Ok(config)
}
