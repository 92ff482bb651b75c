//! Creates graphs from cached simulator logs

// Modules
mod args;

// Imports
use {
	anyhow::Context,
	args::Args,
	clap::Parser,
	gnuplot::{AutoOption, AxesCommon, Caption, Figure, Tick},
	itertools::Itertools,
	simsweep::{cache, smooth, ConfigSpace, LogSectionScanner, ScalarExtractor, SweepFile},
	simsweep_util::logger,
	std::collections::BTreeMap,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Then check the sub-command
	match args.sub_cmd {
		args::SubCmd::Bandwidth(cmd_args) => {
			let scanner = LogSectionScanner::new(&cmd_args.unit).context("Unable to create scanner")?;
			let report = scanner
				.scan_file(&cmd_args.input_file)
				.context("Unable to scan input file")?;
			anyhow::ensure!(
				!report.is_empty(),
				"Unit {:?} never appeared in {:?}",
				cmd_args.unit,
				cmd_args.input_file
			);

			let mut fg = Figure::new();
			let axes = fg
				.axes2d()
				.set_title(&format!("{} Bandwidth Utilization Over Time", cmd_args.unit), &[])
				.set_x_label("Cycles", &[])
				.set_y_label("Bandwidth (bytes/cycle)", &[]);

			if report.is_total_aligned() {
				let total = self::smoothed(&report.total, &cmd_args.smoothing);
				axes.lines(report.cycles.iter().copied(), total, &[Caption("Total")]);
			}

			// Note: Series that don't have a sample per cycle can't be plotted
			//       against the cycles, and near-zero ones only add clutter.
			for (key, samples) in report.aligned_series() {
				let samples = self::smoothed(samples, &cmd_args.smoothing);
				let peak = samples.iter().copied().fold(0.0, f64::max);
				if peak < cmd_args.min_peak {
					tracing::debug!(?key, peak, "Skipping low bandwidth series");
					continue;
				}

				let caption = format!("{} - {}", key.unit, key.label);
				axes.lines(report.cycles.iter().copied(), samples, &[Caption(caption.as_str())]);
			}

			if let Some(total_average) = report.total_average {
				tracing::info!("Average total bandwidth: {total_average:.1} bytes/cycle");
			}

			self::render(&mut fg, &cmd_args.output)?;
		},

		args::SubCmd::BandwidthCompare(cmd_args) => {
			anyhow::ensure!(
				cmd_args.labels.is_empty() || cmd_args.labels.len() == cmd_args.input_files.len(),
				"Expected one label per input file"
			);
			let scanner = LogSectionScanner::new(&cmd_args.unit).context("Unable to create scanner")?;

			let mut fg = Figure::new();
			let axes = fg
				.axes2d()
				.set_title(&format!("{} Bandwidth Comparison", cmd_args.unit), &[])
				.set_x_label("Cycles", &[])
				.set_y_label("Bandwidth (bytes/cycle)", &[]);

			for (idx, input_file) in cmd_args.input_files.iter().enumerate() {
				let report = scanner
					.scan_file(input_file)
					.with_context(|| format!("Unable to scan input file {input_file:?}"))?;
				if !report.is_total_aligned() || report.is_empty() {
					tracing::warn!(?input_file, "Skipping log without an aligned total bandwidth");
					continue;
				}

				let label = match cmd_args.labels.get(idx) {
					Some(label) => label.clone(),
					None => input_file
						.file_stem()
						.map_or_else(|| input_file.display().to_string(), |stem| stem.to_string_lossy().into_owned()),
				};
				let total = self::smoothed(&report.total, &cmd_args.smoothing);
				axes.lines(report.cycles.iter().copied(), total, &[Caption(label.as_str())]);
			}

			self::render(&mut fg, &cmd_args.output)?;
		},

		args::SubCmd::Metric(cmd_args) => {
			let sweep = SweepFile::load(&cmd_args.config_file)
				.with_context(|| format!("Unable to load sweep file {:?}", cmd_args.config_file))?;
			let mut space = sweep.space().context("Unable to build configuration space")?;
			for fix in &cmd_args.fix {
				let (name, values) = fix
					.split_once('=')
					.with_context(|| format!("Fixed parameter {fix:?} must be `key=value[,value...]`"))?;
				space
					.restrict(name, values.split(','))
					.with_context(|| format!("Unable to fix parameter {name:?}"))?;
			}

			let groups = self::param_values(&space, &cmd_args.group_by)?;
			let across = self::param_values(&space, &cmd_args.across)?;

			// Extract the metric of every cached configuration
			let extractor = ScalarExtractor::new(&cmd_args.name).context("Unable to create extractor")?;
			let mut results = BTreeMap::<(usize, usize), Vec<f64>>::new();
			for config in space.configurations() {
				let (Some(group), Some(across_value)) = (config.get(&cmd_args.group_by), config.get(&cmd_args.across))
				else {
					continue;
				};
				let group_idx = groups.iter().position(|value| *value == group.to_string());
				let across_idx = across.iter().position(|value| *value == across_value.to_string());
				let (Some(group_idx), Some(across_idx)) = (group_idx, across_idx) else {
					continue;
				};

				let path = cache::cache_path(&sweep.output_dir, &config).context("Unable to identify configuration")?;
				let value = extractor
					.extract_file(&path)
					.with_context(|| format!("Unable to extract {:?} for {config}", cmd_args.name))?;
				tracing::info!("{config}: {value}");
				results.entry((group_idx, across_idx)).or_default().push(value);
			}

			// Note: Configurations differing only in other parameters are averaged
			let bar_width = 0.8 / groups.len().max(1) as f64;
			let mut fg = Figure::new();
			let axes = fg
				.axes2d()
				.set_title(&format!("{} comparison", cmd_args.name), &[])
				.set_x_label(&cmd_args.across, &[])
				.set_y_label(&cmd_args.name, &[])
				.set_x_ticks_custom(
					across
						.iter()
						.enumerate()
						.map(|(idx, value)| Tick::Major(idx as f64, AutoOption::Fix(value.clone()))),
					&[],
					&[],
				);

			for (group_idx, group) in groups.iter().enumerate() {
				let (xs, ys): (Vec<_>, Vec<_>) = (0..across.len())
					.filter_map(|across_idx| {
						let values = results.get(&(group_idx, across_idx))?;
						let average = values.iter().sum::<f64>() / values.len() as f64;
						let x = across_idx as f64 - 0.4 + bar_width * (group_idx as f64 + 0.5);
						Some((x, average))
					})
					.unzip();

				let widths = vec![bar_width; xs.len()];
				axes.boxes_set_width(xs, ys, widths, &[Caption(group.as_str())]);
			}

			self::render(&mut fg, &cmd_args.output)?;
		},
	}

	Ok(())
}

/// Returns the candidates of a parameter in a space
fn param_values(space: &ConfigSpace, name: &str) -> Result<Vec<String>, anyhow::Error> {
	let (_, values) = space
		.params()
		.find(|(param, _)| param.as_str() == name)
		.with_context(|| format!("Sweep has no parameter {name:?}"))?;

	Ok(values.iter().cloned().unique().collect())
}

/// Smooths a series, if enabled
fn smoothed(samples: &[f64], smoothing: &args::Smoothing) -> Vec<f64> {
	match smoothing.disabled {
		true => samples.to_vec(),
		false => smooth::smooth(samples, smoothing.kernel_size, smoothing.sigma),
	}
}

/// Renders a figure to the selected outputs
fn render(fg: &mut Figure, output: &args::Output) -> Result<(), anyhow::Error> {
	if let Some(file) = &output.file {
		fg.save_to_png(file, output.width, output.height)
			.map_err(|err| anyhow::anyhow!("Unable to save output file: {err:?}"))?;
	}

	if output.interactive {
		fg.show()
			.map_err(|err| anyhow::anyhow!("Unable to show figure: {err:?}"))?;
	}

	if output.file.is_none() && !output.interactive {
		tracing::warn!("No output selected, use `--output` or `--interactive`");
	}

	Ok(())
}
