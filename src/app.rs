//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the sanitize/fit pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{CheckArgs, Command, FitArgs, SynthArgs};
use crate::domain::{FitConfig, default_aliases};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `bigo` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Check(args) => handle_check(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.log, &run.report, &config)
    );

    if config.plot {
        for group in &run.report.groups {
            let plot =
                crate::plot::render_group_plot(group, config.plot_width, config.plot_height);
            println!("{plot}");
        }
    }

    if let Some(path) = &config.export_predictions {
        crate::io::export::write_predictions_csv(path, &run.report)?;
    }
    if let Some(path) = &config.export_report {
        crate::io::export::write_report_json(path, &run.log, &run.report, &config)?;
    }

    Ok(())
}

fn handle_check(args: CheckArgs) -> Result<(), AppError> {
    let mut config = FitConfig::for_log(args.log);
    config.expected_cols = args.expected_cols;
    config.aliases = merge_aliases(args.aliases);
    config.max_k = args.max_k;

    let log = crate::io::ingest::load_measurements(&config)?;
    println!("{}", crate::report::format_check_summary(&log, &config));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let spec = crate::data::SynthSpec {
        seed: args.seed,
        sizes: args.sizes,
        noise: args.noise,
        corrupt_every: args.corrupt_every,
    };
    let log = crate::data::write_synthetic_log(&args.out, &spec)?;

    println!(
        "Wrote {} data lines ({} corrupt) to {}",
        log.data_lines,
        log.corrupt_lines,
        args.out.display()
    );
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        log_path: args.log.clone(),
        expected_cols: args.expected_cols,
        aliases: merge_aliases(args.aliases.clone()),
        max_k: args.max_k,
        min_group_points: args.min_group_points,
        with_intercept: args.with_intercept,
        compare: args.compare,
        zero_variance: args.zero_variance,
        curve_points: args.curve_points,
        sort_groups: args.sort_groups,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_predictions: args.export.clone(),
        export_report: args.export_report.clone(),
    }
}

/// CLI-supplied aliases are matched before the built-in defaults.
fn merge_aliases(mut user: Vec<(String, String)>) -> Vec<(String, String)> {
    user.extend(default_aliases());
    user
}
