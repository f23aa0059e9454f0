//! # Gault Profile Entry Point
//!
//! One linear pass: load configuration, derive thicknesses, assemble the dataset,
//! render the SVG profile, and write the dataset snapshot.
//!
//! ## Usage
//! ```text
//! gault-profile [--config <path>] [--stdout]
//! ```
//! - `--config <path>`: configuration file (default `gault-config.toml`)
//! - `--stdout`: print the ASCII profile instead of writing any files
//!
//! Set `RUST_LOG=debug` for more detail.

#[cfg(test)]
mod tests;

use anyhow::Context;
use gault_lib::canvas::SvgCanvas;
use gault_lib::config::{self, Config};
use gault_lib::dataset::Dataset;
use gault_lib::layout::LayoutOptions;
use gault_lib::{renderer, thickness, GaultError};
use log::{error, info};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Command line flags
#[derive(Debug, PartialEq)]
struct Args {
    config: PathBuf,
    development_mode: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Args> {
    let mut parsed = Args {
        config: PathBuf::from(config::DEFAULT_PATH),
        development_mode: false,
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stdout" => parsed.development_mode = true,
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = PathBuf::from(path);
            }
            other => anyhow::bail!("unknown argument `{other}`"),
        }
    }
    Ok(parsed)
}

fn run(args: &Args) -> anyhow::Result<()> {
    // Everything that can fail on bad input happens before the first write.
    let config = Config::load_from_path(&args.config)?;
    let raw = config.raw_profile();
    let derived = thickness::derive(&raw)?;
    let dataset = Dataset::assemble(config.observation.date, raw.distance, derived)?;
    let options = LayoutOptions::from(&config.layout);

    info!(
        "Derived {} positions for {}",
        dataset.len(),
        dataset.iso_date()
    );

    // Development mode: ASCII output for testing
    if args.development_mode {
        renderer::draw_ascii(&dataset, &options)?;
        return Ok(());
    }

    let output = &config.output;
    let plot_dir = output.plot_dir();
    fs::create_dir_all(&plot_dir).map_err(|e| GaultError::io(&plot_dir, e))?;

    let mut canvas = SvgCanvas::new(config.layout.width, config.layout.height);
    let plot_path = output.plot_path(&dataset.iso_date());
    renderer::render_profile(&dataset, &options, &mut canvas, &plot_path)?;

    dataset.save(output.dataset_path())?;

    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(env::args().skip(1))?;
    run(&args).inspect_err(|e| error!("{e:#}"))
}
