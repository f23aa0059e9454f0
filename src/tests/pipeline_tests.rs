//! # End-to-End Pipeline Tests
//!
//! These tests drive the binary's `run` pass against temporary directories and
//! check what lands on disk: the SVG profile, the dataset snapshot, and, for bad
//! input, nothing at all.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::{parse_args, run, Args};
use gault_lib::dataset::{Dataset, Variable};
use gault_lib::{measurements, GaultError};

/// Write a config file into `dir` that points its output at `dir/out`.
fn write_config(dir: &Path, extra_layout: &str) -> Args {
    write_config_to(dir, &dir.join("out"), extra_layout)
}

fn write_config_to(dir: &Path, out: &Path, extra_layout: &str) -> Args {
    let contents = format!(
        "[layout]\n{extra_layout}\n\n[output]\ndirectory = '{}'\n",
        out.display()
    );
    let path = dir.join("gault-config.toml");
    fs::write(&path, contents).unwrap();
    Args {
        config: path,
        development_mode: false,
    }
}

/// A full run with built-in measurements writes both artifacts.
#[test]
fn run_writes_plot_and_dataset() {
    let dir = TempDir::new().unwrap();
    let args = write_config(dir.path(), "north_direction = \"top\"");

    run(&args).unwrap();

    let plot = dir.path().join("out/plots/gault_2025-01-31.svg");
    let svg = fs::read_to_string(&plot).expect("plot should exist");
    assert!(svg.contains("2025-01-31"), "title should be the ISO date");
    assert!(svg.contains("10 m gap"), "gap marker should be in the legend");

    let dataset = Dataset::load(dir.path().join("out/gault.json")).unwrap();
    assert_eq!(dataset.distance(), &measurements::DISTANCE[..]);
    assert_eq!(dataset.variable(Variable::Ice)[0], 33.0);
    assert_eq!(dataset.variable(Variable::Slush)[0], 8.0);
    assert_eq!(dataset.variable(Variable::Snow)[0], 19.0);
}

/// An unknown compass direction fails before anything is written.
#[test]
fn invalid_direction_produces_no_output() {
    let dir = TempDir::new().unwrap();
    let args = write_config(dir.path(), "north_direction = \"up-ish\"");

    let err = run(&args).unwrap_err();

    assert!(
        err.to_string().contains("up-ish"),
        "error should name the bad value: {err}"
    );
    assert!(
        !dir.path().join("out").exists(),
        "no output directory should be created on config errors"
    );
}

/// An out-of-range annotation index is rejected the same way.
#[test]
fn invalid_index_produces_no_output() {
    let dir = TempDir::new().unwrap();
    let args = write_config(dir.path(), "buoy_index = -40");

    assert!(run(&args).is_err());
    assert!(!dir.path().join("out").exists());
}

/// An output directory that cannot be created is reported as an I/O error.
#[test]
fn unwritable_output_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let args = write_config_to(dir.path(), &blocker.join("out"), "");

    let err = run(&args).unwrap_err();

    match err.downcast_ref::<GaultError>() {
        Some(GaultError::Io { path, .. }) => assert_eq!(path, &blocker.join("out/plots")),
        other => panic!("expected Io error, got {other:?}"),
    }
}

/// Development mode prints the ASCII profile and writes nothing.
#[test]
fn development_mode_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut args = write_config(dir.path(), "");
    args.development_mode = true;

    run(&args).unwrap();

    assert!(!dir.path().join("out").exists());
}

/// Command line flags are recognised in any order.
#[test]
fn parse_args_flags() {
    let args = parse_args(vec![]).unwrap();
    assert_eq!(args.config, Path::new("gault-config.toml"));
    assert!(!args.development_mode);

    let args = parse_args(
        ["--stdout", "--config", "other.toml"]
            .into_iter()
            .map(String::from),
    )
    .unwrap();
    assert_eq!(args.config, Path::new("other.toml"));
    assert!(args.development_mode);

    assert!(parse_args(vec!["--config".to_string()]).is_err());
    assert!(parse_args(vec!["--bogus".to_string()]).is_err());
}
