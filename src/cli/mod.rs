//! The `semcon-harness` command-line interface.
//!
//! Resolves a [`HarnessConfig`] from the config file, environment and flags, then
//! dispatches to the library.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use termcolor::{ColorChoice, StandardStream};

use crate::cli::args::{Command, FixtureArgs, HarnessArgs, OutputFormat};
use crate::config::HarnessConfig;
use crate::discovery::FixtureDiscoverer;
use crate::errors::{HarnessError, HarnessResult};
use crate::runner::{run_all, RunOptions};
use crate::{logging, report, version};

pub mod args;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// The main entry point for the CLI. Returns the process exit code.
pub fn run() -> i32 {
    logging::init();
    let args = HarnessArgs::parse();

    let result = match args.command {
        Command::Run {
            fixtures,
            filter,
            timeout,
            shell,
            repo,
            check_repo,
            no_color,
            format,
        } => load_config(fixtures.config.as_deref()).and_then(|mut config| {
            apply_fixture_args(&mut config, fixtures);
            if let Some(secs) = timeout {
                config.timeout = Duration::from_secs(secs);
            }
            if let Some(mode) = shell {
                config.shell_mode = mode;
            }
            if let Some(url) = repo {
                config.repo_url = url;
            }
            if no_color {
                config.use_colors = false;
            }
            handle_run(&config, RunOptions { filter, check_repo }, format)
        }),
        Command::List { fixtures } => {
            load_config(fixtures.config.as_deref()).and_then(|mut config| {
                apply_fixture_args(&mut config, fixtures);
                handle_list(&config)
            })
        }
        Command::CheckRepo {
            repo,
            timeout,
            config,
        } => load_config(config.as_deref()).and_then(|mut config| {
            if let Some(url) = repo {
                config.repo_url = url;
            }
            if let Some(secs) = timeout {
                config.timeout = Duration::from_secs(secs);
            }
            handle_check_repo(&config)
        }),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            EXIT_USAGE
        }
    }
}

fn load_config(path: Option<&Path>) -> HarnessResult<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_yaml_file(path),
        None => Ok(HarnessConfig::from_env()),
    }
}

fn apply_fixture_args(config: &mut HarnessConfig, args: FixtureArgs) {
    if let Some(root) = args.root {
        config.fixture_root = root;
    }
    if !args.groups.is_empty() {
        config.groups = args.groups;
    }
}

fn io_error(source: std::io::Error) -> HarnessError {
    HarnessError::Io {
        path: "<stdout>".into(),
        source,
    }
}

/// Handles the `run` subcommand.
fn handle_run(
    config: &HarnessConfig,
    options: RunOptions,
    format: OutputFormat,
) -> HarnessResult<i32> {
    let reports = run_all(config, &options)?;
    let summary = match format {
        OutputFormat::Text => {
            let choice = if config.use_colors {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            };
            let mut stdout = StandardStream::stdout(choice);
            report::write_text(&mut stdout, &reports).map_err(io_error)?
        }
        OutputFormat::Json => {
            let json = report::to_json(&reports).map_err(|e| HarnessError::Config {
                message: format!("failed to serialize report: {e}"),
            })?;
            println!("{json}");
            crate::runner::RunSummary::from_reports(&reports)
        }
    };
    Ok(if summary.is_success() {
        EXIT_OK
    } else {
        EXIT_FAILED
    })
}

/// Handles the `list` subcommand.
fn handle_list(config: &HarnessConfig) -> HarnessResult<i32> {
    let triples = FixtureDiscoverer::new(
        &config.fixture_root,
        &config.groups,
        &config.input_extension,
    )
    .discover()?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for triple in &triples {
        writeln!(out, "{}\t{}", triple.id(), triple.input.display()).map_err(io_error)?;
    }
    Ok(EXIT_OK)
}

/// Handles the `check-repo` subcommand.
fn handle_check_repo(config: &HarnessConfig) -> HarnessResult<i32> {
    match version::check_repo(config) {
        Ok(()) => {
            println!("{}: ok", config.version_url());
            Ok(EXIT_OK)
        }
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            Ok(EXIT_FAILED)
        }
    }
}
