//! Command-line arguments for `semcon-harness`.
//!
//! Uses the `clap` derive API. Flags given here override the config file and the
//! environment.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ShellMode;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "semcon-harness",
    version,
    about = "Run golden-output fixtures against the semcon and oydid command-line tools."
)]
pub struct HarnessArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Where fixtures live and which groups to use.
#[derive(Debug, Clone, Args)]
pub struct FixtureArgs {
    /// Directory holding the `NN_input` / `NN_output` pairs.
    #[arg(long, short = 'r')]
    pub root: Option<PathBuf>,
    /// Only run this group (repeatable), e.g. `--group 01`.
    #[arg(long = "group", short = 'g')]
    pub groups: Vec<String>,
    /// YAML config file.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover and run all fixtures.
    Run {
        #[command(flatten)]
        fixtures: FixtureArgs,
        /// Run only cases whose `group/name` contains this substring.
        #[arg(long, short = 'f')]
        filter: Option<String>,
        /// Per-command timeout in seconds.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
        /// How command templates are executed.
        #[arg(long, value_enum)]
        shell: Option<ShellMode>,
        /// Base URL of the repository service (overrides SEMCONREPO).
        #[arg(long)]
        repo: Option<String>,
        /// Also probe `<repo>/version` as a case.
        #[arg(long)]
        check_repo: bool,
        /// Disable colored output.
        #[arg(long)]
        no_color: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List discovered fixtures without running them.
    List {
        #[command(flatten)]
        fixtures: FixtureArgs,
    },
    /// Probe `<repo>/version` and exit.
    CheckRepo {
        /// Base URL of the repository service (overrides SEMCONREPO).
        #[arg(long)]
        repo: Option<String>,
        /// Request timeout in seconds.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
        /// YAML config file.
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}
