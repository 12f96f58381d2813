//! semcon-harness: golden-output fixture testing for command-line tools.
//!
//! Fixtures are `.doc` / `.cmd` / expected-output triples laid out in
//! `NN_input` and `NN_output` directories. Each triple is one independent case:
//! the input document is fed to the command on stdin, and the case passes when
//! the command exits 0 and its trimmed stdout equals the trimmed golden output
//! (or the golden file is empty).
//!
//! ```rust,no_run
//! use semcon_harness::{run_all, HarnessConfig, RunOptions, RunSummary};
//!
//! let config = HarnessConfig::from_env();
//! let reports = run_all(&config, &RunOptions::default()).unwrap();
//! assert!(RunSummary::from_reports(&reports).is_success());
//! ```

pub use crate::config::{HarnessConfig, ShellMode};
pub use crate::discovery::{FixtureContents, FixtureDiscoverer, FixtureTriple};
pub use crate::errors::{FixturePart, HarnessError, HarnessResult};
pub use crate::runner::{run_all, run_fixture, CaseOutcome, CaseReport, Failure, RunOptions, RunSummary};

pub mod cli;
pub mod command;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod runner;
pub mod version;
