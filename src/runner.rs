//! The fixture runner.
//!
//! One case per fixture triple: load the three files, build the invocation,
//! execute it, then assert exit status 0 and, when the golden file is non-empty,
//! trimmed stdout equality. Cases share nothing but the read-only fixture tree,
//! so a setup error or failure in one case never affects its siblings.

use serde::Serialize;
use tracing::{debug, info};

use crate::command::Invocation;
use crate::config::HarnessConfig;
use crate::discovery::{FixtureDiscoverer, FixtureTriple};
use crate::errors::{HarnessError, HarnessResult};
use crate::exec::{execute, ExecutionResult};
use crate::version::check_repo;

// =============================================================================
// CORE TYPES
// =============================================================================

/// Why a case that ran to completion did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// The command exited with something other than 0.
    ExitStatus {
        expected: i32,
        /// `None` when the process died from a signal.
        actual: Option<i32>,
        command: String,
        stdout: String,
        stderr: String,
    },
    /// Trimmed stdout differed from the trimmed golden output.
    OutputMismatch {
        expected: String,
        actual: String,
        command: String,
    },
}

/// The outcome of one case.
#[derive(Debug)]
pub enum CaseOutcome {
    Pass,
    Fail(Failure),
    /// Setup or execution error; the assertions never ran.
    Error(HarnessError),
    Skipped(String),
}

impl CaseOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, CaseOutcome::Pass)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaseOutcome::Pass => "pass",
            CaseOutcome::Fail(_) => "fail",
            CaseOutcome::Error(_) => "error",
            CaseOutcome::Skipped(_) => "skip",
        }
    }
}

/// A named outcome, as collected by [`run_all`].
#[derive(Debug)]
pub struct CaseReport {
    pub id: String,
    pub outcome: CaseOutcome,
}

/// Counts for a full run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[CaseReport]) -> Self {
        let mut summary = RunSummary {
            total: reports.len(),
            ..Default::default()
        };
        for r in reports {
            match r.outcome {
                CaseOutcome::Pass => summary.passed += 1,
                CaseOutcome::Fail(_) => summary.failed += 1,
                CaseOutcome::Error(_) => summary.errors += 1,
                CaseOutcome::Skipped(_) => summary.skipped += 1,
            }
        }
        summary
    }

    /// True when nothing failed or errored.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Options for [`run_all`] beyond the harness config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only cases whose id contains this substring (case-insensitive) run.
    pub filter: Option<String>,
    /// Probe `<repo>/version` as an extra case before the fixtures.
    pub check_repo: bool,
}

pub const REPO_CHECK_ID: &str = "repo/version";

// =============================================================================
// SINGLE CASE
// =============================================================================

/// Runs one fixture triple.
pub fn run_fixture(triple: &FixtureTriple, config: &HarnessConfig) -> CaseOutcome {
    match try_run_fixture(triple, config) {
        Ok(Ok(())) => CaseOutcome::Pass,
        Ok(Err(failure)) => CaseOutcome::Fail(failure),
        Err(err) => CaseOutcome::Error(err),
    }
}

fn try_run_fixture(
    triple: &FixtureTriple,
    config: &HarnessConfig,
) -> HarnessResult<Result<(), Failure>> {
    let contents = triple.load()?;
    let invocation = Invocation::from_template(&contents.command, &contents.input, config)?
        .with_cwd(&config.fixture_root);
    debug!(case = %triple.id(), command = %invocation.display(), "running fixture");
    let result = execute(&invocation, config.timeout)?;
    Ok(assert_result(&result, &contents.expected, &invocation.display()))
}

/// Applies the two assertions to a finished execution.
///
/// A zero-byte golden output means only the exit status is checked. Any other
/// golden output, whitespace-only included, is compared after trimming.
pub fn assert_result(result: &ExecutionResult, expected: &str, command: &str) -> Result<(), Failure> {
    if !result.success() {
        return Err(Failure::ExitStatus {
            expected: 0,
            actual: result.exit_code,
            command: command.to_string(),
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
        });
    }
    if expected.is_empty() {
        return Ok(());
    }
    let want = expected.trim();
    let got = result.stdout.trim();
    if want != got {
        return Err(Failure::OutputMismatch {
            expected: want.to_string(),
            actual: got.to_string(),
            command: command.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// FULL RUN
// =============================================================================

/// Skip reason for a case id under `filter`, if any.
pub fn skip_reason(id: &str, filter: Option<&str>) -> Option<String> {
    let f = filter?;
    if id.to_lowercase().contains(&f.to_lowercase()) {
        None
    } else {
        Some(format!("filtered out by substring: {f}"))
    }
}

/// Discovers and runs every case, returning one report per case in order.
///
/// Discovery failures abort the run; everything after discovery is per case.
pub fn run_all(config: &HarnessConfig, options: &RunOptions) -> HarnessResult<Vec<CaseReport>> {
    let triples = FixtureDiscoverer::new(
        &config.fixture_root,
        &config.groups,
        &config.input_extension,
    )
    .discover()?;
    info!(
        root = %config.fixture_root.display(),
        fixtures = triples.len(),
        "starting run"
    );

    let filter = options.filter.as_deref();
    let mut reports = Vec::with_capacity(triples.len() + 1);

    if options.check_repo {
        let outcome = match skip_reason(REPO_CHECK_ID, filter) {
            Some(reason) => CaseOutcome::Skipped(reason),
            None => match check_repo(config) {
                Ok(()) => CaseOutcome::Pass,
                Err(err) => CaseOutcome::Error(err),
            },
        };
        reports.push(CaseReport {
            id: REPO_CHECK_ID.to_string(),
            outcome,
        });
    }

    for triple in &triples {
        let id = triple.id();
        let outcome = match skip_reason(&id, filter) {
            Some(reason) => CaseOutcome::Skipped(reason),
            None => run_fixture(triple, config),
        };
        debug!(case = %id, outcome = outcome.label(), "case finished");
        reports.push(CaseReport { id, outcome });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(code: Option<i32>, stdout: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code: code,
            stdout: stdout.to_string(),
            stderr: String::new(),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn trimmed_output_matches() {
        assert!(assert_result(&result(Some(0), "\n  HELLO \n"), "HELLO\n", "tool").is_ok());
    }

    #[test]
    fn empty_expected_checks_only_exit_code() {
        assert!(assert_result(&result(Some(0), "anything"), "", "tool").is_ok());
        let err = assert_result(&result(Some(1), ""), "", "tool").unwrap_err();
        assert!(matches!(err, Failure::ExitStatus { actual: Some(1), .. }));
    }

    #[test]
    fn whitespace_only_expected_is_compared() {
        let err = assert_result(&result(Some(0), "x"), "\n", "tool").unwrap_err();
        assert!(matches!(err, Failure::OutputMismatch { .. }));
    }

    #[test]
    fn exit_status_is_checked_before_output() {
        let err = assert_result(&result(None, "HELLO"), "HELLO", "tool").unwrap_err();
        assert!(matches!(err, Failure::ExitStatus { actual: None, .. }));
    }

    #[test]
    fn mismatch_carries_trimmed_strings() {
        let err = assert_result(&result(Some(0), " hello \n"), "HELLO\n", "tool").unwrap_err();
        assert_eq!(
            err,
            Failure::OutputMismatch {
                expected: "HELLO".to_string(),
                actual: "hello".to_string(),
                command: "tool".to_string(),
            }
        );
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        assert_eq!(skip_reason("01/Write", Some("write")), None);
        assert!(skip_reason("01/read", Some("write")).is_some());
        assert_eq!(skip_reason("01/read", None), None);
    }

    #[test]
    fn summary_counts_each_outcome() {
        let reports = vec![
            CaseReport { id: "a".into(), outcome: CaseOutcome::Pass },
            CaseReport {
                id: "b".into(),
                outcome: CaseOutcome::Skipped("filtered".into()),
            },
            CaseReport {
                id: "c".into(),
                outcome: CaseOutcome::Error(HarnessError::Config { message: "x".into() }),
            },
        ];
        let summary = RunSummary::from_reports(&reports);
        assert_eq!(
            summary,
            RunSummary { total: 3, passed: 1, failed: 0, errors: 1, skipped: 1 }
        );
        assert!(!summary.is_success());
    }
}
