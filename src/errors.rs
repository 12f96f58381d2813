//! Harness error types.
//!
//! Every failure the harness can hit outside of an assertion is a
//! [`HarnessError`]. Assertion failures (bad exit code, output mismatch) are not
//! errors; they are carried by [`crate::runner::Failure`] instead, so that a
//! fixture-setup problem and a failing command stay distinguishable in reports.

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Which member of a fixture triple a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixturePart {
    Input,
    Command,
    Expected,
}

impl FixturePart {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixturePart::Input => "input document",
            FixturePart::Command => "command template",
            FixturePart::Expected => "expected output",
        }
    }
}

impl std::fmt::Display for FixturePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("missing {part}: {}", path.display())]
    #[diagnostic(
        code(harness::fixture::missing),
        help("every input document needs a `.cmd` sibling and a file of the same name in the `_output` directory")
    )]
    MissingFixture { part: FixturePart, path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    #[diagnostic(code(harness::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture discovery failed: {message}")]
    #[diagnostic(code(harness::discovery))]
    Discovery { message: String },

    #[error("invalid command template: {message}")]
    #[diagnostic(
        code(harness::template),
        help("templates are one-line commands; use `--shell auto` to allow pipes and redirections")
    )]
    Template { message: String },

    #[error("failed to spawn `{program}`: {source}")]
    #[diagnostic(
        code(harness::spawn),
        help("check that the program is installed or that SEMCONCMD / OYDIDCMD point at it")
    )]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` did not exit within {}s and was killed", timeout.as_secs_f64())]
    #[diagnostic(code(harness::timeout), help("raise the limit with `--timeout`"))]
    Timeout { program: String, timeout: Duration },

    #[error("could not reach {url}: {message}")]
    #[diagnostic(
        code(harness::connectivity),
        help("is the repository service running? set SEMCONREPO to its base URL")
    )]
    Connectivity { url: String, message: String },

    #[error("{url} answered with HTTP {status}, expected 200")]
    #[diagnostic(code(harness::version_status))]
    VersionStatus { url: String, status: u16 },

    #[error("configuration error: {message}")]
    #[diagnostic(code(harness::config))]
    Config { message: String },
}

impl HarnessError {
    /// Maps a read failure on a fixture file to the right variant.
    ///
    /// `NotFound` becomes [`HarnessError::MissingFixture`]; anything else stays an I/O error.
    pub fn fixture_read(part: FixturePart, path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            HarnessError::MissingFixture { part, path }
        } else {
            HarnessError::Io { path, source }
        }
    }

    /// Short machine-readable kind, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::MissingFixture { .. } => "missing_fixture",
            HarnessError::Io { .. } => "io",
            HarnessError::Discovery { .. } => "discovery",
            HarnessError::Template { .. } => "template",
            HarnessError::Spawn { .. } => "spawn",
            HarnessError::Timeout { .. } => "timeout",
            HarnessError::Connectivity { .. } => "connectivity",
            HarnessError::VersionStatus { .. } => "version_status",
            HarnessError::Config { .. } => "config",
        }
    }
}
