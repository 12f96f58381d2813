//! Run reporting.
//!
//! Text reports print one colored line per case, details for failures and
//! errors, and a summary. Output mismatches get a line diff. JSON reports carry
//! the same information for CI tooling.

use std::io::{self, Write};

use difference::{Changeset, Difference};
use serde::Serialize;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::runner::{CaseOutcome, CaseReport, Failure, RunSummary};

// ============================================================================
// TEXT
// ============================================================================

/// Writes a text report of `reports` to `out`.
pub fn write_text<W: WriteColor>(out: &mut W, reports: &[CaseReport]) -> io::Result<RunSummary> {
    for report in reports {
        write_case(out, report)?;
    }
    let summary = RunSummary::from_reports(reports);
    write_summary(out, &summary)?;
    Ok(summary)
}

fn write_case<W: WriteColor>(out: &mut W, report: &CaseReport) -> io::Result<()> {
    match &report.outcome {
        CaseOutcome::Pass => {
            tag(out, "PASS", Color::Green)?;
            writeln!(out, ": {}", report.id)
        }
        CaseOutcome::Skipped(reason) => {
            tag(out, "SKIP", Color::Yellow)?;
            writeln!(out, ": {} ({})", report.id, reason)
        }
        CaseOutcome::Error(err) => {
            tag(out, "ERROR", Color::Magenta)?;
            writeln!(out, ": {}", report.id)?;
            writeln!(out, "  {err}")
        }
        CaseOutcome::Fail(failure) => {
            tag(out, "FAIL", Color::Red)?;
            writeln!(out, ": {}", report.id)?;
            write_failure(out, failure)
        }
    }
}

fn write_failure<W: WriteColor>(out: &mut W, failure: &Failure) -> io::Result<()> {
    match failure {
        Failure::ExitStatus {
            expected,
            actual,
            command,
            stdout,
            stderr,
        } => {
            writeln!(out, "  Command: {command}")?;
            match actual {
                Some(code) => writeln!(out, "  Exit status: expected {expected}, got {code}")?,
                None => writeln!(out, "  Exit status: expected {expected}, killed by signal")?,
            }
            write_stream(out, "stdout", stdout)?;
            write_stream(out, "stderr", stderr)
        }
        Failure::OutputMismatch {
            expected,
            actual,
            command,
        } => {
            writeln!(out, "  Command: {command}")?;
            writeln!(out, "  Output did not match expected")?;
            writeln!(out, "  Diff:")?;
            write_diff(out, expected, actual)
        }
    }
}

fn write_stream<W: Write>(out: &mut W, name: &str, text: &str) -> io::Result<()> {
    let text = text.trim_end();
    if text.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {name}:")?;
    for line in text.lines() {
        writeln!(out, "    {line}")?;
    }
    Ok(())
}

/// Line diff of expected (`-`) against actual (`+`).
pub fn write_diff<W: WriteColor>(out: &mut W, expected: &str, actual: &str) -> io::Result<()> {
    let changeset = Changeset::new(expected, actual, "\n");
    for diff in &changeset.diffs {
        let (marker, color, text) = match diff {
            Difference::Same(x) => (' ', None, x),
            Difference::Rem(x) => ('-', Some(Color::Red), x),
            Difference::Add(x) => ('+', Some(Color::Green), x),
        };
        out.set_color(ColorSpec::new().set_fg(color))?;
        for line in text.split('\n') {
            writeln!(out, "  {marker}{line}")?;
        }
        out.reset()?;
    }
    Ok(())
}

fn write_summary<W: WriteColor>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(out)?;
    write!(out, "Test summary: total {}, ", summary.total)?;
    counted(out, "passed", summary.passed, Color::Green)?;
    write!(out, ", ")?;
    counted(out, "failed", summary.failed, Color::Red)?;
    write!(out, ", ")?;
    counted(out, "errors", summary.errors, Color::Magenta)?;
    write!(out, ", ")?;
    counted(out, "skipped", summary.skipped, Color::Yellow)?;
    writeln!(out)?;

    if !summary.is_success() {
        writeln!(out, "Result: FAILED")?;
    }
    Ok(())
}

fn tag<W: WriteColor>(out: &mut W, text: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{text}")?;
    out.reset()
}

fn counted<W: WriteColor>(out: &mut W, label: &str, n: usize, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(out, "{label}")?;
    out.reset()?;
    write!(out, " {n}")
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    summary: RunSummary,
    cases: Vec<JsonCase<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonCase<'a> {
    id: &'a str,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<&'a Failure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct JsonError {
    kind: &'static str,
    message: String,
}

/// Serializes `reports` and their summary as a pretty JSON document.
pub fn to_json(reports: &[CaseReport]) -> serde_json::Result<String> {
    let cases = reports
        .iter()
        .map(|r| JsonCase {
            id: &r.id,
            outcome: r.outcome.label(),
            failure: match &r.outcome {
                CaseOutcome::Fail(f) => Some(f),
                _ => None,
            },
            error: match &r.outcome {
                CaseOutcome::Error(e) => Some(JsonError {
                    kind: e.kind(),
                    message: e.to_string(),
                }),
                _ => None,
            },
            reason: match &r.outcome {
                CaseOutcome::Skipped(reason) => Some(reason.as_str()),
                _ => None,
            },
        })
        .collect();
    serde_json::to_string_pretty(&JsonReport {
        summary: RunSummary::from_reports(reports),
        cases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FixturePart, HarnessError};
    use std::path::PathBuf;
    use termcolor::Buffer;

    fn sample() -> Vec<CaseReport> {
        vec![
            CaseReport {
                id: "01/upper".into(),
                outcome: CaseOutcome::Pass,
            },
            CaseReport {
                id: "01/read".into(),
                outcome: CaseOutcome::Fail(Failure::OutputMismatch {
                    expected: "a\nb".into(),
                    actual: "a\nc".into(),
                    command: "semcon read".into(),
                }),
            },
            CaseReport {
                id: "01/gone".into(),
                outcome: CaseOutcome::Error(HarnessError::MissingFixture {
                    part: FixturePart::Command,
                    path: PathBuf::from("01_input/gone.cmd"),
                }),
            },
        ]
    }

    fn render(reports: &[CaseReport]) -> String {
        let mut buf = Buffer::no_color();
        write_text(&mut buf, reports).unwrap();
        String::from_utf8(buf.into_inner()).unwrap()
    }

    #[test]
    fn text_report_lists_cases_and_summary() {
        let text = render(&sample());
        assert!(text.contains("PASS: 01/upper"));
        assert!(text.contains("FAIL: 01/read"));
        assert!(text.contains("ERROR: 01/gone"));
        assert!(text.contains("missing command template: 01_input/gone.cmd"));
        assert!(text.contains(
            "Test summary: total 3, passed 1, failed 1, errors 1, skipped 0"
        ));
        assert!(text.contains("Result: FAILED"));
    }

    #[test]
    fn mismatch_is_shown_as_line_diff() {
        let text = render(&sample());
        assert!(text.contains("   a\n"));
        assert!(text.contains("  -b\n"));
        assert!(text.contains("  +c\n"));
    }

    #[test]
    fn exit_status_failure_shows_code_and_stderr() {
        let reports = vec![CaseReport {
            id: "02/bad".into(),
            outcome: CaseOutcome::Fail(Failure::ExitStatus {
                expected: 0,
                actual: Some(255),
                command: "semcon write".into(),
                stdout: "Error: empty or invalid payload\n".into(),
                stderr: String::new(),
            }),
        }];
        let text = render(&reports);
        assert!(text.contains("Exit status: expected 0, got 255"));
        assert!(text.contains("    Error: empty or invalid payload"));
        assert!(!text.contains("stderr:"));
    }

    #[test]
    fn json_report_shape() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        assert_eq!(json["summary"]["total"], 3);
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["cases"][0]["outcome"], "pass");
        assert_eq!(json["cases"][1]["failure"]["kind"], "output_mismatch");
        assert_eq!(json["cases"][2]["error"]["kind"], "missing_fixture");
        assert!(json["cases"][0].get("failure").is_none());
    }
}
