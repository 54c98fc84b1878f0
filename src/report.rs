//! Output formatting for annotation results.

use std::fmt::Write;

use crate::detect::Format;
use crate::model::{check_run_annotations, Annotation, TotalCoverageInfo};

/// Title shown on the check run.
pub const CHECK_TITLE: &str = "Coverage check";

/// Outcome of a coverage run as reported to the review platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    Success,
    Failure,
}

impl Conclusion {
    pub fn of(info: &TotalCoverageInfo) -> Self {
        if info.is_clean() {
            Conclusion::Success
        } else {
            Conclusion::Failure
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
        }
    }

    /// One-line summary for the check-run output.
    pub fn summary(&self) -> &'static str {
        match self {
            Conclusion::Success => "Coverage stayed at 100%",
            Conclusion::Failure => "Coverage dropped",
        }
    }
}

/// Format `total_coverage` in the unit its pipeline uses.
#[must_use]
pub fn format_total(format: Format, total_coverage: f64) -> String {
    match format {
        // Fraction of covered lines across the whole project.
        Format::Jacoco => format!("{:.2}%", total_coverage * 100.0),
        // Sum of the per-annotation percentages.
        Format::Simplecov => format!("{total_coverage:.2}"),
    }
}

/// Plain text rendering for the terminal.
#[must_use]
pub fn format_text(format: Format, info: &TotalCoverageInfo) -> String {
    let mut out = String::new();
    let conclusion = Conclusion::of(info);

    writeln!(out, "{} ({})", conclusion.summary(), format).unwrap();
    writeln!(
        out,
        "Total coverage: {}",
        format_total(format, info.total_coverage)
    )
    .unwrap();

    if info.annotations.is_empty() {
        return out;
    }

    out.push('\n');
    for a in &info.annotations {
        writeln!(out, "{}", format_annotation(a)).unwrap();
    }

    let shown = check_run_annotations(&info.annotations).len();
    if shown < info.annotations.len() {
        writeln!(
            out,
            "\n{} annotations, only the first {shown} are posted to the check run",
            info.annotations.len()
        )
        .unwrap();
    }
    out
}

/// `path:start[-end] [level] message`
#[must_use]
pub fn format_annotation(a: &Annotation) -> String {
    let lines = if a.start_line == a.end_line {
        a.start_line.to_string()
    } else {
        format!("{}-{}", a.start_line, a.end_line)
    };
    format!(
        "{}:{} [{}] {}",
        a.path,
        lines,
        a.annotation_level.as_str(),
        a.message
    )
}
