//! Turning parsed reports into check-run annotations.
//!
//! Both pipelines emit, per file with missed lines, a "coverage dropped"
//! summary pinned to line 1 followed by one annotation per missed range.
//! Files without missed lines produce nothing.

use std::path::Path;

use anyhow::Result;

use crate::baseline;
use crate::calc;
use crate::diagnostics::Diagnostics;
use crate::ingest;
use crate::model::*;
use crate::ranges::{missed_line_ranges, missed_ranges};

/// JaCoCo files at or above this line coverage percentage are not annotated.
pub const JACOCO_COVERAGE_GATE: f64 = 90.0;

/// A source of repository-relative paths touched by the change under review.
pub trait ChangedFiles {
    fn changed_files(&self) -> Result<Vec<String>>;
}

impl ChangedFiles for Vec<String> {
    fn changed_files(&self) -> Result<Vec<String>> {
        Ok(self.clone())
    }
}

/// Builds annotations at a fixed severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Annotator {
    pub level: AnnotationLevel,
}

impl Annotator {
    pub fn new(level: AnnotationLevel) -> Self {
        Self { level }
    }

    /// Annotate a line-array report, skipping files identical to the
    /// baseline.
    ///
    /// `total_coverage` is the sum of the `coverage` of every emitted
    /// annotation; each annotation of a file carries that file's percentage.
    #[must_use]
    pub fn annotate_simplecov(
        &self,
        current: &CoverageReport,
        baseline: Option<&CoverageReport>,
    ) -> TotalCoverageInfo {
        let mut annotations = Vec::new();

        for file in baseline::changed_files(current, baseline) {
            if !file.has_missed() {
                continue;
            }
            let coverage = calc::file_coverage(file);
            let path = normalize_path(&file.name);

            annotations.push(self.annotation(
                path,
                MissedRange { start: 1, end: 1 },
                coverage,
                format!("Coverage dropped to {coverage:.2}%."),
            ));
            for range in missed_ranges(&file.markers) {
                annotations.push(self.annotation(path, range, coverage, missed_message(range)));
            }
        }

        let total_coverage = annotations.iter().map(|a| a.coverage).sum();
        TotalCoverageInfo {
            total_coverage,
            annotations,
        }
    }

    /// Annotate a JaCoCo report. Only source files that map onto one of
    /// `changed_files` and sit below [`JACOCO_COVERAGE_GATE`] are annotated,
    /// under the matched repository path.
    ///
    /// `total_coverage` is the project line coverage as a fraction (0-1)
    /// over every source file in the report.
    #[must_use]
    pub fn annotate_jacoco(
        &self,
        report: &JacocoReport,
        changed_files: &[String],
    ) -> TotalCoverageInfo {
        let mut annotations = Vec::new();

        for package in &report.packages {
            for file in &package.sourcefiles {
                let coverage = calc::sourcefile_coverage(file);
                if coverage >= JACOCO_COVERAGE_GATE {
                    continue;
                }
                let Some(path) = repository_path(&package.name, &file.name, changed_files) else {
                    continue;
                };
                let ranges = missed_line_ranges(&file.lines);
                if ranges.is_empty() {
                    continue;
                }

                annotations.push(self.annotation(
                    path,
                    MissedRange { start: 1, end: 1 },
                    coverage,
                    format!("Coverage dropped to {coverage:.2}% in {}", file.name),
                ));
                for range in ranges {
                    annotations.push(self.annotation(path, range, 0.0, missed_message(range)));
                }
            }
        }

        TotalCoverageInfo {
            total_coverage: calc::project_totals(report).fraction(),
            annotations,
        }
    }

    fn annotation(
        &self,
        path: &str,
        range: MissedRange,
        coverage: f64,
        message: String,
    ) -> Annotation {
        Annotation {
            path: path.to_string(),
            start_line: range.start,
            end_line: range.end,
            annotation_level: self.level,
            coverage,
            message,
        }
    }
}

fn missed_message(range: MissedRange) -> String {
    if range.is_single_line() {
        format!("Missed coverage on line: {range}")
    } else {
        format!("Missed coverage on lines: {range}")
    }
}

/// The changed repository path ending in `package/sourcefile`. The match
/// must start at a path component, so `App.java` never matches `MyApp.java`.
fn repository_path<'a>(
    package: &str,
    sourcefile: &str,
    changed_files: &'a [String],
) -> Option<&'a str> {
    let joined = format!("{package}/{sourcefile}");
    let suffix = normalize_path(&joined);
    changed_files
        .iter()
        .map(String::as_str)
        .find(|path| {
            path.strip_suffix(suffix)
                .is_some_and(|rest| rest.is_empty() || rest.ends_with('/'))
        })
}

/// Read a line-array report (and optional baseline) from disk and annotate
/// it. Report failures abort; baseline failures only produce a warning.
pub fn compute_coverage(
    report_path: &Path,
    baseline_path: Option<&Path>,
    annotator: &Annotator,
    diag: &dyn Diagnostics,
) -> Result<TotalCoverageInfo> {
    diag.info(&format!("Coverage report path: {}", report_path.display()));
    let current = ingest::load_simplecov(report_path)?;
    let baseline = baseline::load_baseline(baseline_path, diag);

    let info = annotator.annotate_simplecov(&current, baseline.as_ref());
    diag.info(&format!(
        "{} files in report, {} annotations",
        current.files.len(),
        info.annotations.len()
    ));
    Ok(info)
}

/// Read a JaCoCo report from disk and annotate the files in the change set.
pub fn compute_coverage_xml(
    report_path: &Path,
    changed: &dyn ChangedFiles,
    annotator: &Annotator,
    diag: &dyn Diagnostics,
) -> Result<TotalCoverageInfo> {
    diag.info(&format!("Coverage report path: {}", report_path.display()));
    let report = ingest::load_jacoco(report_path)?;
    let changed_files = changed.changed_files()?;

    let info = annotator.annotate_jacoco(&report, &changed_files);
    diag.info(&format!(
        "{} changed files, {} annotations, project coverage {:.2}%",
        changed_files.len(),
        info.annotations.len(),
        info.total_coverage * 100.0
    ));
    Ok(info)
}
