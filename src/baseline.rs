//! Baseline comparison for line-array reports.
//!
//! A file is only worth annotating when its coverage data changed since the
//! baseline snapshot. "Unchanged" means the baseline holds an entry with the
//! same name, the same marker sequence and the same source text.

use std::path::Path;

use crate::diagnostics::Diagnostics;
use crate::ingest;
use crate::model::{CoverageReport, FileCoverage};

/// True when `baseline` contains an identical copy of `file`.
#[must_use]
pub fn is_unchanged(file: &FileCoverage, baseline: &CoverageReport) -> bool {
    baseline.files.iter().any(|base| {
        base.name == file.name && base.markers == file.markers && base.source == file.source
    })
}

/// Files of `current` that differ from the baseline, in report order.
/// Without a baseline every file is returned.
#[must_use]
pub fn changed_files<'a>(
    current: &'a CoverageReport,
    baseline: Option<&CoverageReport>,
) -> Vec<&'a FileCoverage> {
    match baseline {
        None => current.files.iter().collect(),
        Some(baseline) => current
            .files
            .iter()
            .filter(|file| !is_unchanged(file, baseline))
            .collect(),
    }
}

/// Load the baseline report, degrading to "no baseline" on any failure.
/// The failure is reported through `diag` and never aborts the run.
pub fn load_baseline(path: Option<&Path>, diag: &dyn Diagnostics) -> Option<CoverageReport> {
    let path = path?;
    match ingest::load_simplecov(path) {
        Ok(report) => {
            diag.info(&format!(
                "Loaded baseline report {} ({} files)",
                path.display(),
                report.files.len()
            ));
            Some(report)
        }
        Err(e) => {
            diag.warn(&format!(
                "Ignoring baseline report {}: {e}",
                path.display()
            ));
            None
        }
    }
}
