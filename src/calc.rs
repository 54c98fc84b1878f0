//! Coverage percentages for both report shapes.
//!
//! The two pipelines deliberately keep their own unit conventions: per-file
//! figures are percentages (0-100) everywhere, while the JaCoCo project
//! aggregate is a fraction (0-1).

use crate::model::{find_counter, CounterType, FileCoverage, JacocoReport, Marker, SourceFile};

/// Compute a coverage rate, returning `default` when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64, default: f64) -> f64 {
    if total == 0 {
        default
    } else {
        covered as f64 / total as f64
    }
}

/// Coverage percentage of a line-array file.
///
/// The denominator is the number of `null` (non-executable) markers, not the
/// number of executable lines. That is how the reports this tool consumes
/// have always been scored, so it is kept for compatibility even though it
/// is not "covered / executable". The result is clamped to `[0, 100]`
/// because `missed` can exceed the null count.
#[must_use]
pub fn file_coverage(file: &FileCoverage) -> f64 {
    let missed = file.missed_count() as u64;
    let total = file
        .markers
        .iter()
        .filter(|m| **m == Marker::NotExecutable)
        .count() as u64;
    let covered = total.saturating_sub(missed);
    rate(covered, total, 1.0) * 100.0
}

/// Missed and covered line counts from a source file's `LINE` counter.
/// A file without one counts as `(0, 0)`.
#[must_use]
pub fn line_counts(file: &SourceFile) -> (u64, u64) {
    find_counter(&file.counters, CounterType::Line)
        .map(|c| (c.missed, c.covered))
        .unwrap_or((0, 0))
}

/// Line coverage percentage of a JaCoCo source file; 0 when nothing was
/// measured.
#[must_use]
pub fn sourcefile_coverage(file: &SourceFile) -> f64 {
    let (missed, covered) = line_counts(file);
    rate(covered, missed.saturating_add(covered), 0.0) * 100.0
}

/// Running project-wide line totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineTotals {
    pub missed: u64,
    pub covered: u64,
}

impl LineTotals {
    pub fn add(&mut self, missed: u64, covered: u64) {
        self.missed = self.missed.saturating_add(missed);
        self.covered = self.covered.saturating_add(covered);
    }

    /// Project coverage as a fraction; 1.0 when nothing was measured.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        rate(self.covered, self.missed.saturating_add(self.covered), 1.0)
    }
}

/// Sum the `LINE` counters of every source file in the report.
#[must_use]
pub fn project_totals(report: &JacocoReport) -> LineTotals {
    let mut totals = LineTotals::default();
    for file in report.packages.iter().flat_map(|p| &p.sourcefiles) {
        let (missed, covered) = line_counts(file);
        totals.add(missed, covered);
    }
    totals
}
