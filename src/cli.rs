//! Command handler functions for the covcheck CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;

use crate::annotate::{compute_coverage, compute_coverage_xml, Annotator, ChangedFiles};
use crate::detect::Format;
use crate::diagnostics::Diagnostics;
use crate::ingest::{self, LoadedReport};
use crate::model::{AnnotationLevel, TotalCoverageInfo};
use crate::ranges::{missed_line_ranges, missed_ranges};
use crate::report;

/// Severity for emitted annotations.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum Level {
    Notice,
    Warning,
    #[default]
    Failure,
}

impl From<Level> for AnnotationLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Notice => AnnotationLevel::Notice,
            Level::Warning => AnnotationLevel::Warning,
            Level::Failure => AnnotationLevel::Failure,
        }
    }
}

/// Inputs to one annotate run.
pub struct AnnotateOptions<'a> {
    pub report: &'a Path,
    pub baseline: Option<&'a Path>,
    pub format: Option<Format>,
    pub level: Level,
}

/// Detect the report format and run the matching pipeline. `changed` is
/// only consulted for JaCoCo reports; without it nothing maps onto the
/// repository and no annotations are produced.
pub fn run_annotate(
    opts: &AnnotateOptions,
    changed: Option<&dyn ChangedFiles>,
    diag: &dyn Diagnostics,
) -> Result<(Format, TotalCoverageInfo)> {
    let format = ingest::resolve_format(opts.report, opts.format)?;
    let annotator = Annotator::new(opts.level.into());

    let info = match format {
        Format::Simplecov => compute_coverage(opts.report, opts.baseline, &annotator, diag)?,
        Format::Jacoco => {
            if opts.baseline.is_some() {
                diag.warn("Baseline reports are only used with simplecov reports; ignoring");
            }
            let none: Vec<String> = Vec::new();
            let changed: &dyn ChangedFiles = match changed {
                Some(changed) => changed,
                None => {
                    diag.warn(
                        "No changed files given; JaCoCo files cannot be mapped to the repository",
                    );
                    &none
                }
            };
            compute_coverage_xml(opts.report, changed, &annotator, diag)?
        }
    };
    Ok((format, info))
}

pub fn cmd_annotate(
    opts: &AnnotateOptions,
    changed: Option<&dyn ChangedFiles>,
    diag: &dyn Diagnostics,
) -> Result<String> {
    let (format, info) = run_annotate(opts, changed, diag)?;
    Ok(report::format_text(format, &info))
}

/// List the missed line ranges of every file in a report.
pub fn cmd_ranges(path: &Path, format: Option<Format>) -> Result<String> {
    let mut out = String::new();

    match ingest::load(path, format)? {
        LoadedReport::Simplecov(report) => {
            for file in &report.files {
                write_ranges(&mut out, &file.name, &missed_ranges(&file.markers));
            }
        }
        LoadedReport::Jacoco(report) => {
            for package in &report.packages {
                for file in &package.sourcefiles {
                    let name = format!("{}/{}", package.name, file.name);
                    write_ranges(&mut out, &name, &missed_line_ranges(&file.lines));
                }
            }
        }
    }

    if out.is_empty() {
        out.push_str("No missed lines.\n");
    }
    Ok(out)
}

fn write_ranges(out: &mut String, name: &str, ranges: &[crate::model::MissedRange]) {
    if ranges.is_empty() {
        return;
    }
    let joined: Vec<String> = ranges.iter().map(ToString::to_string).collect();
    writeln!(out, "{name}: {}", joined.join(", ")).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_cmd_annotate_simplecov() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "coverage.json",
            r#"{"source_files": [{"name": "f.ts", "source": "x", "coverage": [null, 1, 0, 0, null]}]}"#,
        );
        let opts = AnnotateOptions {
            report: &path,
            baseline: None,
            format: None,
            level: Level::Failure,
        };
        let out = cmd_annotate(&opts, None, &RecordingDiagnostics::new()).unwrap();

        assert!(out.starts_with("Coverage dropped (simplecov)"), "{out}");
        assert!(out.contains("f.ts:1 [failure] Coverage dropped to 0.00%."), "{out}");
        assert!(out.contains("f.ts:3-4 [failure] Missed coverage on lines: 3-4"), "{out}");
    }

    #[test]
    fn test_cmd_annotate_jacoco_without_changed_files_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "report.xml",
            r#"<report name="r"><package name="p"><sourcefile name="A.java"><line nr="1" ci="0"/><counter type="LINE" missed="1" covered="0"/></sourcefile></package></report>"#,
        );
        let diag = RecordingDiagnostics::new();
        let opts = AnnotateOptions {
            report: &path,
            baseline: None,
            format: None,
            level: Level::Warning,
        };
        let (format, info) = run_annotate(&opts, None, &diag).unwrap();

        assert_eq!(format, Format::Jacoco);
        assert!(info.is_clean());
        assert_eq!(info.total_coverage, 0.0);
        assert!(diag.warnings()[0].contains("No changed files"));
    }

    #[test]
    fn test_cmd_annotate_jacoco_with_changed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "report.xml",
            r#"<report name="r"><package name="p"><sourcefile name="A.java"><line nr="1" ci="0"/><counter type="LINE" missed="1" covered="0"/></sourcefile></package></report>"#,
        );
        let changed = vec!["module/src/p/A.java".to_string()];
        let opts = AnnotateOptions {
            report: &path,
            baseline: None,
            format: None,
            level: Level::Warning,
        };
        let (_, info) = run_annotate(
            &opts,
            Some(&changed as &dyn ChangedFiles),
            &RecordingDiagnostics::new(),
        )
        .unwrap();

        assert_eq!(info.annotations.len(), 2);
        assert_eq!(info.annotations[0].annotation_level, AnnotationLevel::Warning);
        assert_eq!(info.annotations[1].message, "Missed coverage on line: 1");
    }

    #[test]
    fn test_cmd_annotate_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "coverage.out", "TN:\nSF:a.rs\n");
        let opts = AnnotateOptions {
            report: &path,
            baseline: None,
            format: None,
            level: Level::Failure,
        };
        let err = cmd_annotate(&opts, None, &RecordingDiagnostics::new()).unwrap_err();
        assert!(err.to_string().contains("Unknown coverage format"));
    }

    #[test]
    fn test_cmd_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "coverage.json",
            r#"{"source_files": [
                {"name": "a.ts", "coverage": [0, 0, 1, 0]},
                {"name": "b.ts", "coverage": [1, null]}
            ]}"#,
        );
        let out = cmd_ranges(&path, None).unwrap();
        assert_eq!(out, "a.ts: 1-2, 4\n");
    }

    #[test]
    fn test_cmd_ranges_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "c.json", r#"{"source_files": []}"#);
        assert_eq!(cmd_ranges(&path, None).unwrap(), "No missed lines.\n");
    }
}
