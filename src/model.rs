//! In-memory representation of coverage reports and the annotations derived
//! from them. Parsers produce either a `CoverageReport` (line-array JSON) or a
//! `JacocoReport` (JaCoCo XML); the annotation builder turns both into a
//! `TotalCoverageInfo`.

use serde::{Deserialize, Serialize};

/// GitHub rejects check runs carrying more annotations than this per request.
pub const MAX_CHECK_RUN_ANNOTATIONS: usize = 50;

/// Per-line coverage datum from a line-array report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<u64>")]
pub enum Marker {
    /// `null`: the line holds no executable code.
    NotExecutable,
    /// `0`: executable but never run.
    Missed,
    /// A positive execution count.
    Covered(u64),
}

impl From<Option<u64>> for Marker {
    fn from(value: Option<u64>) -> Self {
        match value {
            None => Marker::NotExecutable,
            Some(0) => Marker::Missed,
            Some(n) => Marker::Covered(n),
        }
    }
}

impl Marker {
    #[must_use]
    pub fn is_missed(self) -> bool {
        self == Marker::Missed
    }
}

/// Coverage data for a single source file in a line-array report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileCoverage {
    pub name: String,
    /// Raw source text (or digest). Only compared against the baseline.
    #[serde(default)]
    pub source: String,
    /// `markers[i]` describes line `i + 1`.
    #[serde(rename = "coverage")]
    pub markers: Vec<Marker>,
}

impl FileCoverage {
    pub fn new(name: impl Into<String>, markers: Vec<Marker>) -> Self {
        Self {
            name: name.into(),
            source: String::new(),
            markers,
        }
    }

    /// Number of lines that were executable but never run.
    #[must_use]
    pub fn missed_count(&self) -> usize {
        self.markers.iter().filter(|m| m.is_missed()).count()
    }

    #[must_use]
    pub fn has_missed(&self) -> bool {
        self.markers.iter().any(|m| m.is_missed())
    }
}

/// A parsed line-array ("simplecov"/coveralls style) report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CoverageReport {
    #[serde(rename = "source_files")]
    pub files: Vec<FileCoverage>,
}

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// JaCoCo
// ---------------------------------------------------------------------------

/// Counter kinds JaCoCo reports at every level of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterType {
    Instruction,
    Branch,
    Line,
    Complexity,
    Method,
    Class,
}

impl CounterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterType::Instruction => "INSTRUCTION",
            CounterType::Branch => "BRANCH",
            CounterType::Line => "LINE",
            CounterType::Complexity => "COMPLEXITY",
            CounterType::Method => "METHOD",
            CounterType::Class => "CLASS",
        }
    }
}

impl std::str::FromStr for CounterType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "INSTRUCTION" => Ok(CounterType::Instruction),
            "BRANCH" => Ok(CounterType::Branch),
            "LINE" => Ok(CounterType::Line),
            "COMPLEXITY" => Ok(CounterType::Complexity),
            "METHOD" => Ok(CounterType::Method),
            "CLASS" => Ok(CounterType::Class),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    pub kind: CounterType,
    pub missed: u64,
    pub covered: u64,
}

/// Find the counter of the given kind, if the element carries one.
#[must_use]
pub fn find_counter(counters: &[Counter], kind: CounterType) -> Option<&Counter> {
    counters.iter().find(|c| c.kind == kind)
}

/// One `<line>` of a `<sourcefile>`. Absent counts are `None`, not zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub nr: u32,
    pub mi: Option<u64>,
    pub ci: Option<u64>,
    pub mb: Option<u64>,
    pub cb: Option<u64>,
}

impl Line {
    /// A line is missed when JaCoCo measured it and no instruction ran.
    #[must_use]
    pub fn is_missed(&self) -> bool {
        self.ci == Some(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub desc: Option<String>,
    pub line: Option<u32>,
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub name: String,
    pub sourcefilename: Option<String>,
    pub methods: Vec<Method>,
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub lines: Vec<Line>,
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub classes: Vec<Class>,
    pub sourcefiles: Vec<SourceFile>,
    pub counters: Vec<Counter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JacocoReport {
    pub name: String,
    pub packages: Vec<Package>,
    pub counters: Vec<Counter>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// An inclusive, 1-indexed run of missed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissedRange {
    pub start: u32,
    pub end: u32,
}

impl MissedRange {
    #[must_use]
    pub fn is_single_line(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for MissedRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_single_line() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    Notice,
    Warning,
    #[default]
    Failure,
}

impl AnnotationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationLevel::Notice => "notice",
            AnnotationLevel::Warning => "warning",
            AnnotationLevel::Failure => "failure",
        }
    }
}

/// A single annotation to attach to a GitHub check run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Source file path relative to the repo root.
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub annotation_level: AnnotationLevel,
    /// Coverage percentage attributed to this annotation.
    pub coverage: f64,
    pub message: String,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TotalCoverageInfo {
    pub total_coverage: f64,
    pub annotations: Vec<Annotation>,
}

impl TotalCoverageInfo {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// The order-preserving prefix of `annotations` that fits in one check run.
#[must_use]
pub fn check_run_annotations(annotations: &[Annotation]) -> &[Annotation] {
    &annotations[..annotations.len().min(MAX_CHECK_RUN_ANNOTATIONS)]
}

/// Strip one leading `../` (or `..\`), or failing that one leading path
/// separator, so report paths line up with repository-relative paths.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    if let Some(rest) = path.strip_prefix("../").or_else(|| path.strip_prefix("..\\")) {
        return rest;
    }
    path.strip_prefix('/')
        .or_else(|| path.strip_prefix('\\'))
        .unwrap_or(path)
}
