use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::detect::{detect_format, Format};
use crate::error::{CovcheckError, Result};
use crate::model::{CoverageReport, JacocoReport};
use crate::parsers::jacoco::JacocoParser;
use crate::parsers::simplecov::SimplecovParser;
use crate::parsers::Parser;

/// A parsed report of either supported format.
#[derive(Debug, Clone)]
pub enum LoadedReport {
    Simplecov(CoverageReport),
    Jacoco(JacocoReport),
}

/// Read a report file fully into memory. An empty path is rejected before
/// touching the filesystem; I/O errors keep the OS message.
pub fn read_report(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str().is_empty() {
        return Err(CovcheckError::EmptyPath);
    }
    Ok(std::fs::read(path)?)
}

/// Decide which format `path` holds without reading the whole file: the
/// override if given, else extension and content sniffing.
pub fn resolve_format(path: &Path, format_override: Option<Format>) -> Result<Format> {
    if let Some(format) = format_override {
        return Ok(format);
    }
    if path.as_os_str().is_empty() {
        return Err(CovcheckError::EmptyPath);
    }
    let mut head = Vec::with_capacity(4096);
    File::open(path)?.take(4096).read_to_end(&mut head)?;
    detect_format(path, &head).ok_or(CovcheckError::UnknownFormat)
}

/// Read and parse a line-array JSON report.
pub fn load_simplecov(path: &Path) -> Result<CoverageReport> {
    let content = read_report(path)?;
    SimplecovParser.parse(&content)
}

/// Read and parse a JaCoCo XML report.
pub fn load_jacoco(path: &Path) -> Result<JacocoReport> {
    let content = read_report(path)?;
    JacocoParser.parse(&content)
}

/// Read a coverage file, auto-detect its format (or use the override) and
/// parse it.
pub fn load(path: &Path, format_override: Option<Format>) -> Result<LoadedReport> {
    let content = read_report(path)?;

    let format = match format_override {
        Some(format) => format,
        None => detect_format(path, &content).ok_or(CovcheckError::UnknownFormat)?,
    };

    parse_with_format(format, &content)
}

fn parse_with_format(format: Format, content: &[u8]) -> Result<LoadedReport> {
    match format {
        Format::Simplecov => SimplecovParser.parse(content).map(LoadedReport::Simplecov),
        Format::Jacoco => JacocoParser.parse(content).map(LoadedReport::Jacoco),
    }
}
