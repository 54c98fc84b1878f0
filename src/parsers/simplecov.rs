/// Parser for line-array JSON coverage reports (the coveralls
/// `source_files` shape, as emitted by simplecov and similar tools).
///
///   {
///     "source_files": [
///       { "name": "lib/foo.rb", "source": "...", "coverage": [null, 1, 0, 2] }
///     ]
///   }
///
/// `coverage[i]` is the execution count of line `i + 1`; `null` marks a line
/// with no executable code.
use super::Parser;
use crate::error::Result;
use crate::model::CoverageReport;

/// Line-array JSON parser.
pub struct SimplecovParser;

impl Parser for SimplecovParser {
    type Output = CoverageReport;

    fn parse(&self, input: &[u8]) -> Result<CoverageReport> {
        parse(input)
    }
}

/// Parse a line-array JSON report from raw bytes. serde_json's error
/// (with line and column) is passed through untouched.
pub fn parse(input: &[u8]) -> Result<CoverageReport> {
    Ok(serde_json::from_slice(input)?)
}

/// Content-based detection: a JSON object with a `source_files` key.
pub fn looks_like_simplecov(head: &str) -> bool {
    head.trim_start().starts_with('{') && head.contains("\"source_files\"")
}
