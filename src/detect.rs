/// Auto-detection of coverage file formats.
///
/// Strategy:
///   1. Check file extension for strong hints
///   2. Peek at the first bytes of the file content
///   3. Fall back to CLI --format override (handled by caller)
use std::path::Path;

use crate::error::CovcheckError;
use crate::parsers::simplecov::looks_like_simplecov;

/// Supported coverage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Simplecov,
    Jacoco,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Simplecov => "simplecov",
            Format::Jacoco => "jacoco",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovcheckError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simplecov" | "coveralls" | "json" => Ok(Format::Simplecov),
            "jacoco" | "xml" => Ok(Format::Jacoco),
            _ => Err(CovcheckError::Other(format!(
                "Unknown format: '{}'. Supported: simplecov, jacoco",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the coverage format from filename and file content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    if let Some(fmt) = detect_by_extension(path) {
        return Some(fmt);
    }
    detect_by_content(content)
}

fn detect_by_extension(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "xml" => Some(Format::Jacoco),
        "json" => Some(Format::Simplecov),
        _ => None,
    }
}

fn detect_by_content(content: &[u8]) -> Option<Format> {
    // We only need to look at the first few KB
    let head_len = content.len().min(4096);
    let head = String::from_utf8_lossy(&content[..head_len]);

    if looks_like_simplecov(&head) {
        return Some(Format::Simplecov);
    }

    let trimmed = head.trim_start();
    if (trimmed.starts_with("<?xml") || trimmed.starts_with('<'))
        && (head.contains("<report") || head.contains("JACOCO"))
    {
        return Some(Format::Jacoco);
    }

    None
}
