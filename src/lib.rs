pub mod annotate;
pub mod baseline;
pub mod calc;
pub mod cli;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod github;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod ranges;
pub mod report;
