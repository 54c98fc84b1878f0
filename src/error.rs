use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovcheckError {
    #[error("coverage report path is empty")]
    EmptyPath,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("Invalid report: {0}")]
    InvalidReport(String),

    #[error("Unknown coverage format")]
    UnknownFormat,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CovcheckError>;
