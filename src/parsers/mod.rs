pub mod jacoco;
pub mod simplecov;
pub mod xml;

use quick_xml::Reader;

use crate::error::{CovcheckError, Result};

/// Every format parser implements this trait.
pub trait Parser {
    /// The typed report this format parses into.
    type Output;

    /// Parse the input bytes into the format's typed model.
    fn parse(&self, input: &[u8]) -> Result<Self::Output>;
}

/// Attach the reader's byte offset to a quick-xml error.
pub(crate) fn xml_err<R>(source: quick_xml::Error, reader: &Reader<R>) -> CovcheckError {
    CovcheckError::Xml {
        source,
        position: reader.buffer_position(),
    }
}
