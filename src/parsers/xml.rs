//! Generic XML element tree.
//!
//! This is the first of two parsing stages: it only checks that the input is
//! well-formed and collects every element with its attributes as plain
//! strings. Interpreting those strings is left to the format-specific
//! conversion (see `parsers::jacoco`).
use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::xml_err;
use crate::error::{CovcheckError, Result};

/// An XML element with its attributes and child elements. Text content is
/// discarded; none of the supported formats carry data in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<Element>,
}

impl Element {
    /// Attribute value, if present.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Direct children with the given element name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Parse a complete XML document into its root element.
pub fn parse_tree(input: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(xml_err(e, &reader)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                let element = element_from(e, &reader)?;
                stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                let element = element_from(e, &reader)?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                // quick-xml has already checked that the end tag matches.
                if let Some(element) = stack.pop() {
                    attach(element, &mut stack, &mut root)?;
                }
            }
            // Text, CDATA, comments, DOCTYPE and processing instructions
            // carry nothing we use.
            Ok(_) => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(xml_err(
            quick_xml::Error::UnexpectedEof(format!("unclosed <{}>", open.name)),
            &reader,
        ));
    }

    root.ok_or_else(|| CovcheckError::InvalidReport("document has no root element".to_string()))
}

fn element_from<R>(start: &BytesStart, reader: &Reader<R>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = HashMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_err(e.into(), reader))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| xml_err(e, reader))?;
        attributes.insert(key, value.into_owned());
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

/// Hang a finished element on its parent, or make it the document root.
fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(CovcheckError::InvalidReport(format!(
                "unexpected second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}
