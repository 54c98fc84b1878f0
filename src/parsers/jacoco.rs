/// Parser for JaCoCo XML coverage reports.
///
/// JaCoCo XML structure:
///   <report name="...">
///     <sessioninfo id="..." start="..." dump="..."/>
///     <package name="com/example">
///       <class name="com/example/Foo" sourcefilename="Foo.java">
///         <method name="doStuff" desc="()V" line="10">
///           <counter type="INSTRUCTION" missed="0" covered="5"/>
///           <counter type="LINE" missed="0" covered="3"/>
///         </method>
///         <counter type="LINE" missed="1" covered="5"/>
///       </class>
///       <sourcefile name="Foo.java">
///         <line nr="10" mi="0" ci="3" mb="0" cb="2"/>
///         <line nr="11" mi="0" ci="5" mb="1" cb="1"/>
///         <counter type="LINE" missed="1" covered="5"/>
///       </sourcefile>
///       <counter type="LINE" missed="1" covered="5"/>
///     </package>
///     <counter type="LINE" missed="1" covered="5"/>
///   </report>
///
/// Parsing happens in two stages: `parsers::xml` produces a generic element
/// tree, and this module converts it into the typed `JacocoReport`, turning
/// the numeric attributes into integers. Optional counts that are absent or
/// empty stay `None` ("not measured") rather than becoming zero.
use std::str::FromStr;

use super::xml::{parse_tree, Element};
use super::Parser;
use crate::error::{CovcheckError, Result};
use crate::model::*;

/// JaCoCo XML format parser.
pub struct JacocoParser;

impl Parser for JacocoParser {
    type Output = JacocoReport;

    fn parse(&self, input: &[u8]) -> Result<JacocoReport> {
        parse(input)
    }
}

/// Parse JaCoCo XML coverage data from raw bytes.
pub fn parse(input: &[u8]) -> Result<JacocoReport> {
    let root = parse_tree(input)?;
    convert_report(&root)
}

/// Convert a generic element tree rooted at `<report>` into the typed model.
pub fn convert_report(root: &Element) -> Result<JacocoReport> {
    if root.name != "report" {
        return Err(CovcheckError::InvalidReport(format!(
            "expected <report> root element, found <{}>",
            root.name
        )));
    }
    Ok(JacocoReport {
        name: root.attr("name").unwrap_or_default().to_string(),
        packages: root
            .children_named("package")
            .map(convert_package)
            .collect::<Result<_>>()?,
        counters: convert_counters(root)?,
    })
}

fn convert_package(e: &Element) -> Result<Package> {
    Ok(Package {
        name: required_str(e, "name")?,
        classes: e
            .children_named("class")
            .map(convert_class)
            .collect::<Result<_>>()?,
        sourcefiles: e
            .children_named("sourcefile")
            .map(convert_sourcefile)
            .collect::<Result<_>>()?,
        counters: convert_counters(e)?,
    })
}

fn convert_class(e: &Element) -> Result<Class> {
    Ok(Class {
        name: required_str(e, "name")?,
        sourcefilename: e.attr("sourcefilename").map(str::to_string),
        methods: e
            .children_named("method")
            .map(|m| {
                Ok(Method {
                    name: required_str(m, "name")?,
                    desc: m.attr("desc").map(str::to_string),
                    line: optional_num(m, "line")?,
                    counters: convert_counters(m)?,
                })
            })
            .collect::<Result<_>>()?,
        counters: convert_counters(e)?,
    })
}

fn convert_sourcefile(e: &Element) -> Result<SourceFile> {
    Ok(SourceFile {
        name: required_str(e, "name")?,
        lines: e
            .children_named("line")
            .map(|l| {
                Ok(Line {
                    nr: required_num(l, "nr")?,
                    mi: optional_num(l, "mi")?,
                    ci: optional_num(l, "ci")?,
                    mb: optional_num(l, "mb")?,
                    cb: optional_num(l, "cb")?,
                })
            })
            .collect::<Result<_>>()?,
        counters: convert_counters(e)?,
    })
}

fn convert_counters(parent: &Element) -> Result<Vec<Counter>> {
    parent
        .children_named("counter")
        .map(|c| {
            let kind_str = required_str(c, "type")?;
            let kind = CounterType::from_str(&kind_str).map_err(|()| {
                CovcheckError::InvalidReport(format!("unknown counter type '{kind_str}'"))
            })?;
            Ok(Counter {
                kind,
                missed: required_num(c, "missed")?,
                covered: required_num(c, "covered")?,
            })
        })
        .collect()
}

fn required_str(e: &Element, key: &str) -> Result<String> {
    e.attr(key).map(str::to_string).ok_or_else(|| {
        CovcheckError::InvalidReport(format!("<{}> is missing attribute '{key}'", e.name))
    })
}

fn required_num<T: FromStr>(e: &Element, key: &str) -> Result<T> {
    optional_num(e, key)?.ok_or_else(|| {
        CovcheckError::InvalidReport(format!("<{}> is missing attribute '{key}'", e.name))
    })
}

/// Absent or empty → `None`; anything else must be a valid integer.
fn optional_num<T: FromStr>(e: &Element, key: &str) -> Result<Option<T>> {
    match e.attr(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            CovcheckError::InvalidReport(format!(
                "<{}> attribute '{key}' is not a number: '{raw}'",
                e.name
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jacoco() {
        let input = include_bytes!("../../tests/fixtures/sample_jacoco.xml");
        let report = parse(input).unwrap();

        assert_eq!(report.name, "sample");
        assert_eq!(report.packages.len(), 1);

        let pkg = &report.packages[0];
        assert_eq!(pkg.name, "com/example");
        assert_eq!(pkg.sourcefiles.len(), 2);
        assert_eq!(pkg.classes.len(), 1);

        let class = &pkg.classes[0];
        assert_eq!(class.sourcefilename.as_deref(), Some("Foo.java"));
        assert_eq!(class.methods.len(), 2);
        assert_eq!(class.methods[1].name, "doStuff");
        assert_eq!(class.methods[1].desc.as_deref(), Some("()V"));
        assert_eq!(class.methods[1].line, Some(10));

        let foo = &pkg.sourcefiles[0];
        assert_eq!(foo.name, "Foo.java");
        assert_eq!(foo.lines.len(), 6);
        assert_eq!(
            foo.lines[0],
            Line {
                nr: 3,
                mi: Some(0),
                ci: Some(3),
                mb: Some(0),
                cb: Some(0),
            }
        );
        assert!(foo.lines[3].is_missed()); // nr=12, ci=0

        let line = find_counter(&foo.counters, CounterType::Line).unwrap();
        assert_eq!((line.missed, line.covered), (2, 4));

        let report_line = find_counter(&report.counters, CounterType::Line).unwrap();
        assert_eq!((report_line.missed, report_line.covered), (3, 5));
    }

    #[test]
    fn test_absent_counts_are_not_zero() {
        let input = br#"<report name="r"><package name="p"><sourcefile name="A.java">
            <line nr="1"/>
            <line nr="2" ci="" mi="4"/>
            <line nr="3" ci="0"/>
        </sourcefile></package></report>"#;
        let report = parse(input).unwrap();
        let lines = &report.packages[0].sourcefiles[0].lines;
        assert_eq!(lines[0].ci, None);
        assert_eq!(lines[1].ci, None);
        assert_eq!(lines[1].mi, Some(4));
        assert_eq!(lines[2].ci, Some(0));
        assert!(!lines[0].is_missed());
        assert!(lines[2].is_missed());
    }

    #[test]
    fn test_parse_jacoco_empty() {
        let report = parse(br#"<?xml version="1.0"?><report name="empty"/>"#).unwrap();
        assert!(report.packages.is_empty());
        assert!(report.counters.is_empty());
    }

    #[test]
    fn test_parse_jacoco_with_doctype() {
        let input = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><!DOCTYPE report PUBLIC "-//JACOCO//DTD Report 1.1//EN" "report.dtd"><report name="x"><package name="p"/></report>"#;
        let report = parse(input).unwrap();
        assert_eq!(report.packages.len(), 1);
        assert!(report.packages[0].sourcefiles.is_empty());
    }

    #[test]
    fn test_parse_jacoco_malformed() {
        let input = include_bytes!("../../tests/fixtures/malformed_jacoco.xml");
        let err_msg = parse(input).unwrap_err().to_string();
        assert!(
            err_msg.contains("position"),
            "Error should contain position info: {err_msg}",
        );
    }

    #[test]
    fn test_wrong_root_element() {
        let err = parse(br#"<coverage version="1"/>"#).unwrap_err();
        assert!(err.to_string().contains("expected <report>"), "{err}");
    }

    #[test]
    fn test_line_without_nr() {
        let input = br#"<report name="r"><package name="p"><sourcefile name="A.java"><line ci="1"/></sourcefile></package></report>"#;
        let err = parse(input).unwrap_err();
        assert!(err.to_string().contains("missing attribute 'nr'"), "{err}");
    }

    #[test]
    fn test_non_numeric_count() {
        let input = br#"<report name="r"><package name="p"><counter type="LINE" missed="lots" covered="1"/></package></report>"#;
        let err = parse(input).unwrap_err();
        assert!(err.to_string().contains("not a number"), "{err}");
    }

    #[test]
    fn test_unknown_counter_type() {
        let input = br#"<report name="r"><counter type="BYTES" missed="0" covered="1"/></report>"#;
        let err = parse(input).unwrap_err();
        assert!(err.to_string().contains("unknown counter type 'BYTES'"), "{err}");
    }
}
