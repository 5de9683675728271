//! Serializes the Cobertura tree to an XML document on an output stream.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::writer::Writer;

use crate::cobertura::{Class, Coverage, Line, Method, Package, Rates};
use crate::error::Result;

/// Write the document: a standalone XML declaration line followed by the
/// serialized tree. Attribute values are escaped by the writer; no
/// pretty-printing beyond well-formedness is guaranteed.
pub fn write<W: Write>(coverage: &Coverage, mut out: W) -> Result<()> {
    writeln!(out, r#"<?xml version="1.0" ?>"#)?;

    let mut writer = Writer::new(&mut out);
    write_coverage(&mut writer, coverage)?;

    writeln!(out)?;
    Ok(())
}

fn write_coverage<W: Write>(w: &mut Writer<W>, coverage: &Coverage) -> Result<()> {
    let mut el = BytesStart::new("coverage");
    el.push_attribute(("timestamp", coverage.timestamp.as_str()));
    push_rates(&mut el, &coverage.rates);
    w.write_event(Event::Start(el))?;

    w.write_event(Event::Start(BytesStart::new("packages")))?;
    for package in &coverage.packages {
        write_package(w, package)?;
    }
    w.write_event(Event::End(BytesEnd::new("packages")))?;

    w.write_event(Event::End(BytesEnd::new("coverage")))?;
    Ok(())
}

fn write_package<W: Write>(w: &mut Writer<W>, package: &Package) -> Result<()> {
    let mut el = BytesStart::new("package");
    el.push_attribute(("name", package.name.as_str()));
    push_rates(&mut el, &package.rates);
    w.write_event(Event::Start(el))?;

    w.write_event(Event::Start(BytesStart::new("classes")))?;
    for class in &package.classes {
        write_class(w, class)?;
    }
    w.write_event(Event::End(BytesEnd::new("classes")))?;

    w.write_event(Event::End(BytesEnd::new("package")))?;
    Ok(())
}

fn write_class<W: Write>(w: &mut Writer<W>, class: &Class) -> Result<()> {
    let mut el = BytesStart::new("class");
    el.push_attribute(("name", class.name.as_str()));
    el.push_attribute(("filename", class.filename.as_str()));
    push_rates(&mut el, &class.rates);
    w.write_event(Event::Start(el))?;

    w.write_event(Event::Start(BytesStart::new("methods")))?;
    for method in &class.methods {
        write_method(w, method)?;
    }
    w.write_event(Event::End(BytesEnd::new("methods")))?;

    write_lines(w, &class.lines)?;

    w.write_event(Event::End(BytesEnd::new("class")))?;
    Ok(())
}

fn write_method<W: Write>(w: &mut Writer<W>, method: &Method) -> Result<()> {
    let mut el = BytesStart::new("method");
    el.push_attribute(("name", method.name.as_str()));
    el.push_attribute(("signature", method.signature.as_str()));
    push_rates(&mut el, &method.rates);
    w.write_event(Event::Start(el))?;

    write_lines(w, &method.lines)?;

    w.write_event(Event::End(BytesEnd::new("method")))?;
    Ok(())
}

fn write_lines<W: Write>(w: &mut Writer<W>, lines: &[Line]) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new("lines")))?;
    for line in lines {
        write_line(w, line)?;
    }
    w.write_event(Event::End(BytesEnd::new("lines")))?;
    Ok(())
}

fn write_line<W: Write>(w: &mut Writer<W>, line: &Line) -> Result<()> {
    let mut el = BytesStart::new("line");
    let number = line.number.to_string();
    let hits = line.hits.to_string();
    el.push_attribute(("number", number.as_str()));
    el.push_attribute(("hits", hits.as_str()));

    match &line.branch {
        Some(detail) => {
            let condition_coverage = detail.condition_coverage();
            el.push_attribute(("branch", "true"));
            el.push_attribute(("condition-coverage", condition_coverage.as_str()));
            w.write_event(Event::Start(el))?;

            // One synthetic jump condition carrying the same percentage.
            w.write_event(Event::Start(BytesStart::new("conditions")))?;
            let mut condition = BytesStart::new("condition");
            let coverage = format!("{}%", detail.percentage);
            condition.push_attribute(("number", "0"));
            condition.push_attribute(("type", "jump"));
            condition.push_attribute(("coverage", coverage.as_str()));
            w.write_event(Event::Empty(condition))?;
            w.write_event(Event::End(BytesEnd::new("conditions")))?;

            w.write_event(Event::End(BytesEnd::new("line")))?;
        }
        None => {
            el.push_attribute(("branch", "false"));
            w.write_event(Event::Empty(el))?;
        }
    }
    Ok(())
}

fn push_rates(el: &mut BytesStart, rates: &Rates) {
    el.push_attribute(("line-rate", rates.line_rate.as_str()));
    el.push_attribute(("branch-rate", rates.branch_rate.as_str()));
    el.push_attribute(("complexity", rates.complexity.as_str()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cobertura::BranchDetail;

    fn rates() -> Rates {
        Rates {
            line_rate: "0.5".to_string(),
            branch_rate: "0.0".to_string(),
            complexity: "2".to_string(),
        }
    }

    fn render(coverage: &Coverage) -> String {
        let mut out = Vec::new();
        write(coverage, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_declaration_line() {
        let coverage = Coverage {
            timestamp: "1000.0".to_string(),
            rates: rates(),
            packages: Vec::new(),
        };
        let output = render(&coverage);
        assert!(output.starts_with("<?xml version=\"1.0\" ?>\n"));
        assert!(output.contains(
            r#"<coverage timestamp="1000.0" line-rate="0.5" branch-rate="0.0" complexity="2">"#
        ));
        assert!(output.contains("<packages></packages>"));
        assert!(output.ends_with("</coverage>\n"));
    }

    #[test]
    fn test_branch_line_rendering() {
        let coverage = Coverage {
            timestamp: "0.0".to_string(),
            rates: rates(),
            packages: vec![Package {
                name: "com.example".to_string(),
                rates: rates(),
                classes: vec![Class {
                    name: "com.example.Foo".to_string(),
                    filename: "com/example/Foo.kt".to_string(),
                    rates: rates(),
                    methods: Vec::new(),
                    lines: vec![
                        Line {
                            number: 10,
                            hits: 1,
                            branch: None,
                        },
                        Line {
                            number: 11,
                            hits: 1,
                            branch: Some(BranchDetail {
                                percentage: 75,
                                covered: 3,
                                total: 4,
                            }),
                        },
                    ],
                }],
            }],
        };
        let output = render(&coverage);
        assert!(output.contains(r#"<line number="10" hits="1" branch="false"/>"#));
        assert!(output
            .contains(r#"<line number="11" hits="1" branch="true" condition-coverage="75% (3/4)">"#));
        assert!(output
            .contains(r#"<conditions><condition number="0" type="jump" coverage="75%"/></conditions>"#));
        assert!(output.contains(r#"filename="com/example/Foo.kt""#));
    }

    #[test]
    fn test_method_name_escaping() {
        let coverage = Coverage {
            timestamp: "0.0".to_string(),
            rates: rates(),
            packages: vec![Package {
                name: "p".to_string(),
                rates: rates(),
                classes: vec![Class {
                    name: "p.C".to_string(),
                    filename: "p/C.kt".to_string(),
                    rates: rates(),
                    methods: vec![Method {
                        name: "<init>".to_string(),
                        signature: "()V".to_string(),
                        rates: rates(),
                        lines: Vec::new(),
                    }],
                    lines: Vec::new(),
                }],
            }],
        };
        let output = render(&coverage);
        assert!(output.contains(r#"name="&lt;init&gt;""#));
    }
}
