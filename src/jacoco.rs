//! Parser for JaCoCo XML coverage reports.
//!
//! JaCoCo XML structure:
//!   <report name="...">
//!     <sessioninfo id="..." start="..." dump="..."/>
//!     <group name="...">          <!-- optional, may nest packages -->
//!       <package name="...">...</package>
//!     </group>
//!     <package name="com/example">
//!       <class name="com/example/Foo" sourcefilename="Foo.kt">
//!         <method name="doStuff" desc="()V" line="10">
//!           <counter type="INSTRUCTION" missed="0" covered="5"/>
//!           <counter type="BRANCH" missed="1" covered="3"/>
//!         </method>
//!         <counter type="LINE" missed="1" covered="5"/>
//!       </class>
//!       <sourcefile name="Foo.kt">
//!         <line nr="10" mi="0" ci="3" mb="0" cb="2"/>
//!         <counter type="LINE" missed="1" covered="5"/>
//!       </sourcefile>
//!       <counter type="LINE" missed="2" covered="7"/>
//!     </package>
//!     <counter type="LINE" missed="2" covered="7"/>
//!   </report>
//!
//! Packages nested inside `<group>` elements are flattened into the same
//! package list as top-level ones, in document order. quick-xml performs
//! no DTD processing or external entity resolution, so CI-supplied input
//! is parsed safely.

use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{ConvertError, Result};
use crate::model::*;

/// Parse a JaCoCo XML report from raw bytes into the typed model.
pub fn parse(input: &[u8]) -> Result<Report> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut report = Report::default();
    let mut session_seen = false;
    let mut buf = Vec::new();

    // State tracking: the innermost open element decides where counters
    // and lines attach.
    let mut current_package: Option<Package> = None;
    let mut current_class: Option<Class> = None;
    let mut current_method: Option<Method> = None;
    let mut current_sourcefile: Option<SourceFile> = None;
    let mut group_depth: usize = 0;

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_start_event = matches!(&event, Ok(Event::Start(_)));
        match event {
            Err(e) => return Err(xml_err(e, &reader)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"sessioninfo" => {
                    // The report may carry one sessioninfo per merged
                    // execution; the first one provides the timestamp.
                    if !session_seen {
                        let start = require_attr(e, "start", "sessioninfo")?;
                        report.session_start_ms = start.parse::<i64>().map_err(|_| {
                            ConvertError::Parse(format!(
                                "invalid sessioninfo start time: {start:?}"
                            ))
                        })?;
                        session_seen = true;
                    }
                }
                b"group" => {
                    if is_start_event {
                        group_depth += 1;
                    }
                }
                b"package" => {
                    let package = Package::new(require_attr(e, "name", "package")?);
                    if is_start_event {
                        current_package = Some(package);
                    } else {
                        report.packages.push(package);
                    }
                }
                b"class" => {
                    let class = Class {
                        name: require_attr(e, "name", "class")?,
                        methods: Vec::new(),
                        counters: CounterSet::default(),
                    };
                    if is_start_event {
                        current_class = Some(class);
                    } else if let Some(package) = current_package.as_mut() {
                        package.classes.push(class);
                    }
                }
                b"method" => {
                    let method = Method {
                        name: require_attr(e, "name", "method")?,
                        desc: require_attr(e, "desc", "method")?,
                        line: opt_num_attr(e, b"line")?,
                        counters: CounterSet::default(),
                    };
                    if is_start_event {
                        current_method = Some(method);
                    } else if let Some(class) = current_class.as_mut() {
                        class.methods.push(method);
                    }
                }
                b"sourcefile" => {
                    let sourcefile = SourceFile {
                        name: require_attr(e, "name", "sourcefile")?,
                        lines: Vec::new(),
                    };
                    if is_start_event {
                        current_sourcefile = Some(sourcefile);
                    } else if let Some(package) = current_package.as_mut() {
                        package.source_files.push(sourcefile);
                    }
                }
                b"line" => {
                    if let Some(sourcefile) = current_sourcefile.as_mut() {
                        let nr = require_attr(e, "nr", "line")?;
                        let nr = nr.parse::<u32>().map_err(|_| {
                            ConvertError::Parse(format!("invalid line number: {nr:?}"))
                        })?;
                        sourcefile.lines.push(SourceLine {
                            nr,
                            mi: num_attr(e, b"mi")?,
                            ci: num_attr(e, b"ci")?,
                            mb: num_attr(e, b"mb")?,
                            cb: num_attr(e, b"cb")?,
                        });
                    }
                }
                b"counter" => {
                    let kind = get_attr(e, b"type").and_then(|t| CounterKind::parse(&t));
                    if let Some(kind) = kind {
                        let counter = Counter {
                            kind,
                            covered: num_attr(e, b"covered")?,
                            missed: num_attr(e, b"missed")?,
                        };
                        // Sourcefile-level counters duplicate package data
                        // and are not used downstream. Group-level counters
                        // are dropped too: the group boundary leaves no
                        // trace, so its aggregates must not shadow the
                        // report-level ones.
                        if let Some(method) = current_method.as_mut() {
                            method.counters.push(counter);
                        } else if let Some(class) = current_class.as_mut() {
                            class.counters.push(counter);
                        } else if current_sourcefile.is_none() {
                            if let Some(package) = current_package.as_mut() {
                                package.counters.push(counter);
                            } else if group_depth == 0 {
                                report.counters.push(counter);
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"group" => {
                    group_depth = group_depth.saturating_sub(1);
                }
                b"method" => {
                    if let (Some(class), Some(method)) =
                        (current_class.as_mut(), current_method.take())
                    {
                        class.methods.push(method);
                    }
                }
                b"class" => {
                    if let (Some(package), Some(class)) =
                        (current_package.as_mut(), current_class.take())
                    {
                        package.classes.push(class);
                    }
                }
                b"sourcefile" => {
                    if let (Some(package), Some(sourcefile)) =
                        (current_package.as_mut(), current_sourcefile.take())
                    {
                        package.source_files.push(sourcefile);
                    }
                }
                b"package" => {
                    if let Some(package) = current_package.take() {
                        report.packages.push(package);
                    }
                }
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    if !session_seen {
        return Err(ConvertError::Parse(
            "report has no <sessioninfo> element".to_string(),
        ));
    }

    Ok(report)
}

fn xml_err(e: quick_xml::Error, reader: &Reader<&[u8]>) -> ConvertError {
    ConvertError::Xml {
        source: e,
        position: reader.buffer_position(),
    }
}

/// Extract a single attribute value from an XML element.
fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.to_string())
}

fn require_attr(e: &BytesStart, name: &str, element: &str) -> Result<String> {
    get_attr(e, name.as_bytes()).ok_or_else(|| {
        ConvertError::Parse(format!("<{element}> element missing '{name}' attribute"))
    })
}

/// Numeric attribute with a zero default when absent. A present but
/// unparseable value is a parse error, not a silent zero.
fn num_attr<T: FromStr + Default>(e: &BytesStart, name: &[u8]) -> Result<T> {
    match get_attr(e, name) {
        None => Ok(T::default()),
        Some(v) => v.parse().map_err(|_| invalid_numeric(name, &v)),
    }
}

/// Optional numeric attribute; absent is `None`, unparseable is an error.
fn opt_num_attr<T: FromStr>(e: &BytesStart, name: &[u8]) -> Result<Option<T>> {
    match get_attr(e, name) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| invalid_numeric(name, &v)),
    }
}

fn invalid_numeric(name: &[u8], value: &str) -> ConvertError {
    ConvertError::Parse(format!(
        "invalid numeric attribute {}={value:?}",
        String::from_utf8_lossy(name)
    ))
}
