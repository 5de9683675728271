//! Reads the JaCoCo input document and hands it to the parser.

use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::jacoco;
use crate::model::Report;

/// Read the report at `path`, treating `-` as standard input. The file
/// handle is released as soon as the bytes are read.
pub fn load(path: &Path) -> Result<Report> {
    if path == Path::new("-") {
        load_from(std::io::stdin().lock())
    } else {
        jacoco::parse(&std::fs::read(path)?)
    }
}

/// Parse a report from any reader; `load` routes stdin through here.
pub fn load_from<R: Read>(mut reader: R) -> Result<Report> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    jacoco::parse(&buf)
}
