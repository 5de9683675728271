//! Typed in-memory representation of a JaCoCo coverage report. Numeric
//! attributes are parsed and validated once, at ingestion; everything
//! downstream works with plain integers.

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Coverage dimensions JaCoCo attaches `<counter>` elements for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Instruction,
    Branch,
    Line,
    Complexity,
    Method,
    Class,
}

impl CounterKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INSTRUCTION" => Some(Self::Instruction),
            "BRANCH" => Some(Self::Branch),
            "LINE" => Some(Self::Line),
            "COMPLEXITY" => Some(Self::Complexity),
            "METHOD" => Some(Self::Method),
            "CLASS" => Some(Self::Class),
            _ => None,
        }
    }
}

/// A (kind, covered, missed) triple from a JaCoCo `<counter>` element.
#[derive(Debug, Clone)]
pub struct Counter {
    pub kind: CounterKind,
    pub covered: u64,
    pub missed: u64,
}

/// The counters attached to one JaCoCo element. Lookup is by kind and the
/// first match wins; a missing kind is reported as absent rather than an
/// error so callers can substitute a zero default.
#[derive(Debug, Clone, Default)]
pub struct CounterSet(Vec<Counter>);

impl CounterSet {
    pub fn push(&mut self, counter: Counter) {
        self.0.push(counter);
    }

    #[must_use]
    pub fn find(&self, kind: CounterKind) -> Option<&Counter> {
        self.0.iter().find(|c| c.kind == kind)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One instrumented line inside a `<sourcefile>`: missed/covered
/// instructions (`mi`/`ci`) and missed/covered branches (`mb`/`cb`).
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub nr: u32,
    pub mi: u64,
    pub ci: u64,
    pub mb: u32,
    pub cb: u32,
}

/// Per-file line data from a package-level `<sourcefile>` element.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub lines: Vec<SourceLine>,
}

/// A `<method>` element: name + descriptor, anchored at its declaration
/// line. JaCoCo always emits `line` for real methods; synthetic ones
/// without it own no source lines.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub desc: String,
    pub line: Option<u32>,
    pub counters: CounterSet,
}

/// A `<class>` element, named with `/` separators (e.g. `com/example/Foo`).
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub methods: Vec<Method>,
    pub counters: CounterSet,
}

/// A `<package>` element with its classes and source files.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: String,
    pub classes: Vec<Class>,
    pub source_files: Vec<SourceFile>,
    pub counters: CounterSet,
}

impl Package {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Look up the source file whose `name` equals the given basename.
    #[must_use]
    pub fn find_source_file(&self, basename: &str) -> Option<&SourceFile> {
        self.source_files.iter().find(|sf| sf.name == basename)
    }
}

/// The parsed report: session start time plus a flat package list.
/// Packages nested inside `<group>` elements are flattened into the same
/// list as top-level packages.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Session start time from `<sessioninfo start="...">`, epoch millis.
    pub session_start_ms: i64,
    pub packages: Vec<Package>,
    pub counters: CounterSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate() {
        assert_eq!(rate(3, 4), 0.75);
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(0, 10), 0.0);
        assert_eq!(rate(10, 10), 1.0);
    }

    #[test]
    fn test_counter_set_first_match_wins() {
        let mut set = CounterSet::default();
        set.push(Counter {
            kind: CounterKind::Line,
            covered: 1,
            missed: 2,
        });
        set.push(Counter {
            kind: CounterKind::Line,
            covered: 9,
            missed: 9,
        });
        let c = set.find(CounterKind::Line).unwrap();
        assert_eq!(c.covered, 1);
        assert_eq!(c.missed, 2);
        assert!(set.find(CounterKind::Branch).is_none());
    }
}
