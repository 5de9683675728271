//! Cobertura-side output tree and the JaCoCo → Cobertura transformer.
//!
//! Cobertura XML structure (as produced here):
//!   <coverage timestamp="..." line-rate="..." branch-rate="..." complexity="...">
//!     <packages>
//!       <package name="com.example" line-rate="..." ...>
//!         <classes>
//!           <class name="com.example.Foo" filename="com/example/Foo.kt" ...>
//!             <methods>
//!               <method name="doStuff" signature="()V" ...>
//!                 <lines><line number="10" hits="1" branch="false"/></lines>
//!               </method>
//!             </methods>
//!             <lines>
//!               <line number="11" hits="1" branch="true"
//!                     condition-coverage="75% (3/4)">
//!                 <conditions>
//!                   <condition number="0" type="jump" coverage="75%"/>
//!                 </conditions>
//!               </line>
//!             </lines>
//!           </class>
//!         </classes>
//!       </package>
//!     </packages>
//!   </coverage>
//!
//! Key differences from JaCoCo:
//!   - Line data must be attributed to methods: each method owns the line
//!     range from its start line up to the next method's start line.
//!   - Counters become `line-rate`/`branch-rate` ratio strings, except
//!     COMPLEXITY which stays a count (covered + missed).
//!   - Names use `.` separators; `filename` paths keep `/`.

use crate::model::{self, CounterKind, CounterSet, Report, SourceLine};

/// Stringify a float the way Cobertura consumers expect: shortest
/// round-trip representation, whole values keeping a trailing `.0`.
fn fmt_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// The three derived attributes every Cobertura element level carries.
#[derive(Debug, Clone)]
pub struct Rates {
    pub line_rate: String,
    pub branch_rate: String,
    pub complexity: String,
}

impl Rates {
    fn from_counters(counters: &CounterSet) -> Self {
        Self {
            line_rate: ratio_attr(counters, CounterKind::Line),
            branch_rate: ratio_attr(counters, CounterKind::Branch),
            complexity: sum_attr(counters, CounterKind::Complexity),
        }
    }
}

/// `covered / (covered + missed)` as a decimal string; `"0.0"` when the
/// counter kind is absent.
fn ratio_attr(counters: &CounterSet, kind: CounterKind) -> String {
    match counters.find(kind) {
        Some(c) => fmt_float(model::rate(c.covered, c.covered + c.missed)),
        None => "0.0".to_string(),
    }
}

/// `covered + missed` as an integer string; complexity is a count, not a
/// fraction. Still `"0.0"` when the counter kind is absent.
fn sum_attr(counters: &CounterSet, kind: CounterKind) -> String {
    match counters.find(kind) {
        Some(c) => (c.covered + c.missed).to_string(),
        None => "0.0".to_string(),
    }
}

/// Branch detail for a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDetail {
    pub percentage: u32,
    pub covered: u32,
    pub total: u32,
}

impl BranchDetail {
    #[must_use]
    pub fn condition_coverage(&self) -> String {
        format!("{}% ({}/{})", self.percentage, self.covered, self.total)
    }
}

/// A Cobertura `<line>`: hit flag plus optional branch detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: u32,
    pub hits: u64,
    pub branch: Option<BranchDetail>,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub signature: String,
    pub rates: Rates,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub filename: String,
    pub rates: Rates,
    pub methods: Vec<Method>,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub rates: Rates,
    pub classes: Vec<Class>,
}

/// The root of the output document.
#[derive(Debug, Clone)]
pub struct Coverage {
    pub timestamp: String,
    pub rates: Rates,
    pub packages: Vec<Package>,
}

/// Build the Cobertura tree for a parsed JaCoCo report. Each node is
/// constructed fully before being linked into its parent; the tree is
/// strictly single-owner, parent to child.
pub fn convert(report: &Report, source_root: &str) -> Coverage {
    Coverage {
        // Session start is epoch millis; the output timestamp is float
        // seconds, so whole seconds render as e.g. "1000.0".
        timestamp: fmt_float(report.session_start_ms as f64 / 1000.0),
        rates: Rates::from_counters(&report.counters),
        packages: report
            .packages
            .iter()
            .map(|p| convert_package(p, source_root))
            .collect(),
    }
}

fn convert_package(package: &model::Package, source_root: &str) -> Package {
    Package {
        name: dotted(&package.name),
        rates: Rates::from_counters(&package.counters),
        classes: package
            .classes
            .iter()
            .map(|c| convert_class(c, package, source_root))
            .collect(),
    }
}

fn convert_class(class: &model::Class, package: &model::Package, source_root: &str) -> Class {
    let filename = source_filename(&class.name, source_root);

    // The class's authoritative line set is the package sourcefile whose
    // name matches the basename of the derived path. No match means the
    // class simply has no line data.
    let basename = filename.rsplit('/').next().unwrap_or(&filename);
    let source_lines: &[SourceLine] = package
        .find_source_file(basename)
        .map(|sf| sf.lines.as_slice())
        .unwrap_or(&[]);

    Class {
        name: dotted(&class.name),
        filename,
        rates: Rates::from_counters(&class.counters),
        methods: class
            .methods
            .iter()
            .enumerate()
            .map(|(index, m)| convert_method(m, index, &class.methods, source_lines))
            .collect(),
        lines: source_lines.iter().map(convert_line).collect(),
    }
}

fn convert_method(
    method: &model::Method,
    index: usize,
    methods: &[model::Method],
    source_lines: &[SourceLine],
) -> Method {
    let range = method_line_range(index, methods);
    let lines = source_lines
        .iter()
        .filter(|l| range.is_some_and(|(start, end)| start <= l.nr && l.nr < end))
        .map(convert_line)
        .collect();

    Method {
        name: method.name.clone(),
        signature: method.desc.clone(),
        rates: Rates::from_counters(&method.counters),
        lines,
    }
}

/// The half-open line range `[start, end)` owned by the method at `index`.
///
/// `end` is the smallest other start line strictly greater than the
/// method's own, or `u32::MAX` when it is the last method in the file.
/// When two methods share a start line, the first in declaration order
/// owns the range; later ones own no lines. Methods without a start line
/// own no lines either.
fn method_line_range(index: usize, methods: &[model::Method]) -> Option<(u32, u32)> {
    let start = methods[index].line?;

    let first_at_start = methods.iter().position(|m| m.line == Some(start));
    if first_at_start != Some(index) {
        return None;
    }

    let end = methods
        .iter()
        .filter_map(|m| m.line)
        .filter(|&l| l > start)
        .min()
        .unwrap_or(u32::MAX);

    Some((start, end))
}

fn convert_line(line: &SourceLine) -> Line {
    // A line counts as hit when any instruction on it was covered.
    let hits = u64::from(line.ci > 0);

    let total = line.cb + line.mb;
    let branch = (total > 0).then(|| BranchDetail {
        // Truncate the float product, not integer division: 29 of 100
        // covered branches must give 28%, matching int(100 * (29 / 100)).
        percentage: (100.0 * (f64::from(line.cb) / f64::from(total))) as u32,
        covered: line.cb,
        total,
    });

    Line {
        number: line.nr,
        hits,
        branch,
    }
}

/// Replace JaCoCo's `/` name separators with `.` for package and class
/// names. File paths keep `/`.
fn dotted(name: &str) -> String {
    name.replace('/', ".")
}

/// Derive the source path for a class: its name up to the first `$`
/// (nested classes map to their enclosing file) plus `.kt`, under the
/// configured source root. A `.` root emits the bare relative path.
fn source_filename(class_name: &str, source_root: &str) -> String {
    let base = class_name.split('$').next().unwrap_or(class_name);
    let root = source_root.trim_end_matches('/');
    if root.is_empty() || root == "." {
        format!("{base}.kt")
    } else {
        format!("{root}/{base}.kt")
    }
}
