use crate::error::{CiError, Result};
use globset::GlobBuilder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::ops::AddAssign;
use std::path::Path;
use walkdir::WalkDir;

/// Test totals of one or more JUnit reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub passed: u64,
    pub skipped: u64,
    /// Failures and errors.
    pub failed: u64,
}

impl AddAssign for TestSummary {
    fn add_assign(&mut self, other: Self) {
        self.passed += other.passed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SuiteCounts {
    tests: u64,
    skipped: u64,
    failures: u64,
    errors: u64,
}

impl SuiteCounts {
    fn summary(self) -> TestSummary {
        TestSummary {
            passed: self
                .tests
                .saturating_sub(self.skipped + self.failures + self.errors),
            skipped: self.skipped,
            failed: self.failures + self.errors,
        }
    }
}

/// Sums the reports under `root` whose relative path matches `pattern`.
///
/// In the pattern, `*` stays within a path segment and `**` spans any number
/// of directories, so `**/TEST-*.xml` finds reports at any depth.
pub fn summarize_junit(root: &Path, pattern: &str) -> Result<TestSummary> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher();

    let mut total = TestSummary::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if matcher.is_match(relative) {
            total += read_report(entry.path())?;
        }
    }
    Ok(total)
}

/// Totals of a single report.
///
/// A `<testsuites>` root sums its `<testsuite>` children. Any other root is
/// read as a single suite.
pub fn read_report(path: &Path) -> Result<TestSummary> {
    let content = fs::read_to_string(path)?;
    parse_report(&content).map_err(|message| CiError::JUnit {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_report(content: &str) -> std::result::Result<TestSummary, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut root: Option<(bool, SuiteCounts)> = None;
    let mut children: Vec<SuiteCounts> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                if depth == 0 {
                    let is_suites = e.name().as_ref() == b"testsuites";
                    root = Some((is_suites, suite_counts(e)?));
                } else if depth == 1 && e.name().as_ref() == b"testsuite" {
                    children.push(suite_counts(e)?);
                }
                if !is_empty {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    let Some((is_suites, root_counts)) = root else {
        return Err("no root element".to_string());
    };

    let mut summary = TestSummary::default();
    if is_suites && !children.is_empty() {
        for suite in children {
            summary += suite.summary();
        }
    } else {
        summary = root_counts.summary();
    }
    Ok(summary)
}

fn suite_counts(element: &BytesStart<'_>) -> std::result::Result<SuiteCounts, String> {
    let mut counts = SuiteCounts::default();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let target = match attribute.key.as_ref() {
            b"tests" => &mut counts.tests,
            b"skipped" => &mut counts.skipped,
            b"failures" => &mut counts.failures,
            b"errors" => &mut counts.errors,
            _ => continue,
        };
        let value = attribute.unescape_value().map_err(|e| e.to_string())?;
        *target = value
            .trim()
            .parse()
            .map_err(|_| format!("invalid count {value:?}"))?;
    }
    Ok(counts)
}
