use std::io::{self, Write};
use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::{Color, ColorSpec, WriteColor};
use ignore::WalkBuilder;
use serde::Deserialize;

use report::RenderedReport;
use report::link::LinkIndex;
use report::model::FootnoteLink;
use report::parser::Parser;

const FIXTURE_SUFFIX: &str = ".report.md";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Citations the report is rendered against.
    #[serde(default)]
    pub links: Vec<FootnoteLink>,

    /// Expected block outline (trimmed comparison).
    #[serde(default)]
    pub expect_outline: Option<String>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a `.report.md` file into its TOML config and report text.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let rendered = Parser::new(source.to_string(), 0).render(&LinkIndex::new(&config.links));

    // Rendering is pure; a second pass must agree with the first.
    let again = Parser::new(source.to_string(), 0).render(&LinkIndex::new(&config.links));
    if again != rendered {
        return fail(description, "rendering is not deterministic".into());
    }

    if let Some(expected) = &config.expect_outline {
        let actual = rendered.outline();
        if actual.trim() != expected.trim() {
            return fail(
                description,
                format!(
                    "outline mismatch\n  expected:\n{}\n  actual:\n{}",
                    indent(expected.trim()),
                    indent(actual.trim())
                ),
            );
        }
    }

    if let Some(expected) = &config.expect_warnings {
        if let Some(reason) = check_warnings(source, &rendered, expected) {
            return fail(description, reason);
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    rendered: &RenderedReport,
    expected: &[ExpectedWarning],
) -> Option<String> {
    let actual = &rendered.warnings;

    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual.iter().map(|w| format!("  - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected.iter()).enumerate() {
        let msg = actual.to_string();

        if !msg.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Fixtures under `root`, sorted by path. A file path is returned as is.
fn discover_fixtures(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut fixtures: Vec<PathBuf> = WalkBuilder::new(root)
        .standard_filters(true)
        .build()
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(FIXTURE_SUFFIX))
        })
        .collect();
    fixtures.sort();
    fixtures
}

/// Outcome of a fixture run.
pub struct Summary {
    pub passed: usize,
    pub failures: Vec<TestResult>,
}

impl Summary {
    pub fn exit_code(&self) -> i32 {
        if self.failures.is_empty() && self.passed > 0 { 0 } else { 1 }
    }
}

fn write_status(out: &mut dyn WriteColor, color: Color, label: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{}", label)?;
    out.reset()
}

/// Render every fixture under `path` and report PASS/FAIL per file to `out`.
pub fn run_tests(path: &Path, out: &mut dyn WriteColor) -> io::Result<Summary> {
    let fixtures = discover_fixtures(path);
    if fixtures.is_empty() {
        writeln!(out, "no {} files found in {}", FIXTURE_SUFFIX, path.display())?;
        return Ok(Summary {
            passed: 0,
            failures: Vec::new(),
        });
    }

    let mut summary = Summary {
        passed: 0,
        failures: Vec::new(),
    };
    for fixture in &fixtures {
        let result = run_single_test(fixture);
        let shown = fixture.strip_prefix(path).unwrap_or(fixture);
        match result.outcome {
            TestOutcome::Pass => write_status(out, Color::Green, "PASS")?,
            TestOutcome::Fail(_) => write_status(out, Color::Red, "FAIL")?,
        }
        write!(out, "  {}", shown.display())?;
        match &result.description {
            Some(description) => writeln!(out, "  {}", description)?,
            None => writeln!(out)?,
        }
        if matches!(result.outcome, TestOutcome::Pass) {
            summary.passed += 1;
        } else {
            summary.failures.push(result);
        }
    }

    for failure in &summary.failures {
        if let TestOutcome::Fail(reason) = &failure.outcome {
            writeln!(out)?;
            writeln!(out, "--- {} ---", failure.path.display())?;
            for line in reason.lines() {
                writeln!(out, "  {}", line)?;
            }
        }
    }

    writeln!(out)?;
    if summary.failures.is_empty() {
        write_status(out, Color::Green, "ok")?;
    } else {
        write_status(out, Color::Red, "FAILED")?;
    }
    writeln!(
        out,
        ": {} passed, {} failed",
        summary.passed,
        summary.failures.len()
    )?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use codespan_reporting::term::termcolor::NoColor;

    use super::*;

    fn fixtures_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/reports")
    }

    fn run_to_string(path: &Path) -> (Summary, String) {
        let mut out = NoColor::new(Vec::new());
        let summary = run_tests(path, &mut out).unwrap();
        (summary, String::from_utf8(out.into_inner()).unwrap())
    }

    #[test]
    fn bundled_fixtures_pass() {
        let (summary, output) = run_to_string(&fixtures_dir());
        assert_eq!(summary.exit_code(), 0, "{}", output);
        assert!(summary.passed >= 8);
        assert!(!output.contains("FAIL"));
    }

    #[test]
    fn discovery_walks_subfolders_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.report.md"), "---\n---\nBody\n").unwrap();
        std::fs::write(dir.path().join("nested/b.report.md"), "---\n---\n## H\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let found = discover_fixtures(dir.path());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![PathBuf::from("a.report.md"), PathBuf::from("nested/b.report.md")]
        );
    }

    #[test]
    fn outline_mismatch_fails_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("wrong.report.md"),
            "---\ndescription = \"wrong outline\"\nexpect_outline = \"heading: Other\"\n---\n## Title\n",
        )
        .unwrap();

        let (summary, output) = run_to_string(dir.path());
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(output.contains("FAIL  wrong.report.md  wrong outline"), "{}", output);
        assert!(output.contains("outline mismatch"));
        assert!(output.contains("FAILED: 0 passed, 1 failed"));
    }

    #[test]
    fn empty_directory_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (summary, output) = run_to_string(dir.path());
        assert_eq!(summary.exit_code(), 1);
        assert!(output.starts_with("no .report.md files found"));
    }

    #[test]
    fn frontmatter_splits_config_and_body() {
        let (config, body) = parse_test_file(
            "---\ndescription = \"x\"\n[[links]]\nfootnote_number = 1\nurl = \"u\"\n---\nBody [1]\n",
        )
        .unwrap();
        assert_eq!(config.description.as_deref(), Some("x"));
        assert_eq!(config.links.len(), 1);
        assert_eq!(body, "Body [1]\n");
    }

    #[test]
    fn missing_frontmatter_is_rejected() {
        assert!(parse_test_file("Body").is_err());
        assert!(parse_test_file("---\ndescription = \"x\"\n").is_err());
    }

    #[test]
    fn warning_line_numbers_are_one_based() {
        assert_eq!(byte_offset_to_line("a\nb\nc", 0), 1);
        assert_eq!(byte_offset_to_line("a\nb\nc", 4), 3);
    }
}
