// Coverage aggregation
// Merges per-job LCOV trace files into one aggregate report. The total
// percentage is recomputed from combined line counts, never averaged from
// the inputs' percentages. Reporting is advisory: a total below the
// threshold is surfaced but never fails the run.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("failed to read coverage data '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed coverage record in '{path}': {line}")]
    Malformed { path: PathBuf, line: String },

    #[error("invalid coverage input pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("failed to encode coverage report: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Merged line-hit data across one or more trace files.
///
/// Keyed by source path, then by line number, holding accumulated hit
/// counts. Merging sums hits per line, so a line covered by any input
/// counts as covered exactly once in the totals.
#[derive(Debug, Clone, Default)]
pub struct CoverageData {
    files: BTreeMap<String, BTreeMap<u32, u64>>,
}

impl CoverageData {
    /// Parse one LCOV-style trace (`SF:`/`DA:line,hits`/`end_of_record`).
    /// Unknown record kinds are ignored.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, CoverageError> {
        let mut data = Self::default();
        let mut current: Option<String> = None;

        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(path) = line.strip_prefix("SF:") {
                current = Some(path.to_string());
                data.files.entry(path.to_string()).or_default();
            } else if let Some(record) = line.strip_prefix("DA:") {
                let file = current.as_ref().ok_or_else(|| CoverageError::Malformed {
                    path: origin.to_path_buf(),
                    line: raw.to_string(),
                })?;
                let (line_no, hits) =
                    record
                        .split_once(',')
                        .ok_or_else(|| CoverageError::Malformed {
                            path: origin.to_path_buf(),
                            line: raw.to_string(),
                        })?;
                let line_no: u32 = line_no.parse().map_err(|_| CoverageError::Malformed {
                    path: origin.to_path_buf(),
                    line: raw.to_string(),
                })?;
                let hits: u64 = hits.parse().map_err(|_| CoverageError::Malformed {
                    path: origin.to_path_buf(),
                    line: raw.to_string(),
                })?;
                *data
                    .files
                    .entry(file.clone())
                    .or_default()
                    .entry(line_no)
                    .or_insert(0) += hits;
            } else if line == "end_of_record" {
                current = None;
            }
        }

        Ok(data)
    }

    /// Fold another trace into this one.
    pub fn merge(&mut self, other: CoverageData) {
        for (file, lines) in other.files {
            let entry = self.files.entry(file).or_default();
            for (line_no, hits) in lines {
                *entry.entry(line_no).or_insert(0) += hits;
            }
        }
    }

    /// (covered, instrumented) line counts over all files.
    pub fn totals(&self) -> (u64, u64) {
        let mut covered = 0;
        let mut total = 0;
        for lines in self.files.values() {
            total += lines.len() as u64;
            covered += lines.values().filter(|h| **h > 0).count() as u64;
        }
        (covered, total)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Per-file slice of the aggregate report.
#[derive(Debug, Clone, Serialize)]
pub struct FileCoverage {
    pub path: String,
    pub covered_lines: u64,
    pub total_lines: u64,
    pub percent: f64,
}

/// Aggregate coverage over all merged inputs.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub covered_lines: u64,
    pub total_lines: u64,
    pub percent: f64,
    pub threshold: f64,
    /// Advisory flag; never fails the job.
    pub below_threshold: bool,
    pub files: Vec<FileCoverage>,
}

impl CoverageReport {
    pub fn from_data(data: &CoverageData, threshold: f64) -> Self {
        let files = data
            .files
            .iter()
            .map(|(path, lines)| {
                let total = lines.len() as u64;
                let covered = lines.values().filter(|h| **h > 0).count() as u64;
                FileCoverage {
                    path: path.clone(),
                    covered_lines: covered,
                    total_lines: total,
                    percent: percent(covered, total),
                }
            })
            .collect();

        let (covered, total) = data.totals();
        let percent = percent(covered, total);
        Self {
            covered_lines: covered,
            total_lines: total,
            percent,
            threshold,
            below_threshold: percent < threshold,
            files,
        }
    }

    /// Textual report in the `name  covered  total  pct%` table shape the
    /// percentage scraper understands.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<40} {:>8} {:>8} {:>8}", "Name", "Lines", "Cover", "Pct");
        for file in &self.files {
            let _ = writeln!(
                out,
                "{:<40} {:>8} {:>8} {:>7.1}%",
                file.path, file.total_lines, file.covered_lines, file.percent
            );
        }
        let _ = writeln!(
            out,
            "{:<40} {:>8} {:>8} {:>7.1}%",
            "TOTAL", self.total_lines, self.covered_lines, self.percent
        );
        out
    }

    /// Machine-readable export of the aggregate report.
    pub fn to_json(&self) -> Result<String, CoverageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write a minimal HTML export into `dir` (one index page).
    pub fn write_html(&self, dir: &Path) -> Result<PathBuf, CoverageError> {
        fs::create_dir_all(dir)?;
        let mut body = String::new();
        for file in &self.files {
            let _ = writeln!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>",
                file.path, file.total_lines, file.covered_lines, file.percent
            );
        }
        let html = format!(
            "<html><head><title>coverage report</title></head><body>\
             <h1>Coverage: {:.1}%</h1>\
             <table><tr><th>File</th><th>Lines</th><th>Covered</th><th>Pct</th></tr>\
             {}</table></body></html>\n",
            self.percent, body
        );
        let index = dir.join("index.html");
        fs::write(&index, html)?;
        Ok(index)
    }
}

fn percent(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 * 100.0 / total as f64
    }
}

/// Merge every trace file matching `pattern` (relative to `workspace`) and
/// build the aggregate report.
pub fn aggregate(
    workspace: &Path,
    pattern: &str,
    threshold: f64,
) -> Result<CoverageReport, CoverageError> {
    let full_pattern = workspace.join(pattern);
    let matches =
        glob::glob(&full_pattern.to_string_lossy()).map_err(|e| CoverageError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

    let mut merged = CoverageData::default();
    let mut inputs = 0;
    for path in matches.flatten() {
        let content = fs::read_to_string(&path).map_err(|e| CoverageError::Read {
            path: path.clone(),
            source: e,
        })?;
        merged.merge(CoverageData::parse(&content, &path)?);
        inputs += 1;
    }

    if inputs == 0 {
        warn!(pattern, "no coverage inputs matched");
    }

    let report = CoverageReport::from_data(&merged, threshold);
    if report.below_threshold {
        warn!(
            percent = report.percent,
            threshold, "coverage below reporting threshold (advisory)"
        );
    }
    Ok(report)
}

/// Scrape the total percentage out of a coverage tool's textual report.
pub fn extract_total_percent(text: &str) -> Option<f64> {
    let re = Regex::new(r"(?m)^TOTAL\b.*?(\d+(?:\.\d+)?)%\s*$").ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TRACE_A: &str = "SF:src/node.cpp\nDA:1,1\nDA:2,1\nDA:3,0\nDA:4,1\nDA:5,1\nDA:6,1\nDA:7,1\nDA:8,1\nDA:9,1\nDA:10,0\nend_of_record\n";
    const TRACE_B: &str = "SF:src/util.cpp\nDA:1,2\nDA:2,1\nend_of_record\n";

    #[test]
    fn test_parse_counts_lines() {
        let data = CoverageData::parse(TRACE_A, Path::new("a")).unwrap();
        let (covered, total) = data.totals();
        assert_eq!(total, 10);
        assert_eq!(covered, 8);
    }

    #[test]
    fn test_total_recomputed_from_line_counts_not_averaged() {
        // 8/10 (80%) merged with 2/2 (100%): combined is 10/12 = 83.3%,
        // not the 90% a naive percentage average would give.
        let mut merged = CoverageData::parse(TRACE_A, Path::new("a")).unwrap();
        merged.merge(CoverageData::parse(TRACE_B, Path::new("b")).unwrap());

        let report = CoverageReport::from_data(&merged, 80.0);
        assert_eq!(report.total_lines, 12);
        assert_eq!(report.covered_lines, 10);
        assert!((report.percent - 83.333).abs() < 0.01);
        assert!(!report.below_threshold);
    }

    #[test]
    fn test_merge_same_file_sums_hits() {
        let first = "SF:a.rs\nDA:1,0\nDA:2,1\nend_of_record\n";
        let second = "SF:a.rs\nDA:1,1\nDA:2,0\nend_of_record\n";
        let mut merged = CoverageData::parse(first, Path::new("x")).unwrap();
        merged.merge(CoverageData::parse(second, Path::new("y")).unwrap());

        let (covered, total) = merged.totals();
        assert_eq!((covered, total), (2, 2));
    }

    #[test]
    fn test_threshold_is_advisory_flag() {
        let data = CoverageData::parse(TRACE_A, Path::new("a")).unwrap();
        let report = CoverageReport::from_data(&data, 90.0);
        assert!(report.below_threshold);
    }

    #[test]
    fn test_malformed_record_rejected() {
        let result = CoverageData::parse("DA:1,1\n", Path::new("orphan"));
        assert!(matches!(result, Err(CoverageError::Malformed { .. })));

        let result = CoverageData::parse("SF:a.rs\nDA:nonsense\n", Path::new("bad"));
        assert!(matches!(result, Err(CoverageError::Malformed { .. })));
    }

    #[test]
    fn test_aggregate_over_glob() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".coverage.unit"), TRACE_A).unwrap();
        fs::write(dir.path().join(".coverage.launch"), TRACE_B).unwrap();
        fs::write(dir.path().join("unrelated.txt"), "noise").unwrap();

        let report = aggregate(dir.path(), ".coverage.*", 80.0).unwrap();
        assert_eq!(report.total_lines, 12);
        assert_eq!(report.files.len(), 2);
    }

    #[test]
    fn test_aggregate_with_no_inputs_is_empty_not_error() {
        let dir = TempDir::new().unwrap();
        let report = aggregate(dir.path(), ".coverage.*", 80.0).unwrap();
        assert_eq!(report.total_lines, 0);
        assert_eq!(report.percent, 0.0);
    }

    #[test]
    fn test_render_then_scrape_total() {
        let mut merged = CoverageData::parse(TRACE_A, Path::new("a")).unwrap();
        merged.merge(CoverageData::parse(TRACE_B, Path::new("b")).unwrap());
        let report = CoverageReport::from_data(&merged, 80.0);

        let text = report.render_text();
        let scraped = extract_total_percent(&text).unwrap();
        assert!((scraped - 83.3).abs() < 0.1);
    }

    #[test]
    fn test_extract_total_percent_ignores_other_rows() {
        let text = "src/a.rs  10  5  50.0%\nTOTAL  20  15  75.0%\n";
        assert_eq!(extract_total_percent(text), Some(75.0));
        assert_eq!(extract_total_percent("no totals here"), None);
    }

    #[test]
    fn test_json_export() {
        let data = CoverageData::parse(TRACE_A, Path::new("a")).unwrap();
        let report = CoverageReport::from_data(&data, 80.0);
        let json = report.to_json().unwrap();
        assert!(json.contains("\"covered_lines\": 8"));
        assert!(json.contains("src/node.cpp"));
    }

    #[test]
    fn test_html_export() {
        let dir = TempDir::new().unwrap();
        let data = CoverageData::parse(TRACE_A, Path::new("a")).unwrap();
        let report = CoverageReport::from_data(&data, 80.0);

        let index = report.write_html(&dir.path().join("htmlcov")).unwrap();
        let html = fs::read_to_string(index).unwrap();
        assert!(html.contains("src/node.cpp"));
        assert!(html.contains("80.0%"));
    }
}
