//! Baseline comparison and changed-file filtering

use std::collections::{BTreeSet, HashSet};

use super::{summarize, CoverageModel, FileSummary, ReportSummary};

/// How a file relates to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Present in both reports
    Shared,
    /// Only in the current report (or no baseline was given)
    New,
    /// Only in the baseline report
    Removed,
}

/// Signed percentage-point change per metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentageDelta {
    pub lines: f64,
    pub branches: f64,
    pub functions: f64,
}

impl PercentageDelta {
    fn between(current: &FileSummary, baseline: &FileSummary) -> Self {
        Self {
            lines: current.line_percentage() - baseline.line_percentage(),
            branches: current.branch_percentage() - baseline.branch_percentage(),
            functions: current.function_percentage() - baseline.function_percentage(),
        }
    }
}

/// One row of the comparison
#[derive(Debug, Clone, PartialEq)]
pub struct FileDelta {
    pub path: String,
    pub current: Option<FileSummary>,
    pub baseline: Option<FileSummary>,
    /// Only set when both sides are present
    pub delta: Option<PercentageDelta>,
    /// Lines with zero hits in the current report
    pub uncovered_lines: Vec<u32>,
}

impl FileDelta {
    fn new(path: String, current: Option<FileSummary>, baseline: Option<FileSummary>) -> Self {
        let delta = match (&current, &baseline) {
            (Some(c), Some(b)) => Some(PercentageDelta::between(c, b)),
            _ => None,
        };

        Self {
            path,
            current,
            baseline,
            delta,
            uncovered_lines: Vec::new(),
        }
    }

    pub fn status(&self) -> FileStatus {
        match (&self.current, &self.baseline) {
            (Some(_), Some(_)) => FileStatus::Shared,
            (None, Some(_)) => FileStatus::Removed,
            _ => FileStatus::New,
        }
    }

    fn is_regression(&self) -> bool {
        self.delta.map(|d| d.lines < 0.0).unwrap_or(false)
    }
}

/// Whole-report comparison plus ordered per-file rows
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDelta {
    pub current: ReportSummary,
    pub baseline: Option<ReportSummary>,
    pub delta: Option<PercentageDelta>,
    pub files: Vec<FileDelta>,
}

impl ReportDelta {
    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }
}

/// Compare a current model against an optional baseline
pub fn diff(current: &CoverageModel, baseline: Option<&CoverageModel>) -> ReportDelta {
    let (current_files, current_total) = summarize(current);
    let (baseline_files, baseline_total) = match baseline {
        Some(model) => {
            let (files, total) = summarize(model);
            (files, Some(total))
        }
        None => Default::default(),
    };

    let paths: BTreeSet<&String> = current_files.keys().chain(baseline_files.keys()).collect();

    let mut files: Vec<FileDelta> = paths
        .into_iter()
        .map(|path| {
            let mut row = FileDelta::new(
                path.clone(),
                current_files.get(path).copied(),
                baseline_files.get(path).copied(),
            );
            if let Some(record) = current.get(path) {
                row.uncovered_lines = record.uncovered_lines();
            }
            row
        })
        .collect();

    // paths are already ascending; a stable sort keeps that order inside each group
    if baseline_total.is_some() {
        files.sort_by_key(|row| !row.is_regression());
    }

    let delta = baseline_total
        .as_ref()
        .map(|b| PercentageDelta::between(&current_total, b));

    ReportDelta {
        current: current_total,
        baseline: baseline_total,
        delta,
        files,
    }
}

/// Keep only rows for files touched by the revision. Totals still describe the whole report.
pub fn filter_changed(mut delta: ReportDelta, changed: &HashSet<String>) -> ReportDelta {
    delta.files.retain(|row| changed.contains(&row.path));
    delta
}
