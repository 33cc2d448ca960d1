//! Per-file and whole-report coverage summaries

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::Add;

use super::{CoverageModel, SourceFileRecord};

/// Found/hit counters for one source file, or for a whole report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub lines_found: u64,
    pub lines_hit: u64,
    pub branches_found: u64,
    pub branches_hit: u64,
    pub functions_found: u64,
    pub functions_hit: u64,
}

/// Whole-report totals share the per-file shape
pub type ReportSummary = FileSummary;

/// Coverage percentage where nothing to cover counts as fully covered
pub fn percentage(hit: u64, found: u64) -> f64 {
    if found == 0 {
        return 100.0;
    }
    (hit as f64 / found as f64) * 100.0
}

impl FileSummary {
    pub fn from_record(record: &SourceFileRecord) -> Self {
        Self {
            lines_found: record.lines.len() as u64,
            lines_hit: record.lines.values().filter(|h| **h > 0).count() as u64,
            branches_found: record.branches.len() as u64,
            branches_hit: record.branches.values().filter(|h| **h > 0).count() as u64,
            functions_found: record.functions.len() as u64,
            functions_hit: record.functions.values().filter(|h| **h > 0).count() as u64,
        }
    }

    pub fn line_percentage(&self) -> f64 {
        percentage(self.lines_hit, self.lines_found)
    }

    pub fn branch_percentage(&self) -> f64 {
        percentage(self.branches_hit, self.branches_found)
    }

    pub fn function_percentage(&self) -> f64 {
        percentage(self.functions_hit, self.functions_found)
    }
}

impl Add for FileSummary {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            lines_found: self.lines_found + other.lines_found,
            lines_hit: self.lines_hit + other.lines_hit,
            branches_found: self.branches_found + other.branches_found,
            branches_hit: self.branches_hit + other.branches_hit,
            functions_found: self.functions_found + other.functions_found,
            functions_hit: self.functions_hit + other.functions_hit,
        }
    }
}

impl Sum for FileSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a FileSummary> for FileSummary {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Summarize every file of a model, plus the element-wise total
pub fn summarize(model: &CoverageModel) -> (BTreeMap<String, FileSummary>, ReportSummary) {
    let files: BTreeMap<String, FileSummary> = model
        .files()
        .iter()
        .map(|record| (record.path.clone(), FileSummary::from_record(record)))
        .collect();

    let total: ReportSummary = files.values().sum();

    (files, total)
}
