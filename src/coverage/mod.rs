//! Coverage module
//!
//! Provides:
//! - Path normalization
//! - LCOV parsing into a per-file coverage model
//! - Per-file and whole-report summaries
//! - Baseline diffing and changed-file filtering

mod delta;
mod lcov;
mod path;
mod summary;

pub use delta::*;
pub use lcov::*;
pub use path::*;
pub use summary::*;

use std::collections::{BTreeMap, HashMap};

/// Identifies one branch outcome: the line it sits on, the block and the branch number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BranchKey {
    pub line: u32,
    pub block: u32,
    pub branch: u32,
}

/// Coverage entries collected for a single source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFileRecord {
    pub path: String,
    /// Line number -> hit count
    pub lines: BTreeMap<u32, u64>,
    pub branches: BTreeMap<BranchKey, u64>,
    /// Function name -> hit count
    pub functions: BTreeMap<String, u64>,
}

impl SourceFileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Line numbers with no hits, in ascending order
    pub fn uncovered_lines(&self) -> Vec<u32> {
        self.lines
            .iter()
            .filter(|(_, hits)| **hits == 0)
            .map(|(line, _)| *line)
            .collect()
    }

    /// Fold another section for the same path into this one. Later entries win.
    fn merge(&mut self, other: SourceFileRecord) {
        self.lines.extend(other.lines);
        self.branches.extend(other.branches);
        self.functions.extend(other.functions);
    }
}

/// Parsed LCOV document: one record per source file, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageModel {
    files: Vec<SourceFileRecord>,
    /// Path -> position in `files`
    index: HashMap<String, usize>,
}

impl CoverageModel {
    /// Build a model from records, merging any that share a path
    pub fn from_records(records: impl IntoIterator<Item = SourceFileRecord>) -> Self {
        let mut files: Vec<SourceFileRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            match index.get(&record.path) {
                Some(&i) => files[i].merge(record),
                None => {
                    index.insert(record.path.clone(), files.len());
                    files.push(record);
                }
            }
        }

        Self { files, index }
    }

    pub fn files(&self) -> &[SourceFileRecord] {
        &self.files
    }

    pub fn get(&self, path: &str) -> Option<&SourceFileRecord> {
        self.index.get(path).map(|&i| &self.files[i])
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
