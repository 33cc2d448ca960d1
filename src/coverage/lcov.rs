//! LCOV format parser
//!
//! Parsing is total: malformed numbers read as 0, unknown lines are skipped
//! and a section left open at end of input is still kept.

use super::{normalize_path, BranchKey, CoverageModel, SourceFileRecord};

/// One classified line of an LCOV document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLine<'a> {
    TestName(&'a str),
    SourceFile(&'a str),
    FunctionDecl { line: u32, name: &'a str },
    FunctionHits { hits: u64, name: &'a str },
    LineHits { line: u32, hits: u64 },
    BranchHits { key: BranchKey, hits: u64 },
    /// `LF`, `LH`, `BRF`, `BRH`, `FNF`, `FNH`: counts are re-derived from entries instead
    Summary,
    EndOfRecord,
    Unknown,
}

impl<'a> RecordLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();

        if line == "end_of_record" {
            return RecordLine::EndOfRecord;
        }

        let Some((tag, value)) = line.split_once(':') else {
            return RecordLine::Unknown;
        };

        match tag {
            "TN" => RecordLine::TestName(value),
            "SF" => RecordLine::SourceFile(value.trim()),
            "FN" => {
                // FN:<line>[,<end line>],<name>
                let (head, name) = value.rsplit_once(',').unwrap_or(("", value));
                let line = head.split(',').next().map(parse_line).unwrap_or(0);
                RecordLine::FunctionDecl { line, name }
            }
            "FNDA" => {
                let (hits, name) = value.split_once(',').unwrap_or((value, ""));
                RecordLine::FunctionHits { hits: parse_count(hits), name }
            }
            "DA" => {
                let mut fields = value.split(',');
                let line = fields.next().map(parse_line).unwrap_or(0);
                let hits = fields.next().map(parse_count).unwrap_or(0);
                RecordLine::LineHits { line, hits }
            }
            "BRDA" => {
                let mut fields = value.split(',');
                let key = BranchKey {
                    line: fields.next().map(parse_line).unwrap_or(0),
                    block: fields.next().map(parse_line).unwrap_or(0),
                    branch: fields.next().map(parse_line).unwrap_or(0),
                };
                // a taken count of "-" means the branch was never evaluated
                let hits = fields.next().map(parse_count).unwrap_or(0);
                RecordLine::BranchHits { key, hits }
            }
            "LF" | "LH" | "BRF" | "BRH" | "FNF" | "FNH" => RecordLine::Summary,
            _ => RecordLine::Unknown,
        }
    }
}

fn parse_count(field: &str) -> u64 {
    field.trim().parse::<u64>().unwrap_or(0)
}

/// Line, block and branch numbers; anything outside `u32` reads as 0
fn parse_line(field: &str) -> u32 {
    field.trim().parse::<u32>().unwrap_or(0)
}

/// Parse LCOV content from a string
pub fn parse_lcov_string(content: &str) -> CoverageModel {
    parse_lcov_with_prefix(content, "")
}

/// Parse LCOV content, normalizing each source path against `prefix`
pub fn parse_lcov_with_prefix(content: &str, prefix: &str) -> CoverageModel {
    let mut records: Vec<SourceFileRecord> = Vec::new();
    let mut current: Option<SourceFileRecord> = None;

    for line in content.lines() {
        match RecordLine::classify(line) {
            RecordLine::SourceFile(path) => {
                // a new section implicitly closes one left open
                if let Some(record) = current.take() {
                    records.push(record);
                }
                current = Some(SourceFileRecord::new(normalize_path(path, prefix)));
            }
            RecordLine::EndOfRecord => {
                if let Some(record) = current.take() {
                    records.push(record);
                }
            }
            RecordLine::LineHits { line, hits } => {
                if let Some(record) = current.as_mut() {
                    record.lines.insert(line, hits);
                }
            }
            RecordLine::BranchHits { key, hits } => {
                if let Some(record) = current.as_mut() {
                    record.branches.insert(key, hits);
                }
            }
            RecordLine::FunctionDecl { name, .. } => {
                if let Some(record) = current.as_mut() {
                    record.functions.entry(name.to_string()).or_insert(0);
                }
            }
            RecordLine::FunctionHits { hits, name } => {
                if let Some(record) = current.as_mut() {
                    record.functions.insert(name.to_string(), hits);
                }
            }
            RecordLine::TestName(_) | RecordLine::Summary | RecordLine::Unknown => {}
        }
    }

    if let Some(record) = current.take() {
        records.push(record);
    }

    CoverageModel::from_records(records)
}
