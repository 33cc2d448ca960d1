//! lcov-reporter - coverage reports for pull requests
//!
//! A library for turning LCOV output into a publishable Markdown report with:
//! - A total LCOV parser that tolerates truncated and malformed input
//! - Per-file and whole-report summaries with baseline deltas
//! - Optional restriction to files changed by the revision
//! - Size-bounded rendering for comments and job summaries

pub mod changes;
pub mod config;
pub mod coverage;
pub mod error;
pub mod git;
pub mod github;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod sink;

pub use config::{Options, PostTo};
pub use changes::ChangedFiles;
pub use coverage::{
    diff, filter_changed, parse_lcov_string, summarize, CoverageModel, ReportDelta,
};
pub use error::ReporterError;
pub use pipeline::{Outcome, Reporter};
pub use report::{render, render_within, RenderOptions};
