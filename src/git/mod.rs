//! Git operations module
//!
//! Provides:
//! - Changed file detection between two revisions of the local checkout

pub mod diff;

pub use diff::GitDiff;
