//! The reporting pipeline: read, parse, diff, filter, render, publish

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::changes::collect_changed;
use crate::config::{Options, PostTo};
use crate::coverage::{diff, filter_changed, parse_lcov_with_prefix, ReportDelta};
use crate::error::ReporterError;
use crate::git::GitDiff;
use crate::github::{Event, GitHubClient, RunContext};
use crate::report::{render, render_within, signature};
use crate::sink;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The report was delivered to its sink
    Published,
    /// No current coverage report exists yet
    NoCoverage,
    /// The sink was not recognized; nothing was published
    UnknownSink(String),
}

/// Read a coverage report, treating a missing or empty file as absent.
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn read_report(path: &Path) -> Result<Option<String>, ReporterError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let content = String::from_utf8_lossy(&bytes);
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(content.into_owned()))
}

/// Parse both reports, diff them and optionally keep only changed files
pub fn build_report(
    prefix: &str,
    current: &str,
    baseline: Option<&str>,
    changed: Option<&HashSet<String>>,
) -> ReportDelta {
    let current = parse_lcov_with_prefix(current, prefix);
    let baseline = baseline.map(|text| parse_lcov_with_prefix(text, prefix));
    debug!(
        "Parsed {} current and {} baseline file records",
        current.len(),
        baseline.as_ref().map(|b| b.len()).unwrap_or(0)
    );

    let report = diff(&current, baseline.as_ref());

    match changed {
        Some(paths) => filter_changed(report, paths),
        None => report,
    }
}

/// One run of the reporter
pub struct Reporter<'a> {
    options: &'a Options,
    context: &'a RunContext,
    client: Option<GitHubClient>,
}

impl<'a> Reporter<'a> {
    pub fn new(options: &'a Options, context: &'a RunContext) -> Self {
        let client = match (&options.github_token, &context.repository) {
            (Some(token), Some(repository)) => {
                Some(GitHubClient::new(token, &context.api_url, repository))
            }
            _ => None,
        };

        Self { options, context, client }
    }

    pub async fn run(&self) -> Result<Outcome> {
        let options = self.options;

        let Some(current) = read_report(&options.lcov_file)
            .with_context(|| format!("Failed to read {}", options.lcov_file.display()))?
        else {
            info!("No coverage report found at '{}', exiting...", options.lcov_file.display());
            return Ok(Outcome::NoCoverage);
        };

        let baseline = match options.lcov_base {
            Some(ref path) => match read_report(path) {
                Ok(Some(text)) => Some(text),
                Ok(None) => {
                    info!("No coverage report found at '{}', ignoring...", path.display());
                    None
                }
                Err(e) => {
                    warn!(
                        "Could not read baseline '{}': {}; reporting without deltas",
                        path.display(),
                        e
                    );
                    None
                }
            },
            None => None,
        };

        let changed = if options.filter_changed_files {
            let changed = self.changed_files().await?;
            info!("Filtering report to {} changed file(s)", changed.len());
            Some(changed)
        } else {
            None
        };

        let report = build_report(
            &options.path_prefix(),
            &current,
            baseline.as_deref(),
            changed.as_ref(),
        );

        if options.delete_old_comments {
            self.delete_old_comments().await?;
        }

        let render_options = options.render_options(self.context.event.subtitle());
        let body = match sink::budget(&options.post_to) {
            Some(max_chars) => render_within(&report, &render_options, max_chars),
            None => render(&report, &render_options),
        };

        match options.post_to {
            PostTo::Comment => {
                sink::post_comment(self.client.as_ref(), self.context, &body)
                    .await
                    .context("Failed to post coverage comment")?;
            }
            PostTo::JobSummary => {
                sink::append_job_summary(self.context, &body)
                    .context("Failed to write job summary")?;
            }
            PostTo::File => {
                sink::write_file(&options.save_file, &body)
                    .with_context(|| format!("Failed to write {}", options.save_file.display()))?;
            }
            PostTo::Unknown(ref value) => {
                warn!("Unknown post-to value: '{}'", value);
                return Ok(Outcome::UnknownSink(value.clone()));
            }
        }

        Ok(Outcome::Published)
    }

    /// Paths touched by the revision, normalized like report paths
    async fn changed_files(&self) -> Result<HashSet<String>> {
        let event = &self.context.event;

        let prefix = self.options.path_prefix();

        let changed = match (&self.client, event) {
            (Some(client), Event::PullRequest { .. } | Event::Push { .. }) => {
                collect_changed(client, event, &prefix).await
            }
            _ => {
                debug!("Listing changed files from the local checkout");
                let git = GitDiff::new(Path::new(&self.options.working_directory))?;
                collect_changed(&git, event, &prefix).await
            }
        };

        changed.context("Failed to list changed files")
    }

    async fn delete_old_comments(&self) -> Result<()> {
        let Some(ref client) = self.client else {
            warn!("delete-old-comments needs a github-token and GITHUB_REPOSITORY; skipping");
            return Ok(());
        };

        client
            .delete_old_comments(&self.context.event, &signature(&self.options.title))
            .await
            .context("Failed to delete old comments")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileConfig, Inputs};
    use tempfile::tempdir;

    const CURRENT: &str = "\
SF:src/a.js\nDA:1,1\nDA:2,1\nDA:3,0\nDA:4,1\nend_of_record\n\
SF:src/b.js\nDA:1,1\nend_of_record\n";
    const BASELINE: &str = "SF:src/a.js\nDA:1,1\nDA:2,0\nDA:3,0\nDA:4,0\nend_of_record\n";

    fn options_in(dir: &Path, post_to: &str) -> Options {
        let inputs = Inputs {
            working_directory: Some(dir.display().to_string()),
            lcov_base: Some(dir.join("base.info").display().to_string()),
            post_to: Some(post_to.to_string()),
            save_file: Some("out/report.md".to_string()),
            ..Default::default()
        };
        Options::resolve(inputs, FileConfig::default()).unwrap()
    }

    #[test]
    fn test_read_report_missing_and_empty() {
        let dir = tempdir().unwrap();
        assert!(read_report(&dir.path().join("nope.info")).unwrap().is_none());

        fs::write(dir.path().join("empty.info"), "  \n").unwrap();
        assert!(read_report(&dir.path().join("empty.info")).unwrap().is_none());
    }

    #[test]
    fn test_read_report_replaces_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.info");
        fs::write(&path, b"SF:caf\xE9.js\nend_of_record\n").unwrap();

        let content = read_report(&path).unwrap().unwrap();

        assert_eq!(content, "SF:caf\u{FFFD}.js\nend_of_record\n");
    }

    #[test]
    fn test_build_report_filters_rows_only() {
        let changed: HashSet<String> = ["src/b.js".to_string()].into_iter().collect();

        let full = build_report("", CURRENT, Some(BASELINE), None);
        let filtered = build_report("", CURRENT, Some(BASELINE), Some(&changed));

        assert_eq!(full.files.len(), 2);
        assert_eq!(filtered.files.len(), 1);
        assert_eq!(filtered.current, full.current);
        assert_eq!(filtered.delta, full.delta);
    }

    #[tokio::test]
    async fn test_run_writes_file() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("coverage")).unwrap();
        fs::write(dir.path().join("coverage/lcov.info"), CURRENT).unwrap();
        fs::write(dir.path().join("base.info"), BASELINE).unwrap();
        let options = options_in(dir.path(), "file");
        let context = RunContext::default();

        let outcome = Reporter::new(&options, &context).run().await.unwrap();

        assert_eq!(outcome, Outcome::Published);
        let body = fs::read_to_string(dir.path().join("out/report.md")).unwrap();
        assert!(body.contains("| src/a.js | 75.00% | ↑ +50.00% |"));
        assert!(body.contains("| src/b.js | 100.00% | new |"));
    }

    #[tokio::test]
    async fn test_run_without_coverage_exits_cleanly() {
        let dir = tempdir().unwrap();
        let options = options_in(dir.path(), "file");
        let context = RunContext::default();

        let outcome = Reporter::new(&options, &context).run().await.unwrap();

        assert_eq!(outcome, Outcome::NoCoverage);
        assert!(!dir.path().join("out/report.md").exists());
    }

    #[tokio::test]
    async fn test_run_with_unknown_sink() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("coverage")).unwrap();
        fs::write(dir.path().join("coverage/lcov.info"), CURRENT).unwrap();
        let options = options_in(dir.path(), "slack");
        let context = RunContext::default();

        let outcome = Reporter::new(&options, &context).run().await.unwrap();

        assert_eq!(outcome, Outcome::UnknownSink("slack".to_string()));
    }

    #[tokio::test]
    async fn test_comment_on_other_event_is_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("coverage")).unwrap();
        fs::write(dir.path().join("coverage/lcov.info"), CURRENT).unwrap();
        let options = options_in(dir.path(), "comment");
        let context = RunContext {
            event: Event::Other("workflow_dispatch".to_string()),
            ..Default::default()
        };

        let outcome = Reporter::new(&options, &context).run().await.unwrap();

        assert_eq!(outcome, Outcome::Published);
    }

    #[tokio::test]
    async fn test_comment_on_push_without_token_fails() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("coverage")).unwrap();
        fs::write(dir.path().join("coverage/lcov.info"), CURRENT).unwrap();
        let options = options_in(dir.path(), "comment");
        let context = RunContext {
            event: Event::Push {
                before: "111".to_string(),
                after: "222".to_string(),
                git_ref: "refs/heads/main".to_string(),
            },
            ..Default::default()
        };

        let result = Reporter::new(&options, &context).run().await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_tolerates_invalid_utf8() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("coverage")).unwrap();
        fs::write(
            dir.path().join("coverage/lcov.info"),
            b"SF:src/caf\xE9.js\nDA:1,1\nDA:2,0\nend_of_record\n",
        )
        .unwrap();
        let options = options_in(dir.path(), "file");
        let context = RunContext::default();

        let outcome = Reporter::new(&options, &context).run().await.unwrap();

        assert_eq!(outcome, Outcome::Published);
        let body = fs::read_to_string(dir.path().join("out/report.md")).unwrap();
        assert!(body.contains("| src/caf\u{FFFD}.js | 50.00% |"));
    }

    #[tokio::test]
    async fn test_unreadable_baseline_is_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("coverage")).unwrap();
        fs::write(dir.path().join("coverage/lcov.info"), CURRENT).unwrap();
        // a directory where the baseline file should be
        fs::create_dir_all(dir.path().join("base.info")).unwrap();
        let options = options_in(dir.path(), "file");
        let context = RunContext::default();

        let outcome = Reporter::new(&options, &context).run().await.unwrap();

        assert_eq!(outcome, Outcome::Published);
        let body = fs::read_to_string(dir.path().join("out/report.md")).unwrap();
        assert!(!body.contains("Δ"));
        assert!(body.contains("| src/a.js | 75.00% |"));
    }

    #[tokio::test]
    async fn test_filter_without_revision_range_fails() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("coverage")).unwrap();
        fs::write(dir.path().join("coverage/lcov.info"), CURRENT).unwrap();
        let mut options = options_in(dir.path(), "file");
        options.filter_changed_files = true;
        let context = RunContext::default();

        let result = Reporter::new(&options, &context).run().await;

        assert!(result.is_err());
    }
}
