//! Report sinks: discussion comment, job summary, file

use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::config::PostTo;
use crate::error::ReporterError;
use crate::github::{Event, GitHubClient, RunContext};

pub const MAX_COMMENT_CHARS: usize = 65_536;
pub const MAX_JOB_SUMMARY_CHARS: usize = 1_024_000;

/// Character budget for a sink, `None` when the body is written whole
pub fn budget(post_to: &PostTo) -> Option<usize> {
    match post_to {
        PostTo::Comment => Some(MAX_COMMENT_CHARS),
        PostTo::JobSummary => Some(MAX_JOB_SUMMARY_CHARS),
        PostTo::File | PostTo::Unknown(_) => None,
    }
}

/// Write the report to `path`, creating parent directories
pub fn write_file(path: &Path, body: &str) -> Result<(), ReporterError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)?;
    info!("Coverage report written to {}", path.display());
    Ok(())
}

/// Append the report to the run's job summary file
pub fn append_job_summary(context: &RunContext, body: &str) -> Result<(), ReporterError> {
    let path = context.step_summary.as_deref().ok_or_else(|| {
        ReporterError::Config("GITHUB_STEP_SUMMARY is not set; cannot write a job summary".into())
    })?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(file, "{}", body)?;
    info!("Coverage report appended to job summary");
    Ok(())
}

/// Post the report as a pull request or commit comment
pub async fn post_comment(
    client: Option<&GitHubClient>,
    context: &RunContext,
    body: &str,
) -> Result<(), ReporterError> {
    if let Event::Other(ref name) = context.event {
        warn!("Not a pull request or push event ('{}'); no comment posted", name);
        return Ok(());
    }

    let client = client.ok_or_else(|| {
        ReporterError::Config("posting a comment needs a github-token and GITHUB_REPOSITORY".into())
    })?;

    client.post_comment(&context.event, body).await?;
    info!("Coverage report posted as a comment");
    Ok(())
}
