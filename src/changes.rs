//! Sources of the paths a revision touched
//!
//! Implemented by the GitHub client (pull request files, push comparisons)
//! and by the local git checkout.

use std::collections::HashSet;
use std::future::Future;

use crate::coverage::normalize_path;
use crate::error::ReporterError;
use crate::github::Event;

/// Lists the files touched by the revision range of an event
pub trait ChangedFiles {
    fn changed_files(
        &self,
        event: &Event,
    ) -> impl Future<Output = Result<Vec<String>, ReporterError>>;
}

/// Ask `provider` for the touched files and normalize them like report paths
pub async fn collect_changed<P: ChangedFiles>(
    provider: &P,
    event: &Event,
    prefix: &str,
) -> Result<HashSet<String>, ReporterError> {
    let files = provider.changed_files(event).await?;
    Ok(files.iter().map(|f| normalize_path(f, prefix)).collect())
}
