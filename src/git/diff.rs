//! Changed files from the local repository, used when no GitHub API is available

use git2::{DiffOptions, Repository};
use std::collections::BTreeSet;
use std::path::Path;

use crate::changes::ChangedFiles;
use crate::error::ReporterError;
use crate::github::Event;

/// Git diff operations
pub struct GitDiff {
    repo: Repository,
}

impl GitDiff {
    /// Open the repository containing `path`
    pub fn new(path: &Path) -> Result<Self, ReporterError> {
        let repo = Repository::discover(path).map_err(|e| {
            ReporterError::Git(format!(
                "failed to find git repository at {}: {}",
                path.display(),
                e.message()
            ))
        })?;

        Ok(Self { repo })
    }

    /// Files added, modified, renamed or deleted between two revisions, sorted
    pub fn changed_between(&self, from: &str, to: &str) -> Result<Vec<String>, ReporterError> {
        let mut files: BTreeSet<String> = BTreeSet::new();

        let from_tree = self.repo.revparse_single(from)?.peel_to_commit()?.tree()?;
        let to_tree = self.repo.revparse_single(to)?.peel_to_commit()?.tree()?;

        let mut diff_opts = DiffOptions::new();
        let diff = self.repo.diff_tree_to_tree(
            Some(&from_tree),
            Some(&to_tree),
            Some(&mut diff_opts),
        )?;

        diff.foreach(
            &mut |delta, _| {
                if let Some(path) = delta.new_file().path() {
                    files.insert(path.to_string_lossy().to_string());
                }
                if let Some(path) = delta.old_file().path() {
                    files.insert(path.to_string_lossy().to_string());
                }
                true
            },
            None,
            None,
            None,
        )?;

        Ok(files.into_iter().collect())
    }
}

impl ChangedFiles for GitDiff {
    async fn changed_files(&self, event: &Event) -> Result<Vec<String>, ReporterError> {
        let (Some(base), Some(head)) = (event.base_commit(), event.commit()) else {
            return Err(ReporterError::Config(
                "cannot filter changed files: no revision range for this event".into(),
            ));
        };
        self.changed_between(base, head)
    }
}
