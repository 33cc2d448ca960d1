//! GitHub REST calls: changed files, report comments, old-report cleanup

use log::{debug, info};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use super::Event;
use crate::changes::ChangedFiles;
use crate::error::ReporterError;

const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct ChangedFile {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct Comparison {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

#[derive(Debug, Deserialize)]
struct Comment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
}

/// Thin client over the REST endpoints this tool needs
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    api_url: String,
    repository: String,
}

impl GitHubClient {
    pub fn new(token: &str, api_url: &str, repository: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
        }
    }

    fn request(&self, method: Method, route: &str) -> RequestBuilder {
        let url = format!("{}/repos/{}/{}", self.api_url, self.repository, route);
        debug!("{} {}", method, url);

        self.http
            .request(method, url)
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", "lcov-reporter")
            .header("Accept", "application/vnd.github.v3+json")
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response, ReporterError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ReporterError::GitHub(format!("{} failed: {}", what, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ReporterError::GitHub(format!("{} failed: {} - {}", what, status, text)));
        }

        Ok(response)
    }

    /// Fetch every page of a list endpoint
    async fn paginate<T: for<'de> Deserialize<'de>>(
        &self,
        route: &str,
        what: &str,
    ) -> Result<Vec<T>, ReporterError> {
        let mut items = Vec::new();

        for page in 1.. {
            let builder = self
                .request(Method::GET, route)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let batch: Vec<T> = self.send(builder, what).await?.json().await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }

        Ok(items)
    }

    /// Post the report where the triggering event lives: the pull request thread or the commit
    pub async fn post_comment(&self, event: &Event, body: &str) -> Result<bool, ReporterError> {
        let (route, what) = match event {
            Event::PullRequest { number, .. } => {
                (format!("issues/{}/comments", number), "creating pull request comment")
            }
            Event::Push { after, .. } => {
                (format!("commits/{}/comments", after), "creating commit comment")
            }
            Event::Other(_) => return Ok(false),
        };

        let builder = self.request(Method::POST, &route).json(&json!({ "body": body }));
        self.send(builder, what).await?;

        Ok(true)
    }

    /// Delete earlier reports carrying `signature`. Returns how many were removed.
    pub async fn delete_old_comments(
        &self,
        event: &Event,
        signature: &str,
    ) -> Result<usize, ReporterError> {
        let (list_route, delete_prefix) = match event {
            Event::PullRequest { number, .. } => {
                (format!("issues/{}/comments", number), "issues/comments")
            }
            Event::Push { after, .. } => (format!("commits/{}/comments", after), "comments"),
            Event::Other(_) => return Ok(0),
        };

        let comments: Vec<Comment> = self.paginate(&list_route, "listing comments").await?;
        let stale: Vec<u64> = comments
            .into_iter()
            .filter(|c| c.body.as_deref().map(|b| b.contains(signature)).unwrap_or(false))
            .map(|c| c.id)
            .collect();

        for id in &stale {
            let builder = self.request(Method::DELETE, &format!("{}/{}", delete_prefix, id));
            self.send(builder, "deleting old comment").await?;
        }

        if !stale.is_empty() {
            info!("Deleted {} previous coverage report(s)", stale.len());
        }

        Ok(stale.len())
    }
}

impl ChangedFiles for GitHubClient {
    /// Files touched by the revision range of the triggering event
    async fn changed_files(&self, event: &Event) -> Result<Vec<String>, ReporterError> {
        let files: Vec<ChangedFile> = match event {
            Event::PullRequest { number, .. } => {
                self.paginate(&format!("pulls/{}/files", number), "listing pull request files")
                    .await?
            }
            Event::Push { before, after, .. } => {
                let builder = self.request(Method::GET, &format!("compare/{}...{}", before, after));
                let comparison: Comparison =
                    self.send(builder, "comparing commits").await?.json().await?;
                comparison.files
            }
            Event::Other(name) => {
                return Err(ReporterError::Config(format!(
                    "cannot list changed files for '{}' events",
                    name
                )))
            }
        };

        Ok(files.into_iter().map(|f| f.filename).collect())
    }
}
