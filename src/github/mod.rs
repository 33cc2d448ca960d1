//! GitHub module
//!
//! Provides:
//! - Run context from the Actions environment (event, repository, commits)
//! - REST client for changed files, report comments and old-comment cleanup

mod client;

pub use client::*;

use serde_json::Value;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::ReporterError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// The workflow event that triggered the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PullRequest {
        number: u64,
        head_sha: String,
        base_sha: String,
        head_ref: String,
        base_ref: String,
    },
    Push {
        before: String,
        after: String,
        git_ref: String,
    },
    Other(String),
}

impl Event {
    /// Read the event from its name and webhook payload
    pub fn from_payload(name: &str, payload: &Value) -> Self {
        let text = |pointer: &str| {
            payload
                .pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match name {
            "pull_request" | "pull_request_target" => Event::PullRequest {
                number: payload
                    .pointer("/pull_request/number")
                    .and_then(Value::as_u64)
                    .unwrap_or_default(),
                head_sha: text("/pull_request/head/sha"),
                base_sha: text("/pull_request/base/sha"),
                head_ref: text("/pull_request/head/ref"),
                base_ref: text("/pull_request/base/ref"),
            },
            "push" => Event::Push {
                before: text("/before"),
                after: text("/after"),
                git_ref: text("/ref"),
            },
            other => Event::Other(other.to_string()),
        }
    }

    /// Commit under test
    pub fn commit(&self) -> Option<&str> {
        let sha = match self {
            Event::PullRequest { head_sha, .. } => head_sha.as_str(),
            Event::Push { after, .. } => after.as_str(),
            Event::Other(_) => "",
        };
        Some(sha).filter(|s| !s.is_empty())
    }

    /// Commit the revision is compared against
    pub fn base_commit(&self) -> Option<&str> {
        let sha = match self {
            Event::PullRequest { base_sha, .. } => base_sha.as_str(),
            Event::Push { before, .. } => before.as_str(),
            Event::Other(_) => "",
        };
        Some(sha).filter(|s| !s.is_empty())
    }

    /// Line shown under the report heading
    pub fn subtitle(&self) -> Option<String> {
        match self {
            Event::PullRequest { head_ref, base_ref, .. } if !head_ref.is_empty() => Some(format!(
                "Coverage after merging `{}` into `{}`",
                head_ref, base_ref
            )),
            Event::Push { git_ref, .. } if !git_ref.is_empty() => {
                Some(format!("Coverage for `{}`", git_ref))
            }
            _ => None,
        }
    }
}

/// Everything the run needs from the Actions environment
#[derive(Debug, Clone)]
pub struct RunContext {
    pub event: Event,
    /// `owner/name`
    pub repository: Option<String>,
    pub api_url: String,
    pub step_summary: Option<PathBuf>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            event: Event::Other(String::new()),
            repository: None,
            api_url: DEFAULT_API_URL.to_string(),
            step_summary: None,
        }
    }
}

impl RunContext {
    pub fn from_env() -> Result<Self, ReporterError> {
        let name = env::var("GITHUB_EVENT_NAME").unwrap_or_default();

        let payload = match env::var("GITHUB_EVENT_PATH") {
            Ok(path) if !path.is_empty() => {
                let content = fs::read_to_string(&path)?;
                serde_json::from_str(&content)?
            }
            _ => Value::Null,
        };

        let mut event = Event::from_payload(&name, &payload);

        // the payload may be missing outside Actions; fall back to plain variables
        if let Event::Push { after, git_ref, .. } = &mut event {
            if after.is_empty() {
                *after = env::var("GITHUB_SHA").unwrap_or_default();
            }
            if git_ref.is_empty() {
                *git_ref = env::var("GITHUB_REF").unwrap_or_default();
            }
        }

        Ok(Self {
            event,
            repository: env::var("GITHUB_REPOSITORY").ok().filter(|r| !r.is_empty()),
            api_url: env::var("GITHUB_API_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            step_summary: env::var("GITHUB_STEP_SUMMARY")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pull_request_event() {
        let payload = json!({
            "pull_request": {
                "number": 42,
                "head": { "sha": "abc123", "ref": "feature/x" },
                "base": { "sha": "def456", "ref": "main" }
            }
        });

        let event = Event::from_payload("pull_request_target", &payload);

        assert_eq!(
            event,
            Event::PullRequest {
                number: 42,
                head_sha: "abc123".to_string(),
                base_sha: "def456".to_string(),
                head_ref: "feature/x".to_string(),
                base_ref: "main".to_string(),
            }
        );
        assert_eq!(event.commit(), Some("abc123"));
        assert_eq!(event.base_commit(), Some("def456"));
        assert_eq!(
            event.subtitle().unwrap(),
            "Coverage after merging `feature/x` into `main`"
        );
    }

    #[test]
    fn test_push_event() {
        let payload = json!({ "before": "111", "after": "222", "ref": "refs/heads/main" });

        let event = Event::from_payload("push", &payload);

        assert_eq!(event.commit(), Some("222"));
        assert_eq!(event.base_commit(), Some("111"));
        assert_eq!(event.subtitle().unwrap(), "Coverage for `refs/heads/main`");
    }

    #[test]
    fn test_other_event() {
        let event = Event::from_payload("workflow_dispatch", &Value::Null);
        assert_eq!(event, Event::Other("workflow_dispatch".to_string()));
        assert!(event.commit().is_none());
        assert!(event.subtitle().is_none());
    }
}
