// Issue tracker collaborator
//
// The GitLab client is the only component with real I/O. The core
// hands it a fully resolved IssueRequest; everything about the API
// (auth header, project addressing, assignee lookup) stays in here.

use crate::config::TrackerConfig;
use crate::errors::TrackerError;
use crate::models::{CreatedIssue, IssueRequest};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Interface for creating tickets in an external tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Create one ticket. May fail independently of the core; the
    /// dispatcher catches failures per-template.
    async fn create_issue(&self, request: &IssueRequest) -> Result<CreatedIssue, TrackerError>;
}

/// GitLab implementation of the tracker collaborator.
pub struct GitLabTracker {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabUser {
    id: u64,
}

impl GitLabTracker {
    /// Create a tracker client from the configured connection settings.
    pub fn new(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| TrackerError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(PRIVATE_TOKEN_HEADER, token),
            None => request,
        }
    }

    /// Verify the configured token against the tracker.
    ///
    /// Called once at startup when a token is configured; a bad token
    /// fails the run before any template is evaluated.
    pub async fn verify_auth(&self) -> Result<(), TrackerError> {
        if self.token.is_none() {
            return Ok(());
        }

        let url = format!("{}/api/v4/user", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| TrackerError::RequestFailed(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(TrackerError::AuthenticationFailed(
                "tracker rejected the configured token".to_string(),
            ));
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::UnexpectedStatus { status, body });
        }

        debug!("Tracker token verified");
        Ok(())
    }

    /// Resolve a tracker username to its numeric user id.
    async fn lookup_user(&self, username: &str) -> Result<u64, TrackerError> {
        let url = format!("{}/api/v4/users", self.base_url);
        let response = self
            .authorize(self.client.get(&url).query(&[("username", username)]))
            .send()
            .await
            .map_err(|e| TrackerError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::UnexpectedStatus { status, body });
        }

        let users: Vec<GitLabUser> = response
            .json()
            .await
            .map_err(|e| TrackerError::InvalidResponse(e.to_string()))?;

        users
            .first()
            .map(|user| user.id)
            .ok_or_else(|| TrackerError::UserNotFound(username.to_string()))
    }
}

#[async_trait]
impl IssueTracker for GitLabTracker {
    #[tracing::instrument(skip(self, request), fields(project = %request.project, title = %request.title))]
    async fn create_issue(&self, request: &IssueRequest) -> Result<CreatedIssue, TrackerError> {
        let mut body = json!({
            "title": request.title,
            "description": request.description,
        });

        if !request.labels.is_empty() {
            body["labels"] = json!(request.labels.join(","));
        }

        if let Some(assignee) = &request.assignee {
            let user_id = self.lookup_user(assignee).await?;
            debug!(username = %assignee, user_id, "Resolved assignee");
            body["assignee_ids"] = json!([user_id]);
        }

        let url = format!(
            "{}/api/v4/projects/{}/issues",
            self.base_url,
            urlencoding::encode(&request.project)
        );

        let response = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| TrackerError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::UnexpectedStatus { status, body });
        }

        let issue: CreatedIssue = response
            .json()
            .await
            .map_err(|e| TrackerError::InvalidResponse(e.to_string()))?;

        info!(iid = issue.iid, web_url = %issue.web_url, "Created tracker issue");
        Ok(issue)
    }
}

/// Tracker stand-in that logs instead of calling the network.
pub struct DryRunTracker;

#[async_trait]
impl IssueTracker for DryRunTracker {
    async fn create_issue(&self, request: &IssueRequest) -> Result<CreatedIssue, TrackerError> {
        info!(
            project = %request.project,
            title = %request.title,
            labels = ?request.labels,
            assignee = ?request.assignee,
            "Dry run: would create tracker issue"
        );
        Ok(CreatedIssue {
            iid: 0,
            web_url: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;

    fn config(url: &str) -> TrackerConfig {
        TrackerConfig {
            server_url: url.to_string(),
            token: None,
            timeout_seconds: 30,
        }
    }

    #[test]
    fn test_tracker_creation() {
        assert!(GitLabTracker::new(&config("https://gitlab.com")).is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let tracker = GitLabTracker::new(&config("https://gitlab.example.com/")).unwrap();
        assert_eq!(tracker.base_url, "https://gitlab.example.com");
    }

    #[tokio::test]
    async fn test_verify_auth_is_noop_without_token() {
        // No token configured: nothing to verify, no network call
        let tracker = GitLabTracker::new(&config("http://127.0.0.1:1")).unwrap();
        assert!(tracker.verify_auth().await.is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_tracker_never_fails() {
        let request = IssueRequest {
            project: "ops/maintenance".to_string(),
            title: "Rotate backups".to_string(),
            description: String::new(),
            labels: vec!["recurring".to_string()],
            assignee: Some("btasker".to_string()),
        };
        let issue = DryRunTracker.create_issue(&request).await.unwrap();
        assert_eq!(issue.iid, 0);
    }
}
