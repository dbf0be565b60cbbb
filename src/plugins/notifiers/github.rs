use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde_json::json;
use tracing::info;

use crate::config::GitHubConfig;
use crate::plugins::traits::{AlertMessage, NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Opens one issue per alert in the configured repository.
pub struct GitHubNotifier {
    client: Client,
    config: GitHubConfig,
}

impl GitHubNotifier {
    pub fn new(config: GitHubConfig) -> Self {
        GitHubNotifier {
            client: Client::new(),
            config,
        }
    }

    fn failure(message: impl Into<String>) -> AppError {
        AppError::Notification {
            notifier: "github".to_string(),
            message: message.into(),
        }
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let token = self
            .config
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Self::failure("GitHub token not configured"))?;
        let repository = self
            .config
            .repository
            .as_deref()
            .filter(|r| r.contains('/'))
            .ok_or_else(|| Self::failure("GitHub repository not configured (expected owner/name)"))?;
        Ok((token, repository))
    }

    fn issues_url(&self, repository: &str) -> String {
        format!(
            "{}/repos/{}/issues",
            self.config.api_url.trim_end_matches('/'),
            repository
        )
    }

    fn create_issue_payload(&self, message: &AlertMessage) -> serde_json::Value {
        json!({
            "title": message.title,
            "body": message.body,
            "labels": self.config.labels,
        })
    }
}

#[async_trait]
impl NotifierPlugin for GitHubNotifier {
    fn name(&self) -> &str {
        "GitHub Issue Notifier"
    }

    fn plugin_type(&self) -> &str {
        "github"
    }

    async fn notify(&self, message: &AlertMessage) -> Result<NotificationResult> {
        let (token, repository) = self.credentials()?;

        let response = self
            .client
            .post(self.issues_url(repository))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, concat!("deal-watcher/", env!("CARGO_PKG_VERSION")))
            .json(&self.create_issue_payload(message))
            .send()
            .await
            .map_err(|e| Self::failure(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::failure(format!("GitHub API returned {}: {}", status, body)));
        }

        let created: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Self::failure(format!("unreadable response: {}", e)))?;
        let issue_url = created
            .get("html_url")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        info!(
            "GitHub issue created for {}: {}",
            message.item_name,
            issue_url.as_deref().unwrap_or("(no url)")
        );

        Ok(NotificationResult::delivered(issue_url))
    }
}
