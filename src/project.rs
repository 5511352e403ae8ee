//! Project Service Client
//!
//! REST client for the project service that owns all durable state: the
//! project record, the externally held `guide_running` lock flag, per-section
//! completion reports, and the restore endpoint used on abort paths. Every
//! call is bearer-token authenticated with the token carried in the request.

use crate::completion::Language;
use crate::error::ProjectApiError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Externally owned project record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub information: String,
    #[serde(default)]
    pub serializer_info: String,
    #[serde(default)]
    pub url_info: String,
    #[serde(default)]
    pub view_info: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub guide_running: bool,
}

impl Project {
    pub fn language(&self) -> Language {
        Language::from_project_lang(&self.lang)
    }
}

/// Per-section completion report
///
/// `is_final` is a completion signal, not a success signal: it is true for
/// the last section in request order regardless of that section's outcome,
/// and tells the project service no further completions are coming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionReport {
    pub project_id: String,
    pub asset_parent: String,
    pub asset_id: String,
    pub content: Option<String>,
    pub success: bool,
    #[serde(rename = "isFinal")]
    pub is_final: bool,
}

/// Project service operations used by the orchestrator
#[async_trait]
pub trait ProjectService: Send + Sync {
    /// Load a project by id. Any non-200 response maps to `NotFound`.
    async fn fetch_project(
        &self,
        project_id: &str,
        token: &str,
    ) -> Result<Project, ProjectApiError>;

    /// Set the `guide_running` lock flag. A failure means the lock was not
    /// acquired and the caller must abort, not retry.
    async fn set_guide_running(&self, project_id: &str, token: &str)
        -> Result<(), ProjectApiError>;

    /// Report one section's completion status.
    async fn report_section(
        &self,
        report: &SectionReport,
        token: &str,
    ) -> Result<(), ProjectApiError>;

    /// Release a project's pending state. Idempotent to re-issue.
    async fn restore_project(
        &self,
        project_id: &str,
        asset_parent: &str,
        token: &str,
    ) -> Result<(), ProjectApiError>;
}

/// HTTP implementation of [`ProjectService`]
pub struct HttpProjectService {
    client: Client,
    base_url: String,
}

impl HttpProjectService {
    pub fn new(base_url: &str) -> Result<Self, ProjectApiError> {
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ProjectApiError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    async fn post_json(
        &self,
        path: &str,
        payload: &serde_json::Value,
        token: &str,
    ) -> Result<(), ProjectApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| ProjectApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ProjectApiError::RequestFailed {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl ProjectService for HttpProjectService {
    async fn fetch_project(
        &self,
        project_id: &str,
        token: &str,
    ) -> Result<Project, ProjectApiError> {
        let url = format!("{}project/info/{}/", self.base_url, project_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProjectApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(project_id, status = status.as_u16(), body = %body, "project fetch failed");
            return Err(ProjectApiError::NotFound(project_id.to_string()));
        }

        debug!(project_id, "project fetched");
        response
            .json()
            .await
            .map_err(|e| ProjectApiError::Transport(format!("Failed to parse project: {}", e)))
    }

    async fn set_guide_running(
        &self,
        project_id: &str,
        token: &str,
    ) -> Result<(), ProjectApiError> {
        let payload = json!({
            "project_id": project_id,
            "guide_running": true,
        });
        self.post_json("project/running-guide/", &payload, token)
            .await
    }

    async fn report_section(
        &self,
        report: &SectionReport,
        token: &str,
    ) -> Result<(), ProjectApiError> {
        let payload = serde_json::to_value(report)
            .map_err(|e| ProjectApiError::Transport(e.to_string()))?;
        self.post_json("project/guide-reference-completion/", &payload, token)
            .await
    }

    async fn restore_project(
        &self,
        project_id: &str,
        asset_parent: &str,
        token: &str,
    ) -> Result<(), ProjectApiError> {
        let payload = json!({
            "project_id": project_id,
            "asset_parent": asset_parent,
        });
        self.post_json("project/restore/", &payload, token).await
    }
}
