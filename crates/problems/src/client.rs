//! HTTP client for the audit backend.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::models::{RawRecord, Task};
use crate::source::ProblemSource;

/// Audit and agent task lists for one project.
#[derive(Debug, Clone, Default)]
pub struct ProjectTasks {
    pub audit: Vec<Task>,
    pub agent: Vec<Task>,
}

/// REST client for the audit backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client from `config`.
    ///
    /// # Errors
    /// Returns error if the token is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| FetchError::Other(format!("Invalid access token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from environment variables.
    ///
    /// # Errors
    /// See [`ApiClient::new`].
    pub fn from_env() -> Result<Self, FetchError> {
        Self::new(&ApiConfig::default())
    }

    /// GET `path`, turning non-success statuses into errors.
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, FetchError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "GET");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// GET a list of records; a `null` body counts as an empty list.
    async fn get_records(&self, path: &str) -> Result<Vec<RawRecord>, FetchError> {
        let body = self.get(path, &[]).await?.bytes().await?;
        let records: Option<Vec<RawRecord>> = serde_json::from_slice(&body)?;
        Ok(records.unwrap_or_default())
    }

    /// GET a list of tasks; anything other than an array counts as empty.
    async fn get_tasks(&self, path: &str, project_id: &str) -> Result<Vec<Task>, FetchError> {
        let body = self
            .get(path, &[("project_id", project_id)])
            .await?
            .bytes()
            .await?;
        let Value::Array(items) = serde_json::from_slice(&body)? else {
            warn!(path, project_id, "Task list response is not an array");
            return Ok(Vec::new());
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Task>(item) {
                Ok(task) => Some(task),
                Err(e) => {
                    debug!(path, error = %e, "Skipping malformed task");
                    None
                }
            })
            .collect())
    }

    /// List audit tasks of a project.
    #[instrument(skip(self))]
    pub async fn list_audit_tasks(&self, project_id: &str) -> Result<Vec<Task>, FetchError> {
        self.get_tasks("/tasks", project_id).await
    }

    /// List agent tasks of a project.
    #[instrument(skip(self))]
    pub async fn list_agent_tasks(&self, project_id: &str) -> Result<Vec<Task>, FetchError> {
        self.get_tasks("/agent-tasks", project_id).await
    }

    /// Load both task lists concurrently.
    ///
    /// Either list falls back to empty when its request fails, so one
    /// broken endpoint does not hide the other.
    #[instrument(skip(self))]
    pub async fn load_project_tasks(&self, project_id: &str) -> ProjectTasks {
        let (audit, agent) = tokio::join!(
            self.list_audit_tasks(project_id),
            self.list_agent_tasks(project_id)
        );

        ProjectTasks {
            audit: audit.unwrap_or_else(|e| {
                warn!(project_id, error = %e, "Failed to load audit tasks");
                Vec::new()
            }),
            agent: agent.unwrap_or_else(|e| {
                warn!(project_id, error = %e, "Failed to load agent tasks");
                Vec::new()
            }),
        }
    }
}

#[async_trait]
impl ProblemSource for ApiClient {
    async fn fetch_audit_issues(&self, task_id: &str) -> Result<Vec<RawRecord>, FetchError> {
        self.get_records(&format!("/tasks/{task_id}/issues")).await
    }

    async fn fetch_agent_findings(&self, task_id: &str) -> Result<Vec<RawRecord>, FetchError> {
        self.get_records(&format!("/agent-tasks/{task_id}/findings")).await
    }
}
