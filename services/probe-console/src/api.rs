//! Client for the monitoring API
//!
//! Four read operations (listing and result history) and two bulk trigger
//! operations, each over HTTP+JSON. Any non-2xx status is a hard failure.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::io::HttpClient;
use crate::model::{BulkTriggerRequest, BulkTriggerResponse, MonitorItem, ProbeResult, StoryResult};
use crate::ConsoleError;

/// The operations the dashboard consumes from the monitoring backend
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MonitorApi: Send + Sync {
    /// `GET /probes`
    async fn list_probes(&self) -> crate::Result<Vec<MonitorItem>>;

    /// `GET /stories`
    async fn list_stories(&self) -> crate::Result<Vec<MonitorItem>>;

    /// `GET /probes/{name}/results`
    async fn probe_results(&self, name: &str) -> crate::Result<Vec<ProbeResult>>;

    /// `GET /stories/{name}/results`
    async fn story_results(&self, name: &str) -> crate::Result<Vec<StoryResult>>;

    /// `POST /probes/bulk/trigger`
    async fn trigger_probes(
        &self,
        tags: &BTreeMap<String, String>,
    ) -> crate::Result<BulkTriggerResponse>;

    /// `POST /stories/bulk/trigger`
    async fn trigger_stories(
        &self,
        tags: &BTreeMap<String, String>,
    ) -> crate::Result<BulkTriggerResponse>;
}

/// [`MonitorApi`] over an [`HttpClient`]
pub struct HttpMonitorApi {
    base_url: Url,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpMonitorApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMonitorApi")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpMonitorApi {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> crate::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConsoleError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConsoleError::InvalidUrl(base_url.to_string()));
        }
        tracing::debug!("Created HttpMonitorApi at {}", base_url);
        Ok(Self { base_url, http })
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> crate::Result<String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConsoleError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> crate::Result<T> {
        let response = self.http.get(url).await?;
        if !response.is_success() {
            return Err(ConsoleError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    async fn post_trigger(
        &self,
        url: &str,
        tags: &BTreeMap<String, String>,
    ) -> crate::Result<BulkTriggerResponse> {
        let body = serde_json::to_value(BulkTriggerRequest { tags: tags.clone() })?;
        let response = self.http.post_json(url, &body).await?;
        if !response.is_success() {
            return Err(ConsoleError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }
}

#[async_trait]
impl MonitorApi for HttpMonitorApi {
    async fn list_probes(&self) -> crate::Result<Vec<MonitorItem>> {
        let url = self.endpoint(&["probes"])?;
        self.get_json(&url).await
    }

    async fn list_stories(&self) -> crate::Result<Vec<MonitorItem>> {
        let url = self.endpoint(&["stories"])?;
        self.get_json(&url).await
    }

    async fn probe_results(&self, name: &str) -> crate::Result<Vec<ProbeResult>> {
        let url = self.endpoint(&["probes", name, "results"])?;
        self.get_json(&url).await
    }

    async fn story_results(&self, name: &str) -> crate::Result<Vec<StoryResult>> {
        let url = self.endpoint(&["stories", name, "results"])?;
        self.get_json(&url).await
    }

    async fn trigger_probes(
        &self,
        tags: &BTreeMap<String, String>,
    ) -> crate::Result<BulkTriggerResponse> {
        let url = self.endpoint(&["probes", "bulk", "trigger"])?;
        self.post_trigger(&url, tags).await
    }

    async fn trigger_stories(
        &self,
        tags: &BTreeMap<String, String>,
    ) -> crate::Result<BulkTriggerResponse> {
        let url = self.endpoint(&["stories", "bulk", "trigger"])?;
        self.post_trigger(&url, tags).await
    }
}
