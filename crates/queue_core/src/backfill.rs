//! Initial snapshot of outstanding requests and online instructors.
//!
//! Everything fetched goes through the same handlers as live events, so there
//! is one path for "state entered the store". Failures show a message and are
//! not retried.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::QueueId,
    error::ApiError,
    protocol::{Instructor, Request},
};
use tracing::{info, warn};

use crate::{engine::ReconciliationEngine, error::SyncError};

pub const OUTSTANDING_REQUESTS: &str = "outstanding requests";
pub const ONLINE_INSTRUCTORS: &str = "online instructors";

#[async_trait]
pub trait BackfillSource: Send + Sync {
    async fn outstanding_requests(&self, queue_id: QueueId) -> Result<Vec<Request>, SyncError>;
    async fn online_instructors(&self, queue_id: QueueId) -> Result<Vec<Instructor>, SyncError>;
}

pub struct HttpBackfill {
    http: Client,
    server_url: String,
}

impl HttpBackfill {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch<T: DeserializeOwned + Send>(
        &self,
        resource: &'static str,
        url: String,
    ) -> Result<Vec<T>, SyncError> {
        let result: anyhow::Result<Vec<T>> = async {
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .with_context(|| format!("failed to reach {url}"))?;
            let response = error_for_api_status(response).await?;
            response
                .json::<Vec<T>>()
                .await
                .with_context(|| format!("invalid {resource} payload from {url}"))
        }
        .await;

        result.map_err(|source| SyncError::BackfillUnavailable { resource, source })
    }
}

async fn error_for_api_status(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => Err(anyhow!(
            "server responded {status} ({:?}): {}",
            api_error.code,
            api_error.message
        )),
        Err(_) => Err(anyhow!("server responded {status}")),
    }
}

#[async_trait]
impl BackfillSource for HttpBackfill {
    async fn outstanding_requests(&self, queue_id: QueueId) -> Result<Vec<Request>, SyncError> {
        let url = format!(
            "{}/course_queues/{}/outstanding_requests.json",
            self.server_url, queue_id.0
        );
        self.fetch(OUTSTANDING_REQUESTS, url).await
    }

    async fn online_instructors(&self, queue_id: QueueId) -> Result<Vec<Instructor>, SyncError> {
        let url = format!(
            "{}/course_queues/{}/online_instructors.json",
            self.server_url, queue_id.0
        );
        self.fetch(ONLINE_INSTRUCTORS, url).await
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    pub requests: usize,
    pub instructors: usize,
    /// Resources that could not be loaded.
    pub failures: Vec<&'static str>,
}

impl BackfillReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Loads both snapshots into `engine`. Only presentation-asset errors are
/// returned; unavailable resources are reported on the page and in the report.
pub async fn run_backfill(
    engine: &mut ReconciliationEngine,
    source: &dyn BackfillSource,
    queue_id: QueueId,
) -> Result<BackfillReport, SyncError> {
    let mut report = BackfillReport::default();
    engine.disable_page();

    match source.outstanding_requests(queue_id).await {
        Ok(requests) => {
            for request in requests {
                engine.on_request_created(request)?;
                report.requests += 1;
            }
        }
        Err(err) => record_failure(engine, &mut report, OUTSTANDING_REQUESTS, err)?,
    }

    match source.online_instructors(queue_id).await {
        Ok(instructors) => {
            for instructor in instructors {
                engine.on_instructor_online(instructor)?;
                report.instructors += 1;
            }
        }
        Err(err) => record_failure(engine, &mut report, ONLINE_INSTRUCTORS, err)?,
    }

    engine.refresh()?;
    info!(
        queue_id = queue_id.0,
        requests = report.requests,
        instructors = report.instructors,
        failures = report.failures.len(),
        outstanding = engine.requests().len(),
        "backfill: finished"
    );
    Ok(report)
}

fn record_failure(
    engine: &mut ReconciliationEngine,
    report: &mut BackfillReport,
    resource: &'static str,
    err: SyncError,
) -> Result<(), SyncError> {
    if err.is_fatal() {
        return Err(err);
    }
    warn!(resource, error = %err, "backfill: resource unavailable");
    report.failures.push(resource);
    engine.show_message(
        "Unable to load queue",
        &format!("Could not load {resource}; showing what is available. Reload to try again."),
    )
}

#[cfg(test)]
#[path = "tests/backfill_tests.rs"]
mod tests;
