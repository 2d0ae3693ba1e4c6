//! Backend submission of finished sessions.
//!
//! The session hands its [`SessionSummary`] to a [`ReportSink`] once, while
//! closing, from a detached task: the outcome is logged and never reaches the
//! client, and nothing is retried.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, info};
use reqwest::Client;

use super::types::SessionSummary;
use crate::configuration::ReporterConfig;
use crate::error_handling::types::ReportingError;

pub trait ReportSink: Send + Sync {
    fn submit(&self, summary: SessionSummary) -> BoxFuture<'static, Result<(), ReportingError>>;
}

/// POSTs the summary as JSON to the configured endpoint.
pub struct BackendReporter {
    http: Client,
    endpoint: String,
}

impl BackendReporter {
    pub fn new(config: &ReporterConfig) -> Result<Self, ReportingError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReportingError::RequestFailed(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl ReportSink for BackendReporter {
    fn submit(&self, summary: SessionSummary) -> BoxFuture<'static, Result<(), ReportingError>> {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();

        async move {
            debug!(
                "Submitting session {:?} ({} bytes of log) to {}",
                summary.log_id,
                summary.full_log_file.len(),
                endpoint
            );
            let response = http
                .post(&endpoint)
                .json(&summary)
                .send()
                .await
                .map_err(|e| ReportingError::RequestFailed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ReportingError::BadStatus(status.as_u16()));
            }
            info!("Successfully sent data to endpoint: {}", status.as_u16());
            Ok(())
        }
        .boxed()
    }
}
