//! Reqwest adapter for the activity-record service.
//!
//! Routes follow the record service's REST surface: `GET /exercises`,
//! `GET /exercises/{id}`, `POST /exercises/add`, `PUT /exercises/update/{id}`,
//! `DELETE /exercises/{id}`. Reads carry a 5 second timeout, writes 10
//! seconds, health probes 3 seconds. The opaque forwarded credential and the
//! request id are attached to every call.

use std::time::Duration;

use async_trait::async_trait;
use fitgate_core::types::{Exercise, ExerciseInput};
use fitgate_core::RequestContext;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ActivityBackend, AdapterError, ProbeResult};

/// Connection settings for the activity-record service.
#[derive(Debug, Clone)]
pub struct ActivityAdapterConfig {
    /// Base URL of the record service.
    pub base_url: String,
    /// Timeout for read calls.
    pub read_timeout: Duration,
    /// Timeout for write calls.
    pub write_timeout: Duration,
    /// Timeout for health probes.
    pub probe_timeout: Duration,
}

impl Default for ActivityAdapterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://activity-tracking:5300".to_string(),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(3),
        }
    }
}

/// Thin HTTP client for the activity-record service.
#[derive(Debug, Clone)]
pub struct ActivityAdapter {
    client: reqwest::Client,
    config: ActivityAdapterConfig,
}

/// Delete confirmation body. The record service may omit the message.
#[derive(Debug, Deserialize)]
struct DeleteConfirmation {
    #[serde(default)]
    message: Option<String>,
}

impl ActivityAdapter {
    /// Creates an adapter over a shared reqwest client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: ActivityAdapterConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn with_context(req: RequestBuilder, ctx: &RequestContext) -> RequestBuilder {
        let req = req.header("x-request-id", &ctx.request_id);
        match &ctx.authorization {
            Some(credential) => req.header(AUTHORIZATION, credential),
            None => req,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        req: RequestBuilder,
        url: &str,
    ) -> Result<T, AdapterError> {
        let response = req
            .send()
            .await
            .map_err(|e| AdapterError::from_reqwest(&e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AdapterError::from_reqwest(&e, url))
    }
}

#[async_trait]
impl ActivityBackend for ActivityAdapter {
    async fn list_exercises(&self, ctx: &RequestContext) -> Result<Vec<Exercise>, AdapterError> {
        let url = self.url("/exercises");
        let req = Self::with_context(
            self.client.get(&url).timeout(self.config.read_timeout),
            ctx,
        );
        Self::send_json(req, &url).await
    }

    async fn get_exercise(
        &self,
        id: &str,
        ctx: &RequestContext,
    ) -> Result<Option<Exercise>, AdapterError> {
        let url = self.url(&format!("/exercises/{id}"));
        let req = Self::with_context(
            self.client.get(&url).timeout(self.config.read_timeout),
            ctx,
        );

        let response = req
            .send()
            .await
            .map_err(|e| AdapterError::from_reqwest(&e, &url))?;

        // Absence is an expected answer for a by-id read.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<Exercise>()
            .await
            .map(Some)
            .map_err(|e| AdapterError::from_reqwest(&e, &url))
    }

    async fn add_exercise(
        &self,
        input: &ExerciseInput,
        ctx: &RequestContext,
    ) -> Result<Exercise, AdapterError> {
        let url = self.url("/exercises/add");
        let req = Self::with_context(
            self.client
                .post(&url)
                .timeout(self.config.write_timeout)
                .json(input),
            ctx,
        );
        Self::send_json(req, &url).await
    }

    async fn update_exercise(
        &self,
        id: &str,
        input: &ExerciseInput,
        ctx: &RequestContext,
    ) -> Result<Exercise, AdapterError> {
        let url = self.url(&format!("/exercises/update/{id}"));
        let req = Self::with_context(
            self.client
                .put(&url)
                .timeout(self.config.write_timeout)
                .json(input),
            ctx,
        );
        Self::send_json(req, &url).await
    }

    async fn delete_exercise(
        &self,
        id: &str,
        ctx: &RequestContext,
    ) -> Result<String, AdapterError> {
        let url = self.url(&format!("/exercises/{id}"));
        let req = Self::with_context(
            self.client
                .delete(&url)
                .timeout(self.config.write_timeout),
            ctx,
        );
        let confirmation: DeleteConfirmation = Self::send_json(req, &url).await?;
        Ok(confirmation
            .message
            .unwrap_or_else(|| "Exercise deleted successfully".to_string()))
    }

    async fn probe(&self) -> ProbeResult {
        let url = self.url("/exercises");
        let result = self
            .client
            .get(&url)
            .timeout(self.config.probe_timeout)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => ProbeResult::connected(),
            Ok(response) => ProbeResult::disconnected(format!("status {}", response.status())),
            Err(err) => ProbeResult::disconnected(err.to_string()),
        }
    }
}
