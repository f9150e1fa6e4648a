//! Reqwest adapter for the analytics/stats service.
//!
//! Routes follow the analytics service's REST surface: `GET /stats`,
//! `GET /stats/{username}`, `GET /stats/weekly/?user&start&end`,
//! `GET /stats/daily_trend/{username}`, `GET /stats/activities/?user&start&end`
//! and `POST /activities/{id}/comment`. The backend wraps every list in an
//! envelope (`{stats}`, `{trend}`, `{activities}`); unwrapping happens here
//! so resolvers only ever see schema-shaped values. Alongside the forwarded
//! credential the adapter passes the originating screen tag, which the
//! analytics service uses for personalization.

use std::time::Duration;

use async_trait::async_trait;
use fitgate_core::types::{ActivityRecord, CommentAck, TrendPoint, UserStats, WeeklyStats};
use fitgate_core::RequestContext;
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{AdapterError, AnalyticsBackend, ProbeResult};

/// Connection settings for the analytics service.
#[derive(Debug, Clone)]
pub struct AnalyticsAdapterConfig {
    /// Base URL of the analytics service.
    pub base_url: String,
    /// Timeout for read calls.
    pub read_timeout: Duration,
    /// Timeout for write calls.
    pub write_timeout: Duration,
    /// Timeout for health probes.
    pub probe_timeout: Duration,
}

impl Default for AnalyticsAdapterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://analytics:5050".to_string(),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(3),
        }
    }
}

/// Thin HTTP client for the analytics service.
#[derive(Debug, Clone)]
pub struct AnalyticsAdapter {
    client: reqwest::Client,
    config: AnalyticsAdapterConfig,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct StatsEnvelope<T> {
    #[serde(default)]
    stats: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TrendEnvelope {
    #[serde(default)]
    trend: Vec<TrendPoint>,
}

#[derive(Debug, Deserialize)]
struct ActivitiesEnvelope {
    #[serde(default)]
    activities: Vec<ActivityRecord>,
}

#[derive(Debug, Deserialize)]
struct CommentResponse {
    #[serde(default)]
    ok: bool,
}

impl AnalyticsAdapter {
    /// Creates an adapter over a shared reqwest client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: AnalyticsAdapterConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn with_context(req: RequestBuilder, ctx: &RequestContext) -> RequestBuilder {
        let mut req = req.header("x-request-id", &ctx.request_id);
        if let Some(credential) = &ctx.authorization {
            req = req.header(AUTHORIZATION, credential);
        }
        if let Some(screen) = &ctx.screen {
            req = req.header("x-screen", screen);
        }
        req
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
impl AnalyticsBackend for AnalyticsAdapter {
    async fn all_stats(&self, ctx: &RequestContext) -> Result<Vec<UserStats>, AdapterError> {
        let url = self.url("/stats");
        let req = Self::with_context(
            self.client.get(&url).timeout(self.config.read_timeout),
            ctx,
        );
        let envelope: StatsEnvelope<UserStats> = Self::send_json(req, &url).await?;
        Ok(envelope.stats)
    }

    async fn user_stats(
        &self,
        username: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<UserStats>, AdapterError> {
        let url = self.url(&format!("/stats/{username}"));
        let req = Self::with_context(
            self.client.get(&url).timeout(self.config.read_timeout),
            ctx,
        );
        let envelope: StatsEnvelope<UserStats> = Self::send_json(req, &url).await?;
        Ok(envelope.stats)
    }

    async fn weekly_stats(
        &self,
        username: &str,
        start: &str,
        end: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<WeeklyStats>, AdapterError> {
        let url = self.url("/stats/weekly/");
        let req = Self::with_context(
            self.client
                .get(&url)
                .timeout(self.config.read_timeout)
                .query(&[("user", username), ("start", start), ("end", end)]),
            ctx,
        );
        let envelope: StatsEnvelope<WeeklyStats> = Self::send_json(req, &url).await?;
        Ok(envelope.stats)
    }

    async fn daily_trend(
        &self,
        username: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<TrendPoint>, AdapterError> {
        let url = self.url(&format!("/stats/daily_trend/{username}"));
        let req = Self::with_context(
            self.client.get(&url).timeout(self.config.read_timeout),
            ctx,
        );
        let envelope: TrendEnvelope = Self::send_json(req, &url).await?;
        Ok(envelope.trend)
    }

    async fn activities_range(
        &self,
        username: &str,
        start: &str,
        end: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<ActivityRecord>, AdapterError> {
        let url = self.url("/stats/activities/");
        let req = Self::with_context(
            self.client
                .get(&url)
                .timeout(self.config.read_timeout)
                .query(&[("user", username), ("start", start), ("end", end)]),
            ctx,
        );
        let envelope: ActivitiesEnvelope = Self::send_json(req, &url).await?;
        Ok(envelope.activities)
    }

    async fn update_activity_comment(
        &self,
        id: &str,
        comments: &str,
        ctx: &RequestContext,
    ) -> Result<CommentAck, AdapterError> {
        let url = self.url(&format!("/activities/{id}/comment"));
        let req = Self::with_context(
            self.client
                .post(&url)
                .timeout(self.config.write_timeout)
                .json(&serde_json::json!({ "comments": comments })),
            ctx,
        );
        let response: CommentResponse = Self::send_json(req, &url).await?;
        Ok(CommentAck {
            ok: response.ok,
            message: if response.ok {
                "Updated successfully".to_string()
            } else {
                "Update failed".to_string()
            },
        })
    }

    async fn probe(&self) -> ProbeResult {
        let url = self.url("/stats");
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
