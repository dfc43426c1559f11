//! HR API client for leave requests and attendance logs.
//!
//! Listing pulls and status updates go through the REST API with the
//! session's bearer token. A 401 from any call signs the session out.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode};
use std::sync::Arc;
use url::Url;

use hrdesk_core::events::Feed;
use hrdesk_core::records::{Record, RecordKey};
use hrdesk_core::session::Session;
use hrdesk_core::store::{PullParams, RecordSource, StatusChange};

use crate::error::{ApiError, Result};
use crate::types::*;

/// Path segments of a feed's listing endpoint, relative to the API root.
fn feed_segments(feed: Feed) -> &'static [&'static str] {
    match feed {
        Feed::Leave => &["leave-requests"],
        Feed::Attendance => &["attendance", "logs"],
    }
}

/// Client for the HR REST API.
#[derive(Debug, Clone)]
pub struct HrApiClient {
    client: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
}

impl HrApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - API root and request timeout
    /// * `session` - source of the bearer token; invalidated on 401
    pub fn new(config: ApiClientConfig, session: Arc<Session>) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::invalid_request(format!("Invalid API URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::invalid_request("API URL cannot be a base"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create headers for an API request.
    fn headers(&self) -> Result<HeaderMap> {
        let token = self
            .session
            .token()
            .ok_or_else(|| ApiError::auth("No access token"))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn endpoint<I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::invalid_request("API URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::from_transport)?;
        debug!("API response ({}): {}", status, body);

        if status == StatusCode::UNAUTHORIZED {
            warn!("API rejected the access token; signing out");
            self.session.invalidate();
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|error| error.message)
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        format!("Request failed with status {}", status)
                    } else {
                        format!("Request failed: {}", body)
                    }
                });
            return Err(ApiError::api(status.as_u16(), message));
        }

        Ok(body)
    }

    /// List the records of a feed.
    ///
    /// GET /leave-requests or GET /attendance/logs, with `params` as query.
    pub async fn list_records(&self, feed: Feed, params: &PullParams) -> Result<Vec<Record>> {
        let url = self.endpoint(feed_segments(feed))?;
        debug!("Listing {} records from {} with {:?}", feed, url, params);

        let body = self
            .send(self.client.get(url).query(&params.pairs()))
            .await?;

        let list: ListResponse = serde_json::from_str(&body).map_err(|e| {
            log::error!("Failed to deserialize listing. Body: {}, Error: {}", body, e);
            ApiError::Json(e)
        })?;
        Ok(list.data)
    }

    /// Persist a status change. The response body is ignored.
    ///
    /// PUT /leave-requests/{key}/{approve|reject|change-status}
    /// PUT /attendance/logs/{key}/{approve|reject|change-status}
    pub async fn put_status(&self, feed: Feed, key: &RecordKey, change: &StatusChange) -> Result<()> {
        let mut segments: Vec<&str> = feed_segments(feed).to_vec();
        segments.push(key.as_str());
        segments.push(change.action().as_path_segment());
        let url = self.endpoint(segments)?;
        debug!("Updating {} {} to {}", feed, key, change.status);

        self.send(self.client.put(url).json(change)).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordSource for HrApiClient {
    async fn fetch(&self, feed: Feed, params: &PullParams) -> hrdesk_core::Result<Vec<Record>> {
        Ok(self.list_records(feed, params).await?)
    }

    async fn update_status(
        &self,
        feed: Feed,
        key: &RecordKey,
        change: &StatusChange,
    ) -> hrdesk_core::Result<()> {
        Ok(self.put_status(feed, key, change).await?)
    }
}
