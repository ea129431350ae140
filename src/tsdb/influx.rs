//! InfluxDB v2 HTTP adapter for the time-series store.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::flux::FluxCursor;
use super::{RangeFilter, RecordCursor, StoreError, TimeSeriesStore};
use crate::config::InfluxConfig;
use crate::storage::data::Point;
use crate::storage::line_protocol::encode_point;

/// Body of a `/api/v2/query` request
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    dialect: Dialect,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dialect {
    header: bool,
    delimiter: &'static str,
    annotations: [&'static str; 3],
    date_time_format: &'static str,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            header: true,
            delimiter: ",",
            annotations: ["datatype", "group", "default"],
            date_time_format: "RFC3339",
        }
    }
}

/// Error body returned by the InfluxDB API on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Client for the InfluxDB v2 HTTP API, bound to one org and bucket
#[derive(Debug, Clone)]
pub struct InfluxClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    org: String,
    bucket: String,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            org: config.org.clone(),
            bucket: config.bucket.clone(),
        })
    }

    /// Submits an arbitrary Flux query
    pub async fn query_raw(&self, flux: &str) -> Result<FluxCursor, StoreError> {
        debug!(query = flux, "Submitting Flux query");
        let request = QueryRequest {
            query: flux,
            kind: "flux",
            dialect: Dialect::default(),
        };

        let resp = self
            .http
            .post(format!("{}/api/v2/query", self.base_url))
            .query(&[("org", self.org.as_str())])
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, "application/csv")
            .json(&request)
            .send()
            .await?;

        let body = check_status(resp).await?.bytes().await?;
        Ok(FluxCursor::new(body.to_vec()))
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }
}

/// Turns a non-2xx response into `StoreError::Status`
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(err) => err.message,
        Err(_) => body,
    };
    warn!(status = status.as_u16(), error = %message, "InfluxDB request rejected");
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TimeSeriesStore for InfluxClient {
    async fn write_point(&self, point: &Point) -> Result<(), StoreError> {
        let line = encode_point(point);
        debug!(%line, "Writing point");

        let resp = self
            .http
            .post(format!("{}/api/v2/write", self.base_url))
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(AUTHORIZATION, self.auth_header())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await?;

        check_status(resp).await?;
        Ok(())
    }

    async fn query(&self, filter: &RangeFilter) -> Result<RecordCursor, StoreError> {
        let flux = filter.to_flux(&self.bucket);
        let cursor = self.query_raw(&flux).await?;
        Ok(Box::new(cursor))
    }
}
