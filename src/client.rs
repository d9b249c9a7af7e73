//! HTTP transport to the OCR service.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::OcrError;
use crate::request::{endpoint, OcrRequest, HEALTH_PATH, RECOGNIZE_PATH};
use crate::stream::{decode_stream, StreamEvent};

pub const USER_AGENT: &str = concat!("streamocr/", env!("CARGO_PKG_VERSION"));

/// Ordered events from one streaming response.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, OcrError>> + Send>>;

/// Response from `/api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    result: String,
}

/// Client for one OCR server.
#[derive(Debug, Clone)]
pub struct OcrClient {
    client: Client,
    base_url: Url,
}

/// Builder for [`OcrClient`].
#[derive(Debug, Clone)]
pub struct OcrClientBuilder {
    base_url: Url,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl OcrClientBuilder {
    /// Limit connection setup. The response body itself is never timed out,
    /// since a long document can stream for minutes.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<OcrClient, OcrError> {
        let user_agent = self.user_agent.as_deref().unwrap_or(USER_AGENT);
        let mut builder = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true);
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(OcrClient {
            client: builder.build()?,
            base_url: self.base_url,
        })
    }
}

impl OcrClient {
    pub fn builder(base_url: Url) -> OcrClientBuilder {
        OcrClientBuilder {
            base_url,
            connect_timeout: None,
            user_agent: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a streaming request and return its decoded events.
    ///
    /// Resolves once the response headers arrive. A non-2xx status is a
    /// transport error.
    pub async fn stream(&self, request: &OcrRequest) -> Result<EventStream, OcrError> {
        let url = request.stream_url(&self.base_url);
        info!("Submitting {} to {}", request.file_name, url);

        let response = self
            .client
            .post(url)
            .multipart(request.form()?)
            .send()
            .await?;
        let response = check_status(response)?;

        debug!("Stream accepted ({})", response.status());
        Ok(Box::pin(decode_stream(response.bytes_stream())))
    }

    /// Non-streaming recognition. The service accepts images only here.
    pub async fn recognize(&self, request: &OcrRequest) -> Result<String, OcrError> {
        let url = endpoint(&self.base_url, RECOGNIZE_PATH);
        info!("Recognizing {} via {}", request.file_name, url);

        let response = self
            .client
            .post(url)
            .multipart(request.form()?)
            .send()
            .await?;
        let body: RecognizeResponse = check_status(response)?.json().await?;
        Ok(body.result)
    }

    /// Probe the service's health endpoint.
    pub async fn health(&self) -> Result<HealthStatus, OcrError> {
        let url = endpoint(&self.base_url, HEALTH_PATH);
        debug!("Checking health at {}", url);

        let response = self.client.get(url).send().await?;
        Ok(check_status(response)?.json().await?)
    }
}

fn check_status(response: Response) -> Result<Response, OcrError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(OcrError::Transport(format!(
            "HTTP error! status: {}",
            status.as_u16()
        )))
    }
}
