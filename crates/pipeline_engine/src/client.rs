use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use url::Url;

use pipeline_core::{ConfirmRequest, IncomingSegment, JobStatus, SegmentationRequest};
use pipeline_logging::engine_debug;

use crate::wire::{
    error_detail, normalize_segment, ConfirmBody, ConfirmResponse, JobStatusPayload, SegmentPayload,
    SegmentationBody,
};
use crate::{ApiError, FailureKind};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Segmentation runs an LLM on the backend and gets a longer budget.
    pub segmentation_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            segmentation_timeout: Duration::from_secs(330),
        }
    }
}

/// The slice of the backend API used by the poller and the segment editor.
#[async_trait::async_trait]
pub trait PipelineApi: Send + Sync {
    async fn fetch_status(&self, task_id: &str) -> Result<JobStatus, ApiError>;

    async fn segment(&self, request: &SegmentationRequest)
        -> Result<Vec<IncomingSegment>, ApiError>;

    /// Persists reviewed segments; returns the backend's result path.
    async fn confirm(&self, request: &ConfirmRequest) -> Result<String, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestPipelineApi {
    settings: ClientSettings,
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestPipelineApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        // `Url::join` drops the last path segment unless it ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body).unwrap_or_else(|| body.trim().to_string());
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                if detail.is_empty() {
                    status.to_string()
                } else {
                    format!("{status}: {detail}")
                },
            ));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl serde::Serialize,
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_json(response).await
    }
}

#[async_trait::async_trait]
impl PipelineApi for ReqwestPipelineApi {
    async fn fetch_status(&self, task_id: &str) -> Result<JobStatus, ApiError> {
        let mut url = self.endpoint("status/")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .push(task_id);
        engine_debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: JobStatusPayload = Self::read_json(response).await?;
        Ok(payload.into())
    }

    async fn segment(
        &self,
        request: &SegmentationRequest,
    ) -> Result<Vec<IncomingSegment>, ApiError> {
        let body = SegmentationBody::from(request);
        let mut url = self.endpoint("process/rag")?;
        // The backend reads the LLM options from the query string.
        url.query_pairs_mut()
            .append_pair("llm_backend", &body.llm_backend)
            .append_pair("llm_model", &body.llm_model)
            .append_pair("llm_timeout", &body.llm_timeout.to_string());
        engine_debug!("POST {} ({} chars)", url, body.content.len());

        let payloads: Vec<SegmentPayload> = self
            .post_json(url, &body, self.settings.segmentation_timeout)
            .await?;
        Ok(payloads.into_iter().map(normalize_segment).collect())
    }

    async fn confirm(&self, request: &ConfirmRequest) -> Result<String, ApiError> {
        let url = self.endpoint("confirm/results")?;
        engine_debug!("POST {} ({} segments)", url, request.segments.len());

        let response: ConfirmResponse = self
            .post_json(url, &ConfirmBody::from(request), self.settings.request_timeout)
            .await?;
        match response.result_path {
            Some(path) if response.success => Ok(path),
            _ => Err(ApiError::new(
                FailureKind::Decode,
                "backend did not report a saved result",
            )),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
