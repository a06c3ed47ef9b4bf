//! HTTP client for the PDF processing service.
//!
//! One multipart POST per operation, with the upload streamed through a
//! byte-counting body for live progress, an abort token raced against the
//! exchange, and non-2xx responses mapped to structured errors.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::abort::AbortToken;
use super::error::ClientError;
use super::filename::parse_content_disposition;
use super::progress::{ProgressObserver, UploadCounter, counted_body};
use crate::request::{OperationRequest, SplitSpec};
use crate::selection::FileHandle;

/// Connection establishment timeout.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;
/// Whole-exchange timeout. Covers the upload plus server-side PDF work,
/// which for large documents is the slower half.
pub const EXCHANGE_TIMEOUT_SECS: u64 = 600;

/// Environment variable consulted by [`ApiClient::from_env`].
pub const BASE_URL_ENV: &str = "PDF_API_URL";
/// Base URL used when [`BASE_URL_ENV`] is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

/// Client for the processing service, reusable across operations.
///
/// Holds a pooled connection to one service base URL. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

/// Successful outcome of one exchange: the binary artifact plus the
/// server-suggested filename, if any.
#[derive(Debug, Clone)]
pub struct OperationSuccess {
    payload: Bytes,
    suggested_filename: Option<String>,
}

impl OperationSuccess {
    pub(crate) fn new(payload: Bytes, suggested_filename: Option<String>) -> Self {
        Self {
            payload,
            suggested_filename,
        }
    }

    /// The returned artifact (PDF or ZIP). `Bytes` clones share the buffer.
    #[must_use]
    pub fn payload(&self) -> Bytes {
        self.payload.clone()
    }

    #[must_use]
    pub fn suggested_filename(&self) -> Option<&str> {
        self.suggested_filename.as_deref()
    }

    /// The suggested filename, or `default` when the server offered none.
    #[must_use]
    pub fn filename_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.suggested_filename.as_deref().unwrap_or(default)
    }
}

impl ApiClient {
    /// Creates a client for the given service base URL with default
    /// timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(base_url: Url) -> Self {
        Self::with_timeouts(base_url, CONNECT_TIMEOUT_SECS, EXCHANGE_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the supplied
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(base_url: Url, connect_timeout_secs: u64, exchange_timeout_secs: u64) -> Self {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(exchange_timeout_secs))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, base_url }
    }

    /// Creates a client from the `PDF_API_URL` environment variable,
    /// falling back to [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns a validation error when the configured value is not a valid
    /// URL.
    pub fn from_env() -> Result<Self, ClientError> {
        let raw = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw)
            .map_err(|e| ClientError::validation(format!("invalid service URL {raw}: {e}")))?;
        Ok(Self::new(base_url))
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs one operation against the service.
    ///
    /// The request is encoded as a multipart body and streamed; `observer`
    /// receives clamped progress percentages followed by a completion
    /// notification once every byte is sent. `abort` is raced against the
    /// exchange at every await point, so cancellation takes effect during
    /// the upload and while waiting out server-side processing.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Network`] when no response is obtained
    /// - [`ClientError::Aborted`] on explicit cancellation
    /// - [`ClientError::Server`] for statuses outside [200, 300)
    /// - [`ClientError::Protocol`] when a success body cannot be read
    #[instrument(level = "debug", skip_all, fields(kind = ?request.kind()))]
    pub async fn send(
        &self,
        request: &OperationRequest,
        observer: Arc<dyn ProgressObserver>,
        mut abort: AbortToken,
    ) -> Result<OperationSuccess, ClientError> {
        let path = request.kind().endpoint_path();
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::validation(format!("invalid endpoint URL {path}: {e}")))?;

        let total_bytes = request.total_bytes();
        let counter = UploadCounter::new(total_bytes, observer);
        if total_bytes == 0 {
            // No chunk will ever be yielded, so complete the upload now.
            counter.finish_empty();
        }
        let form = build_form(request, &counter)?;

        debug!(%url, total_bytes, "sending multipart request");

        let response = tokio::select! {
            result = self.client.post(url).multipart(form).send() => {
                result.map_err(|e| ClientError::network(path, e))?
            }
            () = abort.aborted() => {
                info!("exchange aborted by caller");
                return Err(ClientError::Aborted);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = extract_error_message(response).await;
            warn!(status = status.as_u16(), %message, "service returned an error");
            return Err(ClientError::server(status.as_u16(), message));
        }

        let suggested_filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_disposition)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let payload = tokio::select! {
            result = response.bytes() => result.map_err(|e| ClientError::protocol(path, e))?,
            () = abort.aborted() => {
                info!("exchange aborted while receiving response");
                return Err(ClientError::Aborted);
            }
        };

        info!(
            bytes = payload.len(),
            filename = ?suggested_filename,
            "operation succeeded"
        );
        Ok(OperationSuccess::new(payload, suggested_filename))
    }
}

/// Encodes the request per the service's wire contract: `files` repeated
/// for merge/extract-images, singular `file` plus `mode`/`range` fields for
/// split.
fn build_form(
    request: &OperationRequest,
    counter: &Arc<UploadCounter>,
) -> Result<Form, ClientError> {
    match request {
        OperationRequest::Merge { files } | OperationRequest::ExtractImages { files } => {
            let mut form = Form::new();
            for file in files {
                form = form.part("files", file_part(file, counter)?);
            }
            Ok(form)
        }
        OperationRequest::Split { file, spec } => {
            let mut form = Form::new()
                .part("file", file_part(file, counter)?)
                .text("mode", spec.mode_field());
            if let SplitSpec::Range(range) = spec {
                form = form.text("range", range.to_field());
            }
            Ok(form)
        }
    }
}

fn file_part(file: &FileHandle, counter: &Arc<UploadCounter>) -> Result<Part, ClientError> {
    let body = counted_body(file.data(), Arc::clone(counter));
    Part::stream_with_length(body, file.size_bytes())
        .file_name(file.name().to_string())
        .mime_str("application/pdf")
        .map_err(|e| ClientError::validation(format!("invalid part for {}: {e}", file.name())))
}

/// Derives a user-displayable message from an error response body.
///
/// JSON bodies yield their `detail` or `message` field; anything else is
/// used as trimmed text; an empty, whitespace-only, or undecodable body
/// falls back to `Failed (<status>)`.
async fn extract_error_message(response: reqwest::Response) -> String {
    let status = response.status().as_u16();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    let fallback = format!("Failed ({status})");

    let Ok(body) = response.bytes().await else {
        return fallback;
    };

    if is_json
        && let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body)
        && let Some(message) = value
            .get("detail")
            .and_then(serde_json::Value::as_str)
            .or_else(|| value.get("message").and_then(serde_json::Value::as_str))
    {
        return message.to_string();
    }

    match std::str::from_utf8(&body) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => fallback,
    }
}
