//! # HTTP Retrieval Utilities
//!
//! A thin asynchronous JSON client around `reqwest`. It joins relative paths
//! onto a base URL and wraps every reply in an [`ApiResponse`] carrying status
//! and headers. There is no retry layer: a failed call is simply reported and
//! the caller's next scheduled poll is the retry.

use std::time::Duration;

use reqwest::{header::HeaderMap, Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Per-request timeout. Keeps a hung server from stalling a view forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Server answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Server returned an empty body")]
    EmptyBody,
}

/// A standardized container for API responses.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The deserialized body on success.
    pub data: Option<T>,
    /// The raw body on a non-2xx reply.
    pub error_body: Option<String>,
    pub status: u16,
    pub success: bool,
    pub headers: HeaderMap,
}

impl<T> ApiResponse<T> {
    /// Turns a non-2xx reply into [`FeedError::Status`].
    pub fn into_data(self) -> Result<(T, HeaderMap), FeedError> {
        if !self.success {
            return Err(FeedError::Status {
                status: self.status,
                body: self.error_body.unwrap_or_default(),
            });
        }
        let data = self.data.ok_or(FeedError::EmptyBody)?;
        Ok((data, self.headers))
    }
}

/// Asynchronous JSON client bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// # Arguments
    /// * `base_url` - absolute base URL, e.g. `http://127.0.0.1:3000/`.
    pub fn new(base_url: &str) -> Result<Self, FeedError> {
        let base_url = Url::parse(base_url)?;
        let inner = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { inner, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs one request and decodes a JSON reply.
    ///
    /// # Errors
    /// URL joining, encoding, transport and decoding failures. A non-2xx
    /// status is not an error here; it comes back with `success == false`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, FeedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let full_url = self.base_url.join(path)?;
        let mut req = self.inner.request(method, full_url);

        if let Some(h) = headers {
            req = req.headers(h);
        }

        if let Some(b) = body {
            use reqwest::header::CONTENT_TYPE;
            let json_body = serde_json::to_string(b)?;
            req = req.header(CONTENT_TYPE, "application/json").body(json_body);
        }

        let response: reqwest::Response = req.send().await?;
        let status = response.status();
        let resp_headers = response.headers().clone();

        if status.is_success() {
            let data = response.json::<T>().await?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers: resp_headers,
            })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
                headers: resp_headers,
            })
        }
    }

    /// `GET path`, decoded.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<(T, HeaderMap), FeedError> {
        self.request::<T, ()>(Method::GET, path, None, None)
            .await?
            .into_data()
    }

    /// `POST path` with a JSON body, decoded.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, FeedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request::<T, B>(Method::POST, path, None, Some(body))
            .await?
            .into_data()
            .map(|(data, _)| data)
    }
}
