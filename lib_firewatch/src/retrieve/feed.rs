//! # Fire Feed
//!
//! The read contract viewers depend on. [`HttpFireFeed`] implements it over the
//! JSON API; tests substitute scripted feeds.

use async_trait::async_trait;
use tracing::debug;

use crate::model::{DetectionPayload, FireEvent, FirmsReport, IngestAck, StatusReport, TOTAL_COUNT_HEADER};
use crate::retrieve::api_client::{ApiClient, FeedError};

/// Result of a local detections read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalFires {
    /// Most recent events, oldest first.
    pub events: Vec<FireEvent>,
    /// Detections ever accepted by the server.
    pub total: u64,
}

#[async_trait]
pub trait FireFeed: Send + Sync {
    async fn status(&self) -> Result<StatusReport, FeedError>;

    async fn firms(&self) -> Result<FirmsReport, FeedError>;

    async fn local_fires(&self) -> Result<LocalFires, FeedError>;
}

/// [`FireFeed`] over HTTP, also used by sensors to post detections.
#[derive(Debug, Clone)]
pub struct HttpFireFeed {
    client: ApiClient,
}

impl HttpFireFeed {
    pub fn new(server_url: &str) -> Result<Self, FeedError> {
        Ok(Self {
            client: ApiClient::new(server_url)?,
        })
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// `POST /api/local-fires`.
    pub async fn report_detection(&self, payload: &DetectionPayload) -> Result<IngestAck, FeedError> {
        self.client.post_json("api/local-fires", payload).await
    }
}

#[async_trait]
impl FireFeed for HttpFireFeed {
    async fn status(&self) -> Result<StatusReport, FeedError> {
        self.client.get_json("api/status").await.map(|(report, _)| report)
    }

    async fn firms(&self) -> Result<FirmsReport, FeedError> {
        self.client.get_json("api/firms").await.map(|(report, _)| report)
    }

    async fn local_fires(&self) -> Result<LocalFires, FeedError> {
        let (events, headers): (Vec<FireEvent>, _) = self.client.get_json("api/local-fires").await?;
        let total = headers
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(|| {
                debug!("No {} header, falling back to payload length", TOTAL_COUNT_HEADER);
                events.len() as u64
            });
        Ok(LocalFires { events, total })
    }
}
