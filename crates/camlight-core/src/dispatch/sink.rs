use crate::{Color, CoreError, CoreResult};

use std::panic::Location;

use error_location::ErrorLocation;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Path of the color endpoint relative to the service base URL.
pub const COLOR_PATH: &str = "/api/color";

/// What the color service answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkResponse {
    /// HTTP status code.
    pub status: u16,
    /// Non-empty `message` field of the JSON body, if any.
    pub message: Option<String>,
}

/// Destination for color updates.
pub trait ColorSink: Send + Sync + 'static {
    /// Deliver one color. `Err` means no response was received at all.
    fn post_color(&self, color: Color) -> impl Future<Output = CoreResult<SinkResponse>> + Send;
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

/// Color service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpColorSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpColorSink {
    /// Create a sink posting to `{base_url}/api/color`.
    #[track_caller]
    pub fn new(base_url: &str) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("camlight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::Transport {
                reason: format!("Failed to build HTTP client: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), COLOR_PATH),
        })
    }

    /// Full URL colors are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ColorSink for HttpColorSink {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn post_color(&self, color: Color) -> CoreResult<SinkResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&color)
            .send()
            .await
            .map_err(|e| CoreError::Transport {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let status = response.status().as_u16();

        // Bodies are optional; anything unreadable counts as an empty object.
        let message = response
            .bytes()
            .await
            .ok()
            .and_then(|body| serde_json::from_slice::<MessageBody>(&body).ok())
            .and_then(|body| body.message)
            .filter(|m| !m.is_empty());

        debug!(status, has_message = message.is_some(), "Color service responded");

        Ok(SinkResponse { status, message })
    }
}
