//! API client layer: enveloped REST reads and the live event stream.

use crate::config::{AuthConfig, RetryConfig, TuiConfig};
use crate::realtime::{MessageStream, PushTransport};
use crate::sse;
use async_trait::async_trait;
use futures_util::StreamExt;
use podium_cache::{SnapshotFetcher, TeamFetcher};
use podium_core::{
    ApiEnvelope, EnvelopeError, FieldError, LeaderboardPayload, LeaderboardSnapshot, SnapshotError,
    TeamDetail, TeamId, TeamPayload, DEFAULT_ERROR_MESSAGE,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Non-success status or `status: "error"`; displays the server's message verbatim.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl ApiClientError {
    /// Failures the request layer retries: the request never got an answer.
    pub fn is_transport(&self) -> bool {
        match self {
            ApiClientError::Http(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiClientError::NotFound(_))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    rest: RestClient,
    sse: SseClient,
}

impl ApiClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let rest = RestClient::new(config)?;
        let sse = SseClient::new(config)?;
        Ok(Self { rest, sse })
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn sse(&self) -> &SseClient {
        &self.sse
    }
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: Url,
    auth_header: HeaderMap,
    retry: RetryConfig,
}

/// How a 404 is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Missing {
    /// The addressed record does not exist.
    NotFound,
    /// Plain API failure carrying the server's message.
    Failure,
}

impl RestClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let auth_header = build_auth_headers(&config.auth)?;
        let base_url = Url::parse(config.rest_root())
            .map_err(|e| ApiClientError::Config(format!("api_base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiClientError::Config(format!(
                "api_base_url cannot take a path: {base_url}"
            )));
        }
        Ok(Self {
            client,
            base_url,
            auth_header,
            retry: config.retry.clone(),
        })
    }

    /// `GET /leaderboard`, ordered by rank.
    pub async fn get_leaderboard(&self) -> Result<LeaderboardSnapshot, ApiClientError> {
        let url = self.endpoint(&["leaderboard"]);
        let payload: LeaderboardPayload = self.get_json(url, Missing::Failure).await?;
        Ok(LeaderboardSnapshot::from_standings(payload.leaderboard)?)
    }

    /// `GET /teams/:id`.
    pub async fn get_team(&self, id: &TeamId) -> Result<TeamDetail, ApiClientError> {
        let url = self.endpoint(&["teams", id.as_str()]);
        let payload: TeamPayload = self.get_json(url, Missing::NotFound).await?;
        Ok(payload.team)
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        missing: Missing,
    ) -> Result<T, ApiClientError> {
        let path = url.path().to_string();
        let mut attempt = 0;
        loop {
            match self.get_once::<T>(url.clone(), missing).await {
                Err(err) if err.is_transport() && attempt < self.retry.attempts => {
                    attempt += 1;
                    warn!(
                        path = %path,
                        attempt,
                        delay_ms = self.retry.delay_ms,
                        error = %err,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay()).await;
                }
                result => return result,
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: Url,
        missing: Missing,
    ) -> Result<T, ApiClientError> {
        let response = self
            .client
            .get(url)
            .headers(self.auth_header.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        self.parse_response(response, missing).await
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        missing: Missing,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        let text = response.text().await?;
        let envelope = serde_json::from_str::<ApiEnvelope<T>>(&text);

        if status == StatusCode::NOT_FOUND && missing == Missing::NotFound {
            let message = envelope
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "resource not found".to_string());
            return Err(ApiClientError::NotFound(message));
        }

        if !status.is_success() {
            debug!(status = status.as_u16(), body = %text, "Request rejected");
            let (message, errors) = match envelope {
                Ok(envelope) => (
                    envelope
                        .message
                        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
                    envelope.errors,
                ),
                Err(_) => (DEFAULT_ERROR_MESSAGE.to_string(), Vec::new()),
            };
            return Err(ApiClientError::Api {
                status: status.as_u16(),
                message,
                errors,
            });
        }

        match envelope?.into_result() {
            Ok(data) => Ok(data),
            Err(EnvelopeError::Failed { message, errors }) => Err(ApiClientError::Api {
                status: status.as_u16(),
                message,
                errors,
            }),
            Err(EnvelopeError::MissingData) => Err(ApiClientError::InvalidResponse(
                "success envelope without data".to_string(),
            )),
        }
    }
}

#[async_trait]
impl SnapshotFetcher for RestClient {
    type Error = ApiClientError;

    async fn fetch_leaderboard(&self) -> Result<LeaderboardSnapshot, ApiClientError> {
        self.get_leaderboard().await
    }
}

#[async_trait]
impl TeamFetcher for RestClient {
    type Error = ApiClientError;

    async fn fetch_team(&self, id: &TeamId) -> Result<Option<TeamDetail>, ApiClientError> {
        match self.get_team(id).await {
            Ok(team) => Ok(Some(team)),
            Err(ApiClientError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Opens the server-sent leaderboard stream.
#[derive(Clone)]
pub struct SseClient {
    client: reqwest::Client,
    url: String,
    auth_header: HeaderMap,
}

impl SseClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        // No overall timeout: the body stays open for the life of the connection.
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .build()?;
        let auth_header = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            url: config.sse_url(),
            auth_header,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PushTransport for SseClient {
    async fn open(&self) -> Result<MessageStream, ApiClientError> {
        let response = self
            .client
            .get(&self.url)
            .headers(self.auth_header.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiClientError::Stream(format!(
                "HTTP {} from {}",
                status.as_u16(),
                self.url
            )));
        }
        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/event-stream"))
            .unwrap_or(false);
        if !is_event_stream {
            return Err(ApiClientError::Stream(format!(
                "{} did not answer with text/event-stream",
                self.url
            )));
        }

        info!(url = %self.url, "Event stream opened");
        let body = Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(ApiClientError::from)),
        );
        Ok(sse::message_stream(body).boxed())
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

fn build_auth_headers(auth: &AuthConfig) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &auth.token {
        let value = format!("Bearer {}", token);
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_header_built_from_token() {
        let headers = build_auth_headers(&AuthConfig {
            token: Some("abc".to_string()),
        })
        .unwrap();
        assert_eq!(headers.get("authorization").unwrap(), "Bearer abc");
        assert!(build_auth_headers(&AuthConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_token_is_config_error() {
        let err = build_auth_headers(&AuthConfig {
            token: Some("bad\ntoken".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, ApiClientError::Config(_)));
    }

    #[test]
    fn test_api_error_displays_server_message() {
        let err = ApiClientError::Api {
            status: 422,
            message: "Team name taken".to_string(),
            errors: Vec::new(),
        };
        assert_eq!(err.to_string(), "Team name taken");
        assert!(!err.is_transport());
        assert!(ApiClientError::NotFound("x".into()).is_not_found());
    }

    fn rest_client(api_base_url: &str) -> RestClient {
        let config = TuiConfig::from_toml(&format!(
            r#"
            api_base_url = "{api_base_url}"
            request_timeout_ms = 1000
            refresh_interval_ms = 250
            persistence_path = "/tmp/podium-state.json"
            log_path = "/tmp/podium.log"

            [theme]
            name = "podium"
            "#
        ))
        .unwrap();
        RestClient::new(&config).unwrap()
    }

    #[test]
    fn test_team_ids_are_percent_encoded() {
        let client = rest_client("http://localhost:3000/api/");
        assert_eq!(
            client.endpoint(&["teams", "a/b?c#d"]).as_str(),
            "http://localhost:3000/api/teams/a%2Fb%3Fc%23d"
        );
        assert_eq!(
            client.endpoint(&["leaderboard"]).as_str(),
            "http://localhost:3000/api/leaderboard"
        );
    }

    #[test]
    fn test_bare_host_base_url() {
        let client = rest_client("http://localhost:3000");
        assert_eq!(
            client.endpoint(&["teams", "t1"]).as_str(),
            "http://localhost:3000/teams/t1"
        );
    }
}
