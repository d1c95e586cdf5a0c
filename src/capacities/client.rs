//! HTTP client for the Capacities API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::Settings;
use crate::error::{Error, Result};

use super::types::{
    DailyNoteRequest, SaveWeblinkParams, SaveWeblinkRequest, SaveWeblinkResponse, SpaceInfo,
    SpacesResponse, API_BASE_URL, MAX_DESCRIPTION_CHARS, MAX_MD_TEXT_CHARS, MAX_TAGS,
    MAX_TITLE_CHARS,
};

/// The remote operations the sync layer depends on
#[async_trait]
pub trait CapacitiesApi: Send + Sync {
    /// Submit a URL plus optional markdown body as a new weblink object
    async fn save_weblink(&self, params: SaveWeblinkParams) -> Result<SaveWeblinkResponse>;

    /// Append markdown to today's daily note
    async fn save_to_daily_note(&self, md_text: &str, no_timestamp: Option<bool>) -> Result<()>;

    /// List the spaces the token can write to
    async fn spaces(&self) -> Result<Vec<SpaceInfo>>;
}

/// Bearer-token client over the Capacities HTTP API
///
/// Reconstructed from the current settings at every command entry, so a
/// credential change never leaves a stale client behind.
pub struct CapacitiesClient {
    client: Client,
    base_url: String,
    api_token: String,
    space_id: String,
}

impl CapacitiesClient {
    pub fn new(api_token: String, space_id: String, timeout: Duration) -> Result<Self> {
        // The per-request timeout keeps one hung submission from stalling a
        // whole batch
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            api_token,
            space_id,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.api_token.clone(),
            settings.space_id.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    /// Point the client at a different host; used by tests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_token.is_empty() && !self.space_id.is_empty()
    }

    /// Cheap probe: can we list spaces with the current credentials?
    pub async fn test_connection(&self) -> bool {
        self.spaces().await.is_ok()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn bearer(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.api_token))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::api(status, &body))
    }
}

#[async_trait]
impl CapacitiesApi for CapacitiesClient {
    async fn save_weblink(&self, params: SaveWeblinkParams) -> Result<SaveWeblinkResponse> {
        if !self.is_configured() {
            return Err(Error::NotConfigured);
        }

        let request = SaveWeblinkRequest {
            space_id: self.space_id.clone(),
            url: params.url,
            title_overwrite: params
                .title_overwrite
                .map(|t| truncate_chars(t, MAX_TITLE_CHARS)),
            description_overwrite: params
                .description_overwrite
                .map(|d| truncate_chars(d, MAX_DESCRIPTION_CHARS)),
            tags: params.tags.map(|mut tags| {
                tags.truncate(MAX_TAGS);
                tags
            }),
            md_text: params.md_text.map(|m| truncate_chars(m, MAX_MD_TEXT_CHARS)),
        };

        debug!("Saving weblink for {}", request.url);

        let response = self
            .bearer(self.client.post(self.endpoint("/save-weblink")))
            .json(&request)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn save_to_daily_note(&self, md_text: &str, no_timestamp: Option<bool>) -> Result<()> {
        if !self.is_configured() {
            return Err(Error::NotConfigured);
        }

        let request = DailyNoteRequest {
            space_id: self.space_id.clone(),
            md_text: truncate_chars(md_text.to_string(), MAX_MD_TEXT_CHARS),
            no_time_stamp: no_timestamp,
        };

        let response = self
            .bearer(self.client.post(self.endpoint("/save-to-daily-note")))
            .json(&request)
            .send()
            .await?;

        // Success responses have an empty body
        Self::check(response).await?;
        Ok(())
    }

    async fn spaces(&self) -> Result<Vec<SpaceInfo>> {
        if self.api_token.is_empty() {
            return Err(Error::NotConfigured);
        }

        let response = self
            .bearer(self.client.get(self.endpoint("/spaces")))
            .send()
            .await?;

        let body: SpacesResponse = Self::check(response).await?.json().await?;
        Ok(body.spaces)
    }
}

/// Truncate to a character limit without splitting a code point
fn truncate_chars(value: String, max: usize) -> String {
    if value.chars().count() <= max {
        value
    } else {
        value.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Json;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;

    fn assert_bearer(headers: &HeaderMap) {
        assert_eq!(
            headers.get("authorization").unwrap().to_str().unwrap(),
            "Bearer test-token"
        );
    }

    /// Loopback stand-in for the Capacities API
    async fn serve() -> String {
        let app = Router::new()
            .route(
                "/spaces",
                get(|headers: HeaderMap| async move {
                    assert_bearer(&headers);
                    Json(serde_json::json!({
                        "spaces": [{"id": "s1", "title": "Research"}]
                    }))
                }),
            )
            .route(
                "/save-weblink",
                post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                    assert_bearer(&headers);
                    assert_eq!(body["spaceId"], "space-1");
                    assert!(body["url"].is_string());
                    Json(serde_json::json!({
                        "spaceId": "space-1",
                        "id": "obj-1",
                        "structureId": "RootSpace",
                        "title": body["titleOverwrite"].as_str().unwrap_or(""),
                        "description": "",
                        "tags": body["tags"].clone()
                    }))
                }),
            )
            .route(
                "/save-to-daily-note",
                post(|| async { StatusCode::OK }),
            )
            .route(
                "/rate-limited/save-weblink",
                post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> CapacitiesClient {
        CapacitiesClient::new(
            "test-token".to_string(),
            "space-1".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_save_weblink_round_trip() {
        let base = serve().await;
        let response = client(&base)
            .save_weblink(SaveWeblinkParams {
                url: "https://example.com/paper.pdf".to_string(),
                title_overwrite: Some("A Paper".to_string()),
                tags: Some(vec!["zotero".to_string(), "annotations".to_string()]),
                md_text: Some("## Annotations".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(response.id, "obj-1");
        assert_eq!(response.structure_id, "RootSpace");
        assert_eq!(response.title, "A Paper");
    }

    #[tokio::test]
    async fn test_spaces_round_trip() {
        let base = serve().await;
        let spaces = client(&base).spaces().await.unwrap();
        assert_eq!(spaces.len(), 1);
        assert_eq!(spaces[0].id, "s1");
    }

    #[tokio::test]
    async fn test_daily_note_round_trip() {
        let base = serve().await;
        client(&base)
            .save_to_daily_note("a note", Some(true))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_success_becomes_typed_error() {
        let base = serve().await;
        let err = client(&format!("{base}/rate-limited"))
            .save_weblink(SaveWeblinkParams {
                url: "https://example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 429);
                assert!(message.contains("429"));
                assert!(message.contains("slow down"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_client_makes_no_call() {
        let client =
            CapacitiesClient::new(String::new(), String::new(), Duration::from_secs(5)).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client
                .save_weblink(SaveWeblinkParams::default())
                .await
                .unwrap_err(),
            Error::NotConfigured
        ));
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("abc".to_string(), 5), "abc");
        assert_eq!(truncate_chars("abcdef".to_string(), 3), "abc");
        assert_eq!(truncate_chars("\u{1F7E1}\u{1F7E2}\u{1F535}".to_string(), 2), "\u{1F7E1}\u{1F7E2}");
    }
}
