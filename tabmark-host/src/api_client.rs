//! REST client for the linkding bookmark service.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use tabmark_core::{
    Bookmark, BookmarkDraft, BookmarkGateway, BookmarkId, CheckResponse, ExtensionConfiguration,
    GatewayError, GatewayFactory, SaveOptions, SearchOptions, Tag, UserProfile,
};

const TAG_LIMIT: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Config error: {0}")]
    Config(String),
}

impl From<ApiClientError> for GatewayError {
    fn from(err: ApiClientError) -> Self {
        GatewayError::Client {
            reason: err.to_string(),
        }
    }
}

/// List endpoints wrap their items in a page.
#[derive(Debug, Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

#[derive(Clone)]
pub struct LinkdingClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl LinkdingClient {
    pub fn new(
        configuration: &ExtensionConfiguration,
        timeout: Duration,
    ) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let auth_header = build_auth_headers(&configuration.token)?;
        Ok(Self {
            client,
            base_url: configuration.api_base().to_string(),
            auth_header,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .headers(self.auth_header.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| transport(path, e))?;
        self.parse_response(path, response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| transport(path, e))?;
        if !status.is_success() {
            return Err(GatewayError::UnexpectedStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message: status_message(status, &text),
            });
        }
        serde_json::from_str(&text).map_err(|e| GatewayError::InvalidResponse {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl BookmarkGateway for LinkdingClient {
    async fn check_url(&self, url: &str) -> Result<CheckResponse, GatewayError> {
        self.get_json("/api/bookmarks/check/", &[("url", url.to_string())])
            .await
    }

    async fn get_bookmark(&self, id: BookmarkId) -> Result<Bookmark, GatewayError> {
        self.get_json(&format!("/api/bookmarks/{id}/"), &[]).await
    }

    async fn save_bookmark(
        &self,
        draft: &BookmarkDraft,
        options: SaveOptions,
    ) -> Result<Bookmark, GatewayError> {
        let path = "/api/bookmarks/";
        let mut request = self
            .client
            .post(self.url(path))
            .headers(self.auth_header.clone())
            .json(draft);
        if options.disable_html_snapshot {
            request = request.query(&[("disable_html_snapshot", "true")]);
        }
        let response = request.send().await.map_err(|e| transport(path, e))?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.map_err(|e| transport(path, e))?;
            return Err(GatewayError::Validation { body });
        }
        self.parse_response(path, response).await
    }

    async fn delete_bookmark(&self, id: BookmarkId) -> Result<(), GatewayError> {
        let path = format!("/api/bookmarks/{id}/");
        let response = self
            .client
            .delete(self.url(&path))
            .headers(self.auth_header.clone())
            .send()
            .await
            .map_err(|e| transport(&path, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(GatewayError::UnexpectedStatus {
            endpoint: path,
            status: status.as_u16(),
            message: status_message(status, &text),
        })
    }

    async fn search(
        &self,
        text: &str,
        options: SearchOptions,
    ) -> Result<Vec<Bookmark>, GatewayError> {
        let page: Page<Bookmark> = self
            .get_json(
                "/api/bookmarks/",
                &[("q", text.to_string()), ("limit", options.limit.to_string())],
            )
            .await?;
        Ok(page.results)
    }

    async fn get_tags(&self) -> Result<Vec<Tag>, GatewayError> {
        let page: Page<Tag> = self
            .get_json("/api/tags/", &[("limit", TAG_LIMIT.to_string())])
            .await?;
        Ok(page.results)
    }

    async fn get_user_profile(&self) -> Result<UserProfile, GatewayError> {
        self.get_json("/api/user/profile/", &[]).await
    }

    async fn test_connection(&self) -> bool {
        match self
            .get_json::<Page<serde_json::Value>>("/api/bookmarks/", &[("limit", "1".to_string())])
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::info!(error = %e, base_url = %self.base_url, "Connection test failed");
                false
            }
        }
    }
}

/// Builds a [`LinkdingClient`] per configuration.
pub struct HttpGatewayFactory {
    timeout: Duration,
}

impl HttpGatewayFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl GatewayFactory for HttpGatewayFactory {
    fn connect(
        &self,
        configuration: &ExtensionConfiguration,
    ) -> Result<Arc<dyn BookmarkGateway>, GatewayError> {
        Ok(Arc::new(LinkdingClient::new(configuration, self.timeout)?))
    }
}

fn build_auth_headers(token: &str) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    let value = format!("Token {}", token.trim());
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
    );
    Ok(headers)
}

fn transport(endpoint: &str, err: reqwest::Error) -> GatewayError {
    GatewayError::Transport {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    }
}

fn status_message(status: StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown status");
    if body.trim().is_empty() {
        reason.to_string()
    } else {
        format!("{reason}: {}", body.trim())
    }
}
