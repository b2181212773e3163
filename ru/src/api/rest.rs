//! REST client for the reader endpoints
//!
//! Implements ReaderApi over reqwest. Each fetch is a single GET; transport
//! failures and non-2xx answers come back as FetchError without retrying.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{AuthContext, FetchError, ReaderApi};
use crate::config::ApiConfig;

const TAGS_PATH: &str = "/rest/v1.2/read/menu";
const FOLLOWED_BLOGS_PATH: &str = "/rest/v1.1/read/following/mine";
const RECOMMENDED_BLOGS_PATH: &str = "/rest/v1.1/read/recommendations/mine/";

/// Reader REST API client
pub struct RestClient {
    base_url: String,
    token: Option<String>,
    max_recommended: u32,
    http: Client,
}

impl RestClient {
    /// Create a client from configuration, reading the token from the environment
    pub fn from_config(config: &ApiConfig) -> Result<Self, FetchError> {
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(FetchError::Network)?;

        let token = config.get_token();
        if token.is_none() {
            debug!(token_env = %config.token_env, "from_config: no access token, using logged-out endpoints");
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            max_recommended: config.max_recommended,
            http,
        })
    }

    /// Override the access token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "get_json: called");

        let mut request = self.http.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "get_json: API error");
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        debug!(%url, bytes = body.len(), "get_json: success");
        Ok(serde_json::from_str(&body)?)
    }
}

impl AuthContext for RestClient {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait]
impl ReaderApi for RestClient {
    async fn fetch_tags(&self) -> Result<Value, FetchError> {
        debug!("fetch_tags: called");
        self.get_json(TAGS_PATH, &[]).await
    }

    async fn fetch_followed_blogs(&self) -> Result<Value, FetchError> {
        debug!("fetch_followed_blogs: called");
        self.get_json(FOLLOWED_BLOGS_PATH, &[("meta", "site,feed".to_string())])
            .await
    }

    async fn fetch_recommended_blogs(&self) -> Result<Value, FetchError> {
        debug!(max = self.max_recommended, "fetch_recommended_blogs: called");
        self.get_json(
            RECOMMENDED_BLOGS_PATH,
            &[
                ("source", "mobile".to_string()),
                ("number", self.max_recommended.to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> RestClient {
        let config = ApiConfig {
            base_url: format!("{}/", server.uri()),
            timeout_ms: 5_000,
            max_recommended: 7,
            ..Default::default()
        };
        RestClient::from_config(&config)
            .unwrap()
            .with_token(token.map(str::to_string))
    }

    #[tokio::test]
    async fn test_fetch_tags_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1.2/read/menu"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"default": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        assert!(client.is_authenticated());
        let payload = client.fetch_tags().await.unwrap();
        assert_eq!(payload, json!({"default": {}}));
    }

    #[tokio::test]
    async fn test_fetch_followed_blogs_requests_meta() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1.1/read/following/mine"))
            .and(query_param("meta", "site,feed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"subscriptions": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(!client.is_authenticated());
        let payload = client.fetch_followed_blogs().await.unwrap();
        assert_eq!(payload["subscriptions"], json!([]));
    }

    #[tokio::test]
    async fn test_fetch_recommended_blogs_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1.1/read/recommendations/mine/"))
            .and(query_param("source", "mobile"))
            .and(query_param("number", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"blogs": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        assert!(client.fetch_recommended_blogs().await.is_ok());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1.2/read/menu"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        match client.fetch_tags().await {
            Err(FetchError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_maps_to_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1.2/read/menu"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(matches!(client.fetch_tags().await, Err(FetchError::Json(_))));
    }
}
