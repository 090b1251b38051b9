//! HTTP transport for the analytics API

use super::{
    AnalyticsApi, EndSessionRequest, HeartbeatRequest, StartSessionRequest, StartSessionResponse,
};
use crate::auth::{KeyValueStore, TokenStore};
use crate::types::AnalyticsClientConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// [`AnalyticsApi`] over JSON POST requests.
///
/// Single attempt per call; retry policy belongs to the caller.
pub struct HttpAnalyticsApi {
    config: AnalyticsClientConfig,
    client: Client,
    tokens: Option<TokenStore<Arc<dyn KeyValueStore>>>,
}

impl HttpAnalyticsApi {
    pub fn new(config: AnalyticsClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            config,
            client,
            tokens: None,
        })
    }

    /// Attach a bearer token from `store` whenever an unexpired one exists
    pub fn with_token_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.tokens = Some(TokenStore::new(store));
        self
    }

    pub fn config(&self) -> &AnalyticsClientConfig {
        &self.config
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let url = self.config.endpoint(path)?;
        let request = self.authorize(self.client.post(url.clone()).json(body))?;

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "Analytics request");

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &self.tokens {
            Some(tokens) => match tokens.token()? {
                Some(token) => Ok(request.bearer_auth(token)),
                None => Ok(request),
            },
            None => Ok(request),
        }
    }
}

#[async_trait]
impl AnalyticsApi for HttpAnalyticsApi {
    #[instrument(skip(self, request), fields(event_id = %request.event_id))]
    async fn start_session(&self, request: StartSessionRequest) -> Result<StartSessionResponse> {
        let response = self.post(&self.config.start_path, &request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn heartbeat(&self, request: HeartbeatRequest) -> Result<()> {
        self.post(&self.config.heartbeat_path, &request).await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    async fn end_session(&self, request: EndSessionRequest) -> Result<()> {
        self.post(&self.config.end_path, &request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStore;
    use url::Url;

    #[test]
    fn test_rejects_invalid_config() {
        let config = AnalyticsClientConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(HttpAnalyticsApi::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_authorize_skips_missing_token() {
        let api = HttpAnalyticsApi::new(AnalyticsClientConfig::new(
            Url::parse("https://api.example.com").unwrap(),
        ))
        .unwrap()
        .with_token_store(Arc::new(MemoryStore::new()));

        let request = api
            .authorize(api.client.post("https://api.example.com/x"))
            .unwrap()
            .build()
            .unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_authorize_adds_bearer() {
        let store = MemoryStore::new();
        TokenStore::new(store.clone())
            .save("secret", chrono::Duration::hours(1))
            .unwrap();

        let api = HttpAnalyticsApi::new(AnalyticsClientConfig::default())
            .unwrap()
            .with_token_store(Arc::new(store));

        let request = api
            .authorize(api.client.post("http://localhost:3000/api/x"))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer secret"
        );
    }
}
