//! Authenticated HTTP session shared by the bank and credit card clients.
//!
//! A [`Session`] owns the current authenticated `reqwest::Client`. Every GET
//! goes through the retry policy, and a response that signals an expired
//! session triggers exactly one re-authentication before the request is sent
//! again.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::backoff::{with_backoff, RetryPolicy};
use crate::errors::{Error, Result};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Both portals serve their JSON APIs only to browser-looking clients.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.14; rv:67.0) Gecko/20100101 Firefox/67.0";

/// How much of an error body ends up in error messages.
const BODY_SNIPPET_LEN: usize = 200;

/// Connection settings for one portal.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Scheme and host of the portal, without trailing slash.
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl SessionConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Client builder with the timeout and user agent applied.
    pub fn client_builder(&self) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
    }
}

/// A client that carries valid session state (cookies, tokens).
#[derive(Clone, Debug)]
pub struct AuthenticatedClient {
    pub client: reqwest::Client,
    /// Extra headers sent with every request, e.g. an XSRF token.
    pub headers: HeaderMap,
}

impl AuthenticatedClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            headers: HeaderMap::new(),
        }
    }
}

/// Produces authenticated clients for a portal.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Performs a full authentication and returns a ready client.
    async fn authenticate(&self, config: &SessionConfig) -> Result<AuthenticatedClient>;

    /// Whether `response` shows that the session is no longer valid.
    fn is_session_expired(&self, response: &Response) -> bool {
        response.status() == StatusCode::UNAUTHORIZED
    }
}

/// Authenticated session against one portal.
pub struct Session<A> {
    authenticator: A,
    config: SessionConfig,
    current: RwLock<AuthenticatedClient>,
}

impl<A: Authenticator> Session<A> {
    /// Authenticates and returns a ready session.
    pub async fn connect(authenticator: A, config: SessionConfig) -> Result<Self> {
        info!(
            "[Session] Authenticating to {} at {}",
            authenticator.name(),
            config.base_url
        );
        let client = authenticator.authenticate(&config).await?;
        Ok(Self {
            authenticator,
            config,
            current: RwLock::new(client),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    /// Replaces the current client with a freshly authenticated one.
    pub async fn reauthenticate(&self) -> Result<()> {
        let fresh = self.authenticator.authenticate(&self.config).await?;
        *self.current.write().await = fresh;
        Ok(())
    }

    /// GETs `path` relative to the base url and parses the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.config.url(path);
        debug!("[Session] GET {}", url);
        let target = url.as_str();
        with_backoff(&self.config.retry, target, || async move {
            let response = self.get_once(target, query, headers).await?;
            parse_response(target, response).await
        })
        .await
    }

    async fn get_once(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let response = self.send_get(url, query, headers).await?;
        if !self.authenticator.is_session_expired(&response) {
            return Ok(response);
        }

        info!(
            "[Session] Expired session detected for {}, trying to re-authenticate",
            self.authenticator.name()
        );
        self.reauthenticate().await?;

        let response = self.send_get(url, query, headers).await?;
        if self.authenticator.is_session_expired(&response) {
            warn!(
                "[Session] {} session still expired after re-authentication",
                self.authenticator.name()
            );
            return Err(Error::SessionExpired(self.authenticator.name().to_string()));
        }
        Ok(response)
    }

    async fn send_get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let (client, session_headers) = {
            let current = self.current.read().await;
            (current.client.clone(), current.headers.clone())
        };

        let mut request = client.get(url).headers(session_headers).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        request
            .send()
            .await
            .map_err(|e| Error::from_request(url, e))
    }
}

/// Statuses worth retrying.
fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}

/// Parse an HTTP response, handling errors appropriately.
async fn parse_response<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::from_request(url, e))?;

    if !status.is_success() {
        if is_transient(status) {
            return Err(Error::Transient {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        return Err(Error::Http {
            status: status.as_u16(),
            url: url.to_string(),
            body: snippet(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialize {
        url: url.to_string(),
        message: format!("{} - {}", e, snippet(&body)),
    })
}
