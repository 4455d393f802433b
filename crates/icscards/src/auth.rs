//! Username and password login against the ICS portal.

use std::fmt;
use std::sync::Arc;

use abnamro_core::{AuthenticatedClient, Authenticator, Error, Result, SessionConfig};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use url::Url;

const LOGIN_PATH: &str = "/pub/nl/pub/login";
const XSRF_COOKIE: &str = "XSRF-TOKEN";
const XSRF_HEADER: &str = "x-xsrf-token";

/// Marker in the URL the portal redirects to once the session is gone.
const UNAUTHENTICATED_MARKER: &str = "USERNAME=unauthenticated";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    login_type: &'a str,
    virtual_portal: &'a str,
    username: &'a str,
    password: &'a str,
}

/// Logs in with a username and password and carries the XSRF token.
#[derive(Clone)]
pub struct CredentialsAuthenticator {
    username: String,
    password: String,
}

impl CredentialsAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for CredentialsAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsAuthenticator")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Value of the `XSRF-TOKEN` cookie the jar holds for `url`.
fn xsrf_token(jar: &Jar, url: &Url) -> Option<String> {
    let header = jar.cookies(url)?;
    let cookies = header.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == XSRF_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

#[async_trait]
impl Authenticator for CredentialsAuthenticator {
    fn name(&self) -> &'static str {
        "IcsCards"
    }

    async fn authenticate(&self, config: &SessionConfig) -> Result<AuthenticatedClient> {
        let jar = Arc::new(Jar::default());
        let client = config
            .client_builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| Error::Config(format!("Failed to initialize HTTP client: {}", e)))?;

        let login_url = config.url(LOGIN_PATH);
        debug!("[IcsCards] Trying to authenticate to url {}", login_url);
        let payload = LoginRequest {
            login_type: "PASSWORD",
            virtual_portal: "ICS-ABNAMRO",
            username: &self.username,
            password: &self.password,
        };
        let response = client
            .post(&login_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::from_request(&login_url, e))?;

        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| Error::from_request(&login_url, e))?;
            return Err(Error::AuthenticationFailed(body));
        }

        let url = Url::parse(&login_url)
            .map_err(|e| Error::Config(format!("Invalid login url {}: {}", login_url, e)))?;
        let token = xsrf_token(&jar, &url).ok_or_else(|| {
            Error::AuthenticationFailed(format!("No {} cookie received on login", XSRF_COOKIE))
        })?;
        let value = HeaderValue::from_str(&token).map_err(|_| {
            Error::AuthenticationFailed(format!("Unusable {} cookie received", XSRF_COOKIE))
        })?;

        info!("[IcsCards] Logged in as {}", self.username);
        let mut authenticated = AuthenticatedClient::new(client);
        authenticated
            .headers
            .insert(HeaderName::from_static(XSRF_HEADER), value);
        Ok(authenticated)
    }

    fn is_session_expired(&self, response: &Response) -> bool {
        response.status() == StatusCode::UNAUTHORIZED
            || response.url().as_str().contains(UNAUTHENTICATED_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xsrf_token_from_jar() {
        let url = Url::parse("https://www.icscards.nl/pub/nl/pub/login").unwrap();
        let jar = Jar::default();
        jar.add_cookie_str("JSESSIONID=abc; Path=/", &url);
        jar.add_cookie_str("XSRF-TOKEN=f00-ba4; Path=/", &url);
        assert_eq!(xsrf_token(&jar, &url).as_deref(), Some("f00-ba4"));
    }

    #[test]
    fn test_missing_xsrf_token() {
        let url = Url::parse("https://www.icscards.nl/pub/nl/pub/login").unwrap();
        let jar = Jar::default();
        assert_eq!(xsrf_token(&jar, &url), None);
        jar.add_cookie_str("JSESSIONID=abc; Path=/", &url);
        assert_eq!(xsrf_token(&jar, &url), None);
    }

    #[test]
    fn test_login_payload() {
        let payload = LoginRequest {
            login_type: "PASSWORD",
            virtual_portal: "ICS-ABNAMRO",
            username: "jansen",
            password: "secret",
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["loginType"], "PASSWORD");
        assert_eq!(value["virtualPortal"], "ICS-ABNAMRO");
        assert_eq!(value["username"], "jansen");
    }

    #[test]
    fn test_debug_hides_password() {
        let printed = format!("{:?}", CredentialsAuthenticator::new("jansen", "hunter2"));
        assert!(!printed.contains("hunter2"));
    }
}
