//! GitHub API client.

use reqwest::{Method, StatusCode};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::github::Endpoint;

const DEFAULT_API_URL: &str = "https://api.github.com";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

/// An opaque, non-empty bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap a token string. Blank strings are not tokens.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Extract the `access_token` field of an authorization callback payload.
    pub fn from_callback(payload: &Value) -> Option<Self> {
        payload
            .get("access_token")
            .and_then(Value::as_str)
            .and_then(Token::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Credentials of a signed-in user, held by the client for the lifetime of a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: Token,
}

impl Session {
    pub fn new(token: Token) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

/// Media type requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// Decoded JSON resources.
    Json,
    /// Raw file bytes, returned as text.
    Raw,
}

/// Client for interacting with the GitHub API.
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) base_url: String,
    pub(crate) user_agent: String,
    pub(crate) session: Option<Session>,
    pub(crate) client: Client,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.session.is_some())
            .finish()
    }
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubClient {
    /// Create a client with no session against api.github.com.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
            user_agent: "github-publish".into(),
            session: None,
            client: Client::new(),
        }
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            user_agent: config.user_agent.clone(),
            session: None,
            client: Client::new(),
        }
    }

    /// Create a client for GitHub Enterprise or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        // Remove trailing slash if present
        if url.ends_with('/') {
            url.pop();
        }
        self.base_url = url;
        self
    }

    /// Attach a session built from `token`.
    pub fn with_token(mut self, token: Token) -> Self {
        self.session = Some(Session::new(token));
        self
    }

    /// Replace the current session.
    pub fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
    }

    /// Drop the current session. Later calls fail with `NotAuthenticated`.
    pub fn clear_session(&mut self) {
        self.session = None;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Store the token carried by an authorization callback payload and return it.
    ///
    /// Returns `None` and leaves the session untouched when the payload has
    /// no usable `access_token`.
    pub fn token(&mut self, payload: &Value) -> Option<Token> {
        let token = Token::from_callback(payload)?;
        self.session = Some(Session::new(token.clone()));
        Some(token)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the headers for an authenticated API request.
    pub(crate) fn headers(&self, media: MediaType) -> Result<HeaderMap> {
        let session = self
            .session
            .as_ref()
            .filter(|s| s.token.is_valid())
            .ok_or(PublishError::NotAuthenticated)?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", session.token.as_str()))
            .map_err(|_| PublishError::InvalidConfig("Token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(match media {
                MediaType::Json => JSON_MEDIA_TYPE,
                MediaType::Raw => RAW_MEDIA_TYPE,
            }),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|_| PublishError::InvalidConfig("Invalid user agent".into()))?,
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Prepare a GET request. Nothing is sent until [`ApiCall::send`].
    pub(crate) fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiCall<'_, T> {
        ApiCall::new(self, Method::GET, endpoint, MediaType::Json, None)
    }

    /// Prepare a GET request for raw file content.
    pub(crate) fn get_raw(&self, endpoint: Endpoint) -> ApiCall<'_, String> {
        ApiCall::new(self, Method::GET, endpoint, MediaType::Raw, None)
    }

    /// Prepare a PUT request with a JSON body.
    pub(crate) fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> ApiCall<'_, T> {
        let body = serde_json::to_value(body).map_err(|e| e.to_string());
        ApiCall::new(self, Method::PUT, endpoint, MediaType::Json, Some(body))
    }
}

/// A single API request, prepared but not yet sent.
///
/// Sending consumes the call and yields exactly one decoded value.
#[must_use = "an ApiCall does nothing until `send` is called"]
pub struct ApiCall<'a, T> {
    client: &'a GitHubClient,
    method: Method,
    endpoint: Endpoint,
    media: MediaType,
    body: Option<std::result::Result<Value, String>>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> ApiCall<'a, T> {
    fn new(
        client: &'a GitHubClient,
        method: Method,
        endpoint: Endpoint,
        media: MediaType,
        body: Option<std::result::Result<Value, String>>,
    ) -> Self {
        Self {
            client,
            method,
            endpoint,
            media,
            body,
            _marker: PhantomData,
        }
    }

    /// HTTP method of the request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Fully resolved request URL.
    pub fn url(&self) -> Result<Url> {
        self.endpoint.resolve(&self.client.base_url)
    }

    /// JSON body of a write request.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref().and_then(|b| b.as_ref().ok())
    }

    /// Send the request and decode the response.
    pub fn send(self) -> Result<T> {
        let headers = self.client.headers(self.media)?;
        let url = self.url()?;
        debug!(method = %self.method, url = %url, "GitHub API request");

        let mut request = self
            .client
            .client
            .request(self.method.clone(), url.clone())
            .headers(headers);
        if let Some(body) = self.body {
            let body = body.map_err(|message| PublishError::InvalidConfig(format!(
                "Request body is not serializable: {}",
                message
            )))?;
            request = request.json(&body);
        }
        let response = request.send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            debug!(%status, url = %url, "GitHub API request failed");
            let message = format!("API request failed ({}): {}", status, body);
            return Err(if status == StatusCode::NOT_FOUND {
                PublishError::NotFound { message }
            } else {
                PublishError::GitHub { message }
            });
        }

        match self.media {
            MediaType::Json => response.json().map_err(|e| PublishError::GitHub {
                message: format!("Failed to parse response: {}", e),
            }),
            MediaType::Raw => {
                let text = response.text()?;
                Ok(serde_json::from_value(Value::String(text))?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_rejects_blank() {
        assert!(Token::new("").is_none());
        assert!(Token::new("   ").is_none());
        assert_eq!(Token::new("gho_abc").unwrap().as_str(), "gho_abc");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("gho_secret").unwrap();
        assert_eq!(format!("{:?}", token), "Token(***)");
    }

    #[test]
    fn test_token_setter_stores_and_returns() {
        let mut client = GitHubClient::new();
        let token = client.token(&json!({"access_token": "gho_abc", "scope": "repo"}));

        assert_eq!(token.as_ref().map(Token::as_str), Some("gho_abc"));
        assert_eq!(client.session().map(|s| s.token().as_str()), Some("gho_abc"));
    }

    #[test]
    fn test_token_setter_ignores_unusable_payload() {
        let mut client = GitHubClient::new();
        assert!(client.token(&json!({"access_token": ""})).is_none());
        assert!(client.token(&json!({"access_token": 42})).is_none());
        assert!(client.token(&json!("access_token")).is_none());
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_headers_require_session() {
        let client = GitHubClient::new();
        assert!(matches!(
            client.headers(MediaType::Json),
            Err(PublishError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_headers_with_session() {
        let client = GitHubClient::new().with_token(Token::new("gho_abc").unwrap());
        let headers = client.headers(MediaType::Raw).unwrap();

        assert_eq!(headers[AUTHORIZATION], "Bearer gho_abc");
        assert_eq!(headers[ACCEPT], RAW_MEDIA_TYPE);
        assert_eq!(headers["X-GitHub-Api-Version"], "2022-11-28");
    }

    #[test]
    fn test_send_without_session_fails_fast() {
        let client = GitHubClient::new().with_base_url("http://127.0.0.1:9");
        let result: Result<Value> = client.get(Endpoint::new(["user"])).send();
        assert!(matches!(result, Err(PublishError::NotAuthenticated)));
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let client = GitHubClient::new().with_base_url("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
