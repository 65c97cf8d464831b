//! auth::session_status
//!
//! Advisory session-status query against the identity proxy.
//!
//! A `GET` on the status path answers 200 when the browser session is
//! already authenticated at the proxy and 401 when it is not. Every other
//! outcome, including transport failures, is inconclusive: the answer is
//! advisory and the redundant triggers still run.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

/// User-Agent header for status requests.
const USER_AGENT: &str = concat!("sso-bridge/", env!("CARGO_PKG_VERSION"));

/// Outcome of a session-status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// 200: the proxy session is valid.
    Authenticated,
    /// 401: the proxy session is missing or expired.
    Unauthenticated,
    /// Anything else.
    Inconclusive,
}

impl SessionStatus {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            200 => SessionStatus::Authenticated,
            401 => SessionStatus::Unauthenticated,
            _ => SessionStatus::Inconclusive,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Unauthenticated => "unauthenticated",
            SessionStatus::Inconclusive => "inconclusive",
        };
        f.write_str(s)
    }
}

/// Errors from the status request itself.
#[derive(Debug, Error)]
pub enum SessionStatusError {
    #[error("invalid session status url '{0}'")]
    InvalidUrl(String),

    #[error("session status request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Source of the advisory session status.
#[async_trait]
pub trait SessionStatusSource: Send + Sync {
    /// Query the session status. Never fails; failures are inconclusive.
    async fn query(&self) -> SessionStatus;
}

/// Session status over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSessionStatus {
    client: Client,
    url: String,
}

impl HttpSessionStatus {
    /// Create a status source for `{base_url}{path}`.
    pub fn new(base_url: &str, path: &str) -> Self {
        Self {
            client: Client::new(),
            url: format!("{}{}", base_url.trim_end_matches('/'), path),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform the request and return the raw status.
    pub async fn fetch(&self) -> Result<StatusCode, SessionStatusError> {
        let url = reqwest::Url::parse(&self.url)
            .map_err(|_| SessionStatusError::InvalidUrl(self.url.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );

        let response = self.client.get(url).headers(headers).send().await?;
        Ok(response.status())
    }
}

#[async_trait]
impl SessionStatusSource for HttpSessionStatus {
    async fn query(&self) -> SessionStatus {
        match self.fetch().await {
            Ok(status) => {
                debug!(status = status.as_u16(), "session status response");
                SessionStatus::from_status(status)
            }
            Err(e) => {
                warn!(error = %e, "session status query failed");
                SessionStatus::Inconclusive
            }
        }
    }
}

/// A status source that always answers the same thing.
#[derive(Debug, Clone, Copy)]
pub struct FixedSessionStatus(pub SessionStatus);

#[async_trait]
impl SessionStatusSource for FixedSessionStatus {
    async fn query(&self) -> SessionStatus {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_answering(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth2/userinfo"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn ok_is_authenticated() {
        let server = server_answering(200).await;
        let source = HttpSessionStatus::new(&server.uri(), "/oauth2/userinfo");
        assert_eq!(source.query().await, SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn unauthorized_is_unauthenticated() {
        let server = server_answering(401).await;
        let source = HttpSessionStatus::new(&server.uri(), "/oauth2/userinfo");
        assert_eq!(source.query().await, SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn other_status_is_inconclusive() {
        let server = server_answering(502).await;
        let source = HttpSessionStatus::new(&server.uri(), "/oauth2/userinfo");
        assert_eq!(source.query().await, SessionStatus::Inconclusive);
    }

    #[tokio::test]
    async fn unreachable_server_is_inconclusive() {
        let source = HttpSessionStatus::new("http://127.0.0.1:1", "/oauth2/userinfo");
        assert_eq!(source.query().await, SessionStatus::Inconclusive);
    }

    #[tokio::test]
    async fn invalid_url_is_inconclusive() {
        let source = HttpSessionStatus::new("not a url", "/oauth2/userinfo");
        assert!(matches!(
            source.fetch().await,
            Err(SessionStatusError::InvalidUrl(_))
        ));
        assert_eq!(source.query().await, SessionStatus::Inconclusive);
    }

    #[test]
    fn trailing_slash_is_normalised() {
        let source = HttpSessionStatus::new("http://proxy.local/", "/oauth2/userinfo");
        assert_eq!(source.url(), "http://proxy.local/oauth2/userinfo");
    }

    #[test]
    fn display_names() {
        assert_eq!(SessionStatus::Authenticated.to_string(), "authenticated");
        assert_eq!(SessionStatus::Inconclusive.to_string(), "inconclusive");
    }
}
