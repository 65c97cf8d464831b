//! auth::emby
//!
//! HTTP implementation of the authentication capability for Emby-style
//! media servers.
//!
//! # Endpoints
//!
//! - `POST /Users/AuthenticateByName` with `{"Username", "Pw"}`
//! - `POST /Sessions/Logout` with the `X-Emby-Token` header
//!
//! Every request carries an `X-Emby-Authorization` header identifying the
//! client and a per-process device id.
//!
//! On a successful sign-in the returned token is written into the credential
//! record, which is what the auth-state probe later observes.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::AuthFailure;
use super::ApiClient;
use crate::core::credentials::CredentialProbe;

/// Client name reported to the server.
const CLIENT_NAME: &str = "sso-bridge";

/// Device name reported to the server.
const DEVICE_NAME: &str = "headless";

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Pw")]
    pw: &'a str,
}

/// Successful sign-in response (only the fields we persist).
#[derive(Debug, Deserialize)]
pub struct AuthenticationResult {
    #[serde(rename = "User")]
    pub user: AuthenticatedUser,
    #[serde(rename = "AccessToken")]
    pub access_token: String,
    #[serde(rename = "ServerId")]
    pub server_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticatedUser {
    #[serde(rename = "Id")]
    pub id: String,
}

#[derive(Default)]
struct SessionState {
    token: Option<String>,
    connected: bool,
}

/// Authentication capability backed by a media server's HTTP API.
pub struct EmbyApiClient {
    client: Client,
    server: String,
    device_id: String,
    credentials: CredentialProbe,
    session: Mutex<SessionState>,
}

impl EmbyApiClient {
    /// Create a client for `server` (e.g. `http://media.local:8096`).
    pub fn new(server: &str, credentials: CredentialProbe) -> Self {
        Self {
            client: Client::new(),
            server: server.trim_end_matches('/').to_string(),
            device_id: Uuid::new_v4().to_string(),
            credentials,
            session: Mutex::new(SessionState::default()),
        }
    }

    fn authorization_header(&self) -> String {
        format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
            CLIENT_NAME,
            DEVICE_NAME,
            self.device_id,
            env!("CARGO_PKG_VERSION")
        )
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.authorization_header()) {
            headers.insert("X-Emby-Authorization", value);
        }
        headers
    }

    /// Whether `ensure_live_connection` has been called since the last sign-in.
    pub fn is_connected(&self) -> bool {
        self.session.lock().map(|s| s.connected).unwrap_or(false)
    }

    /// Post the logout request for `token`.
    pub async fn post_logout(&self, token: &str) -> Result<(), AuthFailure> {
        send_logout(self.client.clone(), self.logout_url(), self.headers(), token.to_string()).await
    }

    fn logout_url(&self) -> String {
        format!("{}/Sessions/Logout", self.server)
    }
}

async fn send_logout(
    client: Client,
    url: String,
    headers: HeaderMap,
    token: String,
) -> Result<(), AuthFailure> {
    let response = client
        .post(url)
        .headers(headers)
        .header("X-Emby-Token", token)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(AuthFailure::http(status.as_u16(), "logout rejected"))
    }
}

#[async_trait]
impl ApiClient for EmbyApiClient {
    async fn authenticate_by_name(&self, name: &str, secret: &str) -> Result<(), AuthFailure> {
        let request = AuthenticateRequest {
            username: name,
            pw: secret,
        };

        let response = self
            .client
            .post(format!("{}/Users/AuthenticateByName", self.server))
            .headers(self.headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            return Err(AuthFailure::http(status.as_u16(), message));
        }

        let result: AuthenticationResult = serde_json::from_str(&body).map_err(|e| {
            AuthFailure::network(format!("failed to parse authentication response: {}", e))
        })?;

        self.credentials
            .record_login(&result.server_id, &result.user.id, &result.access_token)
            .map_err(|e| AuthFailure::network(format!("failed to persist credentials: {}", e)))?;

        if let Ok(mut session) = self.session.lock() {
            session.token = Some(result.access_token);
            session.connected = false;
        }
        debug!(server_id = %result.server_id, "credential record updated");
        Ok(())
    }

    fn ensure_live_connection(&self) {
        if let Ok(mut session) = self.session.lock() {
            session.connected = true;
        }
        info!(server = %self.server, "live connection established");
    }

    fn logout(&self) {
        let token = match self.session.lock() {
            Ok(mut session) => {
                session.connected = false;
                session.token.take()
            }
            Err(_) => None,
        };
        let Some(token) = token else {
            debug!("logout requested without an active session");
            return;
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no runtime available, skipping server-side logout");
            return;
        };
        let request = send_logout(self.client.clone(), self.logout_url(), self.headers(), token);
        handle.spawn(async move {
            if let Err(e) = request.await {
                warn!(error = %e, "server-side logout failed");
            }
        });
    }
}

// Custom Debug to avoid exposing the session token
impl std::fmt::Debug for EmbyApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbyApiClient")
            .field("server", &self.server)
            .field("device_id", &self.device_id)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe() -> CredentialProbe {
        CredentialProbe::new(Arc::new(MemoryStore::new()), &StorageConfig::default())
    }

    #[tokio::test]
    async fn successful_sign_in_persists_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Users/AuthenticateByName"))
            .and(header_exists("X-Emby-Authorization"))
            .and(body_json(serde_json::json!({"Username": "household", "Pw": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "User": {"Id": "user-1", "Name": "household"},
                "AccessToken": "tok-123",
                "ServerId": "server-1"
            })))
            .mount(&server)
            .await;

        let credentials = probe();
        let client = EmbyApiClient::new(&server.uri(), credentials.clone());

        client
            .authenticate_by_name("household", "pw")
            .await
            .expect("sign in");

        assert!(credentials.is_authenticated());
        assert!(!client.is_connected());
        client.ensure_live_connection();
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn unauthorized_response_classifies_as_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Users/AuthenticateByName"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = EmbyApiClient::new(&server.uri(), probe());
        let failure = client
            .authenticate_by_name("household", "wrong")
            .await
            .unwrap_err();

        assert!(failure.is_unauthorized());
        assert_eq!(failure.status, Some(401));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Users/AuthenticateByName"))
            .respond_with(ResponseTemplate::new(503).set_body_string("starting up"))
            .mount(&server)
            .await;

        let credentials = probe();
        let client = EmbyApiClient::new(&server.uri(), credentials.clone());
        let failure = client.authenticate_by_name("a", "b").await.unwrap_err();

        assert!(!failure.is_unauthorized());
        assert_eq!(failure.message, "starting up");
        assert!(!credentials.is_authenticated());
    }

    #[tokio::test]
    async fn malformed_success_body_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Users/AuthenticateByName"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = EmbyApiClient::new(&server.uri(), probe());
        let failure = client.authenticate_by_name("a", "b").await.unwrap_err();
        assert!(!failure.is_unauthorized());
        assert!(failure.message.contains("parse"));
    }

    #[tokio::test]
    async fn logout_posts_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Sessions/Logout"))
            .and(header("X-Emby-Token", "tok-123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = EmbyApiClient::new(&server.uri(), probe());
        client.post_logout("tok-123").await.expect("logout");
    }

    #[test]
    fn debug_does_not_expose_token() {
        let client = EmbyApiClient::new("http://media.local", probe());
        if let Ok(mut s) = client.session.lock() {
            s.token = Some("tok-secret".into());
        }
        let debug = format!("{:?}", client);
        assert!(debug.contains("media.local"));
        assert!(!debug.contains("tok-secret"));
    }
}
