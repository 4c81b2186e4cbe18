use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tfplug::Context;
use tokio::sync::RwLock;

use super::common::ApiQueryParams;
use super::error::ApiError;
use super::pool::ConnectionPoolConfig;
use super::session::{self, Credentials, Negotiated, Token};
use super::version::{ApiRevision, PeerVersion};

/// Everything needed to open a session with a collective
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Admin API base, e.g. `https://controller.example.com:8443/admin`
    pub url: String,
    pub credentials: Credentials,
    pub insecure: bool,
    pub timeout: Duration,
    pub preferred_revision: ApiRevision,
}

/// Appgate SDP admin API client
///
/// Cheap to clone; every clone shares the transport, the cached bearer token
/// and the negotiated revision.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    negotiated: Negotiated,
    token: RwLock<Option<Token>>,
    timeout_seconds: u64,
}

impl Client {
    /// Logs in and negotiates the API revision used for the rest of the process
    pub async fn connect(config: ClientConfig) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(&config.url)
            .map_err(|e| ApiError::Configuration(format!("invalid url {}: {}", config.url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Configuration(format!(
                "url {} must use http or https",
                config.url
            )));
        }

        let pool_config = ConnectionPoolConfig {
            request_timeout: config.timeout,
            insecure: config.insecure,
            ..Default::default()
        };
        let http_client = pool_config.build_client()?;
        let base_url = config.url.trim_end_matches('/').to_string();

        let (token, negotiated) = session::negotiate(
            &http_client,
            &base_url,
            &config.credentials,
            config.preferred_revision,
        )
        .await?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                credentials: config.credentials,
                negotiated,
                token: RwLock::new(Some(token)),
                timeout_seconds: config.timeout.as_secs(),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Active API revision, fixed after connect
    pub fn revision(&self) -> ApiRevision {
        self.inner.negotiated.revision
    }

    pub fn peer_version(&self) -> PeerVersion {
        self.inner.negotiated.peer_version
    }

    pub fn at_least(&self, revision: ApiRevision) -> bool {
        self.revision() >= revision
    }

    /// Fails with a version mismatch naming `what` when the active revision
    /// is older than `revision`
    pub fn require(&self, revision: ApiRevision, what: &str) -> Result<(), ApiError> {
        if self.at_least(revision) {
            Ok(())
        } else {
            Err(ApiError::VersionMismatch {
                attribute: what.to_string(),
                required: revision,
                active: self.revision(),
            })
        }
    }

    /// Returns the cached bearer header, logging in again when the token is
    /// missing or about to expire
    async fn bearer(&self) -> Result<String, ApiError> {
        {
            let token = self.inner.token.read().await;
            if let Some(token) = token.as_ref().filter(|t| t.is_fresh_at(Utc::now())) {
                return Ok(token.bearer());
            }
        }

        let mut token = self.inner.token.write().await;
        if let Some(current) = token.as_ref().filter(|t| t.is_fresh_at(Utc::now())) {
            return Ok(current.bearer());
        }

        tracing::info!("Refreshing Appgate SDP token");
        let outcome = session::login(
            &self.inner.http_client,
            &self.inner.base_url,
            &self.inner.credentials,
            self.revision(),
        )
        .await?;
        let bearer = outcome.token.bearer();
        *token = Some(outcome.token);
        Ok(bearer)
    }

    async fn invalidate_token(&self) {
        let mut token = self.inner.token.write().await;
        *token = None;
    }

    /// Execute a GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, ctx: &Context, path: &str) -> Result<T, ApiError> {
        let text = self
            .execute(ctx, "GET", path, |http, url| http.get(url))
            .await?;
        self.parse_success_response(path, &text)
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let full_path = format!("{}{}", path, params.to_query_string());
        self.get(ctx, &full_path).await
    }

    /// Execute a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let text = self
            .execute(ctx, "POST", path, |http, url| http.post(url).json(body))
            .await?;
        self.parse_success_response(path, &text)
    }

    /// Execute a POST request without a body, ignoring the response body
    pub async fn post_empty(&self, ctx: &Context, path: &str) -> Result<(), ApiError> {
        self.execute(ctx, "POST", path, |http, url| http.post(url))
            .await
            .map(|_| ())
    }

    /// Execute a PUT request with a JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let text = self
            .execute(ctx, "PUT", path, |http, url| http.put(url).json(body))
            .await?;
        self.parse_success_response(path, &text)
    }

    /// Execute a DELETE request
    pub async fn delete(&self, ctx: &Context, path: &str) -> Result<(), ApiError> {
        self.execute(ctx, "DELETE", path, |http, url| http.delete(url))
            .await
            .map(|_| ())
    }

    /// Sends one request, replaying it once with a fresh token when the peer
    /// answers 401. Returns the body of a successful response.
    async fn execute<F>(
        &self,
        ctx: &Context,
        method: &str,
        path: &str,
        build: F,
    ) -> Result<String, ApiError>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        let url = format!("{}{}", self.inner.base_url, path);
        let mut replayed = false;

        loop {
            if ctx.is_cancelled() {
                return Err(ApiError::Cancelled);
            }

            let bearer = self.bearer().await?;
            tracing::debug!("{} request to: {} (API {})", method, url, self.revision());

            let request = build(&self.inner.http_client, &url)
                .header(AUTHORIZATION, bearer)
                .header(ACCEPT, self.revision().media_type())
                .header(CONTENT_TYPE, "application/json")
                .send();

            let response = tokio::select! {
                result = request => result.map_err(|e| self.map_transport_error(e))?,
                _ = ctx.cancelled() => return Err(ApiError::Cancelled),
            };

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED && !replayed {
                tracing::debug!("{} {} answered 401, logging in again", method, path);
                self.invalidate_token().await;
                replayed = true;
                continue;
            }

            let text = response
                .text()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            if status.is_success() {
                return Ok(text);
            }

            return Err(self.handle_error_response(status.as_u16(), path, &text));
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.inner.timeout_seconds)
        } else {
            ApiError::Transport(e)
        }
    }

    fn parse_success_response<T: DeserializeOwned>(
        &self,
        path: &str,
        text: &str,
    ) -> Result<T, ApiError> {
        let body = if text.trim().is_empty() { "null" } else { text };
        serde_json::from_str::<T>(body).map_err(|e| {
            tracing::error!("Failed to deserialize response from {}: {}", path, e);
            ApiError::Parse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    fn handle_error_response(&self, status: u16, path: &str, text: &str) -> ApiError {
        let error = ApiError::from_status(status, path, text);
        match &error {
            ApiError::NotFound(_) => tracing::debug!("{} not found", path),
            ApiError::Server { .. } => tracing::warn!("{} failed: {}", path, error),
            _ => tracing::debug!("{} failed: {}", path, error),
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::{connect, login_body, mock_login};
    use super::*;
    use mockito::{Matcher, Server};
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn connect_negotiates_revision_from_peer_version() {
        let mut server = Server::new_async().await;
        let login = mock_login(&mut server, ApiRevision::V20, Some("6.1.2-1234-release")).await;

        let client = connect(&server, ApiRevision::V20).await.unwrap();
        assert_eq!(client.revision(), ApiRevision::V17);
        assert_eq!(client.peer_version(), PeerVersion::new(6, 1, 2));
        assert!(client.at_least(ApiRevision::V16));
        assert!(!client.at_least(ApiRevision::V18));

        login.assert_async().await;
    }

    #[tokio::test]
    async fn connect_retries_login_after_406() {
        let mut server = Server::new_async().await;
        let rejected = server
            .mock("POST", "/admin/login")
            .match_header("accept", ApiRevision::V20.media_type().as_str())
            .with_status(406)
            .with_body(r#"{"id":"not acceptable","minSupportedVersion":15,"maxSupportedVersion":18}"#)
            .create_async()
            .await;
        let accepted = server
            .mock("POST", "/admin/login")
            .match_header("accept", ApiRevision::V18.media_type().as_str())
            .with_body(login_body(None))
            .create_async()
            .await;

        let client = connect(&server, ApiRevision::V20).await.unwrap();
        assert_eq!(client.revision(), ApiRevision::V18);
        assert_eq!(client.peer_version(), PeerVersion::new(6, 2, 0));

        rejected.assert_async().await;
        accepted.assert_async().await;
    }

    #[tokio::test]
    async fn connect_reports_rejected_credentials() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", "/admin/login")
            .with_status(401)
            .with_body(r#"{"id":"unauthorized","message":"Invalid username or password."}"#)
            .create_async()
            .await;

        let err = connect(&server, ApiRevision::V18).await.err().unwrap();
        match err {
            ApiError::Authentication(message) => {
                assert!(message.contains("Invalid username or password."))
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connect_rejects_bad_urls() {
        let config = ClientConfig {
            url: "ftp://controller".to_string(),
            credentials: Credentials {
                username: "admin".into(),
                password: SecretString::from("admin".to_string()),
                provider_name: "local".into(),
                device_id: "device".into(),
            },
            insecure: true,
            timeout: Duration::from_secs(5),
            preferred_revision: ApiRevision::V18,
        };

        assert!(matches!(
            Client::connect(config).await,
            Err(ApiError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn requests_carry_bearer_and_versioned_accept() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server, ApiRevision::V18, None).await;
        let sites = server
            .mock("GET", "/admin/sites")
            .match_header("authorization", "Bearer test-token")
            .match_header("accept", "application/vnd.appgate.peer-v18+json")
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = connect(&server, ApiRevision::V18).await.unwrap();
        let _: serde_json::Value = client.get(&Context::new(), "/sites").await.unwrap();

        sites.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_request_is_replayed_once_after_login() {
        let mut server = Server::new_async().await;
        let logins = Arc::new(AtomicUsize::new(0));
        let counter = logins.clone();
        let login = server
            .mock("POST", "/admin/login")
            .with_body_from_request(move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                format!(
                    r#"{{"token":"token-{}","expires":"2099-01-01T00:00:00Z"}}"#,
                    n
                )
                .into_bytes()
            })
            .expect(2)
            .create_async()
            .await;
        let stale = server
            .mock("GET", "/admin/sites/s1")
            .match_header("authorization", "Bearer token-1")
            .with_status(401)
            .with_body(r#"{"id":"unauthorized"}"#)
            .expect(1)
            .create_async()
            .await;
        let fresh = server
            .mock("GET", "/admin/sites/s1")
            .match_header("authorization", "Bearer token-2")
            .with_body(r#"{"id":"s1","name":"site"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = connect(&server, ApiRevision::V18).await.unwrap();
        let value: serde_json::Value = client.get(&Context::new(), "/sites/s1").await.unwrap();
        assert_eq!(value["name"], "site");

        login.assert_async().await;
        stale.assert_async().await;
        fresh.assert_async().await;
    }

    #[tokio::test]
    async fn second_unauthorized_is_an_authentication_error() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", "/admin/login")
            .with_body(login_body(None))
            .expect_at_least(1)
            .create_async()
            .await;
        let denied = server
            .mock("GET", "/admin/sites")
            .with_status(401)
            .with_body(r#"{"id":"unauthorized","message":"Token expired."}"#)
            .expect(2)
            .create_async()
            .await;

        let client = connect(&server, ApiRevision::V18).await.unwrap();
        let result: Result<serde_json::Value, _> = client.get(&Context::new(), "/sites").await;

        assert!(matches!(result, Err(ApiError::Authentication(_))));
        denied.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_is_typed() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server, ApiRevision::V18, None).await;
        let _missing = server
            .mock("GET", "/admin/sites/gone")
            .with_status(404)
            .with_body(r#"{"id":"not found","message":"Site not found."}"#)
            .create_async()
            .await;

        let client = connect(&server, ApiRevision::V18).await.unwrap();
        let result: Result<serde_json::Value, _> =
            client.get(&Context::new(), "/sites/gone").await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn cancelled_context_aborts_before_sending() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server, ApiRevision::V18, None).await;
        let never = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = connect(&server, ApiRevision::V18).await.unwrap();
        let ctx = Context::new();
        ctx.cancel();

        let result: Result<serde_json::Value, _> = client.get(&ctx, "/sites").await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
        never.assert_async().await;
    }

    #[tokio::test]
    async fn require_reports_version_mismatch() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server, ApiRevision::V20, Some("6.0.3")).await;

        let client = connect(&server, ApiRevision::V20).await.unwrap();
        assert_eq!(client.revision(), ApiRevision::V16);
        let err = client
            .require(ApiRevision::V18, "appgate_oidc_identity_provider")
            .unwrap_err();
        assert!(err.to_string().contains("6.2.0"));
    }
}
