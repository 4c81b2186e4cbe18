//! Login, token caching and API revision negotiation

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ErrorEnvelope, SupportedVersions};
use super::version::{ApiRevision, PeerVersion};

/// Tokens are refreshed this long before the peer expires them
pub const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Credentials for the collective's local identity provider
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub provider_name: String,
    /// Identifies this provider process to the collective
    pub device_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("provider_name", &self.provider_name)
            .field("device_id", &self.device_id)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    provider_name: &'a str,
    username: &'a str,
    password: &'a str,
    device_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    expires: DateTime<Utc>,
    #[serde(default)]
    version: Option<String>,
}

/// Bearer token and the instant the peer stops accepting it
#[derive(Clone)]
pub struct Token {
    value: SecretString,
    expires: DateTime<Utc>,
}

impl Token {
    pub fn new(value: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            expires,
        }
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Still usable at `now`, allowing for the refresh margin
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(EXPIRY_MARGIN_SECONDS) < self.expires
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value.expose_secret())
    }
}

/// Result of the first login: which revision to speak and what the peer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    pub revision: ApiRevision,
    pub peer_version: PeerVersion,
}

pub(crate) struct LoginOutcome {
    pub token: Token,
    pub peer_version: Option<PeerVersion>,
}

/// One `POST /login` at the given revision
pub(crate) async fn login(
    http: &reqwest::Client,
    base_url: &str,
    credentials: &Credentials,
    revision: ApiRevision,
) -> Result<LoginOutcome, LoginFailure> {
    let url = format!("{}/login", base_url);
    tracing::debug!(
        "Logging in to {} as {} (API {})",
        url,
        credentials.username,
        revision
    );

    let body = LoginRequest {
        provider_name: &credentials.provider_name,
        username: &credentials.username,
        password: credentials.password.expose_secret(),
        device_id: &credentials.device_id,
    };

    let response = http
        .post(&url)
        .header(ACCEPT, revision.media_type())
        .header(CONTENT_TYPE, "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| LoginFailure::Error(ApiError::Transport(e)))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| LoginFailure::Error(ApiError::Transport(e)))?;

    if status == StatusCode::NOT_ACCEPTABLE {
        let supported = serde_json::from_str::<SupportedVersions>(&text).map_err(|e| {
            LoginFailure::Error(ApiError::Parse(format!(
                "Unexpected 406 body from login: {}",
                e
            )))
        })?;
        return Err(LoginFailure::NotAcceptable(supported));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let envelope = ErrorEnvelope::parse(&text);
        return Err(LoginFailure::Error(ApiError::Authentication(format!(
            "login as {} via {} rejected: {}",
            credentials.username, credentials.provider_name, envelope
        ))));
    }

    if !status.is_success() {
        return Err(LoginFailure::Error(ApiError::from_status(
            status.as_u16(),
            "/login",
            &text,
        )));
    }

    let parsed: LoginResponse = serde_json::from_str(&text).map_err(|e| {
        tracing::error!("Failed to parse login response: {}", e);
        LoginFailure::Error(ApiError::Parse(format!("login response: {}", e)))
    })?;

    let peer_version = match parsed.version.as_deref() {
        Some(raw) => Some(raw.parse::<PeerVersion>().map_err(LoginFailure::Error)?),
        None => None,
    };

    Ok(LoginOutcome {
        token: Token::new(parsed.token, parsed.expires),
        peer_version,
    })
}

pub(crate) enum LoginFailure {
    NotAcceptable(SupportedVersions),
    Error(ApiError),
}

impl From<LoginFailure> for ApiError {
    fn from(failure: LoginFailure) -> Self {
        match failure {
            LoginFailure::NotAcceptable(supported) => ApiError::Configuration(format!(
                "the collective only accepts API revisions {} to {}",
                supported.min_supported_version, supported.max_supported_version
            )),
            LoginFailure::Error(e) => e,
        }
    }
}

/// First login of the process. Picks the revision to use for every later
/// call: the preferred revision, lowered to what the peer accepts (406) or
/// runs (reported version).
pub(crate) async fn negotiate(
    http: &reqwest::Client,
    base_url: &str,
    credentials: &Credentials,
    preferred: ApiRevision,
) -> Result<(Token, Negotiated), ApiError> {
    let mut revision = preferred;

    let outcome = match login(http, base_url, credentials, revision).await {
        Ok(outcome) => outcome,
        Err(LoginFailure::NotAcceptable(supported)) => {
            revision = renegotiate(preferred, supported)?;
            tracing::info!(
                "Collective accepts API {} to {}, retrying login with {}",
                supported.min_supported_version,
                supported.max_supported_version,
                revision
            );
            login(http, base_url, credentials, revision).await?
        }
        Err(LoginFailure::Error(e)) => return Err(e),
    };

    let negotiated = match outcome.peer_version {
        Some(peer_version) => Negotiated {
            revision: revision.min(peer_version.revision()?),
            peer_version,
        },
        None => Negotiated {
            revision,
            peer_version: revision.peer_version(),
        },
    };

    tracing::info!(
        "Connected to Appgate SDP {} using API {}",
        negotiated.peer_version,
        negotiated.revision
    );

    Ok((outcome.token, negotiated))
}

fn renegotiate(preferred: ApiRevision, supported: SupportedVersions) -> Result<ApiRevision, ApiError> {
    if supported.min_supported_version > ApiRevision::MAX.number() {
        return Err(ApiError::Configuration(format!(
            "the collective requires API v{} or newer, this provider supports {} to {}",
            supported.min_supported_version,
            ApiRevision::MIN,
            ApiRevision::MAX
        )));
    }

    let target = preferred.number().min(supported.max_supported_version);
    ApiRevision::clamp(target).ok_or_else(|| {
        ApiError::Configuration(format!(
            "the collective only accepts API revisions {} to {}, this provider needs {} or newer",
            supported.min_supported_version,
            supported.max_supported_version,
            ApiRevision::MIN
        ))
    })
}
