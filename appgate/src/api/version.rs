//! Peer versions and the API revisions the provider speaks
//!
//! Each Appgate SDP release pins one revision of the admin API. Requests
//! advertise the revision through the versioned `Accept` media type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ApiError;

/// Revision of the admin API, e.g. 18 for peers running 6.2
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ApiRevision {
    V15,
    V16,
    V17,
    V18,
    V19,
    V20,
}

impl ApiRevision {
    pub const ALL: [ApiRevision; 6] = [
        ApiRevision::V15,
        ApiRevision::V16,
        ApiRevision::V17,
        ApiRevision::V18,
        ApiRevision::V19,
        ApiRevision::V20,
    ];

    pub const MIN: ApiRevision = ApiRevision::V15;
    pub const MAX: ApiRevision = ApiRevision::V20;

    pub fn number(self) -> u32 {
        match self {
            ApiRevision::V15 => 15,
            ApiRevision::V16 => 16,
            ApiRevision::V17 => 17,
            ApiRevision::V18 => 18,
            ApiRevision::V19 => 19,
            ApiRevision::V20 => 20,
        }
    }

    /// Exact lookup; unknown numbers return `None`
    pub fn from_number(number: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|rev| rev.number() == number)
    }

    /// Nearest known revision: numbers above the table map to the newest,
    /// numbers below it return `None`.
    pub fn clamp(number: u32) -> Option<Self> {
        if number > Self::MAX.number() {
            return Some(Self::MAX);
        }
        Self::from_number(number)
    }

    /// The peer release that introduced this revision
    pub fn peer_version(self) -> PeerVersion {
        match self {
            ApiRevision::V15 => PeerVersion::new(5, 5, 0),
            ApiRevision::V16 => PeerVersion::new(6, 0, 0),
            ApiRevision::V17 => PeerVersion::new(6, 1, 0),
            ApiRevision::V18 => PeerVersion::new(6, 2, 0),
            ApiRevision::V19 => PeerVersion::new(6, 3, 0),
            ApiRevision::V20 => PeerVersion::new(6, 4, 0),
        }
    }

    /// `application/vnd.appgate.peer-v18+json`
    pub fn media_type(self) -> String {
        format!("application/vnd.appgate.peer-v{}+json", self.number())
    }
}

impl fmt::Display for ApiRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

impl TryFrom<u32> for ApiRevision {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_number(value).ok_or_else(|| format!("unknown API revision {}", value))
    }
}

impl From<ApiRevision> for u32 {
    fn from(rev: ApiRevision) -> Self {
        rev.number()
    }
}

/// Release version reported by the peer, e.g. `6.2.1-30223-release`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl PeerVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Revision this peer speaks natively. Releases newer than the table map
    /// to the newest revision, older ones are not supported.
    pub fn revision(&self) -> Result<ApiRevision, ApiError> {
        let revision = ApiRevision::ALL
            .into_iter()
            .rev()
            .find(|rev| (self.major, self.minor) >= (rev.peer_version().major, rev.peer_version().minor));

        revision.ok_or_else(|| {
            ApiError::Configuration(format!(
                "Appgate SDP {} is not supported, the oldest supported version is {}",
                self,
                ApiRevision::MIN.peer_version()
            ))
        })
    }
}

impl fmt::Display for PeerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for PeerVersion {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core = s
            .trim()
            .trim_start_matches('v')
            .split(['-', '+'])
            .next()
            .unwrap_or_default();

        let mut parts = core.split('.').map(|p| p.parse::<u64>());
        let invalid = || ApiError::Parse(format!("invalid peer version \"{}\"", s));

        let major = parts.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
        let minor = match parts.next() {
            Some(p) => p.map_err(|_| invalid())?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.map_err(|_| invalid())?,
            None => 0,
        };

        Ok(Self::new(major, minor, patch))
    }
}
