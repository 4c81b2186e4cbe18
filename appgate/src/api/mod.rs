//! Appgate SDP admin API
//!
//! `Client` owns the transport and the session; each collection module adds
//! its typed objects, its revision gates and an accessor on `Client`.

pub mod client;
pub mod collection;
pub mod common;
pub mod error;
pub mod pool;
pub mod session;
pub mod shape;
pub mod version;

pub mod administrative_roles;
pub mod appliances;
pub mod blacklist;
pub mod client_profiles;
pub mod conditions;
pub mod entitlements;
pub mod identity_providers;
pub mod ip_pools;
pub mod mfa_providers;
pub mod policies;
pub mod ringfence_rules;
pub mod scripts;
pub mod sites;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{Client, ClientConfig};
pub use collection::Collection;
pub use common::{AppgateApiResource, ListFilter};
pub use error::{ApiError, ErrorEnvelope, FieldError};
pub use session::Credentials;
pub use shape::{FieldGate, WireShape};
pub use version::{ApiRevision, PeerVersion};
