//! Managed resources
//!
//! Every resource is a `Reconciler` driven by the shared engine. The helper
//! modules translate between host values and peer objects.

pub mod codec;
pub mod common;
pub mod diagnostics;
pub mod engine;
pub mod state;

pub mod administrative_role;
pub mod appliance;
pub mod blacklist_user;
pub mod client_profile;
pub mod condition;
pub mod entitlement;
pub mod identity_provider;
pub mod ip_pool;
pub mod mfa_provider;
pub mod policy;
pub mod ringfence_rule;
pub mod script;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use administrative_role::administrative_role;
pub use appliance::appliance;
pub use blacklist_user::blacklist_user;
pub use client_profile::client_profile;
pub use condition::condition;
pub use engine::{ManagedResource, Reconciler};
pub use entitlement::entitlement;
pub use identity_provider::identity_provider;
pub use ip_pool::ip_pool;
pub use mfa_provider::mfa_provider;
pub use policy::{access_policy, admin_policy, device_policy, dhcp_policy};
pub use ringfence_rule::ringfence_rule;
pub use script::{criteria_script, device_script, entitlement_script, user_claim_script};
pub use site::site;
