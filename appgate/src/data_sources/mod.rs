//! Data sources

pub mod appliance_seed;
pub mod collective;
pub mod lookup;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::any::Any;
use std::sync::Arc;
use tfplug::types::Diagnostic;

use crate::provider_data::AppgateProviderData;

pub use appliance_seed::ApplianceSeedDataSource;
pub use collective::CollectiveDataSource;
pub use lookup::{LookupDataSource, LookupKind};

/// Recovers the session handed out by the provider's configure
pub(crate) fn provider_data_from(
    data: Option<Arc<dyn Any + Send + Sync>>,
) -> Result<AppgateProviderData, Diagnostic> {
    let Some(data) = data else {
        return Err(Diagnostic::error(
            "No provider data",
            "No provider data was provided to the data source",
        ));
    };
    data.downcast_ref::<AppgateProviderData>()
        .cloned()
        .ok_or_else(|| {
            Diagnostic::error(
                "Invalid provider data",
                "Failed to extract AppgateProviderData from provider data",
            )
        })
}
