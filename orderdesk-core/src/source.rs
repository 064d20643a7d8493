//! Remote record store seams.

use crate::error::FetchError;
use crate::profile::ProfileUpdate;
use crate::reference::ReferenceData;

/// Anything that can produce a complete [`ReferenceData`] aggregate.
///
/// Implementations must not return partial data: if any collection fails
/// to load the whole fetch fails.
#[async_trait::async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch_reference_data(&self) -> Result<ReferenceData, FetchError>;
}

/// Remote side of a profile edit.
#[async_trait::async_trait]
pub trait ProfileSink: Send + Sync {
    async fn update_profile(&self, username: &str, update: &ProfileUpdate)
        -> Result<(), FetchError>;
}
