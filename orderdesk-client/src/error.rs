//! Error types for the client binary.

use crate::api_client::ApiClientError;
use crate::config::ConfigError;
use orderdesk_core::{OrderdeskError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error(transparent)]
    Orderdesk(#[from] OrderdeskError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Logging setup failed: {0}")]
    Telemetry(String),
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        Self::Orderdesk(err.into())
    }
}
