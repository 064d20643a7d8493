//! Orderdesk client library exports.
//!
//! The session orchestrator plus everything the `orderdesk` binary wires
//! around it: configuration, the record store REST client and logging.

pub mod api_client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod telemetry;

pub use api_client::{ApiClientError, RestClient};
pub use config::{ClientConfig, ConfigError, LogConfig, LogFormat, StoreConfig};
pub use error::ClientError;
pub use orchestrator::{SessionOrchestrator, StatusSummary};
