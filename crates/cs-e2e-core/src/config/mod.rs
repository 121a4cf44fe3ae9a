//! Harness configuration

mod loader;
mod types;

pub use loader::{ConfigLoader, ENV_ORGANIZATION_ID, ENV_PROVISION_URL, ENV_PROXY_URL};
pub use types::{EndpointConfig, HarnessConfig, PollConfig, PollingConfig};
