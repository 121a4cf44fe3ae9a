//! Common test infrastructure for cs-e2e-cloud tests
//!
//! # Modules
//!
//! - `constants`: Organization, cluster and pool identifiers
//! - `mock_server`: Wiremock helpers for the provision API

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod constants;
pub mod mock_server;

pub use constants::*;
pub use mock_server::*;
