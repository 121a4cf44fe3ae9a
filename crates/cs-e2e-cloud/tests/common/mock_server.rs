//! Mock provision API helpers
//!
//! Responses mounted first win while they still have uses left, so a
//! sequence of states is built by mounting limited mocks before the final
//! one.

use std::time::Duration;

use cs_e2e_cloud::{CloudClient, CloudConfig};
use cs_e2e_core::PollSpec;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// Build a client pointed at the mock server
pub fn client_for(server: &MockServer) -> CloudClient {
    CloudClient::new(CloudConfig {
        token: TOKEN.to_string(),
        provision_base_url: server.uri(),
        debug: true,
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

/// Fast poll spec for tests against a live mock server
pub fn fast_spec() -> PollSpec {
    PollSpec::new(Duration::from_millis(10), Duration::from_secs(5))
}

pub fn cluster_path() -> String {
    format!("/v3/organizations/{ORG_ID}/cke/{CLUSTER_ID}")
}

pub fn node_pools_path() -> String {
    format!("/v3/organizations/{ORG_ID}/clusters/{CLUSTER_ID}/node-pools")
}

pub fn node_pool_path(pool_id: &str) -> String {
    format!("{}/{}", node_pools_path(), pool_id)
}

pub fn cluster_json(state: &str) -> Value {
    json!({
        "id": CLUSTER_ID,
        "provider_name": "digital_ocean",
        "status": { "type": state },
    })
}

pub fn node_pool_json(id: &str, mode: &str, count: u32, state: &str) -> Value {
    json!({
        "id": id,
        "name": id,
        "count": count,
        "kubernetes_mode": mode,
        "kubernetes_version": "1.14.1",
        "os": "ubuntu",
        "status": { "type": state },
    })
}

/// Respond to `GET path` with each of `responses` once, in order, then keep
/// answering with `last`
pub async fn mock_get_sequence(
    server: &MockServer,
    route: &str,
    responses: Vec<ResponseTemplate>,
    last: ResponseTemplate,
) {
    for response in responses {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(last)
        .mount(server)
        .await;
}

/// Respond to `GET path` with each state once, then keep answering `last`
pub async fn mock_cluster_states(server: &MockServer, states: &[&str], last: &str) {
    let responses = states
        .iter()
        .map(|s| ResponseTemplate::new(200).set_body_json(cluster_json(s)))
        .collect();
    mock_get_sequence(
        server,
        &cluster_path(),
        responses,
        ResponseTemplate::new(200).set_body_json(cluster_json(last)),
    )
    .await;
}

/// Number of requests the server received for `route`
pub async fn request_count(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}
