//! Fakes shared by the suite tests

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use camino::Utf8Path;
use cs_e2e_core::config::PollConfig;
use cs_e2e_core::HarnessConfig;
use cs_e2e_kube::{KubeApi, CLUSTER_ID_LABEL, NODE_POOL_ID_LABEL};
use k8s_openapi::api::core::v1::{Node, NodeCondition, NodeStatus, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::cli::EnvArgs;
use crate::context::{HarnessContext, KubeConnector};

pub const ORG_ID: &str = "62e4e86f-fe2e-4740-a814-a950bf377daf";
pub const CLUSTER_ID: &str = "5d3c1b8e-0e47-4a5a-9d4b-3f0c2b1e7a90";
pub const TEMPLATE_ID: &str = "a8b7a1d2-64de-4f0e-8a45-0f3f2b8c9e10";
pub const PROVIDER_ID: &str = "3b9e4f3c-7c59-4c50-9d5f-6f2fbc1a6d11";
pub const WORKER_POOL_ID: &str = "np-worker";
pub const MASTER_POOL_ID: &str = "np-master";

/// In-memory cluster whose node list can change between calls
#[derive(Default)]
pub struct FakeKube {
    nodes: Mutex<VecDeque<Vec<Node>>>,
    pub selectors: Mutex<Vec<Option<String>>>,
}

impl FakeKube {
    /// Replay `snapshots` in order; the last one repeats
    pub fn with_nodes(snapshots: Vec<Vec<Node>>) -> Arc<Self> {
        Arc::new(Self {
            nodes: Mutex::new(snapshots.into()),
            ..Default::default()
        })
    }
}

#[async_trait]
impl KubeApi for FakeKube {
    async fn list_nodes(&self, label_selector: Option<&str>) -> cs_e2e_kube::Result<Vec<Node>> {
        self.selectors
            .lock()
            .unwrap()
            .push(label_selector.map(str::to_string));

        let mut nodes = self.nodes.lock().unwrap();
        let snapshot = if nodes.len() > 1 {
            nodes.pop_front().unwrap_or_default()
        } else {
            nodes.front().cloned().unwrap_or_default()
        };

        Ok(match label_selector.and_then(|s| s.split_once('=')) {
            Some((key, value)) => snapshot
                .into_iter()
                .filter(|n| {
                    n.metadata
                        .labels
                        .as_ref()
                        .and_then(|l| l.get(key))
                        .is_some_and(|v| v == value)
                })
                .collect(),
            None => snapshot,
        })
    }

    async fn list_pods(&self, _namespace: &str) -> cs_e2e_kube::Result<Vec<Pod>> {
        Ok(Vec::new())
    }
}

/// Hands out a prepared fake instead of reading the kubeconfig
pub struct FakeConnector {
    api: Arc<FakeKube>,
}

#[async_trait]
impl KubeConnector for FakeConnector {
    async fn connect(&self, _kubeconfig: &Utf8Path) -> Result<Arc<dyn KubeApi>> {
        Ok(self.api.clone())
    }
}

/// A node of the test cluster in node pool `pool`
pub fn node(name: &str, pool: &str, ready: bool) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([
                (CLUSTER_ID_LABEL.to_string(), CLUSTER_ID.to_string()),
                (NODE_POOL_ID_LABEL.to_string(), pool.to_string()),
            ])),
            ..Default::default()
        },
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Harness context pointed at the mock server with fast polling
pub fn context_for(
    server: &MockServer,
    kubeconfig: &Utf8Path,
    kube: Arc<FakeKube>,
) -> HarnessContext {
    let mut config = HarnessConfig::default();
    config.endpoints.provision_url = server.uri();
    config.endpoints.proxy_url = "https://proxy.test".to_string();
    config.organization_id = ORG_ID.to_string();
    config.http_timeout_secs = 5;
    let fast = PollConfig::new(10, 5);
    config.polling.default = fast;
    config.polling.provision = fast;
    config.polling.delete = fast;

    let env = EnvArgs {
        token: "test-token".to_string(),
        kubeconfig: kubeconfig.to_path_buf(),
    };
    HarnessContext::new(config, &env, true, CancellationToken::new())
        .unwrap()
        .with_connector(FakeConnector { api: kube })
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

pub fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Answer `verb route` with each response once, in order, then keep
/// answering with `last`
pub async fn mock_sequence(
    server: &MockServer,
    verb: &str,
    route: &str,
    responses: Vec<ResponseTemplate>,
    last: ResponseTemplate,
) {
    for response in responses {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(response)
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(last)
        .mount(server)
        .await;
}

/// Requests the server received for `verb route`
pub async fn requests_to(server: &MockServer, verb: &str, route: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == route)
        .collect()
}
