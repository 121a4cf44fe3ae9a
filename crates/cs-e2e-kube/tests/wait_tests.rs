//! Node and API readiness watcher tests against an in-memory Kubernetes API
//!
//! Time is paused, so poll intervals elapse instantly and deterministically.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use cs_e2e_core::PollSpec;
use cs_e2e_kube::{
    cluster_id_from_nodes, count_pool_nodes, KubeApi, KubeError, KubeWaiter, Result,
    CLUSTER_ID_LABEL, NODE_POOL_ID_LABEL,
};
use k8s_openapi::api::core::v1::{Node, NodeCondition, NodeStatus, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

type Scripted<T> = Mutex<VecDeque<Result<Vec<T>>>>;

/// Replays scripted responses; the last one repeats forever
#[derive(Default)]
struct FakeKube {
    nodes: Scripted<Node>,
    pods: Scripted<Pod>,
    node_calls: AtomicU32,
    pod_calls: AtomicU32,
    selectors: Mutex<Vec<Option<String>>>,
}

impl FakeKube {
    fn with_nodes(responses: Vec<Result<Vec<Node>>>) -> Self {
        Self {
            nodes: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    fn with_pods(responses: Vec<Result<Vec<Pod>>>) -> Self {
        Self {
            pods: Mutex::new(responses.into()),
            ..Default::default()
        }
    }
}

fn next<T: Clone>(queue: &Scripted<T>) -> Result<Vec<T>> {
    let mut queue = queue.lock().unwrap();
    if queue.len() > 1 {
        return queue.pop_front().unwrap();
    }
    match queue.front() {
        Some(Ok(items)) => Ok(items.clone()),
        Some(Err(err)) => Err(clone_error(err)),
        None => Ok(Vec::new()),
    }
}

fn clone_error(err: &KubeError) -> KubeError {
    match err {
        KubeError::Api {
            code,
            reason,
            message,
        } => KubeError::Api {
            code: *code,
            reason: reason.clone(),
            message: message.clone(),
        },
        other => KubeError::Client(other.to_string()),
    }
}

#[async_trait]
impl KubeApi for FakeKube {
    async fn list_nodes(&self, label_selector: Option<&str>) -> Result<Vec<Node>> {
        self.node_calls.fetch_add(1, Ordering::SeqCst);
        self.selectors
            .lock()
            .unwrap()
            .push(label_selector.map(str::to_string));
        next(&self.nodes)
    }

    async fn list_pods(&self, _namespace: &str) -> Result<Vec<Pod>> {
        self.pod_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.pods)
    }
}

fn node(name: &str, ready: bool, labels: &[(&str, &str)]) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(
                labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
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

fn api_error(code: u16, reason: &str) -> KubeError {
    KubeError::Api {
        code,
        reason: reason.to_string(),
        message: format!("{reason} from fake"),
    }
}

fn spec() -> PollSpec {
    PollSpec::new(Duration::from_millis(500), Duration::from_secs(300))
}

#[tokio::test(start_paused = true)]
async fn test_nodes_ready_after_not_ready() {
    let fake = FakeKube::with_nodes(vec![
        Ok(vec![node("a", true, &[]), node("b", false, &[])]),
        Err(api_error(503, "ServiceUnavailable")),
        Ok(vec![node("a", true, &[]), node("b", true, &[])]),
    ]);

    KubeWaiter::new(&fake).nodes_ready(spec()).await.unwrap();

    assert_eq!(fake.node_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_nodes_ready_aborts_on_forbidden() {
    let fake = FakeKube::with_nodes(vec![Err(api_error(403, "Forbidden"))]);

    let err = KubeWaiter::new(&fake).nodes_ready(spec()).await.unwrap_err();

    assert!(err.is_failed());
    assert!(err.to_string().contains("Forbidden"));
    assert_eq!(fake.node_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_api_ready_tolerates_auth_errors_within_grace() {
    let fake = FakeKube::with_pods(vec![
        Err(api_error(401, "Unauthorized")),
        Err(api_error(403, "Forbidden")),
        Err(api_error(500, "InternalError")),
        Ok(vec![]),
    ]);

    KubeWaiter::new(&fake)
        .with_auth_grace(Duration::from_secs(10))
        .api_ready(spec())
        .await
        .unwrap();

    assert_eq!(fake.pod_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_api_ready_auth_error_fatal_after_grace() {
    let fake = FakeKube::with_pods(vec![Err(api_error(403, "Forbidden"))]);

    let err = KubeWaiter::new(&fake)
        .with_auth_grace(Duration::from_millis(1200))
        .api_ready(spec())
        .await
        .unwrap_err();

    // Checks at 0, 0.5 and 1.0s fall inside the grace window; 1.5s does not
    assert!(err.is_failed());
    assert_eq!(err.attempts(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_api_ready_permanent_error() {
    let fake = FakeKube::with_pods(vec![Err(KubeError::Client(
        "invalid certificate: UnknownIssuer".to_string(),
    ))]);

    let err = KubeWaiter::new(&fake).api_ready(spec()).await.unwrap_err();

    assert!(err.is_failed());
    assert!(err.to_string().contains("UnknownIssuer"));
}

#[tokio::test]
async fn test_cluster_id_from_nodes() {
    let fake = FakeKube::with_nodes(vec![Ok(vec![node(
        "master-0",
        true,
        &[(CLUSTER_ID_LABEL, "c-42")],
    )])]);

    assert_eq!(cluster_id_from_nodes(&fake).await.unwrap(), "c-42");
}

#[tokio::test]
async fn test_cluster_id_missing_label_or_nodes() {
    let fake = FakeKube::with_nodes(vec![Ok(vec![node("worker-0", true, &[])])]);
    let err = cluster_id_from_nodes(&fake).await.unwrap_err();
    assert!(matches!(err, KubeError::MissingLabel { ref node, .. } if node == "worker-0"));

    let fake = FakeKube::with_nodes(vec![Ok(vec![])]);
    assert!(matches!(
        cluster_id_from_nodes(&fake).await.unwrap_err(),
        KubeError::NoNodes
    ));
}

#[tokio::test]
async fn test_count_pool_nodes_uses_selector() {
    let fake = FakeKube::with_nodes(vec![Ok(vec![
        node("w-0", true, &[(NODE_POOL_ID_LABEL, "np-1")]),
        node("w-1", true, &[(NODE_POOL_ID_LABEL, "np-1")]),
    ])]);

    assert_eq!(count_pool_nodes(&fake, "np-1").await.unwrap(), 2);
    assert_eq!(
        fake.selectors.lock().unwrap().as_slice(),
        &[Some("containership.io/node-pool-id=np-1".to_string())]
    );
}
