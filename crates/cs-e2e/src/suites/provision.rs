//! Provision suite: template, cluster, kubeconfig, then readiness waits

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use camino::Utf8PathBuf;
use chrono::Utc;
use cs_e2e_cloud::{ClusterCreateOptions, CreateTemplateRequest, ProviderKind};
use cs_e2e_core::templates::{self, InfraTemplateValues, KubeconfigValues};
use cs_e2e_core::WriteOnce;
use cs_e2e_kube::KubeApi;
use tracing::{debug, info};

use crate::cli::ProvisionArgs;
use crate::context::HarnessContext;
use crate::output;
use crate::runner::{SuiteRunner, SuiteSummary};

/// Where the SSH public key for the template comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshKeySource {
    None,
    File(Utf8PathBuf),
    Base64(String),
}

impl SshKeySource {
    /// Read or decode the key; no source yields an empty key
    pub fn resolve(&self) -> Result<String> {
        let key = match self {
            Self::None => return Ok(String::new()),
            Self::File(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read SSH public key from {path}"))?,
            Self::Base64(encoded) => {
                let bytes = STANDARD
                    .decode(encoded.trim())
                    .context("Failed to base64-decode the SSH public key")?;
                String::from_utf8(bytes).context("Decoded SSH public key is not UTF-8")?
            }
        };
        Ok(key.trim_end().to_string())
    }
}

/// Inputs of the provision suite
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub template: Utf8PathBuf,
    pub provider_id: String,
    pub kubernetes_version: String,
    pub ssh_public_key: SshKeySource,
}

impl ProvisionOptions {
    pub fn from_args(args: &ProvisionArgs) -> Result<Self> {
        let version = args.kubernetes_version.trim();
        let version = version.strip_prefix('v').unwrap_or(version);
        if version.is_empty() {
            bail!("--kubernetes-version must not be empty");
        }
        if args.provider.trim().is_empty() {
            bail!("--provider must not be empty");
        }

        let ssh_public_key = match (&args.ssh_public_key_file, &args.ssh_public_key) {
            (Some(_), Some(_)) => {
                bail!("specify one or neither of --ssh-public-key-file or --ssh-public-key")
            }
            (Some(path), None) => SshKeySource::File(path.clone()),
            (None, Some(encoded)) => SshKeySource::Base64(encoded.clone()),
            (None, None) => SshKeySource::None,
        };

        Ok(Self {
            template: args.template.clone(),
            provider_id: args.provider.trim().to_string(),
            kubernetes_version: version.to_string(),
            ssh_public_key,
        })
    }
}

struct ProvisionRun<'a> {
    ctx: &'a HarnessContext,
    options: &'a ProvisionOptions,
    template_id: WriteOnce<String>,
    cluster_id: WriteOnce<String>,
    kube: WriteOnce<Arc<dyn KubeApi>>,
}

impl<'a> ProvisionRun<'a> {
    fn new(ctx: &'a HarnessContext, options: &'a ProvisionOptions) -> Self {
        Self {
            ctx,
            options,
            template_id: WriteOnce::new("template_id"),
            cluster_id: WriteOnce::new("cluster_id"),
            kube: WriteOnce::new("kubernetes_client"),
        }
    }

    async fn create_template(&self) -> Result<()> {
        let ssh_public_key = self.options.ssh_public_key.resolve()?;
        let values = InfraTemplateValues::for_version(
            &self.options.kubernetes_version,
            ssh_public_key,
            Utc::now(),
        );

        let rendered = templates::render_infra_template(&self.options.template, &values)
            .with_context(|| format!("Failed to render template {}", self.options.template))?;
        let mut request = CreateTemplateRequest::from_yaml(&rendered)?;
        // All pools are assumed to share one OS
        request.append_os_to_description()?;
        debug!(description = %request.description, provider = %request.provider_name, "template request");

        let template = self
            .ctx
            .cloud
            .provision()
            .templates(self.ctx.organization_id())
            .create(&request)
            .await
            .context("Failed to create template")?;

        info!(template_id = %template.id, "created template");
        output::kv("template", &template.id);
        self.template_id.set(template.id)?;
        Ok(())
    }

    async fn create_cluster(&self) -> Result<()> {
        let template_id = self.template_id.get()?;
        let provision = self.ctx.cloud.provision();

        let template = provision
            .templates(self.ctx.organization_id())
            .get(template_id)
            .await
            .context("Failed to get template")?;
        let kind: ProviderKind = template.provider_name.parse()?;

        let mut options = ClusterCreateOptions::new(
            self.options.provider_id.as_str(),
            template_id.as_str(),
            template.description,
        );
        options.default_and_validate(kind)?;

        let cluster = provision
            .cke_clusters(self.ctx.organization_id())
            .create(&options.into_request())
            .await
            .context("Failed to create cluster")?;

        info!(cluster_id = %cluster.id, provider = %kind, "requested cluster");
        output::kv("cluster", &cluster.id);
        self.cluster_id.set(cluster.id)?;
        Ok(())
    }

    async fn write_kubeconfig(&self) -> Result<()> {
        let values = KubeconfigValues::new(
            &self.ctx.config.endpoints.proxy_url,
            self.ctx.organization_id(),
            self.cluster_id.get()?.as_str(),
            self.ctx.token.as_str(),
        );
        templates::write_kubeconfig(&self.ctx.kubeconfig, &values)
            .with_context(|| format!("Failed to write kubeconfig to {}", self.ctx.kubeconfig))?;
        output::kv("kubeconfig", self.ctx.kubeconfig.as_str());
        Ok(())
    }

    async fn connect_kube(&self) -> Result<()> {
        let api = self.ctx.connect_kube().await?;
        self.kube.set(api)?;
        Ok(())
    }

    async fn cluster_running(&self) -> Result<()> {
        let spec = self.ctx.config.polling.provision.spec();
        self.ctx
            .cloud_waiter()
            .cluster_running(self.cluster_id.get()?, spec)
            .await?;
        Ok(())
    }

    async fn node_pools_running(&self) -> Result<()> {
        let spec = self.ctx.config.polling.default.spec();
        self.ctx
            .cloud_waiter()
            .all_node_pools_running(self.cluster_id.get()?, spec)
            .await?;
        Ok(())
    }

    async fn api_ready(&self) -> Result<()> {
        let api = self.kube.get()?;
        let spec = self.ctx.config.polling.default.spec();
        self.ctx.kube_waiter(api.as_ref()).api_ready(spec).await?;
        Ok(())
    }

    async fn nodes_ready(&self) -> Result<()> {
        let api = self.kube.get()?;
        let spec = self.ctx.config.polling.default.spec();
        self.ctx.kube_waiter(api.as_ref()).nodes_ready(spec).await?;
        Ok(())
    }
}

/// Provision a cluster and wait until it is usable
pub async fn run(ctx: &HarnessContext, options: &ProvisionOptions) -> Result<SuiteSummary> {
    let run = ProvisionRun::new(ctx, options);
    let mut runner = SuiteRunner::new("provision", "Provisioning a cluster");

    runner
        .step("create the template from file", run.create_template())
        .await?;
    runner
        .step("initiate provisioning", run.create_cluster())
        .await?;
    runner
        .step("write the kubeconfig", run.write_kubeconfig())
        .await?;
    runner
        .step("initialize a Kubernetes client", run.connect_kube())
        .await?;
    runner
        .step("cluster reports as running", run.cluster_running())
        .await?;
    runner
        .step("all node pools report as running", run.node_pools_running())
        .await?;
    runner
        .step("Kubernetes API server is reachable", run.api_ready())
        .await?;
    runner
        .step("all nodes are ready in Kubernetes", run.nodes_ready())
        .await?;

    Ok(runner.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suites::test_support::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use wiremock::MockServer;

    const TEMPLATE: &str = r#"provider_name: digital_ocean
description: "{{ description }}"
configuration:
  variable:
    np-master:
      default:
        os: ubuntu
        count: 1
        kubernetes_mode: master
        kubernetes_version: "{{ master_kubernetes_version }}"
    np-worker:
      default:
        os: ubuntu
        count: 2
        kubernetes_mode: worker
        kubernetes_version: "{{ worker_kubernetes_version }}"
  resource:
    digitalocean_ssh_key:
      e2e:
        name: "e2e-{{ timestamp }}"
        public_key: "{{ ssh_public_key }}"
"#;

    fn args(template: &Utf8PathBuf) -> ProvisionArgs {
        ProvisionArgs {
            env: crate::cli::EnvArgs {
                token: "test-token".to_string(),
                kubeconfig: Utf8PathBuf::from("kubeconfig"),
            },
            template: template.clone(),
            provider: PROVIDER_ID.to_string(),
            kubernetes_version: "v1.14.1".to_string(),
            ssh_public_key_file: None,
            ssh_public_key: Some(STANDARD.encode("ssh-rsa AAAA e2e@test\n")),
            debug: false,
        }
    }

    fn template_json() -> Value {
        json!({
            "id": TEMPLATE_ID,
            "provider_name": "digital_ocean",
            "description": "e2e-1.14.1-ubuntu",
            "configuration": {},
        })
    }

    async fn mock_provision_api(server: &MockServer, cluster_states: &[&str], last: &str) {
        let templates = format!("/v3/organizations/{ORG_ID}/templates");
        mock_sequence(server, "POST", &templates, vec![], ok_json(template_json())).await;
        mock_sequence(
            server,
            "GET",
            &format!("{templates}/{TEMPLATE_ID}"),
            vec![],
            ok_json(template_json()),
        )
        .await;
        mock_sequence(
            server,
            "POST",
            &format!("/v3/organizations/{ORG_ID}/cke"),
            vec![],
            ok_json(cluster_json("PROVISIONING")),
        )
        .await;

        let states = cluster_states
            .iter()
            .map(|s| ok_json(cluster_json(s)))
            .collect();
        mock_sequence(server, "GET", &cluster_path(), states, ok_json(cluster_json(last))).await;
        mock_sequence(
            server,
            "GET",
            &node_pools_path(),
            vec![ok_json(json!([
                node_pool_json(MASTER_POOL_ID, "master", 1, "RUNNING"),
                node_pool_json(WORKER_POOL_ID, "worker", 2, "UPDATING"),
            ]))],
            ok_json(json!([
                node_pool_json(MASTER_POOL_ID, "master", 1, "RUNNING"),
                node_pool_json(WORKER_POOL_ID, "worker", 2, "RUNNING"),
            ])),
        )
        .await;
    }

    fn write_template(temp: &TempDir) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(temp.path().join("do.yaml.tera")).unwrap();
        fs::write(&path, TEMPLATE).unwrap();
        path
    }

    #[tokio::test]
    async fn test_provision_suite() {
        let server = MockServer::start().await;
        mock_provision_api(&server, &["PROVISIONING"], "RUNNING").await;

        let temp = TempDir::new().unwrap();
        let template = write_template(&temp);
        let kubeconfig = Utf8PathBuf::from_path_buf(temp.path().join("kube/config")).unwrap();
        let kube = FakeKube::with_nodes(vec![
            vec![node("m-0", MASTER_POOL_ID, true), node("w-0", WORKER_POOL_ID, false)],
            vec![node("m-0", MASTER_POOL_ID, true), node("w-0", WORKER_POOL_ID, true)],
        ]);
        let ctx = context_for(&server, &kubeconfig, kube);
        let options = ProvisionOptions::from_args(&args(&template)).unwrap();

        let summary = run(&ctx, &options).await.unwrap();
        assert_eq!(summary.steps.len(), 8);

        let created = requests_to(&server, "POST", &format!("/v3/organizations/{ORG_ID}/templates")).await;
        let body: Value = serde_json::from_slice(&created[0].body).unwrap();
        assert_eq!(body["description"], "e2e-1.14.1-ubuntu");
        assert_eq!(
            body["configuration"]["resource"]["digitalocean_ssh_key"]["e2e"]["public_key"],
            "ssh-rsa AAAA e2e@test"
        );
        assert_eq!(
            body["configuration"]["variable"]["np-worker"]["default"]["kubernetes_version"],
            "1.14.1"
        );

        let cluster = requests_to(&server, "POST", &format!("/v3/organizations/{ORG_ID}/cke")).await;
        let body: Value = serde_json::from_slice(&cluster[0].body).unwrap();
        assert_eq!(body["template_id"], TEMPLATE_ID);
        assert_eq!(body["provider_id"], PROVIDER_ID);
        assert_eq!(body["labels"]["containership.io/cluster-name"], "e2e-1.14.1-ubuntu");

        let written = fs::read_to_string(&kubeconfig).unwrap();
        assert!(written.contains(&format!(
            "https://proxy.test/v3/organizations/{ORG_ID}/clusters/{CLUSTER_ID}/k8sapi/proxy"
        )));
        assert!(written.contains("test-token"));
    }

    #[tokio::test]
    async fn test_provision_stops_on_unexpected_cluster_state() {
        let server = MockServer::start().await;
        mock_provision_api(&server, &["PROVISIONING"], "DEGRADED").await;

        let temp = TempDir::new().unwrap();
        let template = write_template(&temp);
        let kubeconfig = Utf8PathBuf::from_path_buf(temp.path().join("kubeconfig")).unwrap();
        let kube = FakeKube::with_nodes(vec![vec![node("m-0", MASTER_POOL_ID, true)]]);
        let ctx = context_for(&server, &kubeconfig, kube.clone());
        let options = ProvisionOptions::from_args(&args(&template)).unwrap();

        let err = run(&ctx, &options).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("cluster reports as running"));
        assert!(message.contains("DEGRADED"));

        assert!(requests_to(&server, "GET", &node_pools_path()).await.is_empty());
        assert!(kube.selectors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_before_cluster_create() {
        let server = MockServer::start().await;
        let templates = format!("/v3/organizations/{ORG_ID}/templates");
        let mut template = template_json();
        template["provider_name"] = json!("linode");
        mock_sequence(&server, "POST", &templates, vec![], ok_json(template.clone())).await;
        mock_sequence(
            &server,
            "GET",
            &format!("{templates}/{TEMPLATE_ID}"),
            vec![],
            ok_json(template),
        )
        .await;

        let temp = TempDir::new().unwrap();
        let template_path = write_template(&temp);
        let kubeconfig = Utf8PathBuf::from_path_buf(temp.path().join("kubeconfig")).unwrap();
        let ctx = context_for(&server, &kubeconfig, FakeKube::with_nodes(vec![]));
        let options = ProvisionOptions::from_args(&args(&template_path)).unwrap();

        let err = run(&ctx, &options).await.unwrap_err();
        assert!(format!("{err:#}").contains("linode"));
        assert!(requests_to(&server, "POST", &format!("/v3/organizations/{ORG_ID}/cke"))
            .await
            .is_empty());
        assert!(!kubeconfig.exists());
    }

    #[test]
    fn test_options_from_args() {
        let template = Utf8PathBuf::from("t.yaml");
        let options = ProvisionOptions::from_args(&args(&template)).unwrap();
        assert_eq!(options.kubernetes_version, "1.14.1");
        assert!(matches!(options.ssh_public_key, SshKeySource::Base64(_)));

        let mut no_version = args(&template);
        no_version.kubernetes_version = "v".to_string();
        assert!(ProvisionOptions::from_args(&no_version).is_err());
    }

    #[test]
    fn test_ssh_key_sources() {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("id_rsa.pub")).unwrap();
        fs::write(&path, "ssh-ed25519 AAAA user@host\n").unwrap();

        assert_eq!(
            SshKeySource::File(path).resolve().unwrap(),
            "ssh-ed25519 AAAA user@host"
        );
        assert_eq!(
            SshKeySource::Base64(STANDARD.encode("ssh-rsa BBBB")).resolve().unwrap(),
            "ssh-rsa BBBB"
        );
        assert_eq!(SshKeySource::None.resolve().unwrap(), "");
        assert!(SshKeySource::Base64("not base64!".to_string()).resolve().is_err());
        assert!(SshKeySource::File("/nonexistent/id_rsa.pub".into())
            .resolve()
            .is_err());
    }
}
