//! Containership Cloud HTTP client
//!
//! Resource handles are cheap borrowed views over one shared
//! `reqwest::Client`:
//!
//! ```rust,no_run
//! # async fn example(client: &cs_e2e_cloud::CloudClient) -> cs_e2e_cloud::Result<()> {
//! let cluster = client
//!     .provision()
//!     .cke_clusters("62e4e86f-fe2e-4740-a814-a950bf377daf")
//!     .get("c-1")
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{CloudError, Result};
use crate::types::{
    CkeCluster, CreateCkeClusterRequest, CreateTemplateRequest, NodePool, NodePoolScaleRequest,
    Template,
};

/// Connection settings for the cloud client
#[derive(Clone)]
pub struct CloudConfig {
    pub token: String,
    pub provision_base_url: String,
    /// Log request and response bodies
    pub debug: bool,
    pub timeout: Duration,
}

impl std::fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConfig")
            .field("token", &"<redacted>")
            .field("provision_base_url", &self.provision_base_url)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Client for the Containership Cloud APIs
#[derive(Debug, Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    config: CloudConfig,
    auth_header: HeaderValue,
}

impl CloudClient {
    /// Create a new client
    pub fn new(config: CloudConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(CloudError::Client("token must not be empty".to_string()));
        }

        let mut auth_header = HeaderValue::from_str(&format!("JWT {}", config.token))
            .map_err(|e| CloudError::Client(format!("invalid token: {e}")))?;
        auth_header.set_sensitive(true);

        let http = reqwest::Client::builder()
            .user_agent(concat!("cs-e2e/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| CloudError::Client(e.to_string()))?;

        Ok(Self {
            http,
            config,
            auth_header,
        })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Provision service resources
    pub fn provision(&self) -> ProvisionClient<'_> {
        ProvisionClient { client: self }
    }

    fn provision_url(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.config.provision_base_url.trim_end_matches('/'),
            path
        )
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<String> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(AUTHORIZATION, self.auth_header.clone());

        if let Some(body) = body {
            if self.config.debug {
                let json = serde_json::to_string(body).unwrap_or_default();
                debug!(%method, %url, body = %json, "request");
            }
            request = request.json(body);
        } else if self.config.debug {
            debug!(%method, %url, "request");
        }

        let response = request
            .send()
            .await
            .map_err(|e| CloudError::transport(&method, url, e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|e| CloudError::transport(&method, url, e))?;

        if self.config.debug {
            debug!(%method, %url, status = status.as_u16(), body = %text, "response");
        }

        if !status.is_success() {
            return Err(CloudError::Http {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
                retry_after,
            });
        }

        Ok(text)
    }

    async fn request_json<T, B>(&self, method: Method, url: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let text = self.send(method, url, body).await?;
        serde_json::from_str(&text).map_err(|e| CloudError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Handles for provision service resources
pub struct ProvisionClient<'a> {
    client: &'a CloudClient,
}

impl<'a> ProvisionClient<'a> {
    pub fn templates(&self, organization_id: &str) -> TemplatesClient<'a> {
        TemplatesClient {
            client: self.client,
            base: format!("/v3/organizations/{organization_id}/templates"),
        }
    }

    pub fn cke_clusters(&self, organization_id: &str) -> CkeClustersClient<'a> {
        CkeClustersClient {
            client: self.client,
            base: format!("/v3/organizations/{organization_id}/cke"),
        }
    }

    pub fn node_pools(&self, organization_id: &str, cluster_id: &str) -> NodePoolsClient<'a> {
        NodePoolsClient {
            client: self.client,
            base: format!("/v3/organizations/{organization_id}/clusters/{cluster_id}/node-pools"),
        }
    }
}

/// Infrastructure templates in one organization
pub struct TemplatesClient<'a> {
    client: &'a CloudClient,
    base: String,
}

impl TemplatesClient<'_> {
    pub async fn create(&self, request: &CreateTemplateRequest) -> Result<Template> {
        let url = self.client.provision_url(&self.base);
        self.client
            .request_json(Method::POST, &url, Some(request))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Template> {
        let url = self.client.provision_url(&format!("{}/{}", self.base, id));
        self.client.request_json::<_, ()>(Method::GET, &url, None).await
    }
}

/// CKE clusters in one organization
pub struct CkeClustersClient<'a> {
    client: &'a CloudClient,
    base: String,
}

impl CkeClustersClient<'_> {
    pub async fn create(&self, request: &CreateCkeClusterRequest) -> Result<CkeCluster> {
        let url = self.client.provision_url(&self.base);
        self.client
            .request_json(Method::POST, &url, Some(request))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<CkeCluster> {
        let url = self.client.provision_url(&format!("{}/{}", self.base, id));
        self.client.request_json::<_, ()>(Method::GET, &url, None).await
    }

    /// Request deletion; the cluster is torn down asynchronously
    pub async fn delete(&self, id: &str) -> Result<()> {
        let url = self.client.provision_url(&format!("{}/{}", self.base, id));
        self.client
            .send::<()>(Method::DELETE, &url, None)
            .await
            .map(|_| ())
    }
}

/// Node pools of one cluster
pub struct NodePoolsClient<'a> {
    client: &'a CloudClient,
    base: String,
}

impl NodePoolsClient<'_> {
    pub async fn list(&self) -> Result<Vec<NodePool>> {
        let url = self.client.provision_url(&self.base);
        self.client.request_json::<_, ()>(Method::GET, &url, None).await
    }

    pub async fn get(&self, id: &str) -> Result<NodePool> {
        let url = self.client.provision_url(&format!("{}/{}", self.base, id));
        self.client.request_json::<_, ()>(Method::GET, &url, None).await
    }

    /// Set the pool's node count; returns the updated pool
    pub async fn scale(&self, id: &str, request: &NodePoolScaleRequest) -> Result<NodePool> {
        let url = self.client.provision_url(&format!("{}/{}", self.base, id));
        self.client
            .request_json(Method::PATCH, &url, Some(request))
            .await
    }
}
