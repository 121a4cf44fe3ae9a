//! The sample infrastructure templates render into valid create requests

use camino::Utf8PathBuf;
use chrono::{TimeZone, Utc};
use cs_e2e_cloud::{ClusterCreateOptions, CreateTemplateRequest, ProviderKind};
use cs_e2e_core::templates::{render_infra_template, InfraTemplateValues};

fn sample(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../templates")).join(name)
}

fn render(name: &str) -> CreateTemplateRequest {
    let now = Utc.with_ymd_and_hms(2019, 5, 1, 12, 30, 0).unwrap();
    let values = InfraTemplateValues::for_version("1.14.1", "ssh-rsa AAAA e2e@test", now);
    let rendered = render_infra_template(&sample(name), &values).unwrap();
    CreateTemplateRequest::from_yaml(&rendered).unwrap()
}

#[test]
fn test_digital_ocean_sample() {
    let mut request = render("digital-ocean.yaml.tera");
    request.append_os_to_description().unwrap();

    assert_eq!(request.description, "e2e-1.14.1-ubuntu");
    let kind: ProviderKind = request.provider_name.parse().unwrap();
    assert_eq!(kind, ProviderKind::DigitalOcean);

    let worker = &request.configuration.variable["np-worker-0"].default;
    assert_eq!(worker.kubernetes_mode.as_deref(), Some("worker"));
    assert_eq!(worker.kubernetes_version.as_deref(), Some("1.14.1"));
    assert_eq!(worker.extra["droplet_size"], "s-2vcpu-4gb");

    let key = &request.configuration.resource["digitalocean_ssh_key"]["e2e"];
    assert_eq!(key["name"], "e2e-20190501123000");
    assert_eq!(key["public_key"], "ssh-rsa AAAA e2e@test");
}

#[test]
fn test_packet_sample_builds_cluster_request() {
    let request = render("packet.yaml.tera");
    let kind: ProviderKind = request.provider_name.parse().unwrap();

    let mut options = ClusterCreateOptions::new(
        "3b9e4f3c-7c59-4c50-9d5f-6f2fbc1a6d11",
        "a8b7a1d2-64de-4f0e-8a45-0f3f2b8c9e10",
        request.description,
    );
    options.default_and_validate(kind).unwrap();
    let create = options.into_request();

    let csi = create
        .plugins
        .iter()
        .find(|p| p.plugin_type == "csi")
        .map(|p| p.implementation.as_str());
    assert_eq!(csi, None);
    assert!(create
        .plugins
        .iter()
        .any(|p| p.plugin_type == "cloud_controller_manager" && p.implementation == "packet"));
}
