//! Render Tests
//! Tests for the rendered tenant directory as a whole

mod common;

use blueprint_common::{TenantConfig, TenantManifest};
use blueprintctl::render::{render_all, TENANT_MANIFEST_FILE};
use common::snapshot;
use std::fs;
use tempfile::TempDir;

fn config(plan: &str) -> TenantConfig {
    TenantConfig::validated(
        "acme-corp",
        plan,
        "https://github.com/acme-corp/gitops.git",
        "acme.example.com",
        "platform@acme.com",
    )
    .unwrap()
}

#[test]
fn test_two_renders_are_byte_identical() {
    let config = config("growth");
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    render_all(&config, first.path()).unwrap();
    render_all(&config, second.path()).unwrap();

    let a = snapshot(first.path());
    assert_eq!(a.len(), 8);
    assert_eq!(a, snapshot(second.path()));
}

#[test]
fn test_plans_render_differently() {
    let starter = TempDir::new().unwrap();
    let enterprise = TempDir::new().unwrap();
    render_all(&config("starter"), starter.path()).unwrap();
    render_all(&config("enterprise"), enterprise.path()).unwrap();

    let quota = |dir: &TempDir| fs::read_to_string(dir.path().join("bootstrap/quota.yaml")).unwrap();
    assert_ne!(quota(&starter), quota(&enterprise));
    assert!(quota(&enterprise).contains("blueprint.kube-saas.io/plan: enterprise"));
}

#[test]
fn test_tenant_manifest_round_trips_to_same_config() {
    let config = config("enterprise");
    let dir = TempDir::new().unwrap();
    render_all(&config, dir.path()).unwrap();

    let contents = fs::read_to_string(dir.path().join(TENANT_MANIFEST_FILE)).unwrap();
    let manifest: TenantManifest = serde_yaml::from_str(&contents).unwrap();
    assert_eq!(TenantConfig::from_manifest(&manifest).unwrap(), config);
}

#[test]
fn test_every_object_targets_tenant_namespace() {
    let dir = TempDir::new().unwrap();
    render_all(&config("starter"), dir.path()).unwrap();

    for name in ["rbac.yaml", "quota.yaml", "limitrange.yaml", "networkpolicy.yaml", "ingress.yaml"] {
        let contents = fs::read_to_string(dir.path().join("bootstrap").join(name)).unwrap();
        for doc in contents.split("---\n") {
            let value: serde_yaml::Value = serde_yaml::from_str(doc).unwrap();
            assert_eq!(
                value["metadata"]["namespace"].as_str(),
                Some("tenant-acme-corp"),
                "{name}"
            );
        }
    }

    let app = fs::read_to_string(dir.path().join("bootstrap/argocd.yaml")).unwrap();
    let app: serde_yaml::Value = serde_yaml::from_str(&app).unwrap();
    assert_eq!(app["metadata"]["namespace"].as_str(), Some("argocd"));
    assert_eq!(app["spec"]["destination"]["namespace"].as_str(), Some("tenant-acme-corp"));
}
