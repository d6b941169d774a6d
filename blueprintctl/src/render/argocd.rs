//! ArgoCD `Application` resource
//!
//! ArgoCD's CRDs are not part of the Kubernetes OpenAPI types, so the subset we
//! render is modelled here. Field order follows declaration order.

use blueprint_common::TenantConfig;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "argoproj.io/v1alpha1";
pub const KIND: &str = "Application";

/// Namespace the ArgoCD control plane watches for Applications
pub const ARGOCD_NAMESPACE: &str = "argocd";
pub const ARGOCD_PROJECT: &str = "default";
pub const IN_CLUSTER_SERVER: &str = "https://kubernetes.default.svc";
pub const TARGET_REVISION: &str = "HEAD";
pub const SOURCE_PATH: &str = ".";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ApplicationSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub project: String,
    pub source: ApplicationSource,
    pub destination: ApplicationDestination,
    pub sync_policy: SyncPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    pub target_revision: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDestination {
    pub server: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicy {
    pub automated: AutomatedSync,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sync_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedSync {
    pub prune: bool,
    pub self_heal: bool,
}

/// Application syncing the tenant's repo into its namespace, self-healing
pub fn application(config: &TenantConfig) -> Application {
    Application {
        api_version: API_VERSION.to_string(),
        kind: KIND.to_string(),
        metadata: ObjectMeta {
            name: Some(config.namespace().to_string()),
            namespace: Some(ARGOCD_NAMESPACE.to_string()),
            labels: Some(std::collections::BTreeMap::from([(
                super::manifests::LABEL_TENANT.to_string(),
                config.name().to_string(),
            )])),
            ..Default::default()
        },
        spec: ApplicationSpec {
            project: ARGOCD_PROJECT.to_string(),
            source: ApplicationSource {
                repo_url: config.repo_url().to_string(),
                target_revision: TARGET_REVISION.to_string(),
                path: SOURCE_PATH.to_string(),
            },
            destination: ApplicationDestination {
                server: IN_CLUSTER_SERVER.to_string(),
                namespace: config.namespace().to_string(),
            },
            sync_policy: SyncPolicy {
                automated: AutomatedSync {
                    prune: true,
                    self_heal: true,
                },
                // The namespace is owned by bootstrap/namespace.yaml
                sync_options: vec!["CreateNamespace=false".to_string()],
            },
        },
    }
}
