//! Manifest rendering
//!
//! Expands a `TenantConfig` into the tenant directory: `tenant.yaml` plus one
//! file per Kubernetes object kind under `bootstrap/`. Output depends only on
//! the configuration, so re-rendering the same tenant is byte-identical.

pub mod argocd;
pub mod manifests;

use blueprint_common::{Error, Result, TenantConfig};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Metadata file at the root of every tenant directory
pub const TENANT_MANIFEST_FILE: &str = "tenant.yaml";

/// Subdirectory holding the rendered Kubernetes objects
pub const BOOTSTRAP_DIR: &str = "bootstrap";

/// One rendered output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    TenantMetadata,
    Namespace,
    Rbac,
    ResourceQuota,
    LimitRange,
    NetworkPolicy,
    ArgoCdApplication,
    Ingress,
}

impl Artifact {
    /// Every artifact, in write order
    pub const ALL: [Artifact; 8] = [
        Artifact::TenantMetadata,
        Artifact::Namespace,
        Artifact::Rbac,
        Artifact::ResourceQuota,
        Artifact::LimitRange,
        Artifact::NetworkPolicy,
        Artifact::ArgoCdApplication,
        Artifact::Ingress,
    ];

    /// Everything under `bootstrap/`, i.e. all artifacts except `tenant.yaml`
    pub const BOOTSTRAP: [Artifact; 7] = [
        Artifact::Namespace,
        Artifact::Rbac,
        Artifact::ResourceQuota,
        Artifact::LimitRange,
        Artifact::NetworkPolicy,
        Artifact::ArgoCdApplication,
        Artifact::Ingress,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::TenantMetadata => TENANT_MANIFEST_FILE,
            Artifact::Namespace => "namespace.yaml",
            Artifact::Rbac => "rbac.yaml",
            Artifact::ResourceQuota => "quota.yaml",
            Artifact::LimitRange => "limitrange.yaml",
            Artifact::NetworkPolicy => "networkpolicy.yaml",
            Artifact::ArgoCdApplication => "argocd.yaml",
            Artifact::Ingress => "ingress.yaml",
        }
    }

    /// Path relative to the tenant directory
    pub fn relative_path(self) -> PathBuf {
        match self {
            Artifact::TenantMetadata => PathBuf::from(TENANT_MANIFEST_FILE),
            _ => Path::new(BOOTSTRAP_DIR).join(self.file_name()),
        }
    }

    /// YAML contents for this artifact
    pub fn render(self, config: &TenantConfig) -> serde_yaml::Result<String> {
        match self {
            Artifact::TenantMetadata => to_yaml(&config.to_manifest()),
            Artifact::Namespace => to_yaml(&manifests::namespace(config)),
            Artifact::Rbac => {
                let (role, binding) = manifests::rbac(config);
                Ok(format!("{}---\n{}", to_yaml(&role)?, to_yaml(&binding)?))
            }
            Artifact::ResourceQuota => to_yaml(&manifests::resource_quota(config)),
            Artifact::LimitRange => to_yaml(&manifests::limit_range(config)),
            Artifact::NetworkPolicy => to_yaml(&manifests::network_policy(config)),
            Artifact::ArgoCdApplication => to_yaml(&argocd::application(config)),
            Artifact::Ingress => to_yaml(&manifests::ingress(config)),
        }
    }
}

fn to_yaml<T: Serialize>(value: &T) -> serde_yaml::Result<String> {
    serde_yaml::to_string(value)
}

/// Paths of every artifact relative to the tenant directory, in write order
pub fn artifact_paths() -> Vec<PathBuf> {
    Artifact::ALL.iter().map(|a| a.relative_path()).collect()
}

/// Destination for rendered files
pub trait ManifestSink {
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()>;
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Writes straight to the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSink;

impl ManifestSink for FsSink {
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Render every artifact into `tenant_dir` on the local filesystem
pub fn render_all(config: &TenantConfig, tenant_dir: &Path) -> Result<Vec<PathBuf>> {
    render_all_with(config, tenant_dir, &mut FsSink)
}

/// Render every artifact into `tenant_dir` through `sink`. Stops at the first
/// failure; cleaning up what was already written is the caller's job.
pub fn render_all_with(
    config: &TenantConfig,
    tenant_dir: &Path,
    sink: &mut dyn ManifestSink,
) -> Result<Vec<PathBuf>> {
    render_artifacts_with(config, tenant_dir, &Artifact::ALL, sink)
}

/// Render `artifacts`, in order, into `tenant_dir` through `sink`
pub fn render_artifacts_with(
    config: &TenantConfig,
    tenant_dir: &Path,
    artifacts: &[Artifact],
    sink: &mut dyn ManifestSink,
) -> Result<Vec<PathBuf>> {
    let render_error = |path: &Path, source: io::Error| Error::Render {
        tenant: config.name().to_string(),
        path: path.to_path_buf(),
        source,
    };

    let bootstrap_dir = tenant_dir.join(BOOTSTRAP_DIR);
    sink.create_dir_all(&bootstrap_dir)
        .map_err(|e| render_error(&bootstrap_dir, e))?;

    let mut written = Vec::with_capacity(artifacts.len());
    for &artifact in artifacts {
        let path = tenant_dir.join(artifact.relative_path());
        let contents = artifact
            .render(config)
            .map_err(|e| render_error(&path, io::Error::new(io::ErrorKind::InvalidData, e)))?;
        sink.write(&path, &contents)
            .map_err(|e| render_error(&path, e))?;
        debug!(tenant = config.name(), path = %path.display(), "wrote manifest");
        written.push(path);
    }

    Ok(written)
}
