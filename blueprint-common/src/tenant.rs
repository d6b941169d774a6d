//! Tenant configuration
//!
//! `TenantConfig` is the single conversion point from raw operator strings to
//! a trusted, fully resolved description of a tenant. Everything downstream
//! (rendering, directory lifecycle) works from a `TenantConfig`.

use crate::plans::{self, Plan};
use crate::validation;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Prefix shared by tenant namespaces and tenant directories
pub const TENANT_PREFIX: &str = "tenant-";

/// Base URL of the tenant self-service portal
pub const PORTAL_BASE_URL: &str = "https://portal.example.com";

/// API group of the tenant metadata document
pub const TENANT_API_VERSION: &str = "blueprint.kube-saas.io/v1alpha1";
pub const TENANT_KIND: &str = "Tenant";

/// Placeholder shown when tenant metadata cannot be read
pub const UNKNOWN: &str = "unknown";

/// Namespace (and directory) name for a tenant
pub fn namespace_for(name: &str) -> String {
    format!("{}{}", TENANT_PREFIX, name)
}

/// Self-service portal URL for a tenant
pub fn portal_url_for(name: &str) -> String {
    format!("{}/{}", PORTAL_BASE_URL, namespace_for(name))
}

/// Fully resolved tenant configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantConfig {
    name: String,
    plan: Plan,
    domain: String,
    email: String,
    repo_url: String,
    namespace: String,
    portal_url: String,
}

impl TenantConfig {
    /// Resolve raw input into a configuration. Fails exactly when the plan is
    /// not in the catalog.
    pub fn new(name: &str, plan: &str, repo_url: &str, domain: &str, email: &str) -> Result<Self> {
        let plan = *plans::get_plan(plan)?;
        Ok(Self {
            name: name.to_string(),
            plan,
            domain: domain.to_string(),
            email: email.to_string(),
            repo_url: repo_url.to_string(),
            namespace: namespace_for(name),
            portal_url: portal_url_for(name),
        })
    }

    /// Validate then resolve, as `tenant create` does
    pub fn validated(
        name: &str,
        plan: &str,
        repo_url: &str,
        domain: &str,
        email: &str,
    ) -> Result<Self> {
        validation::validate(name, plan, repo_url, domain, email)?;
        Self::new(name, plan, repo_url, domain, email)
    }

    /// Rebuild a configuration from a parsed `tenant.yaml`
    pub fn from_manifest(manifest: &TenantManifest) -> Result<Self> {
        let spec = &manifest.spec;
        Self::validated(
            &manifest.metadata.name,
            &spec.plan,
            &spec.repo_url,
            &spec.domain,
            &spec.email,
        )
    }

    /// Metadata document written to `tenant.yaml`
    pub fn to_manifest(&self) -> TenantManifest {
        TenantManifest {
            api_version: TENANT_API_VERSION.to_string(),
            kind: TENANT_KIND.to_string(),
            metadata: TenantMetadata {
                name: self.name.clone(),
            },
            spec: TenantSpec {
                plan: self.plan.name.to_string(),
                domain: self.domain.clone(),
                email: self.email.clone(),
                repo_url: self.repo_url.clone(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// `tenant-<name>`
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn portal_url(&self) -> &str {
        &self.portal_url
    }
}

/// `tenant.yaml` document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: TenantMetadata,
    pub spec: TenantSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMetadata {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSpec {
    pub plan: String,
    pub domain: String,
    pub email: String,
    #[serde(rename = "repoURL")]
    pub repo_url: String,
}

/// Summary fields the registry shows for a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantInfo {
    pub plan: String,
    pub domain: String,
}

impl Default for TenantInfo {
    fn default() -> Self {
        Self {
            plan: UNKNOWN.to_string(),
            domain: UNKNOWN.to_string(),
        }
    }
}
