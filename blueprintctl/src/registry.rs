//! Tenant registry
//!
//! The GitOps repository is the registry: every `tenants/tenant-<name>/`
//! directory is a tenant. There is no separate index.

use blueprint_common::tenant::{self, TENANT_PREFIX, UNKNOWN};
use blueprint_common::{Error, Result, TenantInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tabled::Tabled;
use tracing::warn;

use crate::render::TENANT_MANIFEST_FILE;

/// Directory under the repository root holding tenant directories
pub const TENANTS_DIR: &str = "tenants";

/// Scaffolding entry that is never reported as a tenant
pub const TEMPLATE_TENANT: &str = "template";

pub fn tenants_dir(repo_root: &Path) -> PathBuf {
    repo_root.join(TENANTS_DIR)
}

/// `<repo_root>/tenants/tenant-<name>`
pub fn tenant_dir(repo_root: &Path, name: &str) -> PathBuf {
    tenants_dir(repo_root).join(tenant::namespace_for(name))
}

/// Names of all tenants, sorted. A repository without a `tenants/`
/// directory has no tenants; entries that cannot be read are skipped.
pub fn list_tenants(repo_root: &Path) -> Result<Vec<String>> {
    let dir = tenants_dir(repo_root);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut tenants = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => {
                let is_dir = entry.file_type().map(|t| t.is_dir());
                tenants.extend(tenant_name(&entry.path(), is_dir));
            }
            Err(e) => warn!(path = %dir.display(), error = %e, "skipping unreadable entry"),
        }
    }

    tenants.sort();
    Ok(tenants)
}

/// Tenant name for one `tenants/` entry, or `None` when it is not a tenant
fn tenant_name(path: &Path, is_dir: std::io::Result<bool>) -> Option<String> {
    match is_dir {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable entry");
            return None;
        }
    }

    let name = path.file_name()?.to_str()?.strip_prefix(TENANT_PREFIX)?;
    if name.is_empty() || name == TEMPLATE_TENANT {
        return None;
    }
    Some(name.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct InfoDocument {
    #[serde(default)]
    spec: InfoSpec,
}

#[derive(Debug, Default, Deserialize)]
struct InfoSpec {
    plan: Option<String>,
    domain: Option<String>,
}

fn known(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Plan and domain from a tenant's `tenant.yaml`. Unreadable or malformed
/// metadata degrades to "unknown" instead of failing.
pub fn tenant_info(repo_root: &Path, name: &str) -> TenantInfo {
    let path = tenant_dir(repo_root, name).join(TENANT_MANIFEST_FILE);

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(tenant = name, path = %path.display(), error = %e, "cannot read tenant metadata");
            return TenantInfo::default();
        }
    };

    match serde_yaml::from_str::<InfoDocument>(&contents) {
        Ok(doc) => TenantInfo {
            plan: known(doc.spec.plan),
            domain: known(doc.spec.domain),
        },
        Err(e) => {
            warn!(tenant = name, path = %path.display(), error = %e, "malformed tenant metadata");
            TenantInfo::default()
        }
    }
}

/// One row of `tenant list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct TenantSummary {
    #[tabled(rename = "TENANT")]
    pub name: String,
    #[tabled(rename = "PLAN")]
    pub plan: String,
    #[tabled(rename = "DOMAIN")]
    pub domain: String,
    #[tabled(rename = "PORTAL URL")]
    pub portal_url: String,
}

/// Summaries of every tenant, in `list_tenants` order
pub fn tenant_summaries(repo_root: &Path) -> Result<Vec<TenantSummary>> {
    Ok(list_tenants(repo_root)?
        .into_iter()
        .map(|name| {
            let info = tenant_info(repo_root, &name);
            TenantSummary {
                portal_url: tenant::portal_url_for(&name),
                plan: info.plan,
                domain: info.domain,
                name,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_metadata(root: &Path, name: &str, contents: &str) {
        let dir = tenant_dir(root, name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(TENANT_MANIFEST_FILE), contents).unwrap();
    }

    #[test]
    fn test_list_excludes_template() {
        let repo = TempDir::new().unwrap();
        for dir in ["tenant-foo", "tenant-template", "tenant-acme"] {
            fs::create_dir_all(repo.path().join(TENANTS_DIR).join(dir)).unwrap();
        }
        assert_eq!(list_tenants(repo.path()).unwrap(), vec!["acme", "foo"]);
    }

    #[test]
    fn test_list_skips_non_tenant_entries() {
        let repo = TempDir::new().unwrap();
        let tenants = repo.path().join(TENANTS_DIR);
        fs::create_dir_all(tenants.join("tenant-acme")).unwrap();
        fs::create_dir_all(tenants.join("shared")).unwrap();
        fs::create_dir_all(tenants.join(".tenant-acme.sync")).unwrap();
        fs::create_dir_all(tenants.join("tenant-")).unwrap();
        fs::write(tenants.join("tenant-file"), "not a directory").unwrap();
        fs::write(tenants.join("README.md"), "# tenants").unwrap();

        assert_eq!(list_tenants(repo.path()).unwrap(), vec!["acme"]);
    }

    #[test]
    fn test_unreadable_entry_is_skipped() {
        let denied = || std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let tenants = Path::new("/repo/tenants");

        assert_eq!(tenant_name(&tenants.join("tenant-acme"), Err(denied())), None);
        assert_eq!(tenant_name(&tenants.join("tenant-acme"), Ok(true)), Some("acme".to_string()));
        assert_eq!(tenant_name(&tenants.join("tenant-acme"), Ok(false)), None);
        assert_eq!(tenant_name(&tenants.join("tenant-template"), Ok(true)), None);
    }

    #[test]
    fn test_unreadable_tenants_dir_names_the_path() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join(TENANTS_DIR), "not a directory").unwrap();

        match list_tenants(repo.path()).unwrap_err() {
            Error::Io { path, .. } => assert_eq!(path, tenants_dir(repo.path())),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_list_without_tenants_dir() {
        let repo = TempDir::new().unwrap();
        assert!(list_tenants(repo.path()).unwrap().is_empty());
    }

    #[test]
    fn test_info_reads_plan_and_domain() {
        let repo = TempDir::new().unwrap();
        write_metadata(
            repo.path(),
            "acme",
            "apiVersion: blueprint.kube-saas.io/v1alpha1\nkind: Tenant\nmetadata:\n  name: acme\nspec:\n  plan: \"growth\"\n  domain: 'acme.example.com'\n  email: a@acme.com\n",
        );
        let info = tenant_info(repo.path(), "acme");
        assert_eq!(info.plan, "growth");
        assert_eq!(info.domain, "acme.example.com");
    }

    #[test]
    fn test_info_degrades_to_unknown() {
        let repo = TempDir::new().unwrap();

        // missing file
        fs::create_dir_all(tenant_dir(repo.path(), "ghost")).unwrap();
        assert_eq!(tenant_info(repo.path(), "ghost"), TenantInfo::default());

        // malformed yaml
        write_metadata(repo.path(), "broken", "spec: [plan: {");
        assert_eq!(tenant_info(repo.path(), "broken"), TenantInfo::default());

        // partial metadata
        write_metadata(repo.path(), "partial", "spec:\n  plan: starter\n");
        let info = tenant_info(repo.path(), "partial");
        assert_eq!(info.plan, "starter");
        assert_eq!(info.domain, "unknown");
    }

    #[test]
    fn test_summaries_survive_one_bad_entry() {
        let repo = TempDir::new().unwrap();
        write_metadata(repo.path(), "acme", "spec:\n  plan: starter\n  domain: acme.io\n");
        write_metadata(repo.path(), "broken", ":::");

        let summaries = tenant_summaries(repo.path()).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "acme");
        assert_eq!(summaries[0].plan, "starter");
        assert_eq!(summaries[0].portal_url, "https://portal.example.com/tenant-acme");
        assert_eq!(summaries[1].name, "broken");
        assert_eq!(summaries[1].plan, "unknown");
    }
}
