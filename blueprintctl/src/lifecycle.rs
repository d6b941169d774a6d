//! Tenant directory lifecycle
//!
//! create, dry-run, delete and sync over one `tenants/tenant-<name>/`
//! directory. A tenant directory is either absent or fully rendered: any
//! failure part way through rendering removes everything written so far.
//! Sync only ever touches the rendered `bootstrap/` artifacts; `tenant.yaml`
//! and files added by hand are left as they are.

use blueprint_common::validation::validate_tenant_name;
use blueprint_common::{Error, Result, TenantConfig, TenantManifest};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::registry::{tenant_dir, tenants_dir};
use crate::render::{self, Artifact, FsSink, ManifestSink, BOOTSTRAP_DIR, TENANT_MANIFEST_FILE};

/// Raw operator input for `tenant create`
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub name: String,
    pub plan: String,
    pub repo_url: String,
    pub domain: String,
    pub email: String,
}

/// Outcome of `create`, also used for dry runs
#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    pub tenant: TenantConfig,
    pub tenant_dir: PathBuf,
    /// Files written, or that would be written on a dry run
    pub files: Vec<PathBuf>,
    pub dry_run: bool,
}

/// Outcome of `sync`
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub tenant: TenantConfig,
    pub tenant_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Removes a directory tree when dropped, unless committed
#[derive(Debug)]
struct DirGuard {
    path: PathBuf,
    armed: bool,
}

impl DirGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => warn!(path = %self.path.display(), "rolled back partially rendered directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "rollback failed, remove the directory manually"
            ),
        }
    }
}

/// Create a tenant on the local filesystem
pub fn create(repo_root: &Path, request: &CreateRequest, dry_run: bool) -> Result<CreateReport> {
    create_with(repo_root, request, dry_run, &mut FsSink)
}

/// Create a tenant, writing through `sink`. A dry run stops after validation,
/// resolution and the existence check, so it fails exactly when a real create
/// would fail before rendering.
pub fn create_with(
    repo_root: &Path,
    request: &CreateRequest,
    dry_run: bool,
    sink: &mut dyn ManifestSink,
) -> Result<CreateReport> {
    let config = TenantConfig::validated(
        &request.name,
        &request.plan,
        &request.repo_url,
        &request.domain,
        &request.email,
    )?;

    let dir = tenant_dir(repo_root, config.name());
    if dir.exists() {
        return Err(Error::AlreadyExists {
            name: config.name().to_string(),
            path: dir,
        });
    }

    if dry_run {
        info!(tenant = config.name(), plan = config.plan().name, "dry run, nothing written");
        let files = render::artifact_paths().iter().map(|p| dir.join(p)).collect();
        return Ok(CreateReport {
            tenant: config,
            tenant_dir: dir,
            files,
            dry_run: true,
        });
    }

    info!(tenant = config.name(), plan = config.plan().name, path = %dir.display(), "creating tenant");
    let guard = DirGuard::new(dir.clone());
    let files = render::render_all_with(&config, &dir, sink)?;
    guard.commit();
    info!(tenant = config.name(), files = files.len(), "tenant created");

    Ok(CreateReport {
        tenant: config,
        tenant_dir: dir,
        files,
        dry_run: false,
    })
}

/// Delete a tenant directory. Requires `force`; the GitOps controller removes
/// the cluster resources once the deletion is pushed.
pub fn delete(repo_root: &Path, name: &str, force: bool) -> Result<PathBuf> {
    validate_tenant_name(name)?;

    let dir = tenant_dir(repo_root, name);
    if !dir.is_dir() {
        return Err(Error::NotFound {
            name: name.to_string(),
            path: dir,
        });
    }

    if !force {
        return Err(Error::ConfirmationRequired {
            name: name.to_string(),
        });
    }

    fs::remove_dir_all(&dir).map_err(|source| Error::Delete {
        name: name.to_string(),
        path: dir.clone(),
        source,
    })?;
    info!(tenant = name, path = %dir.display(), "tenant deleted");
    Ok(dir)
}

/// Parse a tenant's `tenant.yaml`
pub fn read_manifest(tenant_dir: &Path) -> Result<TenantManifest> {
    let path = tenant_dir.join(TENANT_MANIFEST_FILE);
    let invalid = |message: String| Error::InvalidManifest {
        path: path.clone(),
        message,
    };

    let contents = fs::read_to_string(&path).map_err(|e| invalid(e.to_string()))?;
    serde_yaml::from_str(&contents).map_err(|e| invalid(e.to_string()))
}

/// Re-render an existing tenant from its `tenant.yaml`
pub fn sync(repo_root: &Path, name: &str) -> Result<SyncReport> {
    sync_with(repo_root, name, &mut FsSink)
}

/// Re-render an existing tenant through `sink`. The bootstrap artifacts are
/// rendered into a staging directory first and then moved into place one by
/// one; if a move fails, every file already replaced is put back.
pub fn sync_with(repo_root: &Path, name: &str, sink: &mut dyn ManifestSink) -> Result<SyncReport> {
    validate_tenant_name(name)?;

    let dir = tenant_dir(repo_root, name);
    if !dir.is_dir() {
        return Err(Error::NotFound {
            name: name.to_string(),
            path: dir,
        });
    }

    let manifest = read_manifest(&dir)?;
    if manifest.metadata.name != name {
        return Err(Error::InvalidManifest {
            path: dir.join(TENANT_MANIFEST_FILE),
            message: format!(
                "metadata.name is {:?}, expected {:?}",
                manifest.metadata.name, name
            ),
        });
    }
    let config = TenantConfig::from_manifest(&manifest)?;

    let staging = tenants_dir(repo_root).join(format!(".{}.sync", config.namespace()));
    let backup = tenants_dir(repo_root).join(format!(".{}.old", config.namespace()));
    for leftover in [&staging, &backup] {
        if leftover.exists() {
            fs::remove_dir_all(leftover).map_err(|e| Error::io(leftover.as_path(), e))?;
        }
    }

    info!(tenant = name, plan = config.plan().name, "syncing tenant");
    let guard = DirGuard::new(staging.clone());
    render::render_artifacts_with(&config, &staging, &Artifact::BOOTSTRAP, sink)?;
    swap_artifacts(name, &staging, &dir, &backup)?;
    guard.commit();

    for leftover in [&staging, &backup] {
        if let Err(e) = fs::remove_dir_all(leftover) {
            warn!(path = %leftover.display(), error = %e, "could not remove sync working directory");
        }
    }

    let files = render::artifact_paths().iter().map(|p| dir.join(p)).collect();
    info!(tenant = name, "tenant synced");

    Ok(SyncReport {
        tenant: config,
        tenant_dir: dir,
        files,
    })
}

/// A bootstrap file moved into place, with where its previous version went
#[derive(Debug)]
struct Replaced {
    target: PathBuf,
    saved: Option<PathBuf>,
}

/// Move every staged bootstrap artifact over its counterpart in `dir`,
/// saving the old files under `backup`. Rolls back on failure.
fn swap_artifacts(tenant: &str, staging: &Path, dir: &Path, backup: &Path) -> Result<()> {
    let mut replaced = Vec::with_capacity(Artifact::BOOTSTRAP.len());
    let result = replace_each(tenant, staging, dir, backup, &mut replaced);
    if result.is_err() {
        restore(&replaced);
        // only succeeds once every saved file went back
        let _ = fs::remove_dir(backup.join(BOOTSTRAP_DIR));
        let _ = fs::remove_dir(backup);
    }
    result
}

fn replace_each(
    tenant: &str,
    staging: &Path,
    dir: &Path,
    backup: &Path,
    replaced: &mut Vec<Replaced>,
) -> Result<()> {
    let swap_error = |path: &Path, source: io::Error| Error::Render {
        tenant: tenant.to_string(),
        path: path.to_path_buf(),
        source,
    };

    for path in [dir.join(BOOTSTRAP_DIR), backup.join(BOOTSTRAP_DIR)] {
        fs::create_dir_all(&path).map_err(|e| swap_error(&path, e))?;
    }

    for artifact in Artifact::BOOTSTRAP {
        let relative = artifact.relative_path();
        let target = dir.join(&relative);

        let saved = if target.exists() {
            let saved = backup.join(&relative);
            fs::rename(&target, &saved).map_err(|e| swap_error(&target, e))?;
            Some(saved)
        } else {
            None
        };
        replaced.push(Replaced {
            target: target.clone(),
            saved,
        });

        fs::rename(staging.join(&relative), &target).map_err(|e| swap_error(&target, e))?;
    }

    Ok(())
}

/// Put back the previous version of every replaced file, newest first
fn restore(replaced: &[Replaced]) {
    for entry in replaced.iter().rev() {
        if let Err(e) = fs::remove_file(&entry.target) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %entry.target.display(), error = %e, "could not remove new file during rollback");
            }
        }
        if let Some(saved) = &entry.saved {
            if let Err(e) = fs::rename(saved, &entry.target) {
                warn!(
                    path = %entry.target.display(),
                    backup = %saved.display(),
                    error = %e,
                    "could not restore file, copy it back from the backup"
                );
            }
        }
    }
    warn!(files = replaced.len(), "rolled back partially synced tenant");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(name: &str) -> CreateRequest {
        CreateRequest {
            name: name.to_string(),
            plan: "starter".to_string(),
            repo_url: "https://x/y.git".to_string(),
            domain: format!("{}.example.com", name),
            email: format!("ops@{}.com", name),
        }
    }

    #[test]
    fn test_guard_removes_uncommitted_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("partial");
        fs::create_dir_all(path.join("bootstrap")).unwrap();
        fs::write(path.join("bootstrap/namespace.yaml"), "x").unwrap();

        drop(DirGuard::new(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn test_guard_keeps_committed_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("done");
        fs::create_dir_all(&path).unwrap();

        DirGuard::new(path.clone()).commit();
        assert!(path.exists());
    }

    #[test]
    fn test_guard_tolerates_missing_dir() {
        let tmp = TempDir::new().unwrap();
        drop(DirGuard::new(tmp.path().join("never-created")));
    }

    #[test]
    fn test_create_rejects_invalid_input_without_touching_disk() {
        let repo = TempDir::new().unwrap();
        let mut bad = request("acme");
        bad.plan = "bogus".to_string();

        let err = create(repo.path(), &bad, false).unwrap_err();
        assert!(matches!(err, Error::PlanNotFound { .. }));
        assert!(!tenants_dir(repo.path()).exists());

        let err = create(repo.path(), &request("Acme"), false).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!tenants_dir(repo.path()).exists());
    }

    #[test]
    fn test_delete_validates_name() {
        let repo = TempDir::new().unwrap();
        let err = delete(repo.path(), "../etc", true).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_read_manifest_errors() {
        let repo = TempDir::new().unwrap();
        let dir = tenant_dir(repo.path(), "acme");
        fs::create_dir_all(&dir).unwrap();

        assert!(matches!(read_manifest(&dir), Err(Error::InvalidManifest { .. })));

        fs::write(dir.join(TENANT_MANIFEST_FILE), "spec:\n  plan: starter\n").unwrap();
        assert!(matches!(read_manifest(&dir), Err(Error::InvalidManifest { .. })));
    }

    #[test]
    fn test_failed_swap_restores_previous_files() {
        let repo = TempDir::new().unwrap();
        create(repo.path(), &request("acme"), false).unwrap();
        let dir = tenant_dir(repo.path(), "acme");
        let staging = tenants_dir(repo.path()).join(".tenant-acme.sync");
        let backup = tenants_dir(repo.path()).join(".tenant-acme.old");

        let config = TenantConfig::new("acme", "starter", "https://x/y.git", "acme.example.com", "ops@acme.com").unwrap();
        render::render_artifacts_with(&config, &staging, &Artifact::BOOTSTRAP, &mut FsSink).unwrap();

        // namespace and rbac get swapped, quota has no original, limitrange is missing from staging
        fs::write(dir.join("bootstrap/namespace.yaml"), "edited\n").unwrap();
        fs::remove_file(dir.join("bootstrap/quota.yaml")).unwrap();
        fs::remove_file(staging.join("bootstrap/limitrange.yaml")).unwrap();
        let rbac = fs::read_to_string(dir.join("bootstrap/rbac.yaml")).unwrap();

        let err = swap_artifacts("acme", &staging, &dir, &backup).unwrap_err();
        assert!(matches!(err, Error::Render { ref path, .. } if path.ends_with("bootstrap/limitrange.yaml")));

        assert_eq!(fs::read_to_string(dir.join("bootstrap/namespace.yaml")).unwrap(), "edited\n");
        assert_eq!(fs::read_to_string(dir.join("bootstrap/rbac.yaml")).unwrap(), rbac);
        assert!(!dir.join("bootstrap/quota.yaml").exists());
        assert!(dir.join("bootstrap/limitrange.yaml").exists());
        assert!(!backup.exists());
    }
}
