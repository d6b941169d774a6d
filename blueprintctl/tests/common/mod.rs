//! Common test utilities and helpers

#![allow(dead_code)]

use blueprintctl::render::{FsSink, ManifestSink};
use blueprintctl::CreateRequest;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create request with valid values for `name`
pub fn request(name: &str, plan: &str) -> CreateRequest {
    CreateRequest {
        name: name.to_string(),
        plan: plan.to_string(),
        repo_url: format!("https://github.com/{}/gitops.git", name),
        domain: format!("{}.example.com", name),
        email: format!("ops@{}.com", name),
    }
}

/// Empty repository root
pub fn repo() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Every file under `dir`, keyed by relative path
pub fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    collect(dir, dir, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in std::fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_path_buf();
            files.insert(rel, std::fs::read(&path).unwrap());
        }
    }
}

/// Filesystem sink that fails on the n-th file write (1-based)
pub struct FailingSink {
    fail_at: usize,
    writes: usize,
    inner: FsSink,
}

impl FailingSink {
    pub fn new(fail_at: usize) -> Self {
        Self {
            fail_at,
            writes: 0,
            inner: FsSink,
        }
    }
}

impl ManifestSink for FailingSink {
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        self.inner.create_dir_all(path)
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        self.writes += 1;
        if self.writes == self.fail_at {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.inner.write(path, contents)
    }
}
