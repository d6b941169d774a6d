//! Common types shared by the blueprintctl library and CLI
//!
//! Plan catalog, tenant input validation, tenant configuration and the error
//! taxonomy. No filesystem or network access happens in this crate.

pub mod plans;
pub mod tenant;
pub mod validation;

pub use plans::{get_plan, list_plans, Bytes, Cpu, Plan};
pub use tenant::{TenantConfig, TenantInfo, TenantManifest};

use std::path::PathBuf;

/// Tenant provisioning errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("plan {plan:?} not found (available: {available})")]
    PlanNotFound { plan: String, available: String },

    #[error("tenant {name:?} already exists at {} (use 'tenant sync' to update it)", path.display())]
    AlreadyExists { name: String, path: PathBuf },

    #[error("tenant {name:?} not found at {}", path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("deleting tenant {name:?} requires --force")]
    ConfirmationRequired { name: String },

    #[error("failed to render tenant {tenant:?} at {}: {source}", path.display())]
    Render {
        tenant: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tenant manifest {}: {message}", path.display())]
    InvalidManifest { path: PathBuf, message: String },

    #[error("git error: {0}")]
    Git(String),

    #[error("git push failed: {0}")]
    Push(String),

    #[error("failed to delete tenant {name:?} at {}: {source}", path.display())]
    Delete {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// I/O failure on `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
