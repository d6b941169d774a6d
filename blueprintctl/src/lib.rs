//! blueprintctl library
//!
//! Renders per-tenant bootstrap manifests into a GitOps repository and manages
//! the lifecycle of tenant directories. The CLI in `main.rs` is a thin layer
//! over these modules.

pub mod config;
pub mod git;
pub mod lifecycle;
pub mod logging;
pub mod registry;
pub mod render;

pub use lifecycle::{create, delete, sync, CreateReport, CreateRequest, SyncReport};
pub use registry::{list_tenants, tenant_info};
