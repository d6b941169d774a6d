//! Input validation for tenant operations
//!
//! Purely syntactic checks on operator input. Nothing here touches the
//! filesystem or the network.

use crate::{plans, Error};
use regex::Regex;
use std::sync::LazyLock;

/// Kubernetes DNS label limit; tenant names become namespace names verbatim
pub const MAX_TENANT_NAME_LENGTH: usize = 63;

static TENANT_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").expect("tenant name pattern is valid")
});

/// Validation result type
pub type ValidationResult<T> = Result<T, Error>;

/// Tenant name validation (Kubernetes DNS label rules)
pub fn validate_tenant_name(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(Error::Validation("tenant name cannot be empty".to_string()));
    }

    if name.len() > MAX_TENANT_NAME_LENGTH || !TENANT_NAME_REGEX.is_match(name) {
        return Err(Error::Validation(format!(
            "invalid tenant name {:?}: use 1-{} lowercase letters, digits and hyphens, \
             not starting or ending with a hyphen",
            name, MAX_TENANT_NAME_LENGTH
        )));
    }

    Ok(())
}

fn require(value: &str, field: &str) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Validates raw create input. Rules are checked in a fixed order and the
/// first failure is reported.
pub fn validate(
    name: &str,
    plan: &str,
    repo_url: &str,
    domain: &str,
    email: &str,
) -> ValidationResult<()> {
    validate_tenant_name(name)?;
    require(repo_url, "repo URL")?;
    require(domain, "domain")?;
    require(email, "contact email")?;
    plans::get_plan(plan)?;
    Ok(())
}
