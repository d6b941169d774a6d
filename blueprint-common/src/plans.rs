//! Plan catalog
//!
//! Fixed resource tiers that a tenant can subscribe to. Each plan carries the
//! namespace-wide ResourceQuota values and the per-container LimitRange values
//! rendered into the tenant's bootstrap manifests.
//!
//! Adding a tier is a code change: the catalog is compiled in and checked for
//! internal consistency at build time.

use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;

/// CPU quantity, stored in millicores
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cpu(u32);

impl Cpu {
    pub const fn millis(millis: u32) -> Self {
        Self(millis)
    }

    pub const fn cores(cores: u32) -> Self {
        Self(cores * 1000)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1000 == 0 {
            write!(f, "{}", self.0 / 1000)
        } else {
            write!(f, "{}m", self.0)
        }
    }
}

impl Serialize for Cpu {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Memory or storage quantity, stored in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bytes(u64);

const KI: u64 = 1024;
const MI: u64 = KI * 1024;
const GI: u64 = MI * 1024;
const TI: u64 = GI * 1024;

impl Bytes {
    pub const fn mebibytes(n: u64) -> Self {
        Self(n * MI)
    }

    pub const fn gibibytes(n: u64) -> Self {
        Self(n * GI)
    }

    pub const fn tebibytes(n: u64) -> Self {
        Self(n * TI)
    }

    pub const fn as_bytes(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Bytes {
    /// Largest binary suffix that divides the value exactly
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes == 0 {
            return write!(f, "0");
        }
        for (unit, suffix) in [(TI, "Ti"), (GI, "Gi"), (MI, "Mi"), (KI, "Ki")] {
            if bytes % unit == 0 {
                return write!(f, "{}{}", bytes / unit, suffix);
            }
        }
        write!(f, "{}", bytes)
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Namespace-wide ResourceQuota values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaLimits {
    pub cpu_requests: Cpu,
    pub cpu_limits: Cpu,
    pub memory_requests: Bytes,
    pub memory_limits: Bytes,
    pub max_pods: u32,
    pub max_pvcs: u32,
    pub max_storage: Bytes,
}

/// Per-container and per-pod LimitRange values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContainerLimits {
    pub default_cpu_request: Cpu,
    pub default_cpu_limit: Cpu,
    pub default_memory_request: Bytes,
    pub default_memory_limit: Bytes,
    pub max_cpu_per_container: Cpu,
    pub max_memory_per_container: Bytes,
    pub max_cpu_per_pod: Cpu,
    pub max_memory_per_pod: Bytes,
    pub max_pvc_size: Bytes,
}

/// A subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub name: &'static str,
    pub quota: QuotaLimits,
    pub limits: ContainerLimits,
}

const PLANS: [Plan; 3] = [
    Plan {
        name: "starter",
        quota: QuotaLimits {
            cpu_requests: Cpu::cores(1),
            cpu_limits: Cpu::cores(2),
            memory_requests: Bytes::gibibytes(2),
            memory_limits: Bytes::gibibytes(4),
            max_pods: 20,
            max_pvcs: 5,
            max_storage: Bytes::gibibytes(50),
        },
        limits: ContainerLimits {
            default_cpu_request: Cpu::millis(100),
            default_cpu_limit: Cpu::millis(500),
            default_memory_request: Bytes::mebibytes(128),
            default_memory_limit: Bytes::mebibytes(512),
            max_cpu_per_container: Cpu::cores(1),
            max_memory_per_container: Bytes::gibibytes(2),
            max_cpu_per_pod: Cpu::cores(2),
            max_memory_per_pod: Bytes::gibibytes(4),
            max_pvc_size: Bytes::gibibytes(20),
        },
    },
    Plan {
        name: "growth",
        quota: QuotaLimits {
            cpu_requests: Cpu::cores(2),
            cpu_limits: Cpu::cores(4),
            memory_requests: Bytes::gibibytes(4),
            memory_limits: Bytes::gibibytes(8),
            max_pods: 40,
            max_pvcs: 10,
            max_storage: Bytes::gibibytes(200),
        },
        limits: ContainerLimits {
            default_cpu_request: Cpu::millis(200),
            default_cpu_limit: Cpu::cores(1),
            default_memory_request: Bytes::mebibytes(256),
            default_memory_limit: Bytes::gibibytes(1),
            max_cpu_per_container: Cpu::cores(2),
            max_memory_per_container: Bytes::gibibytes(4),
            max_cpu_per_pod: Cpu::cores(4),
            max_memory_per_pod: Bytes::gibibytes(8),
            max_pvc_size: Bytes::gibibytes(50),
        },
    },
    Plan {
        name: "enterprise",
        quota: QuotaLimits {
            cpu_requests: Cpu::cores(4),
            cpu_limits: Cpu::cores(8),
            memory_requests: Bytes::gibibytes(8),
            memory_limits: Bytes::gibibytes(16),
            max_pods: 80,
            max_pvcs: 20,
            max_storage: Bytes::tebibytes(1),
        },
        limits: ContainerLimits {
            default_cpu_request: Cpu::millis(500),
            default_cpu_limit: Cpu::cores(2),
            default_memory_request: Bytes::mebibytes(512),
            default_memory_limit: Bytes::gibibytes(2),
            max_cpu_per_container: Cpu::cores(4),
            max_memory_per_container: Bytes::gibibytes(8),
            max_cpu_per_pod: Cpu::cores(8),
            max_memory_per_pod: Bytes::gibibytes(16),
            max_pvc_size: Bytes::gibibytes(100),
        },
    },
];

static PLAN_NAMES: [&str; 3] = [PLANS[0].name, PLANS[1].name, PLANS[2].name];

static CATALOG: [Plan; 3] = PLANS;

impl Plan {
    /// Checks the ordering every LimitRange and ResourceQuota pair relies on:
    /// default request <= default limit <= container max <= pod max <= namespace limit
    pub const fn is_consistent(&self) -> bool {
        let q = &self.quota;
        let l = &self.limits;

        let cpu = l.default_cpu_request.0 <= l.default_cpu_limit.0
            && l.default_cpu_limit.0 <= l.max_cpu_per_container.0
            && l.max_cpu_per_container.0 <= l.max_cpu_per_pod.0
            && l.max_cpu_per_pod.0 <= q.cpu_limits.0
            && q.cpu_requests.0 <= q.cpu_limits.0;

        let memory = l.default_memory_request.0 <= l.default_memory_limit.0
            && l.default_memory_limit.0 <= l.max_memory_per_container.0
            && l.max_memory_per_container.0 <= l.max_memory_per_pod.0
            && l.max_memory_per_pod.0 <= q.memory_limits.0
            && q.memory_requests.0 <= q.memory_limits.0;

        let storage = l.max_pvc_size.0 <= q.max_storage.0;

        cpu && memory && storage
    }
}

// Rejects an inconsistent catalog at compile time.
const _: () = {
    let mut i = 0;
    while i < PLANS.len() {
        assert!(PLANS[i].is_consistent(), "plan catalog violates quota ordering");
        i += 1;
    }
};

/// Look up a plan by name
pub fn get_plan(name: &str) -> Result<&'static Plan> {
    CATALOG
        .iter()
        .find(|plan| plan.name == name)
        .ok_or_else(|| Error::PlanNotFound {
            plan: name.to_string(),
            available: PLAN_NAMES.join(", "),
        })
}

/// Plan names in catalog order (starter, growth, enterprise)
pub fn list_plans() -> &'static [&'static str] {
    &PLAN_NAMES
}

/// All plans in catalog order
pub fn plans() -> impl Iterator<Item = &'static Plan> {
    CATALOG.iter()
}
