//! Kubernetes objects for a tenant's bootstrap directory
//!
//! Every builder is a pure function of `TenantConfig`. Maps are `BTreeMap`s so
//! the serialized YAML is stable byte for byte.

use blueprint_common::TenantConfig;
use k8s_openapi::api::core::v1::{
    LimitRange, LimitRangeItem, LimitRangeSpec, Namespace, ResourceQuota, ResourceQuotaSpec,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, NetworkPolicy, NetworkPolicyIngressRule,
    NetworkPolicyPeer, NetworkPolicySpec, ServiceBackendPort,
};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_TENANT: &str = "blueprint.kube-saas.io/tenant";
pub const LABEL_PLAN: &str = "blueprint.kube-saas.io/plan";
pub const LABEL_NAMESPACE_NAME: &str = "kubernetes.io/metadata.name";

pub const MANAGED_BY: &str = "blueprintctl";

/// Namespace of the ingress controller allowed through the tenant NetworkPolicy
pub const INGRESS_CONTROLLER_NAMESPACE: &str = "ingress-nginx";
pub const INGRESS_CLASS: &str = "nginx";

pub const TENANT_ADMIN_ROLE: &str = "tenant-admin";
pub const QUOTA_NAME: &str = "tenant-quota";
pub const LIMIT_RANGE_NAME: &str = "tenant-limits";
pub const NETWORK_POLICY_NAME: &str = "tenant-isolation";
pub const INGRESS_NAME: &str = "tenant-ingress";
pub const WEB_SERVICE_PORT: i32 = 80;

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

fn tenant_labels(config: &TenantConfig) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_MANAGED_BY.to_string(), MANAGED_BY.to_string()),
        (LABEL_TENANT.to_string(), config.name().to_string()),
        (LABEL_PLAN.to_string(), config.plan().name.to_string()),
    ])
}

fn namespaced_meta(config: &TenantConfig, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(config.namespace().to_string()),
        labels: Some(tenant_labels(config)),
        ..Default::default()
    }
}

fn quantity(value: impl ToString) -> Quantity {
    Quantity(value.to_string())
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Name of the Service the tenant Ingress routes to
pub fn web_service_name(config: &TenantConfig) -> String {
    format!("{}-web", config.name())
}

/// Group bound to the tenant-admin Role
pub fn admin_group_name(config: &TenantConfig) -> String {
    format!("{}-admins", config.namespace())
}

pub fn namespace(config: &TenantConfig) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(config.namespace().to_string()),
            labels: Some(tenant_labels(config)),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Namespace-scoped admin Role and its binding. Never cluster-scoped.
pub fn rbac(config: &TenantConfig) -> (Role, RoleBinding) {
    let rules = vec![
        PolicyRule {
            api_groups: Some(strings(&[""])),
            resources: Some(strings(&[
                "configmaps",
                "persistentvolumeclaims",
                "pods",
                "pods/log",
                "secrets",
                "serviceaccounts",
                "services",
            ])),
            verbs: strings(&["create", "delete", "get", "list", "patch", "update", "watch"]),
            ..Default::default()
        },
        PolicyRule {
            api_groups: Some(strings(&["apps", "batch"])),
            resources: Some(strings(&[
                "cronjobs",
                "deployments",
                "jobs",
                "replicasets",
                "statefulsets",
            ])),
            verbs: strings(&["create", "delete", "get", "list", "patch", "update", "watch"]),
            ..Default::default()
        },
        PolicyRule {
            api_groups: Some(strings(&["networking.k8s.io"])),
            resources: Some(strings(&["ingresses"])),
            verbs: strings(&["create", "delete", "get", "list", "patch", "update", "watch"]),
            ..Default::default()
        },
        PolicyRule {
            api_groups: Some(strings(&[""])),
            resources: Some(strings(&["events", "limitranges", "resourcequotas"])),
            verbs: strings(&["get", "list", "watch"]),
            ..Default::default()
        },
    ];

    let role = Role {
        metadata: namespaced_meta(config, TENANT_ADMIN_ROLE),
        rules: Some(rules),
    };

    let binding = RoleBinding {
        metadata: namespaced_meta(config, TENANT_ADMIN_ROLE),
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: "Role".to_string(),
            name: TENANT_ADMIN_ROLE.to_string(),
        },
        subjects: Some(vec![Subject {
            api_group: Some(RBAC_API_GROUP.to_string()),
            kind: "Group".to_string(),
            name: admin_group_name(config),
            namespace: None,
        }]),
    };

    (role, binding)
}

/// Namespace-wide totals from the plan's quota tier
pub fn resource_quota(config: &TenantConfig) -> ResourceQuota {
    let quota = &config.plan().quota;
    let hard = BTreeMap::from([
        ("requests.cpu".to_string(), quantity(quota.cpu_requests)),
        ("limits.cpu".to_string(), quantity(quota.cpu_limits)),
        ("requests.memory".to_string(), quantity(quota.memory_requests)),
        ("limits.memory".to_string(), quantity(quota.memory_limits)),
        ("pods".to_string(), quantity(quota.max_pods)),
        ("persistentvolumeclaims".to_string(), quantity(quota.max_pvcs)),
        ("requests.storage".to_string(), quantity(quota.max_storage)),
    ]);

    ResourceQuota {
        metadata: namespaced_meta(config, QUOTA_NAME),
        spec: Some(ResourceQuotaSpec {
            hard: Some(hard),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Per-container defaults and ceilings from the plan's limit tier
pub fn limit_range(config: &TenantConfig) -> LimitRange {
    let limits = &config.plan().limits;

    let cpu_memory = |cpu: blueprint_common::Cpu, memory: blueprint_common::Bytes| {
        BTreeMap::from([
            ("cpu".to_string(), quantity(cpu)),
            ("memory".to_string(), quantity(memory)),
        ])
    };

    let container = LimitRangeItem {
        type_: "Container".to_string(),
        default: Some(cpu_memory(limits.default_cpu_limit, limits.default_memory_limit)),
        default_request: Some(cpu_memory(
            limits.default_cpu_request,
            limits.default_memory_request,
        )),
        max: Some(cpu_memory(
            limits.max_cpu_per_container,
            limits.max_memory_per_container,
        )),
        ..Default::default()
    };

    let pod = LimitRangeItem {
        type_: "Pod".to_string(),
        max: Some(cpu_memory(limits.max_cpu_per_pod, limits.max_memory_per_pod)),
        ..Default::default()
    };

    let pvc = LimitRangeItem {
        type_: "PersistentVolumeClaim".to_string(),
        max: Some(BTreeMap::from([(
            "storage".to_string(),
            quantity(limits.max_pvc_size),
        )])),
        ..Default::default()
    };

    LimitRange {
        metadata: namespaced_meta(config, LIMIT_RANGE_NAME),
        spec: Some(LimitRangeSpec {
            limits: vec![container, pod, pvc],
        }),
    }
}

/// Denies all ingress except from the tenant's own namespace and the ingress
/// controller namespace
pub fn network_policy(config: &TenantConfig) -> NetworkPolicy {
    let same_namespace = NetworkPolicyPeer {
        pod_selector: Some(LabelSelector::default()),
        ..Default::default()
    };

    let ingress_controller = NetworkPolicyPeer {
        namespace_selector: Some(LabelSelector {
            match_labels: Some(BTreeMap::from([(
                LABEL_NAMESPACE_NAME.to_string(),
                INGRESS_CONTROLLER_NAMESPACE.to_string(),
            )])),
            ..Default::default()
        }),
        ..Default::default()
    };

    NetworkPolicy {
        metadata: namespaced_meta(config, NETWORK_POLICY_NAME),
        spec: Some(NetworkPolicySpec {
            pod_selector: LabelSelector::default(),
            policy_types: Some(strings(&["Ingress"])),
            ingress: Some(vec![NetworkPolicyIngressRule {
                from: Some(vec![same_namespace, ingress_controller]),
                ports: None,
            }]),
            egress: None,
        }),
        ..Default::default()
    }
}

/// Routes the tenant domain to the tenant's web Service
pub fn ingress(config: &TenantConfig) -> Ingress {
    let backend = IngressBackend {
        service: Some(IngressServiceBackend {
            name: web_service_name(config),
            port: Some(ServiceBackendPort {
                number: Some(WEB_SERVICE_PORT),
                name: None,
            }),
        }),
        resource: None,
    };

    Ingress {
        metadata: namespaced_meta(config, INGRESS_NAME),
        spec: Some(IngressSpec {
            ingress_class_name: Some(INGRESS_CLASS.to_string()),
            rules: Some(vec![IngressRule {
                host: Some(config.domain().to_string()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".to_string()),
                        path_type: "Prefix".to_string(),
                        backend,
                    }],
                }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(plan: &str) -> TenantConfig {
        TenantConfig::new("acme", plan, "https://x/y.git", "acme.example.com", "a@acme.com").unwrap()
    }

    #[test]
    fn test_namespace_labels() {
        let ns = namespace(&config("growth"));
        assert_eq!(ns.metadata.name.as_deref(), Some("tenant-acme"));
        assert!(ns.metadata.namespace.is_none());
        let labels = ns.metadata.labels.unwrap();
        assert_eq!(labels[LABEL_TENANT], "acme");
        assert_eq!(labels[LABEL_PLAN], "growth");
        assert_eq!(labels[LABEL_MANAGED_BY], "blueprintctl");
    }

    #[test]
    fn test_rbac_is_namespace_scoped() {
        let (role, binding) = rbac(&config("starter"));
        assert_eq!(role.metadata.namespace.as_deref(), Some("tenant-acme"));
        assert_eq!(binding.metadata.namespace.as_deref(), Some("tenant-acme"));
        assert_eq!(binding.role_ref.kind, "Role");
        assert_eq!(binding.role_ref.name, TENANT_ADMIN_ROLE);

        let subjects = binding.subjects.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].name, "tenant-acme-admins");

        // No wildcard grants
        for rule in role.rules.unwrap() {
            assert!(!rule.verbs.iter().any(|v| v == "*"));
            assert!(!rule.resources.unwrap_or_default().iter().any(|r| r == "*"));
        }
    }

    #[test]
    fn test_resource_quota_from_plan() {
        let quota = resource_quota(&config("starter"));
        let hard = quota.spec.unwrap().hard.unwrap();
        assert_eq!(hard["requests.cpu"].0, "1");
        assert_eq!(hard["limits.cpu"].0, "2");
        assert_eq!(hard["requests.memory"].0, "2Gi");
        assert_eq!(hard["limits.memory"].0, "4Gi");
        assert_eq!(hard["pods"].0, "20");
        assert_eq!(hard["persistentvolumeclaims"].0, "5");
        assert_eq!(hard["requests.storage"].0, "50Gi");
    }

    #[test]
    fn test_limit_range_from_plan() {
        let range = limit_range(&config("growth"));
        let items = range.spec.unwrap().limits;
        assert_eq!(items.len(), 3);

        let container = &items[0];
        assert_eq!(container.type_, "Container");
        assert_eq!(container.default.as_ref().unwrap()["cpu"].0, "1");
        assert_eq!(container.default.as_ref().unwrap()["memory"].0, "1Gi");
        assert_eq!(container.default_request.as_ref().unwrap()["cpu"].0, "200m");
        assert_eq!(container.default_request.as_ref().unwrap()["memory"].0, "256Mi");
        assert_eq!(container.max.as_ref().unwrap()["cpu"].0, "2");

        assert_eq!(items[1].type_, "Pod");
        assert_eq!(items[1].max.as_ref().unwrap()["memory"].0, "8Gi");

        assert_eq!(items[2].type_, "PersistentVolumeClaim");
        assert_eq!(items[2].max.as_ref().unwrap()["storage"].0, "50Gi");
    }

    #[test]
    fn test_network_policy_isolates_tenant() {
        let policy = network_policy(&config("starter"));
        let spec = policy.spec.unwrap();
        assert_eq!(spec.policy_types.unwrap(), vec!["Ingress".to_string()]);
        assert!(spec.pod_selector.match_labels.is_none());

        let rules = spec.ingress.unwrap();
        assert_eq!(rules.len(), 1);
        let peers = rules[0].from.as_ref().unwrap();
        assert_eq!(peers.len(), 2);
        assert!(peers[0].pod_selector.is_some());
        assert!(peers[0].namespace_selector.is_none());
        let selector = peers[1].namespace_selector.as_ref().unwrap();
        assert_eq!(
            selector.match_labels.as_ref().unwrap()[LABEL_NAMESPACE_NAME],
            INGRESS_CONTROLLER_NAMESPACE
        );
    }

    #[test]
    fn test_ingress_routes_domain() {
        let ing = ingress(&config("starter"));
        let spec = ing.spec.unwrap();
        assert_eq!(spec.ingress_class_name.as_deref(), Some("nginx"));
        let rule = &spec.rules.unwrap()[0];
        assert_eq!(rule.host.as_deref(), Some("acme.example.com"));
        let path = &rule.http.as_ref().unwrap().paths[0];
        assert_eq!(path.path_type, "Prefix");
        let service = path.backend.service.as_ref().unwrap();
        assert_eq!(service.name, "acme-web");
        assert_eq!(service.port.as_ref().unwrap().number, Some(80));
    }
}
