/// Helper macro to avoid retyping the base domain-like name of the open cluster management API
/// groups when creating further string constants from it. When given no parameters, this returns
/// the base domain. When given a string literal parameter it prefixes it as a subdomain.
macro_rules! ocm {
    () => {
        "open-cluster-management.io"
    };
    ($s:literal) => {
        concat!($s, ".", ocm!())
    };
}

// API groups
pub const GROUP_AGENT: &str = ocm!("agent");
pub const GROUP_CLUSTER: &str = ocm!("cluster");
pub const GROUP_WORK: &str = ocm!("work");
pub const GROUP_HIVE: &str = "hive.openshift.io";

// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "lifecycle-e2e";

// Well known names
pub const LOCAL_CLUSTER: &str = "local-cluster";
pub const KLUSTERLET: &str = "klusterlet";
pub const PULL_SECRET: &str = "pull-secret";
pub const OPENSHIFT_CONFIG_NAMESPACE: &str = "openshift-config";

// Namespaces on the managed cluster
pub const AGENT_NAMESPACE: &str = "open-cluster-management-agent";
pub const AGENT_ADDON_NAMESPACE: &str = "open-cluster-management-agent-addon";

// Condition types
pub const CONDITION_AVAILABLE: &str = "Available";
pub const CONDITION_APPLIED: &str = "Applied";
pub const CONDITION_CLUSTER_AVAILABLE: &str = "ManagedClusterConditionAvailable";
pub const CONDITION_PROVISION_FAILED: &str = "ProvisionFailed";

// Keys of the import secret generated by the import controller
pub const IMPORT_CRDS_V1: &str = "crdsv1.yaml";
pub const IMPORT_CRDS_V1BETA1: &str = "crdsv1beta1.yaml";
pub const IMPORT_YAML: &str = "import.yaml";

/// The add-ons which must become available on every managed cluster.
pub const ADDONS: [&str; 6] = [
    "application-manager",
    "cert-policy-controller",
    "iam-policy-controller",
    "governance-policy-framework",
    "search-collector",
    "work-manager",
];

/// The add-on that is not deployed to the hub's own `local-cluster`.
pub const ADDON_SEARCH_COLLECTOR: &str = "search-collector";

// Environment variables
pub const ENV_KUBECONFIG: &str = "KUBECONFIG";
pub const ENV_IMPORT_KUBECONFIG: &str = "IMPORT_KUBECONFIG";
pub const ENV_HUB_TOKEN: &str = "HUB_TOKEN";

// Remediation documentation
macro_rules! analysis_doc {
    ($anchor:literal) => {
        concat!(
            "https://github.com/stolostron/cluster-lifecycle-e2e/blob/main/doc/e2eFailedAnalysis.md#",
            $anchor
        )
    };
}

pub const LINK_DETACH_KNOWN_ISSUE: &str = analysis_doc!("klusterlet-crd-can-not-be-deleted");
pub const LINK_QUOTA_LIMIT: &str = analysis_doc!("quota-limit-in-awsazuregcp");
pub const LINK_PROVISION_UNKNOWN_ERROR: &str =
    analysis_doc!("cloud-providerawsgcpazure-bug-or-ocp-installer-bug");
pub const LINK_UNKNOWN_ERROR: &str = analysis_doc!("unknown-error");

#[test]
fn ocm_constants_macro_test() {
    assert_eq!("open-cluster-management.io", ocm!());
    assert_eq!("cluster.open-cluster-management.io", GROUP_CLUSTER);
    assert_eq!("work.open-cluster-management.io", ocm!("work"));
    assert!(LINK_UNKNOWN_ERROR.ends_with("e2eFailedAnalysis.md#unknown-error"));
}
