use crate::condition::impl_has_conditions;
use crate::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A set of manifests the hub delivers to a managed cluster. The import controller creates two of
/// them for every imported cluster, see [`klusterlet_manifest_works`].
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    derive = "Default",
    derive = "PartialEq",
    group = "work.open-cluster-management.io",
    kind = "ManifestWork",
    namespaced,
    plural = "manifestworks",
    singular = "manifestwork",
    status = "ManifestWorkStatus",
    version = "v1"
)]
#[serde(rename_all = "camelCase")]
pub struct ManifestWorkSpec {
    #[serde(default)]
    pub workload: Workload,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
pub struct Workload {
    #[serde(default)]
    pub manifests: Vec<Value>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
pub struct ManifestWorkStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl_has_conditions!(ManifestWork);

/// The names of the manifest works that deliver the klusterlet CRDs and the klusterlet itself to
/// `cluster_name`.
pub fn klusterlet_manifest_works(cluster_name: &str) -> [String; 2] {
    [
        format!("{}-klusterlet-crds", cluster_name),
        format!("{}-klusterlet", cluster_name),
    ]
}

#[test]
fn manifest_work_names() {
    assert_eq!(
        klusterlet_manifest_works("local-cluster"),
        [
            "local-cluster-klusterlet-crds".to_string(),
            "local-cluster-klusterlet".to_string()
        ]
    );
}
