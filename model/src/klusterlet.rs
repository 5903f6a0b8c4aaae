use crate::condition::impl_has_conditions;
use crate::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The registration agent configuration on a managed cluster. There is exactly one, named
/// `klusterlet`.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    derive = "Default",
    derive = "PartialEq",
    group = "operator.open-cluster-management.io",
    kind = "Klusterlet",
    plural = "klusterlets",
    singular = "klusterlet",
    status = "KlusterletStatus",
    version = "v1"
)]
#[serde(rename_all = "camelCase")]
pub struct KlusterletSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_image_pull_spec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_image_pull_spec: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
pub struct KlusterletStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl_has_conditions!(Klusterlet);
