use crate::condition::impl_has_conditions;
use crate::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cluster registered with the hub. The `CustomResource` derive also produces a struct named
/// `ManagedCluster` which represents the cluster scoped object in the k8s API.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    derive = "Default",
    derive = "PartialEq",
    group = "cluster.open-cluster-management.io",
    kind = "ManagedCluster",
    plural = "managedclusters",
    singular = "managedcluster",
    status = "ManagedClusterStatus",
    version = "v1"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    #[serde(default)]
    pub hub_accepts_client: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_cluster_client_configs: Vec<ClientConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_duration_seconds: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ManagedClusterVersion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capacity: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<String>,
}

impl_has_conditions!(ManagedCluster);

/// An add-on installed on a managed cluster, living in the cluster's namespace on the hub.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    derive = "Default",
    derive = "PartialEq",
    group = "addon.open-cluster-management.io",
    kind = "ManagedClusterAddOn",
    namespaced,
    plural = "managedclusteraddons",
    singular = "managedclusteraddon",
    status = "ManagedClusterAddOnStatus",
    version = "v1alpha1"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAddOnSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_namespace: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
pub struct ManagedClusterAddOnStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl_has_conditions!(ManagedClusterAddOn);

/// Information the hub collects about a managed cluster.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    derive = "Default",
    derive = "PartialEq",
    group = "internal.open-cluster-management.io",
    kind = "ManagedClusterInfo",
    namespaced,
    plural = "managedclusterinfos",
    singular = "managedclusterinfo",
    status = "ManagedClusterInfoStatus",
    version = "v1beta1"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterInfoSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_endpoint: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterInfoStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(rename = "clusterID", default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl_has_conditions!(ManagedClusterInfo);

impl ManagedClusterInfo {
    /// The cluster id reported by the cluster, if any. An empty id counts as missing.
    pub fn cluster_id(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|status| status.cluster_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::HasConditions;
    use kube::Resource;

    #[test]
    fn managed_cluster_from_api_json() {
        let json = r#"{
            "apiVersion": "cluster.open-cluster-management.io/v1",
            "kind": "ManagedCluster",
            "metadata": {"name": "aws-e2e-abcde"},
            "spec": {
                "hubAcceptsClient": true,
                "managedClusterClientConfigs": [{"url": "https://api.example.com:6443"}]
            },
            "status": {
                "conditions": [
                    {"type": "HubAcceptedManagedCluster", "status": "True"},
                    {"type": "ManagedClusterConditionAvailable", "status": "True"}
                ],
                "version": {"kubernetes": "v1.24.0"}
            }
        }"#;
        let cluster: ManagedCluster = serde_json::from_str(json).unwrap();
        assert!(cluster.spec.hub_accepts_client);
        assert!(cluster.is_condition_true("ManagedClusterConditionAvailable"));
        assert_eq!(
            cluster
                .status
                .and_then(|status| status.version)
                .and_then(|version| version.kubernetes)
                .as_deref(),
            Some("v1.24.0")
        );
    }

    #[test]
    fn managed_cluster_without_status() {
        let cluster = ManagedCluster::new("local-cluster", ManagedClusterSpec::default());
        assert!(cluster.conditions().is_empty());
        assert!(!cluster.is_condition_true("ManagedClusterConditionAvailable"));
    }

    #[test]
    fn resource_names() {
        assert_eq!(ManagedCluster::plural(&()), "managedclusters");
        assert_eq!(
            ManagedClusterAddOn::api_version(&()),
            "addon.open-cluster-management.io/v1alpha1"
        );
        assert_eq!(ManagedClusterInfo::kind(&()), "ManagedClusterInfo");
    }

    #[test]
    fn cluster_id() {
        let mut info = ManagedClusterInfo::new("local-cluster", Default::default());
        assert!(info.cluster_id().is_none());
        info.status = Some(ManagedClusterInfoStatus {
            cluster_id: Some(String::new()),
            ..Default::default()
        });
        assert!(info.cluster_id().is_none());
        info.status = serde_json::from_str(r#"{"clusterID": "1234-abcd"}"#).unwrap();
        assert_eq!(info.cluster_id(), Some("1234-abcd"));
    }
}
