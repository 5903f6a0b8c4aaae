use crate::condition::impl_has_conditions;
use crate::Condition;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A cluster being installed (or already installed) by Hive.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    derive = "Default",
    derive = "PartialEq",
    group = "hive.openshift.io",
    kind = "ClusterDeployment",
    namespaced,
    plural = "clusterdeployments",
    singular = "clusterdeployment",
    status = "ClusterDeploymentStatus",
    version = "v1"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentSpec {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub base_domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning: Option<Provisioning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_secret_ref: Option<LocalObjectReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_metadata: Option<ClusterMetadata>,
    #[serde(default)]
    pub installed: bool,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Provisioning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_set_ref: Option<LocalObjectReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_config_secret_ref: Option<LocalObjectReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_private_key_secret_ref: Option<LocalObjectReference>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetadata {
    #[serde(rename = "clusterID", default)]
    pub cluster_id: String,
    #[serde(rename = "infraID", default)]
    pub infra_id: String,
    #[serde(default)]
    pub admin_kubeconfig_secret_ref: LocalObjectReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password_secret_ref: Option<LocalObjectReference>,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
pub struct LocalObjectReference {
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_timestamp: Option<String>,
    #[serde(rename = "apiURL", default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(rename = "webConsoleURL", default, skip_serializing_if = "Option::is_none")]
    pub web_console_url: Option<String>,
}

impl_has_conditions!(ClusterDeployment);

impl ClusterDeployment {
    /// `true` once Hive has recorded when the installation finished.
    pub fn is_installed(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.installed_timestamp.as_ref())
            .is_some()
    }

    /// The name of the secret holding the admin kubeconfig of the installed cluster.
    pub fn admin_kubeconfig_secret(&self) -> Option<&str> {
        self.spec
            .cluster_metadata
            .as_ref()
            .map(|metadata| metadata.admin_kubeconfig_secret_ref.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// An OpenShift release image that Hive can install.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    derive = "Default",
    derive = "PartialEq",
    group = "hive.openshift.io",
    kind = "ClusterImageSet",
    plural = "clusterimagesets",
    singular = "clusterimageset",
    version = "v1"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterImageSetSpec {
    pub release_image: String,
}

/// Compare two image set names such as `img4.6.3-x86-64-appsub`.
///
/// Names equal ignoring case are equal. A name with the `img` prefix is greater than one without.
/// Otherwise the dot separated components of the version (the part before the first `-`, with
/// `img` stripped) are compared in order: a longer component is greater and components of equal
/// length compare lexically. When one version runs out of components first they are equal.
pub fn compare_image_version(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return Ordering::Equal;
    }
    match (a.starts_with("img"), b.starts_with("img")) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    let version_a = version_part(&a);
    let version_b = version_part(&b);
    if version_a == version_b {
        return Ordering::Equal;
    }
    for (x, y) in version_a.split('.').zip(version_b.split('.')) {
        let ordering = x.len().cmp(&y.len()).then_with(|| x.cmp(y));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// The first `-` separated segment with any leading or trailing `i`, `m` and `g` removed.
fn version_part(name: &str) -> &str {
    name.split('-')
        .next()
        .unwrap_or_default()
        .trim_matches(|c| matches!(c, 'i' | 'm' | 'g'))
}

/// The image set with the greatest name according to [`compare_image_version`]. Among equal
/// names the first one wins.
pub fn latest_image_set<'a, I>(image_sets: I) -> Option<&'a ClusterImageSet>
where
    I: IntoIterator<Item = &'a ClusterImageSet>,
{
    image_sets.into_iter().fold(None, |latest, candidate| match latest {
        Some(current)
            if compare_image_version(&current.name_any(), &candidate.name_any())
                != Ordering::Less =>
        {
            Some(current)
        }
        _ => Some(candidate),
    })
}

/// The name of the image set created for a release image such as
/// `quay.io/openshift-release-dev/ocp-release:4.10.3-x86_64`. Returns `None` when the image has
/// no tag.
pub fn image_set_name(release_image: &str, uid: &str) -> Option<String> {
    let mut parts = release_image.split(':');
    let (_, tag) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(format!("{}-{}", tag.replace('_', "-").to_lowercase(), uid))
}
