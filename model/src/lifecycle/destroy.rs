use super::requirements::Requirements;
use super::{error, LifecycleManager, Result};
use crate::options::ClusterName;
use crate::{Cloud, ClusterDeployment, ManagedCluster, PollSpec};
use kube::api::ListParams;
use kube::{Api, ResourceExt};
use log::info;
use snafu::{OptionExt, ResultExt};

/// The first name that starts with `prefix`.
fn find_cluster<'a, I>(names: I, prefix: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .find(|name| name.starts_with(prefix))
        .map(ToString::to_string)
}

impl LifecycleManager {
    /// Destroy the cluster this owner created on `cloud` and wait until Hive removed it. Returns
    /// `None` when `cloud` is not in `cloud_providers`.
    pub async fn destroy_cluster(
        &self,
        cloud: Cloud,
        vendor: &str,
        cloud_providers: &str,
    ) -> Result<Option<String>> {
        if !cloud.is_requested(cloud_providers) {
            info!("Cloud provider {} skipped", cloud);
            return Ok(None);
        }

        let prefix = ClusterName::prefix(cloud, &self.options.owner_prefix);
        let cluster_deployments = Api::<ClusterDeployment>::all(self.hub.k8s_client())
            .list(&ListParams::default())
            .await
            .context(error::KubeSnafu {
                action: "list cluster deployments",
            })?;
        let names: Vec<String> = cluster_deployments.iter().map(|cd| cd.name_any()).collect();
        let cluster_name = find_cluster(names.iter().map(String::as_str), &prefix).context(
            error::NotFoundSnafu {
                what: format!("a cluster for cloud provider {} to delete", cloud),
            },
        )?;
        // Bare metal still requires a deployment with the owner prefix to exist, but the one that
        // is deleted is the configured bare metal cluster.
        let cluster_name = if cloud.is_baremetal() {
            self.options
                .baremetal_cluster_name()
                .context(error::OptionsSnafu)?
                .to_string()
        } else {
            cluster_name
        };
        let cluster_name = cluster_name.as_str();
        info!(
            "========================= Start Test destroy cluster {} on {} with vendor {} ===============================",
            cluster_name, cloud, vendor
        );

        self.check_requirements(
            cluster_name,
            &Requirements::provisioning(false),
            PollSpec::DEFAULT,
        )
        .await?;

        info!(
            "Cluster {}: Detaching the {} CR on the hub",
            cluster_name, cluster_name
        );
        self.hub
            .delete(&self.hub.api::<ManagedCluster>(), cluster_name)
            .await
            .context(error::ClientSnafu {
                action: format!("delete managed cluster '{}'", cluster_name),
            })?;

        info!(
            "Cluster {}: Deleting the clusterDeployment for cluster {}",
            cluster_name, cluster_name
        );
        let cluster_deployments = self.hub.namespaced_api::<ClusterDeployment>(cluster_name);
        self.hub
            .delete(&cluster_deployments, cluster_name)
            .await
            .context(error::ClientSnafu {
                action: format!("delete cluster deployment '{}'", cluster_name),
            })?;

        let what = format!("clusterDeployment '{}' to be deleted", cluster_name);
        self.poll_deleted(
            &self.hub,
            cluster_deployments,
            cluster_name,
            &what,
            PollSpec::DELETION,
        )
        .await
        .into_result(what)
        .context(error::PollSnafu)?;
        info!(
            "Cluster {}: {} clusterDeployment deleted",
            cluster_name, cluster_name
        );

        self.wait_namespace_deleted(&self.hub, cluster_name, cluster_name, PollSpec::DELETION)
            .await?;
        info!(
            "========================= End Test destroy cluster {} ===============================",
            cluster_name
        );
        Ok(Some(cluster_name.to_string()))
    }
}
