use super::requirements::Requirements;
use super::{error, LifecycleManager, Result};
use crate::constants::{AGENT_ADDON_NAMESPACE, AGENT_NAMESPACE, KLUSTERLET};
use crate::options::ManagedClusterOptions;
use crate::poll::Failure;
use crate::{Klusterlet, ManagedCluster, PollResult, PollSpec};
use log::info;
use snafu::ResultExt;

impl LifecycleManager {
    /// Detach every configured managed cluster.
    pub async fn detach_clusters(&self) -> Result<()> {
        if self.options.clusters.is_empty() {
            info!("No managed clusters to detach");
        }
        for cluster in &self.options.clusters {
            self.detach_cluster(cluster).await?;
        }
        Ok(())
    }

    /// Delete the `ManagedCluster` of an imported cluster and wait until the klusterlet is gone
    /// from the cluster and the cluster namespace is gone from the hub.
    pub async fn detach_cluster(&self, cluster: &ManagedClusterOptions) -> Result<()> {
        let cluster_name = cluster.name.as_str();
        info!(
            "========================= Test cluster detach cluster {} ===============================",
            cluster_name
        );
        let managed_cluster = self.managed_cluster_client(cluster).await?;
        self.check_requirements(cluster_name, &Requirements::import(), PollSpec::DEFAULT)
            .await?;

        info!(
            "Cluster {}: Detaching the {} CR on the hub",
            cluster_name, cluster_name
        );
        let managed_clusters = self.hub.api::<ManagedCluster>();
        self.hub
            .delete(&managed_clusters, cluster_name)
            .await
            .context(error::ClientSnafu {
                action: format!("delete managed cluster '{}'", cluster_name),
            })?;
        self.settle(
            cluster_name,
            self.settle.detached,
            "for cluster to go in Unknown state",
        )
        .await;

        let what = format!("managedCluster '{}' to be deleted", cluster_name);
        self.poll_deleted(
            &self.hub,
            managed_clusters,
            cluster_name,
            &what,
            PollSpec::DETACH,
        )
        .await
        .into_result(what)
        .context(error::PollSnafu)?;

        for namespace in [AGENT_ADDON_NAMESPACE, AGENT_NAMESPACE] {
            self.wait_namespace_deleted(
                &managed_cluster,
                cluster_name,
                namespace,
                PollSpec::DEFAULT,
            )
            .await?;
        }

        info!(
            "Cluster {}: Checking if the {} crd is deleted",
            cluster_name, KLUSTERLET
        );
        let what = format!("{} to be deleted from cluster '{}'", KLUSTERLET, cluster_name);
        let result = self
            .poll_deleted(
                &managed_cluster,
                managed_cluster.api::<Klusterlet>(),
                KLUSTERLET,
                &what,
                PollSpec::DEFAULT,
            )
            .await;
        klusterlet_known_issue(result, cluster_name)
            .into_result(what)
            .context(error::PollSnafu)?;

        self.wait_namespace_deleted(&self.hub, cluster_name, cluster_name, PollSpec::DEFAULT)
            .await
    }
}

/// A klusterlet that outlives the detach is a known defect, report it as such.
fn klusterlet_known_issue(result: PollResult, cluster_name: &str) -> PollResult {
    match result {
        PollResult::TimedOut { elapsed, .. } => PollResult::TerminalFailure(Failure::known_issue(
            "KlusterletNotDeleted",
            format!(
                "the klusterlet of cluster '{}' still exists {:?} after the detach",
                cluster_name, elapsed
            ),
        )),
        other => other,
    }
}
