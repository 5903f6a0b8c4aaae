use super::{error, Result};
use crate::applier::Applier;
use crate::clients::ClusterClient;
use crate::options::ManagedClusterOptions;
use crate::Options;
use log::info;
use snafu::ResultExt;
use std::path::Path;
use std::time::Duration;

/// Pauses between steps that give the hub and klusterlet controllers time to act before the next
/// step starts checking on them.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Settle {
    /// After the `ManagedCluster` of a cluster being imported is created.
    pub managed_cluster_created: Duration,
    /// After the klusterlet CRDs are applied to a cluster being imported.
    pub crds_applied: Duration,
    /// After `import.yaml` is applied to a cluster being imported.
    pub import_applied: Duration,
    /// Before checking the klusterlet manifest works of an imported cluster.
    pub manifest_works: Duration,
    /// Before checking the add-ons of a new or imported cluster.
    pub addons: Duration,
    /// After a `ManagedCluster` is deleted, before checking that it was detached.
    pub detached: Duration,
}

impl Default for Settle {
    fn default() -> Self {
        Self {
            managed_cluster_created: Duration::from_secs(10),
            crds_applied: Duration::from_secs(2),
            import_applied: Duration::from_secs(60),
            manifest_works: Duration::from_secs(3 * 60),
            addons: Duration::from_secs(3 * 60),
            detached: Duration::from_secs(20 * 60),
        }
    }
}

impl Settle {
    /// Do not pause at all, the waits alone decide when a step is done.
    pub const NONE: Settle = Settle {
        managed_cluster_created: Duration::ZERO,
        crds_applied: Duration::ZERO,
        import_applied: Duration::ZERO,
        manifest_works: Duration::ZERO,
        addons: Duration::ZERO,
        detached: Duration::ZERO,
    };
}

/// # Lifecycle Manager
///
/// The lifecycle manager runs the cluster lifecycle scenarios against a hub cluster:
/// - create a cluster with Hive on AWS, Azure, GCP or bare metal
/// - import existing clusters and check that the hub imported itself
/// - detach imported clusters
/// - destroy created clusters
/// - check the managed cluster metrics of the hub
///
/// Every scenario waits for the hub to reach the expected state with a
/// [`PollSpec`](crate::PollSpec) and fails with a [`Error::Poll`](super::Error::Poll) when it
/// does not.
pub struct LifecycleManager {
    pub(super) hub: ClusterClient,
    pub(super) options: Options,
    pub(super) applier: Applier,
    pub(super) settle: Settle,
}

impl LifecycleManager {
    /// Create a `LifecycleManager` for the hub described by `options`.
    pub async fn from_options(options: Options) -> Result<Self> {
        let kubeconfig = options.hub_kubeconfig().context(error::OptionsSnafu)?;
        let hub = ClusterClient::from_kubeconfig_path(
            Path::new(kubeconfig),
            options.hub.kube_context.as_deref(),
            Some(options.hub.api_server_url.as_str()),
        )
        .await
        .context(error::ClientSnafu {
            action: "create hub client",
        })?;
        Self::new(hub, options)
    }

    /// Create a `LifecycleManager` from an existing hub client.
    pub fn new(hub: ClusterClient, options: Options) -> Result<Self> {
        Ok(Self {
            hub,
            options,
            applier: Applier::new().context(error::ApplySnafu {
                action: "load templates",
            })?,
            settle: Settle::default(),
        })
    }

    pub fn with_settle(mut self, settle: Settle) -> Self {
        self.settle = settle;
        self
    }

    pub fn hub(&self) -> &ClusterClient {
        &self.hub
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// A client for one of the configured managed clusters.
    pub async fn managed_cluster_client(
        &self,
        cluster: &ManagedClusterOptions,
    ) -> Result<ClusterClient> {
        let kubeconfig = self
            .options
            .cluster_kubeconfig(cluster)
            .context(error::OptionsSnafu)?;
        ClusterClient::from_kubeconfig_path(
            Path::new(kubeconfig),
            cluster.kube_context.as_deref(),
            Some(cluster.api_server_url.as_str()),
        )
        .await
        .context(error::ClientSnafu {
            action: format!("create client for cluster '{}'", cluster.name),
        })
    }

    pub(super) async fn settle(&self, cluster_name: &str, duration: Duration, why: &str) {
        if duration.is_zero() {
            return;
        }
        info!("Cluster {}: Wait {:?} {}", cluster_name, duration, why);
        tokio::time::sleep(duration).await;
    }
}
