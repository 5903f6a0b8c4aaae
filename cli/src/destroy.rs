use anyhow::{Context, Result};
use clap::Parser;
use lifecycle_model::{Cloud, LifecycleManager};
use log::error;

/// Destroy the cluster created on each requested cloud provider.
#[derive(Debug, Parser)]
pub(crate) struct Destroy {
    /// Comma separated cloud providers to destroy clusters on, e.g. `aws,gcp`. When empty, aws,
    /// azure and gcp are used; baremetal must be named.
    #[clap(long = "cloud-providers", default_value = "")]
    cloud_providers: String,

    /// The vendor label of the managed clusters.
    #[clap(long = "vendor", default_value = "OpenShift")]
    vendor: String,
}

impl Destroy {
    pub(crate) async fn run(self, manager: LifecycleManager) -> Result<()> {
        let mut failed = Vec::new();
        for cloud in Cloud::requested(&self.cloud_providers) {
            match manager
                .destroy_cluster(cloud, &self.vendor, &self.cloud_providers)
                .await
            {
                Ok(Some(name)) => println!("Successfully destroyed cluster '{}'.", name),
                Ok(None) => {}
                Err(e) => {
                    error!("Unable to destroy the cluster on {}: {}", cloud, e);
                    failed.push(cloud.to_string());
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("{}", failed.join(", ")))
                .context("Cluster destruction failed on cloud providers")
        }
    }
}
