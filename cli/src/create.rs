use anyhow::{Context, Result};
use clap::Parser;
use lifecycle_model::{Cloud, LifecycleManager};
use log::error;

/// Create a cluster on each requested cloud provider and import it into the hub.
#[derive(Debug, Parser)]
pub(crate) struct Create {
    /// Comma separated cloud providers to create clusters on, e.g. `aws,gcp`. When empty, aws,
    /// azure and gcp are used; baremetal must be named.
    #[clap(long = "cloud-providers", default_value = "")]
    cloud_providers: String,

    /// The vendor label of the created managed clusters.
    #[clap(long = "vendor", default_value = "OpenShift")]
    vendor: String,
}

impl Create {
    pub(crate) async fn run(self, manager: LifecycleManager) -> Result<()> {
        let mut failed = Vec::new();
        for cloud in Cloud::requested(&self.cloud_providers) {
            match manager
                .create_cluster(cloud, &self.vendor, &self.cloud_providers)
                .await
            {
                Ok(Some(name)) => println!("Successfully created cluster '{}'.", name),
                Ok(None) => {}
                Err(e) => {
                    error!("Unable to create a cluster on {}: {}", cloud, e);
                    failed.push(cloud.to_string());
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("{}", failed.join(", ")))
                .context("Cluster creation failed on cloud providers")
        }
    }
}
