use anyhow::{Context, Result};
use clap::Parser;
use lifecycle_model::LifecycleManager;

/// Check that the hub's Prometheus reports the `acm_managed_cluster_info` metric of
/// `local-cluster`.
#[derive(Debug, Parser)]
pub(crate) struct Metrics {}

impl Metrics {
    pub(crate) async fn run(self, manager: LifecycleManager) -> Result<()> {
        manager
            .check_metrics()
            .await
            .context("Metrics check failed")?;
        println!("The hub reports the managed cluster metrics.");
        Ok(())
    }
}
