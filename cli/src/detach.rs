use anyhow::{Context, Result};
use clap::Parser;
use lifecycle_model::LifecycleManager;

/// Detach the managed clusters listed in the options file.
#[derive(Debug, Parser)]
pub(crate) struct Detach {}

impl Detach {
    pub(crate) async fn run(self, manager: LifecycleManager) -> Result<()> {
        manager
            .detach_clusters()
            .await
            .context("Unable to detach the managed clusters")?;
        println!(
            "Successfully detached {} cluster(s).",
            manager.options().clusters.len()
        );
        Ok(())
    }
}
