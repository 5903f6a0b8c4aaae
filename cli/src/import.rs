use anyhow::{Context, Result};
use clap::Parser;
use lifecycle_model::LifecycleManager;

/// Import the managed clusters listed in the options file.
#[derive(Debug, Parser)]
pub(crate) struct Import {}

impl Import {
    pub(crate) async fn run(self, manager: LifecycleManager) -> Result<()> {
        manager
            .import_clusters()
            .await
            .context("Unable to import the managed clusters")?;
        println!(
            "Successfully imported {} cluster(s).",
            manager.options().clusters.len()
        );
        Ok(())
    }
}

/// Check that the hub imported itself as `local-cluster`.
#[derive(Debug, Parser)]
pub(crate) struct ImportHub {}

impl ImportHub {
    pub(crate) async fn run(self, manager: LifecycleManager) -> Result<()> {
        manager
            .check_hub_import()
            .await
            .context("The hub did not import itself")?;
        println!("The hub is imported as 'local-cluster'.");
        Ok(())
    }
}
