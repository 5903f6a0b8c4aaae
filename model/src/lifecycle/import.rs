use super::requirements::Requirements;
use super::{error, LifecycleManager, Result};
use crate::applier::{apply_yaml, templates};
use crate::constants::{IMPORT_CRDS_V1, IMPORT_CRDS_V1BETA1, IMPORT_YAML, LOCAL_CLUSTER};
use crate::options::ManagedClusterOptions;
use crate::{ManagedCluster, PollOutcome, PollSpec};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::version::Info;
use log::{debug, info};
use minijinja::context;
use snafu::{ensure, OptionExt, ResultExt};

/// `apiextensions.k8s.io/v1` CRDs are applied to clusters newer than this.
const CRDS_V1_AFTER: (u64, u64, u64) = (1, 16, 0);

/// `(major, minor, patch)` of a git version such as `v1.21.1+6438632`.
fn parse_version(git_version: &str) -> Option<(u64, u64, u64)> {
    let version = git_version.trim_start_matches('v');
    let version = version
        .split(|c: char| c == '+' || c == '-')
        .next()
        .unwrap_or_default();
    let mut parts = version.split('.').map(str::parse::<u64>);
    let major = parts.next()?.ok()?;
    let minor = parts.next()?.ok()?;
    let patch = match parts.next() {
        Some(patch) => patch.ok()?,
        None => 0,
    };
    Some((major, minor, patch))
}

/// The key of the import secret holding the klusterlet CRDs for a cluster at `version`.
pub(crate) fn import_crds_key(version: &Info) -> Result<&'static str> {
    let parsed = parse_version(&version.git_version).context(error::ServerVersionSnafu {
        version: &version.git_version,
    })?;
    if parsed > CRDS_V1_AFTER {
        Ok(IMPORT_CRDS_V1)
    } else {
        Ok(IMPORT_CRDS_V1BETA1)
    }
}

fn import_secret_name(cluster_name: &str) -> String {
    format!("{}-import", cluster_name)
}

impl LifecycleManager {
    /// Import every configured managed cluster.
    pub async fn import_clusters(&self) -> Result<()> {
        if self.options.clusters.is_empty() {
            info!("No managed clusters to import");
        }
        for cluster in &self.options.clusters {
            self.import_cluster(cluster).await?;
        }
        Ok(())
    }

    /// Import an existing cluster by applying the manifests of its import secret to it, then wait
    /// until the hub reports it available with its manifest works applied and add-ons available.
    pub async fn import_cluster(&self, cluster: &ManagedClusterOptions) -> Result<()> {
        let cluster_name = cluster.name.as_str();
        info!(
            "========================= Test cluster import cluster {} ===============================",
            cluster_name
        );
        let managed_cluster = self.managed_cluster_client(cluster).await?;
        self.check_requirements(cluster_name, &Requirements::import(), PollSpec::DEFAULT)
            .await?;

        info!(
            "Cluster {}: Creating the namespace in which the cluster will be imported",
            cluster_name
        );
        self.hub
            .ensure_namespace(cluster_name)
            .await
            .context(error::ClientSnafu {
                action: format!("create namespace '{}'", cluster_name),
            })?;

        info!(
            "Cluster {}: Creating the managedCluster and klusterletaddonconfig",
            cluster_name
        );
        for template in [
            templates::IMPORT_MANAGED_CLUSTER,
            templates::IMPORT_KLUSTERLET_ADDON_CONFIG,
        ] {
            self.apply(
                template,
                context! { managed_cluster_name => cluster_name },
                "create import resources",
            )
            .await?;
        }
        self.settle(
            cluster_name,
            self.settle.managed_cluster_created,
            "for the import controller",
        )
        .await;

        let secret_name = import_secret_name(cluster_name);
        self.wait_import_secret(cluster_name, &secret_name).await?;

        info!("Cluster {}: Apply the crds.yaml", cluster_name);
        let version = managed_cluster
            .server_version()
            .await
            .context(error::ClientSnafu {
                action: format!("get the server version of cluster '{}'", cluster_name),
            })?;
        let crds_key = import_crds_key(&version)?;
        debug!(
            "Cluster {}: server version {}, applying {}",
            cluster_name, version.git_version, crds_key
        );
        let crds = self.import_secret_value(cluster_name, &secret_name, crds_key).await?;
        apply_yaml(&managed_cluster, &crds, crds_key)
            .await
            .context(error::ApplySnafu {
                action: format!("apply {} to cluster '{}'", crds_key, cluster_name),
            })?;
        self.settle(
            cluster_name,
            self.settle.crds_applied,
            "for the CRDs to be established",
        )
        .await;

        info!("Cluster {}: Apply the import.yaml", cluster_name);
        let import = self
            .import_secret_value(cluster_name, &secret_name, IMPORT_YAML)
            .await?;
        apply_yaml(&managed_cluster, &import, IMPORT_YAML)
            .await
            .context(error::ApplySnafu {
                action: format!("apply {} to cluster '{}'", IMPORT_YAML, cluster_name),
            })?;
        self.settle(
            cluster_name,
            self.settle.import_applied,
            "for the klusterlet to register",
        )
        .await;

        self.wait_cluster_imported(cluster_name, PollSpec::DEFAULT)
            .await?;
        self.settle(
            cluster_name,
            self.settle.manifest_works,
            "for the manifest works",
        )
        .await;
        self.wait_manifest_works_applied(cluster_name, PollSpec::DEFAULT)
            .await?;
        self.settle(cluster_name, self.settle.addons, "to settle")
            .await;
        self.wait_addons_available(cluster_name).await
    }

    /// Check that the hub imported itself as `local-cluster`.
    pub async fn check_hub_import(&self) -> Result<()> {
        let cluster_name = LOCAL_CLUSTER;
        info!(
            "========================= Test cluster import hub {} ===============================",
            cluster_name
        );
        self.check_requirements(
            cluster_name,
            &Requirements::self_import(),
            PollSpec::SELF_IMPORT,
        )
        .await?;

        let namespace = self
            .hub
            .namespace_exists(cluster_name)
            .await
            .context(error::ClientSnafu {
                action: format!("get namespace '{}'", cluster_name),
            })?;
        ensure!(
            namespace,
            error::NotFoundSnafu {
                what: format!("namespace '{}'", cluster_name),
            }
        );
        info!("Cluster {}: Namespace {} is present", cluster_name, cluster_name);

        let managed_cluster = self
            .hub
            .get_opt(&self.hub.api::<ManagedCluster>(), cluster_name)
            .await
            .context(error::ClientSnafu {
                action: "get managed cluster",
            })?;
        ensure!(
            managed_cluster.is_some(),
            error::NotFoundSnafu {
                what: format!("managedCluster '{}'", cluster_name),
            }
        );
        info!(
            "Cluster {}: ManagedCluster resource {} is present",
            cluster_name, cluster_name
        );

        self.wait_cluster_imported(cluster_name, PollSpec::SELF_IMPORT)
            .await?;
        self.wait_manifest_works_applied(cluster_name, PollSpec::SELF_IMPORT)
            .await?;
        self.wait_addons_available(cluster_name).await
    }

    async fn wait_import_secret(&self, cluster_name: &str, secret_name: &str) -> Result<()> {
        let hub = &self.hub;
        let api = &hub.namespaced_api::<Secret>(cluster_name);
        PollSpec::DEFAULT
            .wait(
                &format!("import secret '{}'", secret_name),
                move || async move {
                    match hub.get_opt(api, secret_name).await {
                        Ok(secret) => PollOutcome::from_bool(secret.is_some(), "not found"),
                        Err(e) => PollOutcome::pending(e.to_string()),
                    }
                },
            )
            .await
            .context(error::PollSnafu)?;
        info!(
            "Cluster {}: bootstrap import secret {} created",
            cluster_name, secret_name
        );
        Ok(())
    }

    async fn import_secret_value(
        &self,
        cluster_name: &str,
        secret_name: &str,
        key: &str,
    ) -> Result<String> {
        self.hub
            .secret_value(cluster_name, secret_name, key)
            .await
            .context(error::ClientSnafu {
                action: format!("read '{}' from the import secret", key),
            })
    }
}
