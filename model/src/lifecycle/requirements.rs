use super::{error, LifecycleManager, Result};
use crate::constants::{GROUP_AGENT, GROUP_CLUSTER, GROUP_HIVE, GROUP_WORK};
use crate::{PollOutcome, PollSpec};
use log::{error, info};
use snafu::ResultExt;

const NAMESPACE_IMPORT_CONTROLLER: &str = "multicluster-engine";
const NAMESPACE_ADDON_CONTROLLER: &str = "open-cluster-management";
const NAMESPACE_HUB: &str = "open-cluster-management-hub";
const NAMESPACE_HIVE: &str = "hive";

const IMPORT_CONTROLLER: &str = "managedcluster-import-controller-v2";
const ADDON_CONTROLLER: &str = "klusterlet-addon-controller-v2";
const REGISTRATION_CONTROLLER: &str = "cluster-manager-registration-controller";
const HIVE_CONTROLLERS: &str = "hive-controllers";

/// The CRDs and controller deployments that must be on the hub before a scenario can run.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Requirements {
    pub crds: Vec<String>,
    /// `(namespace, deployments)`
    pub deployments: Vec<(&'static str, Vec<&'static str>)>,
}

fn crd(plural: &str, group: &str) -> String {
    format!("{}.{}", plural, group)
}

impl Requirements {
    /// Creating or destroying a cluster with Hive. `addons` adds the klusterlet add-on controller,
    /// which only the create scenario depends on.
    pub fn provisioning(addons: bool) -> Self {
        let mut deployments = vec![
            (NAMESPACE_IMPORT_CONTROLLER, vec![IMPORT_CONTROLLER]),
            (NAMESPACE_HUB, vec![REGISTRATION_CONTROLLER]),
            (NAMESPACE_HIVE, vec![HIVE_CONTROLLERS]),
        ];
        if addons {
            deployments.insert(1, (NAMESPACE_ADDON_CONTROLLER, vec![ADDON_CONTROLLER]));
        }
        Self {
            crds: vec![
                crd("managedclusters", GROUP_CLUSTER),
                crd("clusterdeployments", GROUP_HIVE),
                crd("syncsets", GROUP_HIVE),
            ],
            deployments,
        }
    }

    /// Importing or detaching existing clusters.
    pub fn import() -> Self {
        Self {
            crds: vec![
                crd("managedclusters", GROUP_CLUSTER),
                crd("manifestworks", GROUP_WORK),
                crd("klusterletaddonconfigs", GROUP_AGENT),
            ],
            deployments: Self::import_deployments(),
        }
    }

    /// Checking that the hub imported itself.
    pub fn self_import() -> Self {
        Self {
            crds: vec![
                crd("managedclusters", GROUP_CLUSTER),
                crd("manifestworks", GROUP_WORK),
            ],
            deployments: Self::import_deployments(),
        }
    }

    fn import_deployments() -> Vec<(&'static str, Vec<&'static str>)> {
        vec![
            (NAMESPACE_IMPORT_CONTROLLER, vec![IMPORT_CONTROLLER]),
            (NAMESPACE_ADDON_CONTROLLER, vec![ADDON_CONTROLLER]),
            (NAMESPACE_HUB, vec![REGISTRATION_CONTROLLER]),
        ]
    }
}

impl LifecycleManager {
    /// Wait until every CRD and deployment in `requirements` exists on the hub.
    pub async fn check_requirements(
        &self,
        cluster_name: &str,
        requirements: &Requirements,
        spec: PollSpec,
    ) -> Result<()> {
        info!("Cluster {}: Checking the minimal requirements", cluster_name);
        let hub = &self.hub;
        let crds: Vec<&str> = requirements.crds.iter().map(String::as_str).collect();
        let crds = crds.as_slice();
        spec.wait("required CRDs", move || async move {
            match hub.missing_crds(crds).await {
                Ok(missing) if missing.is_empty() => PollOutcome::Success,
                Ok(missing) => {
                    error!("Cluster {}: Missing CRDs {:?}", cluster_name, missing);
                    PollOutcome::pending(format!("missing CRDs {}", missing.join(", ")))
                }
                Err(e) => PollOutcome::pending(e.to_string()),
            }
        })
        .await
        .context(error::PollSnafu)?;

        for (namespace, deployments) in &requirements.deployments {
            let namespace = *namespace;
            let deployments = deployments.as_slice();
            spec.wait(
                &format!("required deployments in '{}'", namespace),
                move || async move {
                    match hub.missing_deployments(namespace, deployments).await {
                        Ok(missing) if missing.is_empty() => PollOutcome::Success,
                        Ok(missing) => {
                            error!(
                                "Cluster {}: Missing deployments in '{}' {:?}",
                                cluster_name, namespace, missing
                            );
                            PollOutcome::pending(format!(
                                "missing deployments {}",
                                missing.join(", ")
                            ))
                        }
                        Err(e) => PollOutcome::pending(e.to_string()),
                    }
                },
            )
            .await
            .context(error::PollSnafu)?;
        }
        Ok(())
    }
}
