use super::leftover::print_left_overs;
use super::{error, LifecycleManager, Result};
use crate::clients::ClusterClient;
use crate::constants::{
    ADDONS, ADDON_SEARCH_COLLECTOR, CONDITION_APPLIED, CONDITION_AVAILABLE,
    CONDITION_CLUSTER_AVAILABLE, CONDITION_PROVISION_FAILED, LOCAL_CLUSTER,
};
use crate::work::klusterlet_manifest_works;
use crate::{
    ClusterDeployment, HasConditions, ManagedCluster, ManagedClusterAddOn, ManifestWork,
    PollOutcome, PollResult, PollSpec,
};
use kube::{Api, Resource};
use log::{error, info};
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use std::fmt::Debug;

/// `Success` once `resource` exists and its `condition_type` condition is `True`.
pub(crate) fn condition_outcome<K>(resource: Option<&K>, condition_type: &str) -> PollOutcome
where
    K: HasConditions,
{
    match resource {
        None => PollOutcome::pending("not found"),
        Some(resource) if resource.is_condition_true(condition_type) => PollOutcome::Success,
        Some(resource) => PollOutcome::pending(format!(
            "{} is not True ({})",
            condition_type,
            resource.describe_conditions()
        )),
    }
}

/// `Success` once Hive recorded the installation of the cluster, `Failure` once it reports that
/// provisioning failed.
pub(crate) fn installed_outcome(cluster_deployment: Option<&ClusterDeployment>) -> PollOutcome {
    let cluster_deployment = match cluster_deployment {
        None => return PollOutcome::pending("not found"),
        Some(cluster_deployment) => cluster_deployment,
    };
    if cluster_deployment.is_installed() {
        return PollOutcome::Success;
    }
    match cluster_deployment.condition(CONDITION_PROVISION_FAILED) {
        Some(condition) if condition.is_true() => {
            PollOutcome::failure(condition.reason(), condition.message())
        }
        _ => PollOutcome::pending(format!(
            "not installed yet ({})",
            cluster_deployment.describe_conditions()
        )),
    }
}

/// The add-ons expected on `cluster_name`. The hub does not run the search collector for itself.
pub fn expected_addons(cluster_name: &str) -> impl Iterator<Item = &'static str> + '_ {
    ADDONS
        .into_iter()
        .filter(move |addon| !(cluster_name == LOCAL_CLUSTER && *addon == ADDON_SEARCH_COLLECTOR))
}

impl LifecycleManager {
    /// Wait until the `condition_type` condition of `name` is `True`.
    pub(super) async fn wait_condition<K>(
        &self,
        api: Api<K>,
        name: &str,
        condition_type: &str,
        what: &str,
        spec: PollSpec,
    ) -> Result<()>
    where
        K: Resource + Clone + DeserializeOwned + Debug + HasConditions,
        <K as Resource>::DynamicType: Default,
    {
        let hub = &self.hub;
        let api = &api;
        spec.wait(what, move || async move {
            match hub.get_opt(api, name).await {
                Ok(resource) => condition_outcome(resource.as_ref(), condition_type),
                Err(e) => PollOutcome::pending(e.to_string()),
            }
        })
        .await
        .context(error::PollSnafu)
    }

    /// Wait until `name` can no longer be found on `cluster`.
    pub(super) async fn poll_deleted<K>(
        &self,
        cluster: &ClusterClient,
        api: Api<K>,
        name: &str,
        what: &str,
        spec: PollSpec,
    ) -> PollResult
    where
        K: Resource + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api = &api;
        spec.poll(what, move || async move {
            match cluster.get_opt(api, name).await {
                Ok(None) => PollOutcome::Success,
                Ok(Some(_)) => PollOutcome::pending("still exists"),
                Err(e) => PollOutcome::pending(e.to_string()),
            }
        })
        .await
    }

    /// Wait until the hub reports `cluster_name` as available.
    pub async fn wait_cluster_imported(&self, cluster_name: &str, spec: PollSpec) -> Result<()> {
        self.wait_condition(
            self.hub.api::<ManagedCluster>(),
            cluster_name,
            CONDITION_CLUSTER_AVAILABLE,
            &format!("cluster '{}' to be imported", cluster_name),
            spec,
        )
        .await?;
        info!("Cluster {}: imported", cluster_name);
        Ok(())
    }

    /// Wait until every expected add-on of `cluster_name` is available.
    pub async fn wait_addons_available(&self, cluster_name: &str) -> Result<()> {
        for addon in expected_addons(cluster_name) {
            info!("Cluster {}: Checking Add-On {} is available...", cluster_name, addon);
            self.wait_condition(
                self.hub.namespaced_api::<ManagedClusterAddOn>(cluster_name),
                addon,
                CONDITION_AVAILABLE,
                &format!("add-on '{}' of cluster '{}' to be available", addon, cluster_name),
                PollSpec::DEFAULT,
            )
            .await?;
        }
        info!("Cluster {}: all add-ons are available", cluster_name);
        Ok(())
    }

    /// Wait until both klusterlet manifest works of `cluster_name` are applied.
    pub async fn wait_manifest_works_applied(
        &self,
        cluster_name: &str,
        spec: PollSpec,
    ) -> Result<()> {
        for manifest_work in klusterlet_manifest_works(cluster_name) {
            self.wait_condition(
                self.hub.namespaced_api::<ManifestWork>(cluster_name),
                &manifest_work,
                CONDITION_APPLIED,
                &format!("manifestwork '{}' to be applied", manifest_work),
                spec,
            )
            .await?;
            info!("Cluster {}: manifestwork {} applied", cluster_name, manifest_work);
        }
        Ok(())
    }

    /// Wait until Hive finished installing `cluster_name`. A failed provisioning ends the wait with
    /// a classified failure.
    pub async fn wait_cluster_installed(&self, cluster_name: &str) -> Result<()> {
        let hub = &self.hub;
        let api = &hub.namespaced_api::<ClusterDeployment>(cluster_name);
        PollSpec::PROVISION
            .wait(
                &format!("cluster '{}' to be installed", cluster_name),
                move || async move {
                    match hub.get_opt(api, cluster_name).await {
                        Ok(cluster_deployment) => installed_outcome(cluster_deployment.as_ref()),
                        Err(e) => PollOutcome::pending(e.to_string()),
                    }
                },
            )
            .await
            .context(error::PollSnafu)?;
        info!("Cluster {}: installed", cluster_name);
        Ok(())
    }

    /// Wait until `namespace` is gone from `cluster`, listing what is left in it on every attempt.
    pub async fn wait_namespace_deleted(
        &self,
        cluster: &ClusterClient,
        cluster_name: &str,
        namespace: &str,
        spec: PollSpec,
    ) -> Result<()> {
        info!(
            "Cluster {}: Checking the deletion of the {} namespace",
            cluster_name, namespace
        );
        spec.wait(
            &format!("namespace '{}' to be deleted", namespace),
            move || async move {
                match cluster.namespace_exists(namespace).await {
                    Ok(false) => PollOutcome::Success,
                    Ok(true) => {
                        if let Err(e) = print_left_overs(cluster, namespace).await {
                            error!("{}", e);
                        }
                        PollOutcome::pending("namespace still exists")
                    }
                    Err(e) => PollOutcome::pending(e.to_string()),
                }
            },
        )
        .await
        .context(error::PollSnafu)?;
        info!("Cluster {}: {} namespace deleted", cluster_name, namespace);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hive::ClusterDeploymentStatus;
    use crate::{Condition, ConditionStatus};

    fn condition(type_: &str, status: ConditionStatus, reason: &str, message: &str) -> Condition {
        Condition {
            type_: type_.to_string(),
            status,
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            last_transition_time: None,
        }
    }

    fn cluster_deployment(status: ClusterDeploymentStatus) -> ClusterDeployment {
        let mut cluster_deployment = ClusterDeployment::new("aws-e2e-abcde", Default::default());
        cluster_deployment.status = Some(status);
        cluster_deployment
    }

    #[test]
    fn missing_resource_is_pending() {
        assert_eq!(
            condition_outcome::<ManagedCluster>(None, CONDITION_CLUSTER_AVAILABLE),
            PollOutcome::pending("not found")
        );
        assert_eq!(installed_outcome(None), PollOutcome::pending("not found"));
    }

    #[test]
    fn available_cluster() {
        let mut cluster = ManagedCluster::new("import-1", Default::default());
        assert!(matches!(
            condition_outcome(Some(&cluster), CONDITION_CLUSTER_AVAILABLE),
            PollOutcome::Pending(_)
        ));
        cluster.status = Some(crate::cluster::ManagedClusterStatus {
            conditions: vec![
                condition(
                    "HubAcceptedManagedCluster",
                    ConditionStatus::True,
                    "HubClusterAdminAccepted",
                    "",
                ),
                condition(
                    CONDITION_CLUSTER_AVAILABLE,
                    ConditionStatus::Unknown,
                    "ManagedClusterLeaseUpdateStopped",
                    "",
                ),
            ],
            ..Default::default()
        });
        assert!(matches!(
            condition_outcome(Some(&cluster), CONDITION_CLUSTER_AVAILABLE),
            PollOutcome::Pending(state) if state.contains("ManagedClusterLeaseUpdateStopped")
        ));
        if let Some(status) = cluster.status.as_mut() {
            status.conditions[1].status = ConditionStatus::True;
        }
        assert_eq!(
            condition_outcome(Some(&cluster), CONDITION_CLUSTER_AVAILABLE),
            PollOutcome::Success
        );
    }

    #[test]
    fn provision_failed_is_terminal() {
        let failed = cluster_deployment(ClusterDeploymentStatus {
            conditions: vec![condition(
                CONDITION_PROVISION_FAILED,
                ConditionStatus::True,
                "VcpuLimitExceeded",
                "vCPU limit exceeded",
            )],
            ..Default::default()
        });
        assert_eq!(
            installed_outcome(Some(&failed)),
            PollOutcome::failure("VcpuLimitExceeded", "vCPU limit exceeded")
        );
    }

    #[test]
    fn provisioning_in_progress() {
        let provisioning = cluster_deployment(ClusterDeploymentStatus {
            conditions: vec![condition(
                CONDITION_PROVISION_FAILED,
                ConditionStatus::False,
                "ProvisionNotFailed",
                "",
            )],
            ..Default::default()
        });
        assert!(matches!(
            installed_outcome(Some(&provisioning)),
            PollOutcome::Pending(_)
        ));
        let installed = cluster_deployment(ClusterDeploymentStatus {
            installed_timestamp: Some("2021-06-01T00:00:00Z".to_string()),
            ..Default::default()
        });
        assert_eq!(installed_outcome(Some(&installed)), PollOutcome::Success);
    }

    #[test]
    fn local_cluster_has_no_search_collector() {
        assert_eq!(expected_addons("import-1").count(), ADDONS.len());
        let local: Vec<_> = expected_addons(LOCAL_CLUSTER).collect();
        assert_eq!(local.len(), ADDONS.len() - 1);
        assert!(!local.contains(&ADDON_SEARCH_COLLECTOR));
    }
}
