use super::requirements::Requirements;
use super::{error, LifecycleManager, Result};
use crate::applier::{templates, ClusterLabels};
use crate::clients::ClusterClient;
use crate::constants::{AGENT_NAMESPACE, KLUSTERLET, OPENSHIFT_CONFIG_NAMESPACE, PULL_SECRET};
use crate::hive::{image_set_name, latest_image_set};
use crate::options::Host;
use crate::{Cloud, ClusterDeployment, ClusterImageSet, Klusterlet, PollSpec};
use kube::api::ListParams;
use kube::ResourceExt;
use log::info;
use minijinja::context;
use serde::Serialize;
use snafu::{ensure, OptionExt, ResultExt};

const DOCKER_CONFIG_JSON: &str = ".dockerconfigjson";
const ADMIN_KUBECONFIG_KEY: &str = "kubeconfig";

/// Values of the install config and `ClusterDeployment` templates. Each template uses the subset
/// that applies to its cloud.
#[derive(Debug, Serialize)]
struct InstallValues<'a> {
    managed_cluster_name: &'a str,
    managed_cluster_cloud: Cloud,
    managed_cluster_vendor: &'a str,
    managed_cluster_base_domain: &'a str,
    managed_cluster_region: &'a str,
    managed_cluster_base_domain_rgn: &'a str,
    managed_cluster_project_id: &'a str,
    managed_cluster_ssh_public_key: &'a str,
    managed_cluster_trust_bundle: &'a str,
    managed_cluster_image_ref_name: &'a str,
    libvirt_uri: &'a str,
    provisioning_network_cidr: &'a str,
    provisioning_network_interface: &'a str,
    provisioning_bridge: &'a str,
    external_bridge: &'a str,
    api_vip: &'a str,
    ingress_vip: &'a str,
    bootstrap_os_image: &'a str,
    cluster_os_image: &'a str,
    image_registry_mirror: &'a str,
    hosts: &'a [Host],
    ssh_known_hosts: &'a [String],
}

impl LifecycleManager {
    /// Create a cluster on `cloud` with Hive and wait until the hub imported it and its add-ons
    /// are available. Returns `None` when `cloud` is not in `cloud_providers`, a comma separated
    /// list where empty means every cloud but bare metal.
    pub async fn create_cluster(
        &self,
        cloud: Cloud,
        vendor: &str,
        cloud_providers: &str,
    ) -> Result<Option<String>> {
        if !cloud.is_requested(cloud_providers) {
            info!("Cloud provider {} skipped", cloud);
            return Ok(None);
        }
        let (cluster_name, uid) = self
            .options
            .new_cluster_name(cloud)
            .context(error::OptionsSnafu)?;
        let cluster_name = cluster_name.as_str();
        info!(
            "========================= Start Test create cluster {} ===============================",
            cluster_name
        );

        self.check_requirements(
            cluster_name,
            &Requirements::provisioning(true),
            PollSpec::DEFAULT,
        )
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

        info!("Cluster {}: Creating the needed resources", cluster_name);
        self.create_secrets(cloud, cluster_name).await?;
        let image_set = self.image_set(cloud, cluster_name, &uid).await?;

        let keys = &self.options.cloud_connection.api_keys;
        let baremetal = &keys.baremetal;
        let base_domain = self.options.base_domain(cloud).context(error::OptionsSnafu)?;
        let region = self
            .options
            .region(cloud)
            .context(error::OptionsSnafu)?
            .unwrap_or_default();
        let values = InstallValues {
            managed_cluster_name: cluster_name,
            managed_cluster_cloud: cloud,
            managed_cluster_vendor: vendor,
            managed_cluster_base_domain: base_domain,
            managed_cluster_region: region,
            managed_cluster_base_domain_rgn: &keys.azure.base_domain_rgn,
            managed_cluster_project_id: &keys.gcp.project_id,
            managed_cluster_ssh_public_key: &self.options.cloud_connection.ssh_public_key,
            managed_cluster_trust_bundle: &baremetal.trust_bundle,
            managed_cluster_image_ref_name: &image_set,
            libvirt_uri: &baremetal.libvirt_uri,
            provisioning_network_cidr: &baremetal.provisioning_network_cidr,
            provisioning_network_interface: &baremetal.provisioning_network_interface,
            provisioning_bridge: &baremetal.provisioning_bridge,
            external_bridge: &baremetal.external_bridge,
            api_vip: &baremetal.api_vip,
            ingress_vip: &baremetal.ingress_vip,
            bootstrap_os_image: &baremetal.bootstrap_os_image,
            cluster_os_image: &baremetal.cluster_os_image,
            image_registry_mirror: &baremetal.image_registry_mirror,
            hosts: &baremetal.hosts,
            ssh_known_hosts: &baremetal.ssh_known_hosts_list,
        };

        info!("Cluster {}: Creating install config secret", cluster_name);
        let install_config = self
            .applier
            .render(templates::install_config(cloud), &values)
            .context(error::ApplySnafu {
                action: "render install config",
            })?;
        self.apply(
            templates::INSTALL_CONFIG_SECRET,
            context! {
                managed_cluster_name => cluster_name,
                managed_cluster_install_config => install_config,
            },
            "create install config secret",
        )
        .await?;

        info!("Cluster {}: Creating the clusterDeployment", cluster_name);
        self.apply(
            templates::CLUSTER_DEPLOYMENT,
            &values,
            "create cluster deployment",
        )
        .await?;

        let labels = ClusterLabels {
            managed_cluster_name: cluster_name,
            managed_cluster_cloud: cloud,
            managed_cluster_vendor: vendor,
        };
        info!("Cluster {}: Creating the managedCluster", cluster_name);
        self.apply(
            templates::CREATE_MANAGED_CLUSTER,
            &labels,
            "create managed cluster",
        )
        .await?;
        info!("Cluster {}: Creating the klusterletaddonconfig", cluster_name);
        self.apply(
            templates::CREATE_KLUSTERLET_ADDON_CONFIG,
            &labels,
            "create klusterlet addon config",
        )
        .await?;

        self.wait_cluster_installed(cluster_name).await?;
        self.wait_cluster_imported(cluster_name, PollSpec::DEFAULT)
            .await?;
        if !cloud.is_baremetal() {
            self.validate_cluster_imported(cluster_name).await?;
        }
        self.settle(cluster_name, self.settle.addons, "to settle")
            .await;
        if !cloud.is_baremetal() {
            self.wait_addons_available(cluster_name).await?;
        }

        info!(
            "========================= End Test create cluster {} ===============================",
            cluster_name
        );
        Ok(Some(cluster_name.to_string()))
    }

    /// Check on the new cluster itself that the klusterlet was installed.
    pub async fn validate_cluster_imported(&self, cluster_name: &str) -> Result<()> {
        let cluster_deployment = self
            .hub
            .get_opt(
                &self.hub.namespaced_api::<ClusterDeployment>(cluster_name),
                cluster_name,
            )
            .await
            .context(error::ClientSnafu {
                action: "get cluster deployment",
            })?
            .context(error::NotFoundSnafu {
                what: format!("clusterDeployment '{}'", cluster_name),
            })?;
        let secret_name =
            cluster_deployment
                .admin_kubeconfig_secret()
                .context(error::NotFoundSnafu {
                    what: format!(
                        "adminKubeconfigSecretRef.name in clusterDeployment '{}'",
                        cluster_name
                    ),
                })?;
        let kubeconfig = self
            .hub
            .secret_value(cluster_name, secret_name, ADMIN_KUBECONFIG_KEY)
            .await
            .context(error::ClientSnafu {
                action: "read admin kubeconfig",
            })?;
        let managed_cluster = ClusterClient::from_kubeconfig_yaml(
            &kubeconfig,
            &format!("admin kubeconfig of '{}'", cluster_name),
        )
        .await
        .context(error::ClientSnafu {
            action: format!("create client for cluster '{}'", cluster_name),
        })?;

        let agent_namespace = managed_cluster
            .namespace_exists(AGENT_NAMESPACE)
            .await
            .context(error::ClientSnafu {
                action: format!("get namespace '{}'", AGENT_NAMESPACE),
            })?;
        ensure!(
            agent_namespace,
            error::NotFoundSnafu {
                what: format!(
                    "namespace '{}' on cluster '{}'",
                    AGENT_NAMESPACE, cluster_name
                ),
            }
        );
        info!(
            "Cluster {}: \"{}\" namespace on managed cluster exists",
            cluster_name, AGENT_NAMESPACE
        );

        let klusterlet = managed_cluster
            .get_opt(&managed_cluster.api::<Klusterlet>(), KLUSTERLET)
            .await
            .context(error::ClientSnafu {
                action: "get klusterlet",
            })?;
        ensure!(
            klusterlet.is_some(),
            error::NotFoundSnafu {
                what: format!("klusterlet on cluster '{}'", cluster_name),
            }
        );
        info!("Cluster {}: klusterlet on managed cluster exists", cluster_name);
        Ok(())
    }

    /// The pull secret, the SSH private key and, except on bare metal, the cloud credentials.
    async fn create_secrets(&self, cloud: Cloud, cluster_name: &str) -> Result<()> {
        let pull_secret = self
            .hub
            .secret_value(OPENSHIFT_CONFIG_NAMESPACE, PULL_SECRET, DOCKER_CONFIG_JSON)
            .await
            .context(error::ClientSnafu {
                action: "read the hub pull secret",
            })?;
        self.apply(
            templates::PULL_SECRET,
            context! {
                managed_cluster_name => cluster_name,
                managed_cluster_pull_secret => pull_secret,
            },
            "create pull secret",
        )
        .await?;
        self.apply(
            templates::SSH_PRIVATE_KEY_SECRET,
            context! {
                managed_cluster_name => cluster_name,
                managed_cluster_ssh_private_key => &self.options.cloud_connection.ssh_private_key,
            },
            "create SSH private key secret",
        )
        .await?;

        let template = match templates::creds_secret(cloud) {
            Some(template) => template,
            None => return Ok(()),
        };
        info!("Cluster {}: Creating the {} cred secret", cluster_name, cloud);
        let keys = &self.options.cloud_connection.api_keys;
        let values = match cloud {
            Cloud::Aws => context! {
                managed_cluster_name => cluster_name,
                aws_access_key_id => &keys.aws.access_key_id,
                aws_secret_access_key => &keys.aws.secret_access_key,
            },
            Cloud::Azure => context! {
                managed_cluster_name => cluster_name,
                service_principal => context! {
                    clientId => &keys.azure.client_id,
                    clientSecret => &keys.azure.client_secret,
                    tenantId => &keys.azure.tenant_id,
                    subscriptionId => &keys.azure.subscription_id,
                },
            },
            Cloud::Gcp | Cloud::Baremetal => context! {
                managed_cluster_name => cluster_name,
                service_account_json => &keys.gcp.service_account_json_key,
            },
        };
        self.apply(template, values, "create credentials secret")
            .await
    }

    /// The name of the `ClusterImageSet` to install. A configured release image gets a new image
    /// set, except on bare metal where it is used as is. Without one the latest existing image set
    /// is used.
    async fn image_set(&self, cloud: Cloud, cluster_name: &str, uid: &str) -> Result<String> {
        let release_image = self
            .options
            .ocp_release_version
            .as_deref()
            .filter(|release_image| !release_image.is_empty());
        if let Some(release_image) = release_image {
            if cloud.is_baremetal() {
                return Ok(release_image.to_string());
            }
            let name =
                image_set_name(release_image, uid).context(error::ReleaseImageSnafu {
                    release_image,
                })?;
            info!(
                "Cluster {}: Creating the imageSetName {}",
                cluster_name, name
            );
            self.apply(
                templates::CLUSTER_IMAGE_SET,
                context! {
                    cluster_image_set_name => &name,
                    ocp_release_image => release_image,
                },
                "create cluster image set",
            )
            .await?;
            return Ok(name);
        }

        let image_sets = self
            .hub
            .api::<ClusterImageSet>()
            .list(&ListParams::default())
            .await
            .context(error::KubeSnafu {
                action: "list cluster image sets",
            })?;
        for image_set in &image_sets {
            info!(
                "Cluster {}: Add imageset: {}",
                cluster_name,
                image_set.name_any()
            );
        }
        latest_image_set(&image_sets)
            .map(|image_set| image_set.name_any())
            .context(error::NotFoundSnafu {
                what: "a ClusterImageSet to install",
            })
    }

    /// Render `template` and apply it to the hub.
    pub(super) async fn apply<S: Serialize>(
        &self,
        template: &str,
        values: S,
        action: &str,
    ) -> Result<()> {
        self.applier
            .apply(&self.hub, template, values)
            .await
            .context(error::ApplySnafu { action })?;
        Ok(())
    }
}
