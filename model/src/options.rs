/*!

The options file that drives every lifecycle scenario, e.g.

```yaml
options:
  hub:
    name: hub-1
    baseDomain: example.com
  clusters:
    - name: import-1
      baseDomain: import-1.example.com
  ownerPrefix: e2e
  ocpReleaseVersion: quay.io/openshift-release-dev/ocp-release:4.10.3-x86_64
  cloudConnection:
    sshPrivatekey: ...
    sshPublickey: ...
    apiKeys:
      aws:
        awsAccessKeyID: ...
        awsSecretAccessKeyID: ...
        baseDnsDomain: aws.example.com
        region: us-east-1
```

Values missing from the file are filled in by [`Options::resolve`], see its documentation.

!*/

use crate::constants::{ENV_IMPORT_KUBECONFIG, ENV_KUBECONFIG};
use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::fmt::{Display, Formatter};
use std::path::Path;

/// The top level of the options file, which nests everything under `options`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct OptionsFile {
    pub options: Options,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    #[serde(default)]
    pub hub: Hub,
    /// The clusters to import and detach.
    #[serde(default)]
    pub clusters: Vec<ManagedClusterOptions>,
    #[serde(default)]
    pub cloud_connection: CloudConnection,
    /// Used in the names of created clusters, `<cloud>-<owner>-<uid>`.
    #[serde(default = "default_owner", alias = "owner")]
    pub owner_prefix: String,
    /// A release image with a tag. When set, create scenarios install it through a new
    /// `ClusterImageSet` instead of using the latest existing one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocp_release_version: Option<String>,
}

fn default_owner() -> String {
    String::from("e2e")
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hub {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_domain: String,
    #[serde(rename = "apiServerURL", default)]
    pub api_server_url: String,
    #[serde(rename = "kubeconfig", default)]
    pub kubeconfig: String,
    #[serde(rename = "kubecontext", default, skip_serializing_if = "Option::is_none")]
    pub kube_context: Option<String>,
    /// Bearer token for the hub's Prometheus query API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Skip TLS verification when querying Prometheus.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterOptions {
    pub name: String,
    #[serde(default)]
    pub base_domain: String,
    #[serde(rename = "apiServerURL", default)]
    pub api_server_url: String,
    #[serde(rename = "kubeconfig", default)]
    pub kubeconfig: String,
    #[serde(rename = "kubecontext", default, skip_serializing_if = "Option::is_none")]
    pub kube_context: Option<String>,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudConnection {
    #[serde(rename = "sshPrivatekey", alias = "sshPrivateKey", default)]
    pub ssh_private_key: String,
    #[serde(rename = "sshPublickey", alias = "sshPublicKey", default)]
    pub ssh_public_key: String,
    #[serde(default)]
    pub api_keys: ApiKeys,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub aws: AwsApiKeys,
    #[serde(default)]
    pub azure: AzureApiKeys,
    #[serde(default)]
    pub gcp: GcpApiKeys,
    #[serde(default)]
    pub baremetal: BareMetalOptions,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsApiKeys {
    #[serde(rename = "awsAccessKeyID", default)]
    pub access_key_id: String,
    #[serde(rename = "awsSecretAccessKeyID", default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub base_dns_domain: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureApiKeys {
    #[serde(default)]
    pub base_dns_domain: String,
    /// The resource group of the base domain.
    #[serde(rename = "azureBaseDomainRGN", default)]
    pub base_domain_rgn: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub subscription_id: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpApiKeys {
    #[serde(rename = "gcpProjectID", default)]
    pub project_id: String,
    #[serde(rename = "gcpServiceAccountJsonKey", default)]
    pub service_account_json_key: String,
    #[serde(default)]
    pub base_dns_domain: String,
    #[serde(default)]
    pub region: String,
}

/// Settings of the pre-existing bare metal environment. Bare metal clusters are not named by the
/// test, `cluster_name` is used as is.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BareMetalOptions {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub base_dns_domain: String,
    #[serde(rename = "libvirtURI", default)]
    pub libvirt_uri: String,
    #[serde(rename = "provisioningNetworkCIDR", default)]
    pub provisioning_network_cidr: String,
    #[serde(default)]
    pub provisioning_network_interface: String,
    #[serde(default)]
    pub provisioning_bridge: String,
    #[serde(default)]
    pub external_bridge: String,
    #[serde(rename = "apiVIP", default)]
    pub api_vip: String,
    #[serde(rename = "ingressVIP", default)]
    pub ingress_vip: String,
    #[serde(rename = "bootstrapOSImage", default)]
    pub bootstrap_os_image: String,
    #[serde(rename = "clusterOSImage", default)]
    pub cluster_os_image: String,
    #[serde(default)]
    pub trust_bundle: String,
    #[serde(default)]
    pub image_registry_mirror: String,
    #[serde(default)]
    pub ssh_known_hosts_list: Vec<String>,
    #[serde(default)]
    pub hosts: Vec<Host>,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub bmc: Bmc,
    #[serde(default)]
    pub hw_profile: String,
    #[serde(rename = "bootMACAddress", default)]
    pub boot_mac_address: String,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bmc {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub disable_certificate_verification: bool,
}

/// The infrastructure a cluster is created on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cloud {
    Aws,
    Azure,
    Gcp,
    Baremetal,
}

serde_plain::derive_fromstr_from_deserialize!(Cloud);
serde_plain::derive_display_from_serialize!(Cloud);

impl Cloud {
    /// Every cloud a cluster can be created on.
    pub const ALL: [Cloud; 4] = [Cloud::Aws, Cloud::Azure, Cloud::Gcp, Cloud::Baremetal];

    /// The clouds used when no cloud provider is named. Bare metal needs a dedicated lab and is
    /// only used when named.
    pub const DEFAULT: [Cloud; 3] = [Cloud::Aws, Cloud::Azure, Cloud::Gcp];

    /// The clouds named by `cloud_providers`, in the order of [`Cloud::ALL`].
    pub fn requested(cloud_providers: &str) -> Vec<Cloud> {
        Cloud::ALL
            .into_iter()
            .filter(|cloud| cloud.is_requested(cloud_providers))
            .collect()
    }

    pub fn is_baremetal(self) -> bool {
        self == Cloud::Baremetal
    }

    /// `true` if `cloud_providers`, a comma separated list such as `aws, gcp`, names this cloud.
    /// An empty list requests the [`Cloud::DEFAULT`] clouds.
    pub fn is_requested(self, cloud_providers: &str) -> bool {
        if cloud_providers.trim().is_empty() {
            return Cloud::DEFAULT.contains(&self);
        }
        let name = self.to_string();
        cloud_providers
            .split(',')
            .any(|provider| provider.trim() == name)
    }
}

/// The name of a cluster created by the tests, `<cloud>-<owner>-<uid>`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClusterName {
    cloud: Cloud,
    owner: String,
    uid: String,
}

impl ClusterName {
    /// Creates a name with a fresh random uid.
    pub fn new<S: Into<String>>(cloud: Cloud, owner: S) -> Self {
        let uid = uuid::Uuid::new_v4().simple().to_string();
        Self::with_uid(cloud, owner, &uid[..5])
    }

    pub fn with_uid<S1, S2>(cloud: Cloud, owner: S1, uid: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            cloud,
            owner: owner.into(),
            uid: uid.into(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// The prefix shared by every cluster this owner creates on this cloud.
    pub fn prefix(cloud: Cloud, owner: &str) -> String {
        format!("{}-{}", cloud, owner)
    }
}

impl Display for ClusterName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", Self::prefix(self.cloud, &self.owner), self.uid)
    }
}

/// Environment variables consulted when the options file leaves a value out.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Environment {
    /// `KUBECONFIG`
    #[serde(default)]
    pub kubeconfig: Option<String>,
    /// `IMPORT_KUBECONFIG`
    #[serde(default)]
    pub import_kubeconfig: Option<String>,
    /// `HUB_TOKEN`
    #[serde(default)]
    pub hub_token: Option<String>,
}

impl Environment {
    pub fn from_env() -> Result<Self> {
        Ok(envy::from_env::<Environment>().context(error::EnvReadSnafu)?)
    }
}

impl Options {
    /// Read the options file at `path` and resolve it against the process environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut options = Self::from_path(path)?;
        options.resolve(&Environment::from_env()?)?;
        Ok(options)
    }

    /// Read the options file at `path` without resolving defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(error::OptionsFileSnafu { path })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let file: OptionsFile = serde_yaml::from_str(contents).context(error::OptionsParseSnafu)?;
        Ok(file.options)
    }

    /// Fill in values that the options file left out.
    ///
    /// - The hub kubeconfig falls back to `KUBECONFIG` and its token to `HUB_TOKEN`.
    /// - The hub `baseDomain` is required; the hub API URL defaults to
    ///   `https://api.<name>.<baseDomain>:6443`.
    /// - A managed cluster's API URL defaults to `https://api.<baseDomain>:6443` when it has a
    ///   `baseDomain`, and its kubeconfig to `IMPORT_KUBECONFIG`.
    pub fn resolve(&mut self, env: &Environment) -> Result<()> {
        let hub = &mut self.hub;
        if hub.kubeconfig.is_empty() {
            hub.kubeconfig = env.kubeconfig.clone().unwrap_or_default();
        }
        if hub.token.is_none() {
            hub.token = env.hub_token.clone();
        }
        ensure!(
            !hub.base_domain.is_empty(),
            error::OptionMissingSnafu {
                option: "hub.baseDomain",
                why: "it is used to locate the hub API server and its Prometheus route",
            }
        );
        if hub.api_server_url.is_empty() {
            hub.api_server_url = if hub.name.is_empty() {
                format!("https://api.{}:6443", hub.base_domain)
            } else {
                format!("https://api.{}.{}:6443", hub.name, hub.base_domain)
            };
        }
        for cluster in &mut self.clusters {
            if cluster.api_server_url.is_empty() && !cluster.base_domain.is_empty() {
                cluster.api_server_url = format!("https://api.{}:6443", cluster.base_domain);
            }
            if cluster.kubeconfig.is_empty() {
                cluster.kubeconfig = env.import_kubeconfig.clone().unwrap_or_default();
            }
        }
        Ok(())
    }

    /// The hub kubeconfig, which must be set either in the file or by `KUBECONFIG`.
    pub fn hub_kubeconfig(&self) -> Result<&str> {
        ensure!(
            !self.hub.kubeconfig.is_empty(),
            error::EnvMissingSnafu {
                key: ENV_KUBECONFIG,
                what: "the hub kubeconfig (or set options.hub.kubeconfig)",
            }
        );
        Ok(&self.hub.kubeconfig)
    }

    /// The kubeconfig of a managed cluster, which must be set either in the file or by
    /// `IMPORT_KUBECONFIG`.
    pub fn cluster_kubeconfig<'a>(&self, cluster: &'a ManagedClusterOptions) -> Result<&'a str> {
        ensure!(
            !cluster.kubeconfig.is_empty(),
            error::EnvMissingSnafu {
                key: ENV_IMPORT_KUBECONFIG,
                what: format!("the kubeconfig of cluster '{}'", cluster.name),
            }
        );
        Ok(&cluster.kubeconfig)
    }

    /// The bearer token for the hub's Prometheus, if one is configured.
    pub fn hub_token(&self) -> Option<&str> {
        self.hub.token.as_deref().filter(|token| !token.is_empty())
    }

    /// The base DNS domain configured for `cloud`.
    pub fn base_domain(&self, cloud: Cloud) -> Result<&str> {
        let keys = &self.cloud_connection.api_keys;
        let (option, value) = match cloud {
            Cloud::Aws => ("apiKeys.aws.baseDnsDomain", &keys.aws.base_dns_domain),
            Cloud::Azure => ("apiKeys.azure.baseDnsDomain", &keys.azure.base_dns_domain),
            Cloud::Gcp => ("apiKeys.gcp.baseDnsDomain", &keys.gcp.base_dns_domain),
            Cloud::Baremetal => (
                "apiKeys.baremetal.baseDnsDomain",
                &keys.baremetal.base_dns_domain,
            ),
        };
        ensure!(
            !value.is_empty(),
            error::OptionMissingSnafu {
                option,
                why: format!("it is required to create clusters on {}", cloud),
            }
        );
        Ok(value)
    }

    /// The region configured for `cloud`. Bare metal has no region.
    pub fn region(&self, cloud: Cloud) -> Result<Option<&str>> {
        let keys = &self.cloud_connection.api_keys;
        let (option, value) = match cloud {
            Cloud::Aws => ("apiKeys.aws.region", &keys.aws.region),
            Cloud::Azure => ("apiKeys.azure.region", &keys.azure.region),
            Cloud::Gcp => ("apiKeys.gcp.region", &keys.gcp.region),
            Cloud::Baremetal => return Ok(None),
        };
        ensure!(
            !value.is_empty(),
            error::OptionMissingSnafu {
                option,
                why: format!("it is required to create clusters on {}", cloud),
            }
        );
        Ok(Some(value))
    }

    /// The name and uid of the cluster to create on `cloud`. Bare metal clusters use the
    /// configured name, which must be set.
    pub fn new_cluster_name(&self, cloud: Cloud) -> Result<(String, String)> {
        let name = ClusterName::new(cloud, &self.owner_prefix);
        let uid = name.uid().to_string();
        if cloud.is_baremetal() {
            Ok((self.baremetal_cluster_name()?.to_string(), uid))
        } else {
            Ok((name.to_string(), uid))
        }
    }

    /// The name of the pre-existing bare metal cluster.
    pub fn baremetal_cluster_name(&self) -> Result<&str> {
        let name = &self.cloud_connection.api_keys.baremetal.cluster_name;
        ensure!(
            !name.is_empty(),
            error::OptionMissingSnafu {
                option: "apiKeys.baremetal.clusterName",
                why: "bare metal clusters are not named by the tests",
            }
        );
        Ok(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const OPTIONS: &str = r#"
options:
  hub:
    name: hub-1
    baseDomain: example.com
  clusters:
    - name: import-1
      baseDomain: import-1.example.com
    - name: import-2
      kubeconfig: /tmp/import-2
      apiServerURL: https://import-2.example.com:6443
  ocpReleaseVersion: quay.io/openshift-release-dev/ocp-release:4.10.3-x86_64
  cloudConnection:
    sshPrivatekey: private
    sshPublickey: public
    apiKeys:
      aws:
        awsAccessKeyID: AKIA
        awsSecretAccessKeyID: secret
        baseDnsDomain: aws.example.com
        region: us-east-1
      azure:
        baseDnsDomain: azure.example.com
        azureBaseDomainRGN: dns-rg
      baremetal:
        clusterName: bm-1
        hosts:
          - name: master-0
            role: master
            bmc:
              address: ipmi://10.0.0.1
              username: admin
              password: password
            bootMACAddress: "00:00:00:00:00:01"
"#;

    fn env() -> Environment {
        Environment {
            kubeconfig: Some("/tmp/hub".into()),
            import_kubeconfig: Some("/tmp/import".into()),
            hub_token: Some("sha256~token".into()),
        }
    }

    #[test]
    fn parse_and_resolve() {
        let mut options = Options::from_yaml(OPTIONS).unwrap();
        assert_eq!(options.owner_prefix, "e2e");
        assert_eq!(options.cloud_connection.api_keys.aws.access_key_id, "AKIA");
        assert_eq!(
            options.cloud_connection.api_keys.azure.base_domain_rgn,
            "dns-rg"
        );
        let host = &options.cloud_connection.api_keys.baremetal.hosts[0];
        assert_eq!(host.bmc.address, "ipmi://10.0.0.1");
        assert_eq!(host.boot_mac_address, "00:00:00:00:00:01");

        options.resolve(&env()).unwrap();
        assert_eq!(options.hub.kubeconfig, "/tmp/hub");
        assert_eq!(options.hub_token(), Some("sha256~token"));
        assert_eq!(options.hub.api_server_url, "https://api.hub-1.example.com:6443");
        assert_eq!(
            options.clusters[0].api_server_url,
            "https://api.import-1.example.com:6443"
        );
        assert_eq!(options.clusters[0].kubeconfig, "/tmp/import");
        assert_eq!(
            options.clusters[1].api_server_url,
            "https://import-2.example.com:6443"
        );
        assert_eq!(options.clusters[1].kubeconfig, "/tmp/import-2");
    }

    #[test]
    fn base_domain_is_required() {
        let mut options = Options::from_yaml("options:\n  hub:\n    name: hub-1\n").unwrap();
        let err = options.resolve(&env()).unwrap_err();
        assert!(err.to_string().contains("hub.baseDomain"));
    }

    #[test]
    fn missing_kubeconfig() {
        let mut options =
            Options::from_yaml("options:\n  hub:\n    baseDomain: example.com\n").unwrap();
        options.resolve(&Environment::default()).unwrap();
        let err = options.hub_kubeconfig().unwrap_err();
        assert!(err.to_string().contains("KUBECONFIG"));
        assert!(options.hub_token().is_none());
    }

    #[test]
    fn cloud_settings() {
        let options = Options::from_yaml(OPTIONS).unwrap();
        assert_eq!(options.base_domain(Cloud::Aws).unwrap(), "aws.example.com");
        assert_eq!(options.region(Cloud::Aws).unwrap(), Some("us-east-1"));
        assert_eq!(options.region(Cloud::Baremetal).unwrap(), None);
        assert!(options.region(Cloud::Azure).is_err());
        assert!(options.base_domain(Cloud::Gcp).is_err());
    }

    #[test]
    fn cloud_names() {
        assert_eq!("baremetal".parse::<Cloud>().unwrap(), Cloud::Baremetal);
        assert_eq!(Cloud::Gcp.to_string(), "gcp");
        assert!("openstack".parse::<Cloud>().is_err());
    }

    #[test]
    fn requested_cloud_providers() {
        assert!(Cloud::Aws.is_requested(""));
        assert!(Cloud::Aws.is_requested("azure, aws"));
        assert!(!Cloud::Gcp.is_requested("azure,aws"));
        assert!(!Cloud::Baremetal.is_requested(""));
        assert!(!Cloud::Baremetal.is_requested("  "));
        assert!(Cloud::Baremetal.is_requested("aws,baremetal"));
    }

    #[test]
    fn baremetal_is_only_used_when_named() {
        assert_eq!(
            Cloud::requested(""),
            vec![Cloud::Aws, Cloud::Azure, Cloud::Gcp]
        );
        assert_eq!(
            Cloud::requested("baremetal, gcp"),
            vec![Cloud::Gcp, Cloud::Baremetal]
        );
        assert_eq!(Cloud::requested("openstack"), vec![]);
    }

    #[test]
    fn cluster_names() {
        let name = ClusterName::with_uid(Cloud::Aws, "e2e", "abcde");
        assert_eq!(name.to_string(), "aws-e2e-abcde");
        assert_eq!(ClusterName::prefix(Cloud::Aws, "e2e"), "aws-e2e");
        let generated = ClusterName::new(Cloud::Gcp, "ci");
        assert_eq!(generated.uid().len(), 5);
        assert!(generated.to_string().starts_with("gcp-ci-"));

        let options = Options::from_yaml(OPTIONS).unwrap();
        let (bm_name, _) = options.new_cluster_name(Cloud::Baremetal).unwrap();
        assert_eq!(bm_name, "bm-1");
        assert!(Options::default()
            .new_cluster_name(Cloud::Baremetal)
            .is_err());
    }
}
