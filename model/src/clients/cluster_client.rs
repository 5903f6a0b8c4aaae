use super::error::{self, Result};
use super::{AllowNotFound, HttpStatusCode};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::version::Info;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, Resource, ResourceExt};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use snafu::{OptionExt, ResultExt};
use std::fmt::Debug;
use std::path::Path;

/// A connection to one cluster, either the hub or a managed cluster, with the handful of
/// operations the lifecycle scenarios need on top of `kube::Api`.
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
    token: Option<String>,
}

/// The parts of a kubeconfig that lead from a context to its user's bearer token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct KubeconfigUsers {
    current_context: Option<String>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: Option<ContextUser>,
}

#[derive(Debug, Deserialize)]
struct ContextUser {
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    user: Option<UserToken>,
}

#[derive(Debug, Deserialize)]
struct UserToken {
    token: Option<String>,
}

/// The bearer token of the user of `context`, or of the current context when `context` is
/// `None`. Users that authenticate another way, e.g. with a client certificate, have none.
pub fn kubeconfig_token(yaml: &str, context: Option<&str>) -> Option<String> {
    let kubeconfig: KubeconfigUsers = serde_yaml::from_str(yaml).ok()?;
    let context = context.or(kubeconfig.current_context.as_deref())?;
    let user = kubeconfig
        .contexts
        .iter()
        .find(|named| named.name == context)?
        .context
        .as_ref()?
        .user
        .as_deref()?;
    kubeconfig
        .users
        .iter()
        .find(|named| named.name == user)?
        .user
        .as_ref()?
        .token
        .clone()
        .filter(|token| !token.is_empty())
}

impl ClusterClient {
    /// Create a `ClusterClient` from the path to a kubeconfig file. `context` selects a context
    /// other than the current one, `api_server_url` replaces the server of the selected cluster.
    pub async fn from_kubeconfig_path(
        kubeconfig_path: &Path,
        context: Option<&str>,
        api_server_url: Option<&str>,
    ) -> Result<Self> {
        let yaml = std::fs::read_to_string(kubeconfig_path).context(error::ConfigReadSnafu {
            path: kubeconfig_path,
        })?;
        let kubeconfig = Kubeconfig::from_yaml(&yaml).context(error::ConfigParseSnafu {
            what: kubeconfig_path.display().to_string(),
        })?;
        let token = kubeconfig_token(&yaml, context);
        Self::from_kubeconfig(kubeconfig, token, context, api_server_url).await
    }

    /// Create a `ClusterClient` from the contents of a kubeconfig file, e.g. the admin
    /// kubeconfig secret of a cluster installed by Hive.
    pub async fn from_kubeconfig_yaml(yaml: &str, what: &str) -> Result<Self> {
        let kubeconfig =
            Kubeconfig::from_yaml(yaml).context(error::ConfigParseSnafu { what })?;
        Self::from_kubeconfig(kubeconfig, kubeconfig_token(yaml, None), None, None).await
    }

    async fn from_kubeconfig(
        kubeconfig: Kubeconfig,
        token: Option<String>,
        context: Option<&str>,
        api_server_url: Option<&str>,
    ) -> Result<Self> {
        let options = KubeConfigOptions {
            context: context.map(ToString::to_string),
            ..KubeConfigOptions::default()
        };
        let mut config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .context(error::ClientCreateKubeconfigSnafu)?;
        if let Some(url) = api_server_url.filter(|url| !url.is_empty()) {
            config.cluster_url = url
                .parse()
                .context(error::ApiServerUrlSnafu { url })?;
        }
        Ok(Self {
            client: config.try_into().context(error::InitializationSnafu)?,
            token,
        })
    }

    pub fn new_from_k8s_client(client: Client) -> Self {
        Self {
            client,
            token: None,
        }
    }

    /// The bearer token of the kubeconfig user this client was created from, if it has one.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn k8s_client(&self) -> Client {
        self.client.clone()
    }

    /// An `Api` for a cluster scoped resource.
    pub fn api<K>(&self) -> Api<K>
    where
        K: Resource<Scope = ClusterResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::all(self.k8s_client())
    }

    /// An `Api` for a namespaced resource in `namespace`.
    pub fn namespaced_api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.k8s_client(), namespace)
    }

    /// Get an object, returning `None` if it does not exist.
    pub async fn get_opt<K>(&self, api: &Api<K>, name: &str) -> Result<Option<K>>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        Ok(api
            .get(name)
            .await
            .allow_not_found(|_| ())
            .context(error::KubeApiCallSnafu {
                method: "get",
                what: format!("{} '{}'", K::kind(&K::DynamicType::default()), name),
            })?)
    }

    /// Delete an object. Returns `false` if it did not exist.
    pub async fn delete<K>(&self, api: &Api<K>, name: &str) -> Result<bool>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let kind = K::kind(&K::DynamicType::default()).to_string();
        let deleted = api
            .delete(name, &DeleteParams::default())
            .await
            .allow_not_found(|_| ())
            .context(error::KubeApiCallSnafu {
                method: "delete",
                what: format!("{} '{}'", kind, name),
            })?
            .is_some();
        if deleted {
            info!("Deleted {} '{}'", kind, name);
        } else {
            debug!("{} '{}' was already gone", kind, name);
        }
        Ok(deleted)
    }

    /// The version of the API server.
    pub async fn server_version(&self) -> Result<Info> {
        Ok(self
            .client
            .apiserver_version()
            .await
            .context(error::KubeApiCallSnafu {
                method: "get",
                what: "server version",
            })?)
    }

    /// The CRDs from `names` that are not installed. `names` are of the form
    /// `managedclusters.cluster.open-cluster-management.io`.
    pub async fn missing_crds(&self, names: &[&str]) -> Result<Vec<String>> {
        let api = self.api::<CustomResourceDefinition>();
        let mut missing = Vec::new();
        for name in names {
            if self.get_opt(&api, name).await?.is_none() {
                missing.push(name.to_string());
            }
        }
        Ok(missing)
    }

    /// The deployments from `names` that do not exist in `namespace`.
    pub async fn missing_deployments(
        &self,
        namespace: &str,
        names: &[&str],
    ) -> Result<Vec<String>> {
        let existing: Vec<String> = self
            .namespaced_api::<Deployment>(namespace)
            .list(&ListParams::default())
            .await
            .context(error::KubeApiCallSnafu {
                method: "list",
                what: format!("deployments in '{}'", namespace),
            })?
            .iter()
            .map(|deployment| deployment.name_any())
            .collect();
        Ok(names
            .iter()
            .filter(|name| !existing.iter().any(|existing| existing == *name))
            .map(|name| name.to_string())
            .collect())
    }

    pub async fn namespace_exists(&self, name: &str) -> Result<bool> {
        Ok(self
            .get_opt(&self.api::<Namespace>(), name)
            .await?
            .is_some())
    }

    /// Create the namespace if it does not exist yet.
    pub async fn ensure_namespace(&self, name: &str) -> Result<()> {
        if self.namespace_exists(name).await? {
            debug!("Namespace '{}' already exists", name);
            return Ok(());
        }
        let namespace = Namespace {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let created = self
            .api::<Namespace>()
            .create(&PostParams::default(), &namespace)
            .await;
        // Someone else may have created it in the meantime.
        if created.is_status_code(http::StatusCode::CONFLICT) {
            return Ok(());
        }
        created.context(error::KubeApiCallSnafu {
            method: "create",
            what: format!("namespace '{}'", name),
        })?;
        info!("Created namespace '{}'", name);
        Ok(())
    }

    /// The value of `key` in a secret, decoded as utf-8.
    pub async fn secret_value(&self, namespace: &str, name: &str, key: &str) -> Result<String> {
        let secret = self
            .namespaced_api::<Secret>(namespace)
            .get(name)
            .await
            .context(error::KubeApiCallSnafu {
                method: "get",
                what: format!("secret '{}/{}'", namespace, name),
            })?;
        secret_value(&secret, key)
    }
}

/// The value of `key` in `secret`, decoded as utf-8.
pub fn secret_value(secret: &Secret, key: &str) -> Result<String> {
    let namespace = secret.namespace().unwrap_or_default();
    let name = secret.name_any();
    let bytes = secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .context(error::SecretKeyMissingSnafu {
            namespace: &namespace,
            name: &name,
            key,
        })?;
    Ok(
        String::from_utf8(bytes.0.clone()).context(error::SecretKeyUtf8Snafu {
            namespace,
            name,
            key,
        })?,
    )
}
