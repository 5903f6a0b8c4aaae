use super::{error, Result};
use crate::clients::{ClusterClient, HttpStatusCode};
use kube::api::{DynamicObject, ListParams};
use kube::discovery::{verbs, Discovery, Scope};
use kube::{Api, ResourceExt};
use log::{error, info};
use snafu::ResultExt;

/// Log the kind and name of every object still in `namespace`. Does nothing when the namespace is
/// already gone. Resources that cannot be listed are logged and skipped.
pub async fn print_left_overs(cluster: &ClusterClient, namespace: &str) -> Result<()> {
    info!("==================== Left Over in {} ======================", namespace);
    let exists = cluster
        .namespace_exists(namespace)
        .await
        .context(error::ClientSnafu {
            action: format!("get namespace '{}'", namespace),
        })?;
    if !exists {
        return Ok(());
    }

    let client = cluster.k8s_client();
    let discovery = Discovery::new(client.clone())
        .run()
        .await
        .context(error::KubeSnafu {
            action: "discover API resources",
        })?;
    for group in discovery.groups() {
        for (resource, capabilities) in group.recommended_resources() {
            if !matches!(capabilities.scope, Scope::Namespaced)
                || !capabilities.supports_operation(verbs::LIST)
            {
                continue;
            }
            let api: Api<DynamicObject> =
                Api::namespaced_with(client.clone(), namespace, &resource);
            let objects = match api.list(&ListParams::default()).await {
                Ok(objects) => objects,
                Err(e) => {
                    if !e.is_not_found() {
                        error!(
                            "Group: {}, Version: {}, Resource: {} Error: {}",
                            resource.group, resource.version, resource.plural, e
                        );
                    }
                    continue;
                }
            };
            for object in objects {
                info!("Kind: {}, Name: {}", resource.kind, object.name_any());
            }
        }
    }
    Ok(())
}
