use super::{error, LifecycleManager, Result};
use crate::cluster::ManagedClusterInfo;
use crate::constants::{ENV_HUB_TOKEN, LOCAL_CLUSTER};
use crate::{PollOutcome, PollSpec};
use log::info;
use serde::Deserialize;
use serde_json::Value;
use snafu::{OptionExt, ResultExt};

/// The Prometheus query endpoint exposed by the hub's monitoring route.
pub fn metrics_query_url(base_domain: &str) -> String {
    format!(
        "https://prometheus-k8s-openshift-monitoring.apps.{}/api/v1/query",
        base_domain
    )
}

/// Sums the `acm_managed_cluster_info` series the hub reports about itself.
pub fn managed_cluster_info_query(cluster_id: &str) -> String {
    format!(
        r#"sum(acm_managed_cluster_info{{hub_cluster_id="{id}",managed_cluster_id="{id}"}})"#,
        id = cluster_id
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: QueryData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    #[serde(default)]
    result_type: String,
    #[serde(default)]
    result: Vec<QuerySample>,
}

#[derive(Debug, Deserialize)]
struct QuerySample {
    /// `[<timestamp>, "<value>"]`
    #[serde(default)]
    value: Vec<Value>,
}

/// Evaluates a query response body. The sum must be exactly `1`.
fn metrics_outcome(body: &str) -> PollOutcome {
    let response: QueryResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => return PollOutcome::pending(format!("unable to parse response: {}", e)),
    };
    if response.status != "success" {
        return PollOutcome::pending(format!(
            "Expected status success got {}",
            response.status
        ));
    }
    let sample = match response.data.result.first() {
        Some(sample) => sample,
        None => {
            return PollOutcome::pending(format!(
                "failed to get data, empty {} result",
                response.data.result_type
            ))
        }
    };
    match sample.value.get(1).and_then(Value::as_str) {
        Some("1") => PollOutcome::Success,
        Some(value) => PollOutcome::pending(format!("Expected value 1 got {}", value)),
        None => PollOutcome::pending("failed to get data, sample has no value"),
    }
}

impl LifecycleManager {
    /// Check that the hub's Prometheus reports exactly one `acm_managed_cluster_info` series for
    /// `local-cluster`.
    pub async fn check_metrics(&self) -> Result<()> {
        info!("========================= Test metrics ===============================");
        self.wait_cluster_imported(LOCAL_CLUSTER, PollSpec::DEFAULT)
            .await?;

        let info = self
            .hub
            .get_opt(
                &self
                    .hub
                    .namespaced_api::<ManagedClusterInfo>(LOCAL_CLUSTER),
                LOCAL_CLUSTER,
            )
            .await
            .context(error::ClientSnafu {
                action: "get managed cluster info",
            })?
            .context(error::NotFoundSnafu {
                what: format!("managedClusterInfo '{}'", LOCAL_CLUSTER),
            })?;
        let cluster_id = info.cluster_id().context(error::NotFoundSnafu {
            what: format!("the clusterID of managedClusterInfo '{}'", LOCAL_CLUSTER),
        })?;
        info!("Cluster {}: clusterID {}", LOCAL_CLUSTER, cluster_id);

        let token = self
            .options
            .hub_token()
            .or_else(|| self.hub.token())
            .context(error::NotFoundSnafu {
                what: format!(
                    "a bearer token for the hub's Prometheus, set hub.token or {} or use a hub kubeconfig with a token",
                    ENV_HUB_TOKEN
                ),
            })?;
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.options.hub.insecure_skip_tls_verify)
            .build()
            .context(error::HttpSnafu {
                action: "build HTTP client",
            })?;
        let url = metrics_query_url(&self.options.hub.base_domain);
        let query = managed_cluster_info_query(cluster_id);
        info!("Querying {} with {}", url, query);

        let client = &client;
        let url = url.as_str();
        let query = query.as_str();
        PollSpec::METRICS
            .wait("acm_managed_cluster_info metric", move || async move {
                let response = match client
                    .get(url)
                    .query(&[("query", query)])
                    .bearer_auth(token)
                    .send()
                    .await
                {
                    Ok(response) => response,
                    Err(e) => return PollOutcome::pending(e.to_string()),
                };
                let status = response.status();
                if !status.is_success() {
                    return PollOutcome::pending(format!("StatusCode: {}", status));
                }
                match response.text().await {
                    Ok(body) => metrics_outcome(&body),
                    Err(e) => PollOutcome::pending(e.to_string()),
                }
            })
            .await
            .context(error::PollSnafu)?;
        info!("Cluster {}: metrics are reported", LOCAL_CLUSTER);
        Ok(())
    }
}
