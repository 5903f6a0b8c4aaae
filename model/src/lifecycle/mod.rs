/*!

The cluster lifecycle scenarios run against a hub.

A [`LifecycleManager`] holds a client for the hub and the resolved [`Options`](crate::Options).
Each scenario checks that the hub components it depends on are installed, applies the resources
that start the transition, and then waits for the hub and the managed cluster to report the end
state:

- [`LifecycleManager::create_cluster`] provisions a cluster on a cloud provider with Hive and
  imports it.
- [`LifecycleManager::import_cluster`] imports an existing cluster.
- [`LifecycleManager::check_hub_import`] checks that the hub imported itself as `local-cluster`.
- [`LifecycleManager::detach_cluster`] detaches an imported cluster.
- [`LifecycleManager::destroy_cluster`] destroys a cluster created by `create_cluster`.
- [`LifecycleManager::check_metrics`] checks the hub's `acm_managed_cluster_info` metric.

!*/

mod create;
mod destroy;
mod detach;
mod error;
mod import;
mod leftover;
mod manager;
mod metrics;
mod requirements;
mod waits;

pub use error::{Error, Result};
pub use leftover::print_left_overs;
pub use manager::{LifecycleManager, Settle};
pub use metrics::{managed_cluster_info_query, metrics_query_url};
pub use requirements::Requirements;
pub use waits::expected_addons;
