/*!

This library provides the Open Cluster Management and Hive resource definitions, the polling
primitives and the cluster lifecycle scenarios used by the end-to-end tests.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use clients::ClusterClient;
pub use cluster::{ManagedCluster, ManagedClusterAddOn, ManagedClusterInfo};
pub use condition::{Condition, ConditionStatus, HasConditions};
pub use error::{Error, Result};
pub use hive::{ClusterDeployment, ClusterImageSet};
pub use klusterlet::Klusterlet;
pub use lifecycle::LifecycleManager;
pub use options::{Cloud, Options};
pub use poll::{classify, poll, Failure, FailureTag, PollOutcome, PollResult, PollSpec};
pub use work::ManifestWork;

pub mod applier;
pub mod clients;
pub mod cluster;
mod condition;
pub mod constants;
mod error;
pub mod hive;
pub mod klusterlet;
pub mod lifecycle;
pub mod options;
pub mod poll;
pub mod work;
