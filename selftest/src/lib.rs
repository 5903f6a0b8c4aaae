/*!

Provides utilities for testing the lifecycle scenarios against a `kind` cluster.
The kind cluster stands in for a hub: the tests install the custom resource definitions they need
and play the part of the hub controllers by writing resource status themselves.

!*/

pub mod cluster;
mod test_settings;

pub use cluster::Cluster;
