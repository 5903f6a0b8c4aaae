mod cluster_client;
mod error;
mod http_status_code;

pub use cluster_client::{kubeconfig_token, secret_value, ClusterClient};
pub use error::{Error, Result};
pub use http_status_code::{AllowNotFound, HttpStatusCode, StatusCode};
