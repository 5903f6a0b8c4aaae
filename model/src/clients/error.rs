use crate::clients::{HttpStatusCode, StatusCode};
use snafu::Snafu;

/// The `Result` type returned by `clients`.
pub type Result<T> = std::result::Result<T, Error>;

/// The public error type returned by `clients`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

/// The private error type returned by `clients`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub(crate) enum InnerError {
    #[snafu(display("Unable to read kubeconfig '{}': {}", path.display(), source))]
    ConfigRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to parse kubeconfig from {}: {}", what, source))]
    ConfigParse {
        what: String,
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Unable to create client config: {}", source))]
    ClientCreateKubeconfig {
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Invalid API server URL '{}': {}", url, source))]
    ApiServerUrl {
        url: String,
        source: http::uri::InvalidUri,
    },

    #[snafu(display("Error initializing the Kubernetes client: {}", source))]
    Initialization { source: kube::Error },

    #[snafu(display("Unable to {} {}: {}", method, what, source))]
    KubeApiCall {
        method: String,
        what: String,
        source: kube::Error,
    },

    #[snafu(display("Secret '{}/{}' has no key '{}'", namespace, name, key))]
    SecretKeyMissing {
        namespace: String,
        name: String,
        key: String,
    },

    #[snafu(display("Secret '{}/{}' key '{}' is not utf-8: {}", namespace, name, key, source))]
    SecretKeyUtf8 {
        namespace: String,
        name: String,
        key: String,
        source: std::string::FromUtf8Error,
    },
}

impl HttpStatusCode for InnerError {
    fn status_code(&self) -> Option<StatusCode> {
        match self {
            InnerError::KubeApiCall { source, .. } | InnerError::Initialization { source } => {
                source.status_code()
            }
            InnerError::ConfigRead { .. }
            | InnerError::ConfigParse { .. }
            | InnerError::ClientCreateKubeconfig { .. }
            | InnerError::ApiServerUrl { .. }
            | InnerError::SecretKeyMissing { .. }
            | InnerError::SecretKeyUtf8 { .. } => None,
        }
    }
}

impl HttpStatusCode for Error {
    fn status_code(&self) -> Option<StatusCode> {
        self.0.status_code()
    }
}
