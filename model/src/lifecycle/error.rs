use crate::poll::Failure;
use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for `LifecycleManager`
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum Error {
    #[snafu(display("Unable to {}: {}", action, source))]
    Apply {
        action: String,
        source: crate::applier::Error,
    },

    #[snafu(display("Unable to {}: {}", action, source))]
    Client {
        action: String,
        source: crate::clients::Error,
    },

    #[snafu(display("Unable to {}: {}", action, source))]
    Http {
        action: String,
        source: reqwest::Error,
    },

    #[snafu(display("Unable to {}: {}", action, source))]
    Kube { action: String, source: kube::Error },

    #[snafu(display("Unable to find {}", what))]
    NotFound { what: String },

    #[snafu(display("{}", source))]
    Options { source: crate::Error },

    #[snafu(display("{}", source))]
    Poll { source: crate::poll::Error },

    #[snafu(display("Release image '{}' has no tag", release_image))]
    ReleaseImage { release_image: String },

    #[snafu(display("Unable to parse server version '{}'", version))]
    ServerVersion { version: String },
}

impl Error {
    /// The classified failure, if a poll ended in a terminal failure.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Error::Poll { source } => source.failure(),
            _ => None,
        }
    }
}
