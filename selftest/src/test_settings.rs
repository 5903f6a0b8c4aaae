use serde::Deserialize;

/// The prefix of the environment variables that configure the kind cluster the tests run against.
const ENV_PREFIX: &str = "LIFECYCLE_SELFTEST_";

/// Settings for the kind stand-in hub, read from `LIFECYCLE_SELFTEST_*` environment variables.
///
/// ```text
/// LIFECYCLE_SELFTEST_KIND_PATH=/usr/local/bin/kind
/// LIFECYCLE_SELFTEST_KIND_IMAGE=kindest/node:v1.24.7
/// LIFECYCLE_SELFTEST_KEEP_CLUSTER=true
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct TestSettings {
    /// The path or name of the [kind](https://kind.sigs.k8s.io/) binary, found via `$PATH` by
    /// default.
    #[serde(default = "default_kind_path")]
    pub(crate) kind_path: String,

    /// The node image of the kind cluster. kind picks its own default when unset.
    #[serde(default)]
    pub(crate) kind_image: Option<String>,

    /// Leave the kind cluster running after the test so the hub state can be inspected.
    #[serde(default)]
    pub(crate) keep_cluster: bool,
}

impl TestSettings {
    pub(crate) fn get() -> &'static TestSettings {
        &TEST_SETTINGS
    }

    fn from_vars<I>(vars: I) -> Result<TestSettings, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }
}

lazy_static::lazy_static! {
    static ref TEST_SETTINGS: TestSettings = {
        #[allow(clippy::expect_used)]
        TestSettings::from_vars(std::env::vars())
            .expect("Invalid LIFECYCLE_SELFTEST_* environment variables")
    };
}

fn default_kind_path() -> String {
    String::from("kind")
}
