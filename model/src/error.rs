use snafu::Snafu;

#[derive(Debug, Snafu)]
pub struct Error(OpaqueError);
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum OpaqueError {
    #[snafu(display("Environment variable '{}' is required for {}", key, what))]
    EnvMissing { key: String, what: String },

    #[snafu(display("Unable to read environment variables: {}", source))]
    EnvRead { source: envy::Error },

    #[snafu(display("Unable to read options file '{}': {}", path.display(), source))]
    OptionsFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to parse options: {}", source))]
    OptionsParse { source: serde_yaml::Error },

    #[snafu(display("Option '{}' is required: {}", option, why))]
    OptionMissing { option: String, why: String },
}
