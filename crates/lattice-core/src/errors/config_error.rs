/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("invalid config value `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}
