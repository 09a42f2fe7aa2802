use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenomicError {
    /// The caller handed the analyzer something that breaks its input contract.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rule set error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GenomicError>;
