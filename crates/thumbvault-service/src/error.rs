use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unknown image provider: {0}")]
    UnknownProvider(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("provider error: {0}")]
    Provider(#[from] thumbvault_provider::ProviderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
