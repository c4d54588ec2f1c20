use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Layer already exists: {0}")]
    LayerAlreadyExists(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
