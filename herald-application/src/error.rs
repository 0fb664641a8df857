use herald_domain::error::DomainError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("config: {0}")]
    Config(#[from] figment::Error),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session expired: {0}")]
    SessionExpired(String),

    #[error("repository: {0}")]
    Repository(String),

    #[error("client already subscribed: {0}")]
    ClientAlreadySubscribed(String),

    #[error("client not subscribed: {0}")]
    ClientNotSubscribed(String),

    #[error("client disconnected: {0}")]
    ClientDisconnected(String),
}

pub type AppResult<T> = Result<T, AppError>;
