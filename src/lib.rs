use thiserror::Error;

pub mod logs;
pub mod persistence;
pub mod player;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl ServiceError {
    pub fn persistence<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::Persistence(msg.into()))
    }

    pub fn connection<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::Connection(msg.into()))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
