use thiserror::Error;

use crate::comp::CompId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The caller's job setup is faulty; nothing from the job may reach hardware.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Recorded against a job that still runs, without a hardware guarantee.
    #[error("unsupported operation on {comp:?}: {reason}")]
    UnsupportedOperation { comp: CompId, reason: &'static str },

    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }
}
