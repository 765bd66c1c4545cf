use std::io;
use thiserror::Error;

/// All errors produced while talking to an installation or touching local files.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote system rejected the request with a SOAP fault.
    #[error("{reason}")]
    RemoteFault {
        reason: String,
        code: Option<String>,
    },

    /// No response could be obtained (connect, TLS, read failure).
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response arrived but could not be understood.
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// Filesystem I/O failed.
    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings could not be loaded.
    #[error("config: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn remote_fault(reason: impl Into<String>, code: Option<String>) -> Self {
        Error::RemoteFault {
            reason: reason.into(),
            code,
        }
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    /// Whether the remote system answered with an explicit rejection, as opposed
    /// to the call not completing at all.
    pub fn is_remote_fault(&self) -> bool {
        matches!(self, Error::RemoteFault { .. })
    }

    pub fn fault_code(&self) -> Option<&str> {
        match self {
            Error::RemoteFault { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[macro_export]
macro_rules! protocol_bail {
    ( $fmt:literal $(, $($arg:tt)*)?) => {
        return Err($crate::utils::error::Error::protocol(format!($fmt $(, $($arg)*)?)))
    };
}
