use serde::{Deserialize, Serialize};

use std::fmt;

pub mod prelude {
    pub use super::{err_msg, AnonCredsError, AnonCredsErrorKind, AnonCredsResult};
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, thiserror::Error)]
pub enum AnonCredsErrorKind {
    // Common errors
    #[error("Invalid library state")]
    InvalidState,
    #[error("Invalid structure")]
    InvalidStructure,
    #[error("IO error")]
    IOError,
    // Schema and attribute errors
    #[error("Invalid configuration")]
    Config,
    #[error("Invalid attribute")]
    Attribute,
    // Protocol errors
    #[error("Protocol violation")]
    Protocol,
    #[error("Proof rejected")]
    ProofRejected,
    #[error("Registration failed")]
    Registration,
    #[error("Attribute condition not satisfied")]
    Condition,
}

#[derive(Debug, thiserror::Error)]
pub struct AnonCredsError {
    kind: AnonCredsErrorKind,
    message: String,
}

impl AnonCredsError {
    pub fn from_msg<D>(kind: AnonCredsErrorKind, msg: D) -> AnonCredsError
    where
        D: fmt::Display,
    {
        AnonCredsError {
            kind,
            message: msg.to_string(),
        }
    }

    pub fn kind(&self) -> AnonCredsErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AnonCredsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

pub fn err_msg<D>(kind: AnonCredsErrorKind, msg: D) -> AnonCredsError
where
    D: fmt::Display,
{
    AnonCredsError::from_msg(kind, msg)
}

impl From<AnonCredsErrorKind> for AnonCredsError {
    fn from(kind: AnonCredsErrorKind) -> AnonCredsError {
        AnonCredsError::from_msg(kind, kind)
    }
}

impl From<log::SetLoggerError> for AnonCredsError {
    fn from(_err: log::SetLoggerError) -> AnonCredsError {
        err_msg(AnonCredsErrorKind::InvalidState, "Setting logger failed")
    }
}

impl From<std::io::Error> for AnonCredsError {
    fn from(err: std::io::Error) -> AnonCredsError {
        err_msg(AnonCredsErrorKind::IOError, err)
    }
}

impl From<serde_json::Error> for AnonCredsError {
    fn from(err: serde_json::Error) -> AnonCredsError {
        err_msg(
            AnonCredsErrorKind::InvalidStructure,
            format!("Invalid json: {}", err),
        )
    }
}

impl From<std::str::ParseBoolError> for AnonCredsError {
    fn from(err: std::str::ParseBoolError) -> AnonCredsError {
        err_msg(AnonCredsErrorKind::Config, err)
    }
}

impl From<num_bigint::ParseBigIntError> for AnonCredsError {
    fn from(err: num_bigint::ParseBigIntError) -> AnonCredsError {
        err_msg(
            AnonCredsErrorKind::InvalidStructure,
            format!("Invalid number: {}", err),
        )
    }
}

impl From<rand::Error> for AnonCredsError {
    fn from(err: rand::Error) -> AnonCredsError {
        err_msg(AnonCredsErrorKind::InvalidState, err)
    }
}

pub type AnonCredsResult<T> = Result<T, AnonCredsError>;
