//! Error taxonomy shared by every bridge component.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid endpoint '{0}' (expected a.b.c.d:port)")]
    InvalidEndpoint(String),

    #[error("port {0} is already in use")]
    PortInUse(u16),

    #[error("port {0} is out of range (must be between 1 and 65535)")]
    PortOutOfRange(i64),

    #[error("expected {expected} argument: {reason}")]
    DecodeMismatch { expected: String, reason: String },

    #[error("address pattern '{0}' must start with '/'")]
    InvalidAddress(String),

    #[error("zone radius must be a positive finite number (got {0})")]
    InvalidRadius(f32),

    #[error("drag element '{0}' is registered twice")]
    DuplicateElement(String),

    #[error("drag element '{0}' is not registered")]
    UnknownElement(String),

    #[error("unknown relay route '{0}'")]
    UnknownRoute(String),

    #[error("malformed body for relay route {route}: {reason}")]
    InvalidRelayBody { route: String, reason: String },

    #[error("OSC codec error: {0}")]
    Codec(#[from] rosc::OscError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    pub(crate) fn mismatch(expected: &str, reason: impl Into<String>) -> Self {
        BridgeError::DecodeMismatch {
            expected: expected.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn relay_body(route: &str, reason: impl Into<String>) -> Self {
        BridgeError::InvalidRelayBody {
            route: route.to_string(),
            reason: reason.into(),
        }
    }
}
