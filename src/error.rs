use thiserror::Error as ThisError;

/// Physical sensor read failure. Recovered locally by the reader.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("sensor did not respond within the bus timeout")]
    Timeout,

    #[error("sensor frame checksum mismatch")]
    ChecksumMismatch,

    #[error("sensor returned a malformed frame")]
    InvalidResponse,

    #[error("sensor bus error: {0}")]
    Bus(i32),
}

impl SensorError {
    /// Driver-level error code, logged alongside the message.
    pub fn code(&self) -> i32 {
        match self {
            SensorError::Timeout => 0x107,
            SensorError::ChecksumMismatch => 0x109,
            SensorError::InvalidResponse => 0x102,
            SensorError::Bus(code) => *code,
        }
    }
}

/// The transport could not take the outgoing attribute payload.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
#[error("insufficient transport buffer space: needed {needed} bytes, {available} available")]
pub struct BufferError {
    pub needed: usize,
    pub available: usize,
}

/// Attribute-protocol error surfaced to the peer.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttError {
    #[error("attribute handle is not valid")]
    InvalidHandle,

    #[error("insufficient resources to complete the request")]
    InsufficientResources,

    #[error("request could not be completed")]
    Unlikely,
}

impl AttError {
    /// ATT error code carried in the Error Response PDU.
    pub fn code(&self) -> u8 {
        match self {
            AttError::InvalidHandle => 0x01,
            AttError::InsufficientResources => 0x11,
            AttError::Unlikely => 0x0E,
        }
    }
}

impl From<BufferError> for AttError {
    fn from(_: BufferError) -> Self {
        AttError::InsufficientResources
    }
}

#[derive(ThisError, Debug)]
pub enum TransportError {
    #[error("attribute registration failed: {0}")]
    RegistrationFailed(String),

    #[error("no connection with handle {0}")]
    NotConnected(u16),

    #[error("no attribute with handle {0}")]
    UnknownHandle(u16),

    #[error("indication failed: {0}")]
    IndicationFailed(String),
}

#[derive(ThisError, Debug)]
pub enum ThermoError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ThermoError>;
