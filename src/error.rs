//! Our error types for the Mercury iPS.
//!
//! [`Error`] is generic over the transport's error type, the same way the
//! transport itself is generic over [`embedded_io`]. The errors which can be
//! raised without touching the transport ([`ConfigError`], [`ArgumentError`],
//! [`ParseError`], [`TargetError`]) live on their own and convert into
//! [`Error`] with `?`.

use thiserror::Error;

use crate::types::Coordinate;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for Mercury iPS communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Transport error: {0:?}")]
    Transport(I),
    #[error("Communication timeout")]
    Timeout,
    #[error("Connection closed by the instrument")]
    ConnectionClosed,
    #[error("Reply did not fit in the receive buffer")]
    BufferOverflow,
    #[error("Invalid response received: {0:?}")]
    InvalidResponse(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(
        "Error in ramping unit {uid}: can not ramp to target value; power supply is clamped. \
         Unclamp first by setting ramp status to HOLD."
    )]
    Clamped { uid: String },
    #[error("Can not ramp {uid}; ramp rate set to zero")]
    ZeroRampRate { uid: String },
    #[error("Unknown ramp status {0:?}")]
    UnknownRampStatus(String),
}

/// Problems with how the driver was set up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid UID {0:?}. Must be an axis group or device name, e.g. \"GRPX\" or \"PSU.M1\"")]
    InvalidUid(String),
    #[error("Incorrect resource name {0:?}. Must be of type TCPIP0::XXX.XXX.XXX.XXX::7020::SOCKET")]
    InvalidAddress(String),
}

/// A caller supplied argument the driver can not act on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Invalid ramp mode {0:?}. Please provide either \"simul\" or \"safe\"")]
    UnknownRampMode(String),
    #[error("Components {0} do not belong to a single coordinate system")]
    UnderdeterminedComponents(String),
    #[error("Ramp rate must not be negative, got {0}")]
    NegativeRampRate(String),
}

/// A reply which does not hold a number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("No numeric value in reply {0:?}")]
    NoNumber(String),
    #[error("Malformed number {0:?}")]
    BadNumber(String),
}

/// The target vector refused a change.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TargetError {
    #[error("Cannot set {coordinate} target to {value}, that would violate the field limits")]
    RegionViolation { coordinate: Coordinate, value: f64 },
    #[error("Cannot set {coordinate} target to {value}, the field must be finite")]
    NonFinite { coordinate: Coordinate, value: f64 },
    #[error("Can not assign new field limits; present target is illegal")]
    LimitsRejected,
}
