//! This crate provides an interface for communicating with and controlling the Oxford
//! Instruments Mercury iPS three-axis magnet power supply.
//!
//! The instrument runs one PSU group per axis (`GRPX`, `GRPY`, `GRPZ`). On top of those, the
//! driver keeps a vector target which may be set in Cartesian, spherical or cylindrical
//! coordinates, checks every target against a user supplied safe region, and ramps the three
//! axes to it either all at once or one at a time.
//!
//! It speaks the instrument's own SCPI-like language over TCP, by default on port 7020, and is
//! addressed with a VISA style resource name:
//! * `TCPIP0::<host>::7020::SOCKET`
//!
//! Any interface implementing [embedded_io::Read] & [embedded_io::Write] can be used as well, for
//! instance the [`sim::Simulator`].
//!
//! ```no_run
//! use mercury_ips::{FieldVector, MercuryIpsBuilder, RampMode};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut magnet = MercuryIpsBuilder::new()
//!     .with_field_limits(|x, y, z| x * x + y * y + z * z <= 1.0)
//!     .connect("TCPIP0::192.168.0.10::7020::SOCKET")?;
//! magnet.set_field_target(FieldVector::spherical(0.5, 0.0, 0.0))?;
//! magnet.ramp(RampMode::Safe).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod link;
pub mod psu;
pub mod ramp;
pub mod scaling;
pub mod signal;
pub mod sim;
pub mod target;
pub mod tasks;
pub mod transport;
pub mod types;
pub mod vector;

#[cfg(test)]
mod mock_serial;

pub use config::{ConnectionConfig, MercuryIpsBuilder};
pub use driver::MercuryIps;
pub use error::{ArgumentError, ConfigError, Error, ParseError, Result, TargetError};
pub use types::{Axis, Backend, Coordinate, Identity, RampMode, RampStatus, Uid};
pub use vector::{CoordinateSystem, FieldVector};
