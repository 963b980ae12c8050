//! This module contains the small value types shared across the driver.

use core::fmt;
use core::str::FromStr;

use strum::{EnumProperty, IntoEnumIterator};
use strum_macros::{Display, EnumIter, EnumProperty as EnumPropertyMacro, EnumString};

use crate::error::{ArgumentError, ConfigError};

/// The three magnet axes.
#[derive(Debug, Display, EnumIter, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Axis {
    #[strum(serialize = "x")]
    X,
    #[strum(serialize = "y")]
    Y,
    #[strum(serialize = "z")]
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position of this axis in x, y, z order.
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The group name the instrument uses for this axis.
    pub const fn group(self) -> &'static str {
        match self {
            Axis::X => "GRPX",
            Axis::Y => "GRPY",
            Axis::Z => "GRPZ",
        }
    }

    /// The Cartesian coordinate this axis drives.
    pub const fn coordinate(self) -> Coordinate {
        match self {
            Axis::X => Coordinate::X,
            Axis::Y => Coordinate::Y,
            Axis::Z => Coordinate::Z,
        }
    }
}

/// Instrument internal name of a PSU group, e.g. `GRPX`.
///
/// Can never contain the protocol field separator `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uid(String);

impl Uid {
    pub fn new(uid: impl Into<String>) -> Result<Self, ConfigError> {
        let uid = uid.into();
        if uid.is_empty() || uid.contains(':') {
            return Err(ConfigError::InvalidUid(uid));
        }
        Ok(Self(uid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ramp status of a single PSU.
///
/// The `Display`/`FromStr` form is the human readable one, the wire code is what the
/// instrument uses in `ACTN`.
#[derive(Debug, Display, EnumString, EnumIter, EnumPropertyMacro, PartialEq, Eq, Clone, Copy)]
pub enum RampStatus {
    /// Output is held at its present value.
    #[strum(serialize = "HOLD", props(wire = "HOLD"))]
    Hold,
    /// Ramping to the field target.
    #[strum(serialize = "TO SET", props(wire = "RTOS"))]
    ToSet,
    /// Ramping inhibited until released to [`RampStatus::Hold`].
    #[strum(serialize = "CLAMP", props(wire = "CLMP"))]
    Clamp,
    /// Ramping to zero.
    #[strum(serialize = "TO ZERO", props(wire = "RTOZ"))]
    ToZero,
}

impl RampStatus {
    pub fn wire_code(self) -> &'static str {
        // Every variant carries a wire property.
        self.get_str("wire").unwrap_or_default()
    }

    pub fn from_wire(code: &str) -> Option<Self> {
        Self::iter().find(|status| status.wire_code() == code)
    }
}

/// Coordinates a [`FieldVector`](crate::vector::FieldVector) can be viewed and set in.
///
/// Angles are in radians; `theta` is measured from +z, `phi` from +x in the xy-plane.
#[derive(Debug, Display, EnumString, EnumIter, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Coordinate {
    #[strum(serialize = "x")]
    X,
    #[strum(serialize = "y")]
    Y,
    #[strum(serialize = "z")]
    Z,
    #[strum(serialize = "r")]
    R,
    #[strum(serialize = "theta", serialize = "θ")]
    Theta,
    #[strum(serialize = "phi", serialize = "φ")]
    Phi,
    #[strum(serialize = "rho", serialize = "ρ")]
    Rho,
}

/// How to ramp the three axes to their targets.
#[derive(Debug, Display, EnumIter, PartialEq, Eq, Clone, Copy, Default)]
pub enum RampMode {
    /// All axes at once. Fastest, but the path may leave the safe region.
    #[strum(serialize = "simul")]
    Simul,
    /// One axis at a time, shortest move first. Stays inside a convex safe region.
    #[default]
    #[strum(serialize = "safe")]
    Safe,
}

impl FromStr for RampMode {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter()
            .find(|mode| mode.to_string() == s)
            .ok_or_else(|| ArgumentError::UnknownRampMode(s.to_owned()))
    }
}

/// What the transport is connected to.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Backend {
    /// A real instrument behind a socket.
    #[default]
    Socket,
    /// A simulated instrument. Ramps complete immediately, so nothing is polled.
    Simulation,
}

/// Parsed `*IDN?` reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    pub vendor: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
}

impl Identity {
    /// Parse the non-SCPI `IDN:<vendor>:<model>:<serial>:<firmware>` reply.
    pub fn parse(raw: &str) -> Option<Self> {
        let fields: Vec<&str> = raw.trim().split(':').collect();
        if fields.len() < 5 {
            return None;
        }
        Some(Self {
            vendor: fields[1].to_owned(),
            model: fields[2].to_owned(),
            serial: fields[3].to_owned(),
            firmware: fields[4].to_owned(),
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (serial {}, firmware {})",
            self.vendor, self.model, self.serial, self.firmware
        )
    }
}
