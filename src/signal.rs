//! This module is used to define the items exposed by each PSU group.
//!
//! Every item is addressed as `READ:DEV:<UID>:PSU:<suffix>` and, where writable,
//! `SET:DEV:<UID>:PSU:<suffix>:<value>`.

use strum_macros::EnumIter;

use crate::scaling::ScalingFactors;

/// Whether an item can be written.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Read,
    ReadWrite,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
pub enum Signal {
    /// __R__ - Output voltage. V.
    Voltage,
    /// __R__ - Output current. A.
    Current,
    /// __R__ - Persistent current. A.
    CurrentPersistent,
    /// __R__ - Target current. A.
    CurrentTarget,
    /// __R/W__ - Target field. T.
    FieldTarget,
    /// __R__ - Current ramp rate. A/s.
    ///
    /// Follows the field ramp rate through [`Signal::Atob`].
    CurrentRampRate,
    /// __R/W__ - Field ramp rate. T/s.
    ///
    /// The instrument counts in T/min.
    FieldRampRate,
    /// __R__ - Field strength. T.
    Field,
    /// __R__ - Persistent field strength. T.
    FieldPersistent,
    /// __R/W__ - Current to field ratio. A/T.
    Atob,
    /// __R/W__ - Ramp status, see [`RampStatus`](crate::types::RampStatus).
    Action,
}

impl Signal {
    /// Command suffix following `PSU:`.
    pub const fn suffix(self) -> &'static str {
        match self {
            Signal::Voltage => "SIG:VOLT",
            Signal::Current => "SIG:CURR",
            Signal::CurrentPersistent => "SIG:PCUR",
            Signal::CurrentTarget => "SIG:CSET",
            Signal::FieldTarget => "SIG:FSET",
            Signal::CurrentRampRate => "SIG:RCST",
            Signal::FieldRampRate => "SIG:RFST",
            Signal::Field => "SIG:FLD",
            Signal::FieldPersistent => "SIG:PFLD",
            Signal::Atob => "ATOB",
            Signal::Action => "ACTN",
        }
    }

    pub const fn access(self) -> Access {
        match self {
            Signal::FieldTarget | Signal::FieldRampRate | Signal::Atob | Signal::Action => {
                Access::ReadWrite
            }
            _ => Access::Read,
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Signal::Voltage => "V",
            Signal::Current | Signal::CurrentPersistent | Signal::CurrentTarget => "A",
            Signal::FieldTarget | Signal::Field | Signal::FieldPersistent => "T",
            Signal::CurrentRampRate => "A/s",
            Signal::FieldRampRate => "T/s",
            Signal::Atob => "A/T",
            Signal::Action => "",
        }
    }

    pub const fn scaling(self) -> ScalingFactors {
        match self {
            Signal::CurrentRampRate | Signal::FieldRampRate => ScalingFactors::PER_MINUTE,
            _ => ScalingFactors::UNITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn writable_items() {
        let writable: Vec<Signal> = Signal::iter()
            .filter(|s| s.access() == Access::ReadWrite)
            .collect();
        assert_eq!(
            writable,
            [
                Signal::FieldTarget,
                Signal::FieldRampRate,
                Signal::Atob,
                Signal::Action
            ]
        );
    }

    #[test]
    fn suffixes_never_start_with_separator() {
        for signal in Signal::iter() {
            assert!(!signal.suffix().starts_with(':'));
            assert!(!signal.suffix().is_empty());
        }
    }

    #[test]
    fn only_rates_are_rescaled() {
        for signal in Signal::iter() {
            let expected = match signal {
                Signal::CurrentRampRate | Signal::FieldRampRate => ScalingFactors::PER_MINUTE,
                _ => ScalingFactors::UNITY,
            };
            assert_eq!(signal.scaling(), expected);
        }
    }
}
