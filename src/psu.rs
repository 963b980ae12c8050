use core::fmt::Display;

use tracing::debug;

use crate::{
    error::{ArgumentError, Error, Result},
    link::{Link, Reply},
    scaling::strip_structural,
    signal::Signal,
    types::{RampStatus, Uid},
};

/// What we last heard from, or told, one PSU group.
///
/// Every value here has been through the instrument: reads refresh it, and writes only land
/// here once the instrument has accepted them.
#[derive(Debug, Clone, PartialEq)]
pub struct PsuState {
    uid: Uid,
    ramp_status: Option<RampStatus>,
    field_target: Option<f64>,
    field_ramp_rate: Option<f64>,
    atob: Option<f64>,
}

impl PsuState {
    pub fn new(uid: Uid) -> Self {
        Self {
            uid,
            ramp_status: None,
            field_target: None,
            field_ramp_rate: None,
            atob: None,
        }
    }

    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Last known ramp status.
    pub fn ramp_status(&self) -> Option<RampStatus> {
        self.ramp_status
    }

    /// Last known field target in T.
    pub fn field_target(&self) -> Option<f64> {
        self.field_target
    }

    /// Last known field ramp rate in T/s.
    pub fn field_ramp_rate(&self) -> Option<f64> {
        self.field_ramp_rate
    }

    /// Last known current to field ratio in A/T.
    pub fn atob(&self) -> Option<f64> {
        self.atob
    }
}

/// Handle to one PSU group, borrowed from the driver.
///
/// For its methods we use the nomenclature that "set" writes a configuration and "get" reads a
/// configuration back from the instrument, where as "read" returns a measured value.
pub struct Psu<'a, S: embedded_io::Read + embedded_io::Write, const L: usize> {
    link: &'a mut Link<S, L>,
    state: &'a mut PsuState,
}

impl<'a, S: embedded_io::Read + embedded_io::Write, const L: usize> Psu<'a, S, L> {
    pub fn new(link: &'a mut Link<S, L>, state: &'a mut PsuState) -> Self {
        Self { link, state }
    }

    pub fn uid(&self) -> &Uid {
        &self.state.uid
    }

    pub fn state(&self) -> &PsuState {
        &*self.state
    }

    /// Output voltage in V.
    pub fn read_voltage(&mut self) -> Result<f64, S::Error> {
        self.read_signal(Signal::Voltage)
    }

    /// Output current in A.
    pub fn read_current(&mut self) -> Result<f64, S::Error> {
        self.read_signal(Signal::Current)
    }

    /// Persistent current in A.
    pub fn read_current_persistent(&mut self) -> Result<f64, S::Error> {
        self.read_signal(Signal::CurrentPersistent)
    }

    /// Target current in A.
    pub fn read_current_target(&mut self) -> Result<f64, S::Error> {
        self.read_signal(Signal::CurrentTarget)
    }

    /// Current ramp rate in A/s. Derived by the instrument from the field ramp rate and ATOB.
    pub fn read_current_ramp_rate(&mut self) -> Result<f64, S::Error> {
        self.read_signal(Signal::CurrentRampRate)
    }

    /// Measured field in T.
    pub fn read_field(&mut self) -> Result<f64, S::Error> {
        self.read_signal(Signal::Field)
    }

    /// Persistent field in T.
    pub fn read_field_persistent(&mut self) -> Result<f64, S::Error> {
        self.read_signal(Signal::FieldPersistent)
    }

    /// Field target in T.
    pub fn get_field_target(&mut self) -> Result<f64, S::Error> {
        let value = self.read_signal(Signal::FieldTarget)?;
        self.state.field_target = Some(value);
        Ok(value)
    }

    pub fn set_field_target(&mut self, tesla: f64) -> Result<(), S::Error> {
        if let Some(echoed) = self.write_signal(Signal::FieldTarget, tesla)? {
            self.state.field_target = Some(echoed);
        }
        Ok(())
    }

    /// Field ramp rate in T/s.
    pub fn get_field_ramp_rate(&mut self) -> Result<f64, S::Error> {
        let value = self.read_signal(Signal::FieldRampRate)?;
        self.state.field_ramp_rate = Some(value);
        Ok(value)
    }

    /// Set the field ramp rate in T/s. Must not be negative.
    pub fn set_field_ramp_rate(&mut self, tesla_per_second: f64) -> Result<(), S::Error> {
        if tesla_per_second < 0.0 || tesla_per_second.is_nan() {
            return Err(ArgumentError::NegativeRampRate(tesla_per_second.to_string()).into());
        }
        if let Some(echoed) = self.write_signal(Signal::FieldRampRate, tesla_per_second)? {
            self.state.field_ramp_rate = Some(echoed);
        }
        Ok(())
    }

    /// Current to field ratio in A/T.
    pub fn get_atob(&mut self) -> Result<f64, S::Error> {
        let value = self.read_signal(Signal::Atob)?;
        self.state.atob = Some(value);
        Ok(value)
    }

    pub fn set_atob(&mut self, amps_per_tesla: f64) -> Result<(), S::Error> {
        if let Some(echoed) = self.write_signal(Signal::Atob, amps_per_tesla)? {
            self.state.atob = Some(echoed);
        }
        Ok(())
    }

    pub fn get_ramp_status(&mut self) -> Result<RampStatus, S::Error> {
        let resp = self.param_getter(Signal::Action.suffix())?;
        let code = strip_structural(&resp);
        let status = RampStatus::from_wire(&code).ok_or(Error::UnknownRampStatus(code))?;
        self.state.ramp_status = Some(status);
        Ok(status)
    }

    /// Change the ramp status.
    ///
    /// A clamped supply can not go straight to [`RampStatus::ToSet`]; it must be released to
    /// [`RampStatus::Hold`] first.
    pub fn set_ramp_status(&mut self, status: RampStatus) -> Result<(), S::Error> {
        let status_now = self.get_ramp_status()?;
        if status_now == RampStatus::Clamp && status == RampStatus::ToSet {
            return Err(Error::Clamped {
                uid: self.state.uid.to_string(),
            });
        }
        let reply = self.param_setter(Signal::Action.suffix(), status.wire_code())?;
        if !reply.is_invalid() {
            self.state.ramp_status = Some(status);
        }
        Ok(())
    }

    /// Unconditionally ramp this PSU to its target, unclamping it first if needed.
    pub fn ramp_to_target(&mut self) -> Result<(), S::Error> {
        if self.get_ramp_status()? == RampStatus::Clamp {
            debug!("Releasing clamp on {}", self.state.uid);
            self.set_ramp_status(RampStatus::Hold)?;
        }
        self.set_ramp_status(RampStatus::ToSet)
    }

    /// Read an item and parse it into SI units.
    pub fn read_signal(&mut self, signal: Signal) -> Result<f64, S::Error> {
        let resp = self.param_getter(signal.suffix())?;
        Ok(signal.scaling().raw_to_si(&resp)?)
    }

    /// Write an item given in SI units. Returns the value the instrument echoed back, in SI
    /// units, or `None` if it refused the write.
    fn write_signal(&mut self, signal: Signal, value: f64) -> Result<Option<f64>, S::Error> {
        let raw = signal.scaling().si_to_raw(value);
        match self.param_setter(signal.suffix(), raw)? {
            Reply::Set(echoed) => Ok(Some(signal.scaling().raw_to_si(&echoed)?)),
            Reply::Read(_) | Reply::Invalid(_) => Ok(None),
        }
    }

    fn param_getter(&mut self, suffix: &str) -> Result<String, S::Error> {
        let dressed_cmd = format!("READ:DEV:{}:PSU:{}", self.state.uid, suffix);
        self.link.ask(&dressed_cmd)
    }

    fn param_setter(&mut self, suffix: &str, value: impl Display) -> Result<Reply, S::Error> {
        let dressed_cmd = format!("SET:DEV:{}:PSU:{}:{}", self.state.uid, suffix, value);
        self.link.query(&dressed_cmd)
    }
}
