//! An in-process Mercury iPS.
//!
//! The [`Simulator`] speaks the same line protocol as the instrument and implements
//! [`embedded_io::Read`] & [`embedded_io::Write`], so the driver can be run against it without
//! any hardware. Ramps finish instantly by default, or after a set number of status polls.

use std::collections::VecDeque;

use strum::IntoEnumIterator;
use tracing::debug;

use crate::{
    signal::{Access, Signal},
    transport::IoError,
    types::{Axis, RampStatus},
};

pub const DEFAULT_IDENTITY: &str = "IDN:OXFORD INSTRUMENTS:MERCURY iPS:SIMULATED:1.0";

/// State of one simulated PSU group.
#[derive(Debug, Clone, PartialEq)]
pub struct SimAxis {
    pub field: f64,
    pub field_target: f64,
    /// T/s.
    pub field_ramp_rate: f64,
    /// A/T.
    pub atob: f64,
    pub status: RampStatus,
    polls_left: u32,
}

impl Default for SimAxis {
    fn default() -> Self {
        Self {
            field: 0.0,
            field_target: 0.0,
            field_ramp_rate: 0.01,
            atob: 50.0,
            status: RampStatus::Hold,
            polls_left: 0,
        }
    }
}

impl SimAxis {
    fn complete_ramp(&mut self, field: f64) {
        self.field = field;
        self.status = RampStatus::Hold;
        self.polls_left = 0;
    }

    fn value(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Voltage => 0.0,
            Signal::Current | Signal::CurrentPersistent => self.field * self.atob,
            Signal::CurrentTarget => self.field_target * self.atob,
            Signal::FieldTarget => self.field_target,
            Signal::CurrentRampRate => self.field_ramp_rate * self.atob,
            Signal::FieldRampRate => self.field_ramp_rate,
            Signal::Field | Signal::FieldPersistent => self.field,
            Signal::Atob => self.atob,
            Signal::Action => 0.0,
        }
    }
}

/// Simulated instrument.
pub struct Simulator {
    identity: String,
    axes: [SimAxis; 3],
    /// Status polls answered with `RTOS` before a ramp completes.
    polls_per_ramp: u32,
    /// Partial command line not yet terminated.
    inbound: Vec<u8>,
    outbound: VecDeque<u8>,
    log: Vec<String>,
    fail_next_write: Option<std::io::ErrorKind>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            identity: DEFAULT_IDENTITY.to_owned(),
            axes: Default::default(),
            polls_per_ramp: 0,
            inbound: Vec::new(),
            outbound: VecDeque::new(),
            log: Vec::new(),
            fail_next_write: None,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Keep reporting `RTOS` for `polls` status reads after each ramp starts.
    pub fn with_polls_per_ramp(mut self, polls: u32) -> Self {
        self.polls_per_ramp = polls;
        self
    }

    /// Start with a field already on the magnet. The target follows.
    pub fn with_field(mut self, axis: Axis, tesla: f64) -> Self {
        let state = &mut self.axes[axis.index()];
        state.field = tesla;
        state.field_target = tesla;
        self
    }

    pub fn with_field_ramp_rate(mut self, axis: Axis, tesla_per_second: f64) -> Self {
        self.axes[axis.index()].field_ramp_rate = tesla_per_second;
        self
    }

    pub fn axis(&self, axis: Axis) -> &SimAxis {
        &self.axes[axis.index()]
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut SimAxis {
        &mut self.axes[axis.index()]
    }

    /// Clamp an axis, as if from the front panel.
    pub fn clamp(&mut self, axis: Axis) {
        self.axes[axis.index()].status = RampStatus::Clamp;
    }

    /// Every command received so far, in order.
    pub fn commands(&self) -> &[String] {
        &self.log
    }

    pub fn clear_commands(&mut self) {
        self.log.clear();
    }

    /// Make the next write fail with `kind`.
    pub fn fail_next_write(&mut self, kind: std::io::ErrorKind) {
        self.fail_next_write = Some(kind);
    }

    fn handle_line(&mut self, line: &str) {
        debug!("Simulator received: {line}");
        self.log.push(line.to_owned());
        let reply = self
            .respond(line)
            .unwrap_or_else(|| format!("STAT:{line}:INVALID"));
        self.outbound.extend(reply.bytes());
        self.outbound.push_back(b'\n');
    }

    fn respond(&mut self, line: &str) -> Option<String> {
        if line == "*IDN?" {
            return Some(self.identity.clone());
        }
        if let Some(item) = line.strip_prefix("READ:") {
            let (axis, suffix) = Self::address(item)?;
            let payload = self.read_item(axis, suffix)?;
            return Some(format!("STAT:{item}:{payload}"));
        }
        if let Some(item) = line.strip_prefix("SET:") {
            let (item, value) = item.rsplit_once(':')?;
            let (axis, suffix) = Self::address(item)?;
            self.write_item(axis, suffix, value)?;
            return Some(format!("STAT:{line}:VALID"));
        }
        None
    }

    /// Split `DEV:<UID>:PSU:<suffix>` into axis and suffix.
    fn address(item: &str) -> Option<(Axis, &str)> {
        let (uid, suffix) = item.strip_prefix("DEV:")?.split_once(':')?;
        let axis = Axis::iter().find(|axis| axis.group() == uid)?;
        Some((axis, suffix.strip_prefix("PSU:")?))
    }

    fn read_item(&mut self, axis: Axis, suffix: &str) -> Option<String> {
        let signal = Signal::iter().find(|signal| signal.suffix() == suffix)?;
        let state = &mut self.axes[axis.index()];

        if signal == Signal::Action {
            if state.status == RampStatus::ToSet {
                if state.polls_left == 0 {
                    let target = state.field_target;
                    state.complete_ramp(target);
                } else {
                    state.polls_left -= 1;
                }
            }
            return Some(state.status.wire_code().to_owned());
        }

        let raw = signal.scaling().si_to_raw(state.value(signal));
        Some(format!("{raw:.4}{}", wire_unit(signal)))
    }

    fn write_item(&mut self, axis: Axis, suffix: &str, value: &str) -> Option<()> {
        let signal = Signal::iter().find(|signal| signal.suffix() == suffix)?;
        if signal.access() == Access::Read {
            return None;
        }
        let polls_per_ramp = self.polls_per_ramp;
        let state = &mut self.axes[axis.index()];

        if signal == Signal::Action {
            let status = RampStatus::from_wire(value)?;
            match status {
                RampStatus::ToSet if state.status == RampStatus::Clamp => return None,
                RampStatus::ToSet if polls_per_ramp == 0 => {
                    let target = state.field_target;
                    state.complete_ramp(target);
                }
                RampStatus::ToSet => {
                    state.status = RampStatus::ToSet;
                    state.polls_left = polls_per_ramp;
                }
                RampStatus::ToZero => state.complete_ramp(0.0),
                RampStatus::Hold | RampStatus::Clamp => {
                    state.status = status;
                    state.polls_left = 0;
                }
            }
            return Some(());
        }

        let si = signal.scaling().raw_to_si(value).ok()?;
        match signal {
            Signal::FieldTarget => state.field_target = si,
            Signal::FieldRampRate => state.field_ramp_rate = si,
            Signal::Atob => state.atob = si,
            _ => return None,
        }
        Some(())
    }
}

/// Unit the instrument appends to a reading.
fn wire_unit(signal: Signal) -> &'static str {
    match signal {
        Signal::CurrentRampRate => "A/m",
        Signal::FieldRampRate => "T/m",
        Signal::Atob => "",
        _ => signal.unit(),
    }
}

impl embedded_io::ErrorType for Simulator {
    type Error = IoError;
}

impl embedded_io::Write for Simulator {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if let Some(kind) = self.fail_next_write.take() {
            return Err(IoError::from(kind));
        }
        self.inbound.extend_from_slice(buf);
        while let Some(pos) = self.inbound.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.inbound.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..pos]);
            self.handle_line(line.trim_end_matches('\r'));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for Simulator {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.outbound.is_empty() {
            return Err(IoError::from(std::io::ErrorKind::TimedOut));
        }
        let bytes_to_read = core::cmp::min(buf.len(), self.outbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.outbound.drain(..bytes_to_read)) {
            *slot = byte;
        }
        Ok(bytes_to_read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use embedded_io::{Read, Write};

    fn exchange(sim: &mut Simulator, cmd: &str) -> String {
        sim.write_all(cmd.as_bytes()).unwrap();
        sim.write_all(b"\n").unwrap();
        let mut buf = [0u8; 256];
        let n = sim.read(&mut buf).unwrap();
        String::from_utf8_lossy(&buf[..n]).trim_end().to_owned()
    }

    #[test]
    fn test_idn() {
        let mut sim = Simulator::new().with_identity("IDN:OXFORD:MERCURYIPS:SN1234:1.07");
        assert_eq!(exchange(&mut sim, "*IDN?"), "IDN:OXFORD:MERCURYIPS:SN1234:1.07");
    }

    #[test]
    fn test_reads_echo_command() {
        let mut sim = Simulator::new().with_field(Axis::Y, -0.25);
        assert_eq!(
            exchange(&mut sim, "READ:DEV:GRPY:PSU:SIG:FLD"),
            "STAT:DEV:GRPY:PSU:SIG:FLD:-0.2500T"
        );
        assert_eq!(
            exchange(&mut sim, "READ:DEV:GRPX:PSU:SIG:RFST"),
            "STAT:DEV:GRPX:PSU:SIG:RFST:0.6000T/m"
        );
        assert_eq!(
            exchange(&mut sim, "READ:DEV:GRPX:PSU:ACTN"),
            "STAT:DEV:GRPX:PSU:ACTN:HOLD"
        );
    }

    #[test]
    fn test_writes() {
        let mut sim = Simulator::new();
        assert_eq!(
            exchange(&mut sim, "SET:DEV:GRPZ:PSU:SIG:RFST:30"),
            "STAT:SET:DEV:GRPZ:PSU:SIG:RFST:30:VALID"
        );
        assert_relative_eq!(sim.axis(Axis::Z).field_ramp_rate, 0.5);
        exchange(&mut sim, "SET:DEV:GRPZ:PSU:SIG:FSET:0.3");
        exchange(&mut sim, "SET:DEV:GRPZ:PSU:ACTN:RTOS");
        assert_eq!(sim.axis(Axis::Z).field, 0.3);
        assert_eq!(sim.axis(Axis::Z).status, RampStatus::Hold);
    }

    #[test]
    fn test_invalid_commands() {
        let mut sim = Simulator::new();
        for cmd in [
            "SET:DEV:GRPX:PSU:SIG:FLD:1",
            "READ:DEV:GRPW:PSU:SIG:FLD",
            "READ:DEV:GRPX:PSU:SIG:FOO",
            "SET:DEV:GRPX:PSU:ACTN:FAST",
            "HELLO",
        ] {
            assert_eq!(exchange(&mut sim, cmd), format!("STAT:{cmd}:INVALID"));
        }
        assert_eq!(sim.commands().len(), 5);
    }

    #[test]
    fn test_clamped_axis_refuses_to_ramp() {
        let mut sim = Simulator::new();
        sim.clamp(Axis::X);
        assert!(exchange(&mut sim, "SET:DEV:GRPX:PSU:ACTN:RTOS").ends_with("INVALID"));
        assert_eq!(sim.axis(Axis::X).status, RampStatus::Clamp);
        assert!(exchange(&mut sim, "SET:DEV:GRPX:PSU:ACTN:HOLD").ends_with(":VALID"));
        assert!(exchange(&mut sim, "SET:DEV:GRPX:PSU:ACTN:RTOS").ends_with(":VALID"));
    }

    #[test]
    fn test_polled_ramp() {
        let mut sim = Simulator::new().with_polls_per_ramp(2);
        exchange(&mut sim, "SET:DEV:GRPX:PSU:SIG:FSET:1");
        exchange(&mut sim, "SET:DEV:GRPX:PSU:ACTN:RTOS");
        assert!(exchange(&mut sim, "READ:DEV:GRPX:PSU:ACTN").ends_with("RTOS"));
        assert!(exchange(&mut sim, "READ:DEV:GRPX:PSU:ACTN").ends_with("RTOS"));
        assert_eq!(sim.axis(Axis::X).field, 0.0);
        assert!(exchange(&mut sim, "READ:DEV:GRPX:PSU:ACTN").ends_with("HOLD"));
        assert_eq!(sim.axis(Axis::X).field, 1.0);
    }

    #[test]
    fn test_nothing_to_read_times_out() {
        let mut sim = Simulator::new();
        let mut buf = [0u8; 8];
        assert!(sim.read(&mut buf).is_err());
        sim.fail_next_write(std::io::ErrorKind::BrokenPipe);
        assert!(sim.write(b"*IDN?\n").is_err());
        assert!(sim.commands().is_empty());
    }
}
