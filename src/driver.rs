use fugit::MillisDurationU32;
use tracing::info;

use crate::{
    error::{Error, Result},
    link::Link,
    psu::{Psu, PsuState},
    target::{FieldLimits, VectorTarget},
    types::{Axis, Backend, Identity, RampStatus, Uid},
    vector::FieldVector,
};

/// Three-axis Mercury iPS magnet power supply.
///
/// You can create a MercuryIps using any interface which implements [embedded_io::Read] &
/// [embedded_io::Write], normally via [`MercuryIpsBuilder`](crate::config::MercuryIpsBuilder).
///
/// The driver owns the link to the instrument, the three PSU groups (`GRPX`, `GRPY`, `GRPZ`)
/// and the vector target. Use [`Self::psu`] to talk to a single axis.
pub struct MercuryIps<S: embedded_io::Read + embedded_io::Write, const L: usize = 256> {
    pub(crate) link: Link<S, L>,
    pub(crate) psus: [PsuState; 3],
    pub(crate) target: VectorTarget,
    pub(crate) poll_interval: MillisDurationU32,
    identity: Identity,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> MercuryIps<S, L> {
    /// Identify the instrument and seed the target with the field it currently holds.
    pub(crate) fn init(
        interface: S,
        backend: Backend,
        limits: FieldLimits,
        poll_interval: MillisDurationU32,
    ) -> Result<Self, S::Error> {
        let mut link = Link::new(interface, backend);

        let identity = Self::query_identity(&mut link)?;
        info!("Connected to: {identity}");

        let psus = [
            PsuState::new(Uid::new(Axis::X.group())?),
            PsuState::new(Uid::new(Axis::Y.group())?),
            PsuState::new(Uid::new(Axis::Z.group())?),
        ];

        let mut driver = Self {
            link,
            psus,
            target: VectorTarget::new(FieldVector::ZERO, limits),
            poll_interval,
            identity,
        };
        let measured = driver.read_field()?;
        driver.target.commit(measured);
        Ok(driver)
    }

    fn query_identity(link: &mut Link<S, L>) -> Result<Identity, S::Error> {
        let raw = link.ask("*IDN?")?;
        Identity::parse(&raw).ok_or(Error::InvalidResponse(raw))
    }

    /// Borrow one axis.
    pub fn psu(&mut self, axis: Axis) -> Psu<'_, S, L> {
        Psu::new(&mut self.link, &mut self.psus[axis.index()])
    }

    /// What the driver last heard from one axis, without asking the instrument.
    pub fn psu_state(&self, axis: Axis) -> &PsuState {
        &self.psus[axis.index()]
    }

    /// Identity read when the driver was created.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Ask the instrument for its identity again.
    pub fn refresh_identity(&mut self) -> Result<&Identity, S::Error> {
        self.identity = Self::query_identity(&mut self.link)?;
        Ok(&self.identity)
    }

    /// Send a raw command and return the payload of the reply.
    pub fn ask(&mut self, cmd: &str) -> Result<String, S::Error> {
        self.link.ask(cmd)
    }

    pub fn backend(&self) -> Backend {
        self.link.backend()
    }

    /// Interval between ramp status polls in safe mode.
    pub fn poll_interval(&self) -> MillisDurationU32 {
        self.poll_interval
    }

    pub fn set_poll_interval(&mut self, interval: MillisDurationU32) {
        self.poll_interval = interval;
    }

    /// Field ramp rates of all three axes in T/s.
    pub fn get_field_ramp_rate(&mut self) -> Result<FieldVector, S::Error> {
        let mut rates = [0.0; 3];
        for axis in Axis::ALL {
            rates[axis.index()] = self.psu(axis).get_field_ramp_rate()?;
        }
        Ok(FieldVector::from(rates))
    }

    /// Set the field ramp rates of all three axes in T/s, x first.
    pub fn set_field_ramp_rate(&mut self, rates: FieldVector) -> Result<(), S::Error> {
        for axis in Axis::ALL {
            self.psu(axis)
                .set_field_ramp_rate(rates.get(axis.coordinate()))?;
        }
        Ok(())
    }

    /// Put every axis on hold.
    ///
    /// A cancelled ramp leaves the instrument ramping on its own; this stops it.
    pub fn hold_all(&mut self) -> Result<(), S::Error> {
        for axis in Axis::ALL {
            self.psu(axis).set_ramp_status(RampStatus::Hold)?;
        }
        Ok(())
    }

    pub fn interface(&self) -> &S {
        self.link.interface()
    }

    pub fn interface_mut(&mut self) -> &mut S {
        self.link.interface_mut()
    }

    /// Give back the interface.
    pub fn into_inner(self) -> S {
        self.link.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_serial::MockSerial;
    use approx::assert_relative_eq;
    use fugit::ExtU32;

    const IDN: &str = "IDN:OXFORD:MERCURYIPS:SN1234:1.07";

    fn connected(extra: &[&str]) -> MercuryIps<MockSerial> {
        let mut mock = MockSerial::new();
        mock.push_reply(IDN);
        mock.push_reply("STAT:DEV:GRPX:PSU:SIG:FLD:0.1000T");
        mock.push_reply("STAT:DEV:GRPY:PSU:SIG:FLD:-0.2000T");
        mock.push_reply("STAT:DEV:GRPZ:PSU:SIG:FLD:0.0000T");
        for reply in extra {
            mock.push_reply(reply);
        }
        MercuryIps::init(mock, Backend::Socket, Box::new(|_, _, _| true), 100.millis()).unwrap()
    }

    #[test]
    fn test_init_sequence() {
        let driver = connected(&[]);
        assert_eq!(driver.identity().vendor, "OXFORD");
        assert_eq!(driver.identity().serial, "SN1234");
        assert_eq!(driver.get_field_target(), FieldVector::new(0.1, -0.2, 0.0));
        assert_eq!(
            driver.into_inner().written_lines(),
            [
                "*IDN?",
                "READ:DEV:GRPX:PSU:SIG:FLD",
                "READ:DEV:GRPY:PSU:SIG:FLD",
                "READ:DEV:GRPZ:PSU:SIG:FLD",
            ]
        );
    }

    #[test]
    fn test_bad_identity() {
        let mut mock = MockSerial::new();
        mock.push_reply("IDN:OXFORD");
        let result: Result<MercuryIps<MockSerial>, _> =
            MercuryIps::init(mock, Backend::Socket, Box::new(|_, _, _| true), 100.millis());
        assert!(matches!(result, Err(Error::InvalidResponse(raw)) if raw == "IDN:OXFORD"));
    }

    #[test]
    fn test_field_ramp_rate_vector() {
        let mut driver = connected(&[
            "STAT:DEV:GRPX:PSU:SIG:RFST:0.6000T/m",
            "STAT:DEV:GRPY:PSU:SIG:RFST:1.2000T/m",
            "STAT:DEV:GRPZ:PSU:SIG:RFST:0.0000T/m",
        ]);
        let rates = driver.get_field_ramp_rate().unwrap();
        assert_relative_eq!(rates.x(), 0.01);
        assert_relative_eq!(rates.y(), 0.02);
        assert_relative_eq!(rates.z(), 0.0);
        assert_relative_eq!(driver.psu_state(Axis::Y).field_ramp_rate().unwrap(), 0.02);
    }

    #[test]
    fn test_hold_all() {
        let mut driver = connected(&[
            "STAT:DEV:GRPX:PSU:ACTN:RTOS",
            "STAT:SET:DEV:GRPX:PSU:ACTN:HOLD:VALID",
            "STAT:DEV:GRPY:PSU:ACTN:HOLD",
            "STAT:SET:DEV:GRPY:PSU:ACTN:HOLD:VALID",
            "STAT:DEV:GRPZ:PSU:ACTN:RTOZ",
            "STAT:SET:DEV:GRPZ:PSU:ACTN:HOLD:VALID",
        ]);
        driver.hold_all().unwrap();
        for axis in Axis::ALL {
            assert_eq!(driver.psu_state(axis).ramp_status(), Some(RampStatus::Hold));
        }
        let lines = driver.into_inner().written_lines();
        assert_eq!(lines[5], "SET:DEV:GRPX:PSU:ACTN:HOLD");
        assert_eq!(lines[9], "SET:DEV:GRPZ:PSU:ACTN:HOLD");
    }

    #[test]
    fn test_refresh_identity() {
        let mut driver = connected(&["IDN:OXFORD:MERCURYIPS:SN1234:2.00"]);
        assert_eq!(driver.refresh_identity().unwrap().firmware, "2.00");
    }
}
