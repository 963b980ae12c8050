//! Ramping all three axes to the target.
//!
//! Two modes are offered, see [`RampMode`]. In safe mode the axes are ramped one after the
//! other, shortest move first, which keeps the field inside a convex safe region the whole way.
//! Waiting for an axis to finish is the only place the driver yields.

use core::time::Duration;

use tracing::debug;

use crate::{
    driver::MercuryIps,
    error::{Error, Result},
    types::{Axis, Backend, RampMode, RampStatus},
    vector::FieldVector,
};

/// Order in which safe mode ramps the axes: ascending distance to target, ties in x, y, z
/// order.
pub fn ramp_order(target: FieldVector, measured: FieldVector) -> [Axis; 3] {
    let mut order = Axis::ALL;
    let distance = |axis: Axis| {
        let coordinate = axis.coordinate();
        (target.get(coordinate) - measured.get(coordinate)).abs()
    };
    // sort_by is stable.
    order.sort_by(|a, b| distance(*a).total_cmp(&distance(*b)));
    order
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> MercuryIps<S, L> {
    /// Ramp the field to the present target.
    ///
    /// In [`RampMode::Simul`] all axes are started at once and this returns straight away; the
    /// field may leave the safe region on its way. In [`RampMode::Safe`] it returns once the
    /// last axis has finished.
    ///
    /// Dropping the future while it waits does not stop the axis that is ramping; use
    /// [`Self::hold_all`] for that.
    pub async fn ramp(&mut self, mode: RampMode) -> Result<(), S::Error> {
        let measured = self.read_field()?;

        for axis in Axis::ALL {
            let mut psu = self.psu(axis);
            if psu.get_field_target()? != measured.get(axis.coordinate())
                && psu.get_field_ramp_rate()? == 0.0
            {
                return Err(Error::ZeroRampRate {
                    uid: psu.uid().to_string(),
                });
            }
        }

        match mode {
            RampMode::Simul => self.ramp_simultaneously(),
            RampMode::Safe => self.ramp_safely(measured).await,
        }
    }

    fn ramp_simultaneously(&mut self) -> Result<(), S::Error> {
        for axis in Axis::ALL {
            debug!("Ramping {axis}");
            self.psu(axis).ramp_to_target()?;
        }
        Ok(())
    }

    async fn ramp_safely(&mut self, measured: FieldVector) -> Result<(), S::Error> {
        let order = ramp_order(self.target.vector(), measured);
        debug!("Safe ramp order {order:?}");

        let poll_interval = Duration::from_millis(self.poll_interval.to_millis().into());
        for axis in order {
            debug!("Ramping {axis}");
            self.psu(axis).ramp_to_target()?;

            // A simulated instrument is done as soon as it is told.
            if self.link.backend() == Backend::Simulation {
                continue;
            }
            while self.psu(axis).get_ramp_status()? == RampStatus::ToSet {
                debug!("Waiting for {axis} to reach its target");
                tokio::time::sleep(poll_interval).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortest_move_first() {
        let order = ramp_order(FieldVector::new(0.3, 0.1, 0.2), FieldVector::ZERO);
        assert_eq!(order, [Axis::Y, Axis::Z, Axis::X]);
    }

    #[test]
    fn test_distance_not_signed() {
        let order = ramp_order(
            FieldVector::new(0.0, 0.5, 0.0),
            FieldVector::new(0.4, 0.0, 0.45),
        );
        assert_eq!(order, [Axis::X, Axis::Z, Axis::Y]);
    }

    #[test]
    fn test_ties_keep_axis_order() {
        assert_eq!(
            ramp_order(FieldVector::new(0.1, 0.1, 0.1), FieldVector::ZERO),
            [Axis::X, Axis::Y, Axis::Z]
        );
        assert_eq!(
            ramp_order(FieldVector::new(0.2, 0.1, 0.1), FieldVector::ZERO),
            [Axis::Y, Axis::Z, Axis::X]
        );
    }
}
