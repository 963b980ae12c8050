//! The vector target and its safe region.
//!
//! The instrument only stores a scalar target per axis, so any non-Cartesian coordinate the
//! user sets only exists here. The target is changed by setters alone, never by ramping, and
//! only after the field limits have accepted the result.

use tracing::debug;

use crate::{
    driver::MercuryIps,
    error::{Result, TargetError},
    types::{Axis, Coordinate},
    vector::FieldVector,
};

/// Safe region predicate on `(x, y, z)` in T. `true` means inside.
pub type FieldLimits = Box<dyn Fn(f64, f64, f64) -> bool + Send + Sync>;

pub struct VectorTarget {
    vector: FieldVector,
    limits: FieldLimits,
}

impl VectorTarget {
    pub fn new(vector: FieldVector, limits: FieldLimits) -> Self {
        Self { vector, limits }
    }

    /// A target with no restriction on where the field may go.
    pub fn unbounded(vector: FieldVector) -> Self {
        Self::new(vector, Box::new(|_, _, _| true))
    }

    pub fn vector(&self) -> FieldVector {
        self.vector
    }

    pub fn get(&self, coordinate: Coordinate) -> f64 {
        self.vector.get(coordinate)
    }

    pub fn permits(&self, candidate: &FieldVector) -> bool {
        let [x, y, z] = candidate.cartesian();
        (self.limits)(x, y, z)
    }

    /// The target with one component changed, if it is finite and stays inside the limits.
    pub fn propose(
        &self,
        coordinate: Coordinate,
        value: f64,
    ) -> core::result::Result<FieldVector, TargetError> {
        let mut candidate = self.vector;
        candidate.set_component(coordinate, value);
        if !value.is_finite() || !candidate.cartesian().iter().all(|c| c.is_finite()) {
            return Err(TargetError::NonFinite { coordinate, value });
        }
        if !self.permits(&candidate) {
            return Err(TargetError::RegionViolation { coordinate, value });
        }
        Ok(candidate)
    }

    /// Replace the target. Only for candidates from [`Self::propose`].
    pub(crate) fn commit(&mut self, candidate: FieldVector) {
        self.vector = candidate;
    }

    /// Swap in new limits, provided the present target satisfies them.
    pub fn set_limits(&mut self, limits: FieldLimits) -> core::result::Result<(), TargetError> {
        let [x, y, z] = self.vector.cartesian();
        if !limits(x, y, z) {
            return Err(TargetError::LimitsRejected);
        }
        self.limits = limits;
        Ok(())
    }
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> MercuryIps<S, L> {
    /// Set one component of the target field and push the result to the three PSUs.
    ///
    /// A target outside the field limits is refused before anything changes, locally or on
    /// the instrument.
    pub fn set_target_component(&mut self, coordinate: Coordinate, value: f64) -> Result<(), S::Error> {
        let candidate = self.target.propose(coordinate, value)?;
        self.target.commit(candidate);
        debug!("New target {candidate}");

        for axis in Axis::ALL {
            self.psu(axis)
                .set_field_target(candidate.get(axis.coordinate()))?;
        }
        Ok(())
    }

    /// Set the whole target field, one Cartesian component at a time in x, y, z order.
    ///
    /// Each intermediate target must also be inside the limits.
    pub fn set_field_target(&mut self, field: FieldVector) -> Result<(), S::Error> {
        for axis in Axis::ALL {
            let coordinate = axis.coordinate();
            self.set_target_component(coordinate, field.get(coordinate))?;
        }
        Ok(())
    }

    /// A component of the target, as held by the driver. Never read back from the instrument.
    pub fn get_target_component(&self, coordinate: Coordinate) -> f64 {
        self.target.get(coordinate)
    }

    pub fn get_field_target(&self) -> FieldVector {
        self.target.vector()
    }

    /// Measure all three axes.
    pub fn read_field(&mut self) -> Result<FieldVector, S::Error> {
        let mut field = [0.0; 3];
        for axis in Axis::ALL {
            field[axis.index()] = self.psu(axis).read_field()?;
        }
        Ok(FieldVector::from(field))
    }

    /// Measure all three axes and project onto one coordinate.
    pub fn read_component(&mut self, coordinate: Coordinate) -> Result<f64, S::Error> {
        Ok(self.read_field()?.get(coordinate))
    }

    /// Measure all three axes and project onto several coordinates.
    pub fn read_components(&mut self, coordinates: &[Coordinate]) -> Result<Vec<f64>, S::Error> {
        Ok(self.read_field()?.get_components(coordinates))
    }

    /// Assign new field limits. Refused if the present target lies outside them.
    pub fn set_field_limits<F>(&mut self, limits: F) -> Result<(), S::Error>
    where
        F: Fn(f64, f64, f64) -> bool + Send + Sync + 'static,
    {
        Ok(self.target.set_limits(Box::new(limits))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_ball() -> FieldLimits {
        Box::new(|x, y, z| x * x + y * y + z * z <= 1.0)
    }

    #[test]
    fn propose_inside_limits() {
        let target = VectorTarget::new(FieldVector::ZERO, unit_ball());
        let candidate = target.propose(Coordinate::Z, 0.5).unwrap();
        assert_eq!(candidate, FieldVector::new(0.0, 0.0, 0.5));
        // Proposing alone changes nothing.
        assert_eq!(target.vector(), FieldVector::ZERO);
    }

    #[test]
    fn propose_outside_limits() {
        let target = VectorTarget::new(FieldVector::ZERO, unit_ball());
        assert_eq!(
            target.propose(Coordinate::Z, 2.0),
            Err(TargetError::RegionViolation {
                coordinate: Coordinate::Z,
                value: 2.0
            })
        );
        assert_eq!(target.get(Coordinate::Z), 0.0);
    }

    #[test]
    fn propose_in_spherical() {
        let mut target = VectorTarget::new(FieldVector::new(0.0, 0.0, 0.5), unit_ball());
        assert!(target.propose(Coordinate::R, 1.5).is_err());
        let candidate = target.propose(Coordinate::R, 0.8).unwrap();
        target.commit(candidate);
        assert_eq!(target.vector(), FieldVector::new(0.0, 0.0, 0.8));
    }

    #[test]
    fn propose_non_finite() {
        let target = VectorTarget::unbounded(FieldVector::new(0.1, 0.0, 0.0));
        for (coordinate, value) in [
            (Coordinate::R, f64::NAN),
            (Coordinate::X, f64::INFINITY),
            (Coordinate::Theta, f64::NEG_INFINITY),
        ] {
            assert!(matches!(
                target.propose(coordinate, value),
                Err(TargetError::NonFinite { .. })
            ));
        }
        assert_eq!(target.vector(), FieldVector::new(0.1, 0.0, 0.0));
    }

    #[test]
    fn limits_must_admit_present_target() {
        let mut target = VectorTarget::unbounded(FieldVector::new(0.0, 0.0, 2.0));
        assert_eq!(
            target.set_limits(unit_ball()),
            Err(TargetError::LimitsRejected)
        );
        // Old limits still apply.
        assert!(target.propose(Coordinate::Z, 5.0).is_ok());

        let mut target = VectorTarget::unbounded(FieldVector::new(0.0, 0.0, 0.5));
        assert!(target.set_limits(unit_ball()).is_ok());
        assert!(target.propose(Coordinate::Z, 5.0).is_err());
    }
}
