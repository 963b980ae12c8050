//! Magnetic field vectors.
//!
//! A [`FieldVector`] is stored as its Cartesian triple in T. The spherical and cylindrical
//! components are views computed on demand, so the representations can never disagree.
//!
//! | Coordinate | Meaning                         |
//! |------------|---------------------------------|
//! | `r`        | `√(x²+y²+z²)`                   |
//! | `theta`    | angle from +z, `acos(z/r)`      |
//! | `phi`      | angle from +x in the xy-plane   |
//! | `rho`      | `√(x²+y²)`                      |
//!
//! Angles are in radians. On a zero length vector the undefined angles read as 0.

use core::fmt;
use core::ops::{Add, Div, Mul, Neg, Sub};

use approx::{AbsDiffEq, RelativeEq};
use strum_macros::EnumIter;

use crate::{error::ArgumentError, types::Coordinate};

/// The coordinate systems a vector can be specified in.
///
/// Order matters: a set of components is applied in the first system that holds all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum CoordinateSystem {
    /// `(x, y, z)`
    Cartesian,
    /// `(r, theta, phi)`
    Spherical,
    /// `(phi, rho, z)`
    Cylindrical,
}

impl CoordinateSystem {
    pub const ALL: [CoordinateSystem; 3] = [
        CoordinateSystem::Cartesian,
        CoordinateSystem::Spherical,
        CoordinateSystem::Cylindrical,
    ];

    pub const fn members(self) -> [Coordinate; 3] {
        match self {
            CoordinateSystem::Cartesian => [Coordinate::X, Coordinate::Y, Coordinate::Z],
            CoordinateSystem::Spherical => [Coordinate::R, Coordinate::Theta, Coordinate::Phi],
            CoordinateSystem::Cylindrical => [Coordinate::Phi, Coordinate::Rho, Coordinate::Z],
        }
    }

    pub fn contains(self, coordinate: Coordinate) -> bool {
        self.members().contains(&coordinate)
    }

    /// Build a vector from this system's components, in [`Self::members`] order.
    pub fn build(self, [a, b, c]: [f64; 3]) -> FieldVector {
        match self {
            CoordinateSystem::Cartesian => FieldVector::new(a, b, c),
            CoordinateSystem::Spherical => FieldVector::spherical(a, b, c),
            CoordinateSystem::Cylindrical => FieldVector::cylindrical(a, b, c),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldVector {
    x: f64,
    y: f64,
    z: f64,
}

impl FieldVector {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// From length, polar angle from +z, and azimuth from +x.
    pub fn spherical(r: f64, theta: f64, phi: f64) -> Self {
        Self::new(
            r * theta.sin() * phi.cos(),
            r * theta.sin() * phi.sin(),
            r * theta.cos(),
        )
    }

    /// From azimuth, distance from the z axis, and height.
    pub fn cylindrical(phi: f64, rho: f64, z: f64) -> Self {
        Self::new(rho * phi.cos(), rho * phi.sin(), z)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn r(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn theta(&self) -> f64 {
        let r = self.r();
        if r > 0.0 {
            // Rounding can push the ratio a hair outside [-1, 1].
            (self.z / r).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        }
    }

    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn rho(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn get(&self, coordinate: Coordinate) -> f64 {
        match coordinate {
            Coordinate::X => self.x,
            Coordinate::Y => self.y,
            Coordinate::Z => self.z,
            Coordinate::R => self.r(),
            Coordinate::Theta => self.theta(),
            Coordinate::Phi => self.phi(),
            Coordinate::Rho => self.rho(),
        }
    }

    pub fn get_components(&self, coordinates: &[Coordinate]) -> Vec<f64> {
        coordinates.iter().map(|c| self.get(*c)).collect()
    }

    /// `[x, y, z]`
    pub fn cartesian(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Set one component, keeping the rest of its coordinate system fixed.
    ///
    /// Setting `r` keeps the direction, setting `theta` keeps `r` and `phi`, setting `rho` keeps
    /// `phi` and `z`, and so on.
    pub fn set_component(&mut self, coordinate: Coordinate, value: f64) {
        // A single coordinate always belongs to some system.
        let system = CoordinateSystem::ALL
            .into_iter()
            .find(|s| s.contains(coordinate))
            .unwrap_or(CoordinateSystem::Cartesian);
        *self = self.with_system_values(system, &[(coordinate, value)]);
    }

    /// Set several components at once. They must all belong to one coordinate system; the
    /// members of that system which are not given keep their present values.
    pub fn set_components(&mut self, updates: &[(Coordinate, f64)]) -> Result<(), ArgumentError> {
        let system = CoordinateSystem::ALL
            .into_iter()
            .find(|s| updates.iter().all(|(c, _)| s.contains(*c)))
            .ok_or_else(|| {
                let names: Vec<String> = updates.iter().map(|(c, _)| c.to_string()).collect();
                ArgumentError::UnderdeterminedComponents(names.join(", "))
            })?;
        *self = self.with_system_values(system, updates);
        Ok(())
    }

    fn with_system_values(&self, system: CoordinateSystem, updates: &[(Coordinate, f64)]) -> Self {
        let values = system.members().map(|member| {
            updates
                .iter()
                .rev()
                .find(|(c, _)| *c == member)
                .map(|(_, v)| *v)
                .unwrap_or_else(|| self.get(member))
        });
        system.build(values)
    }

    /// Euclidean length, same as `r`.
    pub fn norm(&self) -> f64 {
        self.r()
    }

    pub fn distance(&self, other: &FieldVector) -> f64 {
        (*self - *other).norm()
    }

    pub fn dot(&self, other: &FieldVector) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl From<[f64; 3]> for FieldVector {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<FieldVector> for [f64; 3] {
    fn from(value: FieldVector) -> Self {
        value.cartesian()
    }
}

impl Add for FieldVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for FieldVector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for FieldVector {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for FieldVector {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<FieldVector> for f64 {
    type Output = FieldVector;

    fn mul(self, rhs: FieldVector) -> FieldVector {
        rhs * self
    }
}

impl Div<f64> for FieldVector {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl AbsDiffEq for FieldVector {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        1e-8
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
    }
}

impl RelativeEq for FieldVector {
    fn default_max_relative() -> f64 {
        1e-5
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.x.relative_eq(&other.x, epsilon, max_relative)
            && self.y.relative_eq(&other.y, epsilon, max_relative)
            && self.z.relative_eq(&other.z, epsilon, max_relative)
    }
}

/// Equal up to floating point noise on each axis.
impl PartialEq for FieldVector {
    fn eq(&self, other: &Self) -> bool {
        self.relative_eq(
            other,
            Self::default_epsilon(),
            Self::default_max_relative(),
        )
    }
}

impl fmt::Display for FieldVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldVector(x={}, y={}, z={})", self.x, self.y, self.z)
    }
}
