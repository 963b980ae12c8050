//! Scaling of numeric replies.
//!
//! The Mercury reports values with an optional SI prefix glued to the unit, e.g. `-1.23mT`, and
//! interleaves its `:` field separator into value fields. We only want to deal in SI units, so
//! the prefix is translated into a factor, and any conversion on our side (e.g. A/min to A/s) is
//! applied explicitly through [`ScalingFactors`].

use crate::error::ParseError;

/// SI prefixes the instrument may put in front of a unit.
pub const SI_PREFIXES: [(char, f64); 5] = [
    ('n', 1e-9),
    ('u', 1e-6),
    ('m', 1e-3),
    ('k', 1e3),
    ('M', 1e6),
];

/// Conversion between what goes over the wire and the SI value we expose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingFactors {
    /// Multiplier applied to a parsed reply.
    pub read: f64,
    /// Multiplier applied to a value before it is written.
    pub write: f64,
}

impl Default for ScalingFactors {
    /// Default to no scaling.
    fn default() -> Self {
        Self::UNITY
    }
}

impl ScalingFactors {
    pub const UNITY: Self = Self::new(1.0, 1.0);

    /// The instrument counts ramp rates per minute, we count per second.
    pub const PER_MINUTE: Self = Self::new(1.0 / 60.0, 60.0);

    pub const fn new(read: f64, write: f64) -> Self {
        Self { read, write }
    }

    /// Parse a reply and convert it to SI.
    #[inline]
    pub fn raw_to_si(&self, response: &str) -> Result<f64, ParseError> {
        parse_signal(self.read, response)
    }

    /// Convert an SI value to what the instrument expects.
    #[inline]
    pub fn si_to_raw(&self, value: f64) -> f64 {
        value * self.write
    }
}

/// Factor for an SI prefix character, if it is one.
pub fn si_factor(prefix: char) -> Option<f64> {
    SI_PREFIXES
        .iter()
        .find(|(c, _)| *c == prefix)
        .map(|(_, factor)| *factor)
}

/// Remove every structural `:` from a reply.
pub fn strip_structural(response: &str) -> String {
    response.replace(':', "")
}

/// Parse a reply into an SI value.
///
/// The leading run of `0-9 . -` is the number. If the character right after it is a known SI
/// prefix, the number is scaled by it; anything else (a bare unit, or nothing) leaves it as is.
/// Finally `our_scaling` is applied.
pub fn parse_signal(our_scaling: f64, response: &str) -> Result<f64, ParseError> {
    let response = strip_structural(response);
    let split = response
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(response.len());
    let (digits, scale_and_unit) = response.split_at(split);

    if digits.is_empty() {
        return Err(ParseError::NoNumber(response));
    }
    let value: f64 = digits
        .parse()
        .map_err(|_| ParseError::BadNumber(digits.to_owned()))?;

    let their_scaling = scale_and_unit
        .chars()
        .next()
        .and_then(si_factor)
        .unwrap_or(1.0);

    Ok(value * their_scaling * our_scaling)
}
