use std::ops::{Div, Mul};

use serde::{Deserialize, Serialize};

/// Dimensioned quantity: energy (MWh), hydrogen mass (tH2), ammonia mass (tNH3),
/// and CO2 mass (gCO2) exponents are tracked in the type.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Neg,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
)]
pub struct Quantity<
    T,
    const ENERGY: isize,
    const HYDROGEN: isize,
    const AMMONIA: isize,
    const CARBON: isize,
>(pub T);

#[allow(dead_code)]
pub type Bare<T> = Quantity<T, 0, 0, 0, 0>;

impl<T, const ENERGY: isize, const HYDROGEN: isize, const AMMONIA: isize, const CARBON: isize>
    Quantity<T, ENERGY, HYDROGEN, AMMONIA, CARBON>
where
    Self: PartialOrd,
{
    pub fn min(mut self, rhs: Self) -> Self {
        if rhs < self {
            self = rhs;
        }
        self
    }

    pub fn max(mut self, rhs: Self) -> Self {
        if rhs > self {
            self = rhs;
        }
        self
    }

    pub fn clamp(mut self, min: Self, max: Self) -> Self {
        if self < min {
            self = min;
        }
        if self > max {
            self = max;
        }
        self
    }
}

impl<const ENERGY: isize, const HYDROGEN: isize, const AMMONIA: isize, const CARBON: isize>
    Quantity<f64, ENERGY, HYDROGEN, AMMONIA, CARBON>
{
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    /// Round to 10 decimal digits to suppress floating drift in carried-forward
    /// storage levels.
    #[must_use]
    pub fn round10(self) -> Self {
        Self((self.0 * 1e10).round() / 1e10)
    }
}

impl<const ENERGY: isize, const HYDROGEN: isize, const AMMONIA: isize, const CARBON: isize>
    Mul<f64> for Quantity<f64, ENERGY, HYDROGEN, AMMONIA, CARBON>
{
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl<const ENERGY: isize, const HYDROGEN: isize, const AMMONIA: isize, const CARBON: isize>
    Div<f64> for Quantity<f64, ENERGY, HYDROGEN, AMMONIA, CARBON>
{
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self(self.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min() {
        assert_eq!(Bare::from(1.0).min(Bare::from(2.0)), Bare::from(1.0));
        assert_eq!(Bare::from(2.0).min(Bare::from(1.0)), Bare::from(1.0));
    }

    #[test]
    fn test_max() {
        assert_eq!(Bare::from(1.0).max(Bare::from(2.0)), Bare::from(2.0));
        assert_eq!(Bare::from(2.0).max(Bare::from(1.0)), Bare::from(2.0));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Bare::from(1.0).clamp(Bare::from(2.0), Bare::from(3.0)), Bare::from(2.0));
        assert_eq!(Bare::from(4.0).clamp(Bare::from(2.0), Bare::from(3.0)), Bare::from(3.0));
    }

    #[test]
    fn test_round10() {
        assert_eq!(Bare::from(0.1 + 0.2).round10(), Bare::from(0.3));
    }
}
