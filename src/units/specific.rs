use std::ops::{Div, Mul};

use crate::units::Quantity;

/// Specific electricity demand per tonne of hydrogen produced.
pub type MwhPerTonneHydrogen = Quantity<f64, 1, -1, 0, 0>;

/// Specific electricity demand per tonne of ammonia synthesized.
pub type MwhPerTonneAmmonia = Quantity<f64, 1, 0, -1, 0>;

/// Hydrogen feed per tonne of ammonia synthesized.
pub type TonnesHydrogenPerTonneAmmonia = Quantity<f64, 0, 1, -1, 0>;

impl Div<MwhPerTonneHydrogen> for MwhPerTonneHydrogen {
    type Output = f64;

    fn div(self, rhs: MwhPerTonneHydrogen) -> Self::Output {
        self.0 / rhs.0
    }
}

impl Div<MwhPerTonneAmmonia> for MwhPerTonneAmmonia {
    type Output = f64;

    fn div(self, rhs: MwhPerTonneAmmonia) -> Self::Output {
        self.0 / rhs.0
    }
}

impl Mul<MwhPerTonneHydrogen> for TonnesHydrogenPerTonneAmmonia {
    type Output = MwhPerTonneAmmonia;

    fn mul(self, rhs: MwhPerTonneHydrogen) -> Self::Output {
        Quantity(self.0 * rhs.0)
    }
}
