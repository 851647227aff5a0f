use std::ops::Div;

use crate::units::{
    Quantity,
    mass::{TonnesAmmonia, TonnesHydrogen},
    specific::{MwhPerTonneAmmonia, MwhPerTonneHydrogen},
};

/// Electrical energy over one hourly step.
pub type MegawattHours = Quantity<f64, 1, 0, 0, 0>;

impl Div<MwhPerTonneHydrogen> for MegawattHours {
    type Output = TonnesHydrogen;

    fn div(self, rhs: MwhPerTonneHydrogen) -> Self::Output {
        Quantity(self.0 / rhs.0)
    }
}

impl Div<MwhPerTonneAmmonia> for MegawattHours {
    type Output = TonnesAmmonia;

    fn div(self, rhs: MwhPerTonneAmmonia) -> Self::Output {
        Quantity(self.0 / rhs.0)
    }
}

impl Div<MegawattHours> for MegawattHours {
    type Output = f64;

    fn div(self, rhs: MegawattHours) -> Self::Output {
        self.0 / rhs.0
    }
}
