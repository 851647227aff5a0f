use std::ops::{Div, Mul};

use crate::units::{
    Quantity,
    energy::MegawattHours,
    specific::{MwhPerTonneAmmonia, MwhPerTonneHydrogen, TonnesHydrogenPerTonneAmmonia},
};

pub type TonnesHydrogen = Quantity<f64, 0, 1, 0, 0>;
pub type TonnesAmmonia = Quantity<f64, 0, 0, 1, 0>;

impl Mul<MwhPerTonneHydrogen> for TonnesHydrogen {
    type Output = MegawattHours;

    fn mul(self, rhs: MwhPerTonneHydrogen) -> Self::Output {
        Quantity(self.0 * rhs.0)
    }
}

impl Div<TonnesHydrogenPerTonneAmmonia> for TonnesHydrogen {
    type Output = TonnesAmmonia;

    fn div(self, rhs: TonnesHydrogenPerTonneAmmonia) -> Self::Output {
        Quantity(self.0 / rhs.0)
    }
}

impl Mul<MwhPerTonneAmmonia> for TonnesAmmonia {
    type Output = MegawattHours;

    fn mul(self, rhs: MwhPerTonneAmmonia) -> Self::Output {
        Quantity(self.0 * rhs.0)
    }
}

impl Mul<TonnesHydrogenPerTonneAmmonia> for TonnesAmmonia {
    type Output = TonnesHydrogen;

    fn mul(self, rhs: TonnesHydrogenPerTonneAmmonia) -> Self::Output {
        Quantity(self.0 * rhs.0)
    }
}
