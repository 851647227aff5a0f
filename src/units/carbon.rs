use serde::{Deserialize, Serialize};

use crate::units::{
    Quantity,
    energy::MegawattHours,
    mass::{TonnesAmmonia, TonnesHydrogen},
};

/// Carbon intensity, gCO2 per MJ of energy content.
pub type GramsPerMegajoule = Quantity<f64, -1, 0, 0, 1>;

pub type GramsCo2 = Quantity<f64, 0, 0, 0, 1>;

pub const MEGAJOULES_PER_MEGAWATT_HOUR: f64 = 3600.0;
pub const KILOGRAMS_PER_TONNE: f64 = 1000.0;

/// Lower heating value of a product, as configured (MJ per kg).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Display,
    derive_more::From,
)]
pub struct MegajoulesPerKilogram(pub f64);

/// CO2 attributed to a quantity of grid electricity.
pub fn grid_emissions(energy: MegawattHours, grid_ci: GramsPerMegajoule) -> GramsCo2 {
    Quantity(energy.0 * MEGAJOULES_PER_MEGAWATT_HOUR * grid_ci.0)
}

/// Carbon intensity of a hydrogen mass whose only CO2 source is grid electricity.
///
/// Zero when no hydrogen was produced.
pub fn hydrogen_ci(
    grid_energy: MegawattHours,
    grid_ci: GramsPerMegajoule,
    mass: TonnesHydrogen,
    energy_density: MegajoulesPerKilogram,
) -> GramsPerMegajoule {
    if mass <= TonnesHydrogen::ZERO {
        return GramsPerMegajoule::ZERO;
    }
    let content = mass.0 * KILOGRAMS_PER_TONNE * energy_density.0;
    Quantity(grid_emissions(grid_energy, grid_ci).0 / content)
}

/// Carbon intensity of the produced ammonia when grid electricity is the only
/// CO2 source. Zero when nothing was produced.
pub fn ammonia_ci_from_grid(
    grid_energy: MegawattHours,
    grid_ci: GramsPerMegajoule,
    output: TonnesAmmonia,
    energy_density: MegajoulesPerKilogram,
) -> GramsPerMegajoule {
    if output <= TonnesAmmonia::ZERO {
        return GramsPerMegajoule::ZERO;
    }
    let content = output.0 * KILOGRAMS_PER_TONNE * energy_density.0;
    Quantity(grid_emissions(grid_energy, grid_ci).0 / content)
}

/// Carbon intensity of the produced ammonia when stored hydrogen is the only
/// CO2 source. Zero when nothing was produced.
pub fn ammonia_ci_from_hydrogen(
    hydrogen_ci: GramsPerMegajoule,
    hydrogen: TonnesHydrogen,
    hydrogen_density: MegajoulesPerKilogram,
    output: TonnesAmmonia,
    ammonia_density: MegajoulesPerKilogram,
) -> GramsPerMegajoule {
    if output <= TonnesAmmonia::ZERO {
        return GramsPerMegajoule::ZERO;
    }
    let co2 = hydrogen_ci.0 * hydrogen.0 * KILOGRAMS_PER_TONNE * hydrogen_density.0;
    Quantity(co2 / (output.0 * KILOGRAMS_PER_TONNE * ammonia_density.0))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_grid_emissions() {
        // 1 MWh at 100 g/MJ is 360 kg of CO2.
        assert_abs_diff_eq!(
            grid_emissions(Quantity(1.0), Quantity(100.0)).0,
            360_000.0,
        );
    }

    #[test]
    fn test_hydrogen_ci() {
        let ci = hydrogen_ci(
            Quantity(1.0),
            Quantity(100.0),
            Quantity(1.0),
            MegajoulesPerKilogram(120.0),
        );
        assert_abs_diff_eq!(ci.0, 3.0);
    }

    #[test]
    fn test_zero_output_yields_zero_ci() {
        let ci = ammonia_ci_from_grid(
            Quantity(1.0),
            Quantity(100.0),
            TonnesAmmonia::ZERO,
            MegajoulesPerKilogram(18.8),
        );
        assert_eq!(ci, GramsPerMegajoule::ZERO);
    }
}
