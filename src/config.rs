//! Static plant configuration. Built once per run by the caller; read-only
//! inside the engine except through the degradation tracker.

use serde::{Deserialize, Serialize};

use crate::{
    prelude::*,
    units::{
        GramsPerMegajoule,
        MegajoulesPerKilogram,
        MegawattHours,
        MwhPerTonneAmmonia,
        MwhPerTonneHydrogen,
        TonnesAmmonia,
        TonnesHydrogen,
        TonnesHydrogenPerTonneAmmonia,
    },
};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlantConfig {
    pub wind: ResAsset,
    pub solar: ResAsset,
    pub grid: GridConnection,
    pub battery: BatterySpec,
    pub hydrogen_storage: HydrogenStorageSpec,
    pub compressor: CompressorSpec,
    pub electrolyzer: ElectrolyzerSpec,
    pub synthesis: SynthesisSpec,
    pub system: SystemConstants,
}

/// A wind or PV asset, scaled by the capacity-factor series.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResAsset {
    /// Energy produced over one hour at capacity factor 1.0.
    pub nominal_power: MegawattHours,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GridConnection {
    pub carbon_intensity: GramsPerMegajoule,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BatterySpec {
    pub capacity: MegawattHours,

    /// Maximum charge/discharge energy per hourly step.
    pub nominal_power: MegawattHours,

    /// Initial state of charge as a fraction of capacity.
    pub initial_soc: f64,

    /// Fraction of capacity reserved as the minimum-SOC floor.
    pub min_soc: f64,

    /// Fraction of capacity available for opportunistic output maximization.
    pub flex_use: f64,

    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,

    /// Absolute efficiency decrease per year.
    pub efficiency_degradation: f64,

    /// Capacity decrease per year, as a fraction of the initial capacity.
    pub capacity_degradation: f64,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HydrogenStorageSpec {
    pub capacity: TonnesHydrogen,
    pub initial_soc: f64,
    pub min_soc: f64,
    pub flex_use: f64,

    /// Carbon-intensity ceiling on hydrogen admitted to storage.
    pub ci_ceiling: GramsPerMegajoule,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompressorSpec {
    pub specific_energy: MwhPerTonneHydrogen,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ElectrolyzerSpec {
    /// Maximum electricity intake per hourly step.
    pub capacity: MegawattHours,

    pub specific_energy: MwhPerTonneHydrogen,

    /// Minimum load as a fraction of capacity.
    pub min_load: f64,

    /// Specific-energy increase per year, as a fraction of the initial value.
    pub specific_energy_degradation: f64,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisSpec {
    /// Haber-Bosch output per hourly step at nominal load.
    pub capacity: TonnesAmmonia,

    pub specific_energy: MwhPerTonneAmmonia,
    pub specific_hydrogen: TonnesHydrogenPerTonneAmmonia,

    /// Minimum load as a fraction of nominal load.
    pub min_load: f64,

    /// Hours of forced standby after an infeasible-load shutdown.
    pub restart_delay: u32,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConstants {
    /// Regulatory carbon-intensity ceiling on the produced ammonia.
    pub ci_max: GramsPerMegajoule,

    /// Carbon intensity of process steps outside this model's scope.
    pub ci_others: GramsPerMegajoule,

    pub ammonia_energy_density: MegajoulesPerKilogram,
    pub hydrogen_energy_density: MegajoulesPerKilogram,
}

impl SystemConstants {
    /// CI headroom left for electricity sourcing.
    pub fn ci_budget(&self) -> GramsPerMegajoule {
        self.ci_max - self.ci_others
    }
}

impl PlantConfig {
    /// Reject configurations the gate formulas cannot operate on. Called by
    /// [`crate::Simulation::run`] before the first step.
    pub fn validate(&self) -> Result<()> {
        fn fraction(name: &str, value: f64) -> Result<()> {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimulationError::configuration(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
            Ok(())
        }
        fn efficiency(name: &str, value: f64) -> Result<()> {
            if !(value > 0.0 && value <= 1.0) {
                return Err(SimulationError::configuration(format!(
                    "{name} must be within (0, 1], got {value}"
                )));
            }
            Ok(())
        }
        fn non_negative(name: &str, value: f64) -> Result<()> {
            if !(value >= 0.0) {
                return Err(SimulationError::configuration(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
            Ok(())
        }
        fn positive(name: &str, value: f64) -> Result<()> {
            if !(value > 0.0) {
                return Err(SimulationError::configuration(format!(
                    "{name} must be positive, got {value}"
                )));
            }
            Ok(())
        }

        non_negative("wind.nominal_power", self.wind.nominal_power.0)?;
        non_negative("solar.nominal_power", self.solar.nominal_power.0)?;
        non_negative("grid.carbon_intensity", self.grid.carbon_intensity.0)?;

        non_negative("battery.capacity", self.battery.capacity.0)?;
        non_negative("battery.nominal_power", self.battery.nominal_power.0)?;
        fraction("battery.initial_soc", self.battery.initial_soc)?;
        fraction("battery.min_soc", self.battery.min_soc)?;
        fraction("battery.flex_use", self.battery.flex_use)?;
        efficiency("battery.charge_efficiency", self.battery.charge_efficiency)?;
        efficiency("battery.discharge_efficiency", self.battery.discharge_efficiency)?;
        non_negative("battery.efficiency_degradation", self.battery.efficiency_degradation)?;
        non_negative("battery.capacity_degradation", self.battery.capacity_degradation)?;

        non_negative("hydrogen_storage.capacity", self.hydrogen_storage.capacity.0)?;
        fraction("hydrogen_storage.initial_soc", self.hydrogen_storage.initial_soc)?;
        fraction("hydrogen_storage.min_soc", self.hydrogen_storage.min_soc)?;
        fraction("hydrogen_storage.flex_use", self.hydrogen_storage.flex_use)?;
        non_negative("hydrogen_storage.ci_ceiling", self.hydrogen_storage.ci_ceiling.0)?;

        non_negative("compressor.specific_energy", self.compressor.specific_energy.0)?;

        positive("electrolyzer.capacity", self.electrolyzer.capacity.0)?;
        positive("electrolyzer.specific_energy", self.electrolyzer.specific_energy.0)?;
        fraction("electrolyzer.min_load", self.electrolyzer.min_load)?;
        non_negative(
            "electrolyzer.specific_energy_degradation",
            self.electrolyzer.specific_energy_degradation,
        )?;

        non_negative("synthesis.capacity", self.synthesis.capacity.0)?;
        positive("synthesis.specific_energy", self.synthesis.specific_energy.0)?;
        positive("synthesis.specific_hydrogen", self.synthesis.specific_hydrogen.0)?;
        fraction("synthesis.min_load", self.synthesis.min_load)?;

        non_negative("system.ci_max", self.system.ci_max.0)?;
        non_negative("system.ci_others", self.system.ci_others.0)?;
        positive("system.ammonia_energy_density", self.system.ammonia_energy_density.0)?;
        positive("system.hydrogen_energy_density", self.system.hydrogen_energy_density.0)?;

        Ok(())
    }
}
