//! Per-step demand figures and grid-share caps, derived from the configured
//! ratings and the current degradation state.

use crate::{
    config::PlantConfig,
    degradation::{BatteryState, ElectrolyzerState},
    units::{
        GramsPerMegajoule,
        MegajoulesPerKilogram,
        MegawattHours,
        MwhPerTonneAmmonia,
        MwhPerTonneHydrogen,
        TonnesHydrogen,
        carbon::{KILOGRAMS_PER_TONNE, MEGAJOULES_PER_MEGAWATT_HOUR},
    },
};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Thresholds {
    /// Electricity demand of the whole chain at nominal synthesis load, with
    /// hydrogen fed straight from the electrolyzer.
    pub demand_nominal: MegawattHours,
    /// The same demand at the synthesis minimum load.
    pub demand_min: MegawattHours,

    /// Electricity per tonne of hydrogen produced and compressed to storage.
    pub spec_storage: MwhPerTonneHydrogen,
    /// Electricity per tonne of ammonia across all consumers.
    pub spec_ammonia: MwhPerTonneAmmonia,

    /// Electrolyzer and synthesis shares of the direct-feed demand.
    pub electrolyzer_share: f64,
    pub synthesis_share: f64,

    /// Grid share cap on the storage path: compressor-only sourcing and the
    /// admission CI ceiling.
    pub max_grid_share_storage: f64,
    /// Grid share cap on direct production: synthesis-only sourcing and the
    /// product CI budget.
    pub max_grid_share_min: f64,

    pub battery_floor: MegawattHours,
    pub storage_floor: TonnesHydrogen,

    /// Synthesis part of the minimum demand, also the hot-standby draw.
    pub synthesis_min_demand: MegawattHours,
    /// Electrolysis part of the minimum demand.
    pub electrolyzer_min_demand: MegawattHours,
    /// Electrolysis part of the minimum demand, less the electrolyzer's own
    /// minimum load.
    pub electrolyzer_reduced_min: MegawattHours,
}

impl Thresholds {
    pub fn compute(
        config: &PlantConfig,
        battery: &BatteryState,
        electrolyzer: &ElectrolyzerState,
    ) -> Self {
        let synthesis = &config.synthesis;
        let hydrogen_el: MwhPerTonneAmmonia =
            synthesis.specific_hydrogen * electrolyzer.specific_energy;
        let spec_ammonia = synthesis.specific_energy + hydrogen_el;
        let spec_storage = electrolyzer.specific_energy + config.compressor.specific_energy;

        let demand_nominal = synthesis.capacity * spec_ammonia;
        let demand_min = demand_nominal * synthesis.min_load;

        let synthesis_share = synthesis.specific_energy / spec_ammonia;
        let electrolyzer_share = hydrogen_el / spec_ammonia;

        let ci_budget = config.system.ci_budget();
        let grid_ci = config.grid.carbon_intensity;
        let max_grid_share_storage = (config.compressor.specific_energy / spec_storage).min(
            ci_share_limit(
                ci_budget.min(config.hydrogen_storage.ci_ceiling),
                config.system.hydrogen_energy_density,
                grid_ci,
                spec_storage.0,
            ),
        );
        let max_grid_share_min = synthesis_share.min(ci_share_limit(
            ci_budget,
            config.system.ammonia_energy_density,
            grid_ci,
            spec_ammonia.0,
        ));

        let synthesis_min_demand = demand_min * synthesis_share;
        let electrolyzer_min_demand = demand_min * electrolyzer_share;

        Self {
            demand_nominal,
            demand_min,
            spec_storage,
            spec_ammonia,
            electrolyzer_share,
            synthesis_share,
            max_grid_share_storage,
            max_grid_share_min,
            battery_floor: battery.capacity * config.battery.min_soc,
            storage_floor: config.hydrogen_storage.capacity * config.hydrogen_storage.min_soc,
            synthesis_min_demand,
            electrolyzer_min_demand,
            electrolyzer_reduced_min: electrolyzer_min_demand
                - config.electrolyzer.capacity * config.electrolyzer.min_load,
        }
    }
}

/// Largest grid share keeping the product at or below `limit`, for a process
/// drawing `specific_energy` MWh per tonne of product.
fn ci_share_limit(
    limit: GramsPerMegajoule,
    energy_density: MegajoulesPerKilogram,
    grid_ci: GramsPerMegajoule,
    specific_energy: f64,
) -> f64 {
    if grid_ci.0 <= 0.0 {
        return 1.0;
    }
    let per_tonne_content = energy_density.0 * KILOGRAMS_PER_TONNE;
    (limit.0 * per_tonne_content / (grid_ci.0 * MEGAJOULES_PER_MEGAWATT_HOUR * specific_energy))
        .min(1.0)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::config::tests::default_config;

    #[test]
    fn test_reference_plant_demands() {
        let config = default_config();
        let thresholds = Thresholds::compute(
            &config,
            &BatteryState::from_spec(&config.battery),
            &ElectrolyzerState::from_spec(&config.electrolyzer),
        );
        // 7.5 t/h * (0.33 + 0.18 * 55) MWh/t.
        assert_abs_diff_eq!(thresholds.demand_nominal.0, 76.725, epsilon = 1e-9);
        assert_abs_diff_eq!(thresholds.demand_min.0, 30.69, epsilon = 1e-9);
        assert_abs_diff_eq!(thresholds.spec_storage.0, 57.0);
        assert_abs_diff_eq!(
            thresholds.synthesis_share + thresholds.electrolyzer_share,
            1.0,
            epsilon = 1e-12,
        );
    }

    #[test]
    fn test_grid_share_caps() {
        let config = default_config();
        let thresholds = Thresholds::compute(
            &config,
            &BatteryState::from_spec(&config.battery),
            &ElectrolyzerState::from_spec(&config.electrolyzer),
        );
        // Keeping the electrolyzer fully renewable binds tighter than the
        // ammonia CI budget at the German grid mix.
        assert_abs_diff_eq!(thresholds.max_grid_share_min, 0.33 / 10.23, epsilon = 1e-12);
        // The storage admission ceiling binds tighter than the compressor share.
        assert_abs_diff_eq!(
            thresholds.max_grid_share_storage,
            5.0 * 120.0 * 1000.0 / (114.0 * 3600.0 * 57.0),
            epsilon = 1e-12,
        );
    }

    #[test]
    fn test_zero_grid_ci_allows_full_grid_share() {
        assert_abs_diff_eq!(
            ci_share_limit(
                GramsPerMegajoule::from(22.2),
                MegajoulesPerKilogram(18.8),
                GramsPerMegajoule::ZERO,
                10.23,
            ),
            1.0,
        );
    }
}
