//! Hour-by-hour dispatch engine.
//!
//! Each step runs a cascade of feasibility gates: nominal operation from
//! renewables alone, grid-assisted operation within the carbon-intensity
//! budget, minimum-load operation from the onsite buffers, and finally hot
//! standby. The first feasible regime wins and allocates all flows.

use bon::Builder;
use chrono::Duration;

use crate::{
    config::PlantConfig,
    degradation::{BatteryState, ElectrolyzerState, MonthTracker},
    ledger::HydrogenLedger,
    prelude::*,
    record::{OperationalSeries, TimestepRecord},
    restart::RestartClock,
    series::ResSeries,
    shutdown::ShutdownTracker,
    trace::GateOutcome,
    units::{GramsPerMegajoule, TonnesAmmonia, TonnesHydrogen},
};

mod assisted;
mod minimum;
mod nominal;
mod standby;
mod thresholds;

use self::thresholds::Thresholds;

#[derive(Builder)]
#[builder(finish_fn(vis = ""))]
pub struct Simulation<'a> {
    config: &'a PlantConfig,
    series: &'a ResSeries,
}

impl<S: simulation_builder::IsComplete> SimulationBuilder<'_, S> {
    pub fn run(self) -> Result<OperationalSeries> {
        self.build().run()
    }
}

impl Simulation<'_> {
    /// Walks the renewable series and returns the anchor record followed by
    /// one record per hour.
    #[instrument(skip_all, name = "Simulating…", fields(steps = self.series.len()))]
    fn run(self) -> Result<OperationalSeries> {
        let config = self.config;
        config.validate()?;

        let mut battery = BatteryState::from_spec(&config.battery);
        let mut electrolyzer = ElectrolyzerState::from_spec(&config.electrolyzer);
        let mut ledger = HydrogenLedger::new();
        let mut months = MonthTracker::new(self.series.start_time());
        let mut restart = RestartClock::new();
        let mut synthesis_downtime = ShutdownTracker::new();
        let mut electrolyzer_downtime = ShutdownTracker::new();

        let mut records: OperationalSeries = Vec::with_capacity(self.series.len() + 1);
        records.push(self.anchor(&battery, &electrolyzer, &mut ledger)?);

        for (index, sample) in self.series.samples().iter().enumerate() {
            let step = index + 1;

            if let Some(share) = months.advance(sample.time) {
                battery.degrade(&config.battery, share);
                electrolyzer.degrade(&config.electrolyzer, share);
                // The shrunk capacity may strand part of the previous charge.
                let prev = &mut records[step - 1];
                let clamped = prev.battery_soc.min(battery.capacity);
                prev.battery_loss += prev.battery_soc - clamped;
                prev.battery_soc = clamped;
                debug!(step, share, "applied monthly degradation");
            }

            restart.tick();

            let thresholds = Thresholds::compute(config, &battery, &electrolyzer);
            let prev = records[step - 1].clone();

            let mut rec = TimestepRecord::zeroed(sample.time);
            rec.wind_cf = sample.wind_cf;
            rec.pv_cf = sample.pv_cf;
            rec.wind_energy = config.wind.nominal_power * sample.wind_cf;
            rec.pv_energy = config.solar.nominal_power * sample.pv_cf;
            rec.res_energy = rec.wind_energy + rec.pv_energy;
            rec.battery_capacity = battery.capacity;
            rec.battery_charge_efficiency = battery.charge_efficiency;
            rec.battery_discharge_efficiency = battery.discharge_efficiency;
            rec.electrolyzer_specific_energy = electrolyzer.specific_energy.0;

            let blocked = restart.is_blocked();
            let mut cx = StepContext {
                step,
                config,
                battery: &battery,
                electrolyzer: &electrolyzer,
                thresholds: &thresholds,
                ledger: &mut ledger,
                prev: &prev,
                rec: &mut rec,
            };

            if cx.rec.res_energy > thresholds.demand_nominal && !blocked {
                cx.rec.trace.push(GateOutcome::NominalFeasible);
                nominal::dispatch(&mut cx)?;
            } else {
                cx.rec.trace.push(GateOutcome::NominalInfeasible);
                let potential = cx.rec.res_energy / (1.0 - thresholds.max_grid_share_min);
                if potential > thresholds.demand_min && !blocked {
                    cx.rec.trace.push(GateOutcome::GridMinFeasible);
                    assisted::dispatch(&mut cx)?;
                } else {
                    cx.rec.trace.push(GateOutcome::GridMinInfeasible);
                    match minimum::verdict(&cx) {
                        Some(mode) if !blocked => {
                            cx.rec.trace.push(GateOutcome::MinLoad(mode));
                            minimum::dispatch(&mut cx, mode)?;
                        }
                        _ => {
                            if blocked {
                                cx.rec.trace.push(GateOutcome::SynthesisBlocked);
                            } else {
                                restart.trip(config.synthesis.restart_delay);
                                cx.rec.trace.push(GateOutcome::MinLoadInfeasible);
                            }
                            standby::dispatch(&mut cx)?;
                        }
                    }
                }
            }

            self.settle(step, &mut rec, &prev, &battery, &ledger)?;
            trace!(step, gates = %rec.trace, "dispatched");

            if let Some((start, duration)) =
                synthesis_downtime.observe(step, rec.ammonia_output > TonnesAmmonia::ZERO)
            {
                if start == step {
                    rec.synthesis_downtime = duration;
                } else {
                    records[start].synthesis_downtime = duration;
                }
            }
            if let Some((start, duration)) =
                electrolyzer_downtime.observe(step, rec.electrolyzer_output > TonnesHydrogen::ZERO)
            {
                if start == step {
                    rec.electrolyzer_downtime = duration;
                } else {
                    records[start].electrolyzer_downtime = duration;
                }
            }

            records.push(rec);
        }

        let produced: TonnesAmmonia = records.iter().map(|rec| rec.ammonia_output).sum();
        info!(steps = self.series.len(), %produced, "completed");
        Ok(records)
    }

    /// The row preceding the first sample, carrying the initial buffer levels.
    fn anchor(
        &self,
        battery: &BatteryState,
        electrolyzer: &ElectrolyzerState,
        ledger: &mut HydrogenLedger,
    ) -> Result<TimestepRecord> {
        let config = self.config;
        let mut rec = TimestepRecord::zeroed(self.series.start_time() - Duration::hours(1));
        rec.battery_soc = config.battery.capacity * config.battery.initial_soc;
        rec.storage_soc = config.hydrogen_storage.capacity * config.hydrogen_storage.initial_soc;
        // Pre-filled inventory is assumed to sit right at the admission ceiling.
        if rec.storage_soc > TonnesHydrogen::ZERO {
            rec.storage_avg_ci = config.hydrogen_storage.ci_ceiling;
            ledger
                .deposit(0, rec.storage_soc, rec.storage_avg_ci)
                .map_err(|source| SimulationError::Ledger { step: 0, source })?;
        }
        rec.battery_capacity = battery.capacity;
        rec.battery_charge_efficiency = battery.charge_efficiency;
        rec.battery_discharge_efficiency = battery.discharge_efficiency;
        rec.electrolyzer_specific_energy = electrolyzer.specific_energy.0;
        Ok(rec)
    }

    /// Closes the step: totals, battery conversion losses, buffer levels, and
    /// the physical sanity checks.
    fn settle(
        &self,
        step: usize,
        rec: &mut TimestepRecord,
        prev: &TimestepRecord,
        battery: &BatteryState,
        ledger: &HydrogenLedger,
    ) -> Result<()> {
        rec.total_consumption = rec.electrolyzer_input
            + rec.synthesis_input
            + rec.battery_input
            + rec.compressor_input;

        let charging = rec.battery_input.0 != 0.0;
        let discharging = rec.battery_output.0 != 0.0;
        if charging && discharging {
            return Err(SimulationError::invariant(
                step,
                format!(
                    "battery cannot charge ({}) and discharge ({}) in the same hour",
                    rec.battery_input, rec.battery_output,
                ),
            ));
        }
        if rec.battery_input.0 < 0.0 || rec.battery_output.0 < 0.0 {
            return Err(SimulationError::invariant(
                step,
                format!(
                    "negative battery flow (input {}, output {})",
                    rec.battery_input, rec.battery_output,
                ),
            ));
        }
        if charging {
            rec.battery_charge = rec.battery_input * battery.charge_efficiency;
            rec.battery_loss += rec.battery_input - rec.battery_charge;
            rec.battery_soc = prev.battery_soc + rec.battery_charge;
        } else if discharging {
            rec.battery_discharge = rec.battery_output / battery.discharge_efficiency;
            rec.battery_loss += rec.battery_discharge - rec.battery_output;
            rec.battery_soc = prev.battery_soc - rec.battery_discharge;
        } else {
            rec.battery_soc = prev.battery_soc;
        }
        rec.battery_soc = rec.battery_soc.round10();

        let storage_touched = rec.storage_input.0 != 0.0
            || rec.storage_output.0 != 0.0
            || rec.storage_vent.0 != 0.0;
        if storage_touched {
            rec.storage_soc = ledger.total().round10();
            rec.storage_avg_ci = ledger.weighted_ci().round10();
        } else {
            rec.storage_soc = prev.storage_soc;
            rec.storage_avg_ci = prev.storage_avg_ci;
        }

        if rec.battery_soc.0 < -1e-6 || rec.battery_soc.0 > battery.capacity.0 + 1e-6 {
            return Err(SimulationError::invariant(
                step,
                format!(
                    "battery SOC {} outside [0, {}]",
                    rec.battery_soc, battery.capacity,
                ),
            ));
        }
        let storage_capacity = self.config.hydrogen_storage.capacity;
        if rec.storage_soc.0 < -1e-6 || rec.storage_soc.0 > storage_capacity.0 + 1e-6 {
            return Err(SimulationError::invariant(
                step,
                format!(
                    "hydrogen storage SOC {} outside [0, {}]",
                    rec.storage_soc, storage_capacity,
                ),
            ));
        }
        Ok(())
    }
}

/// Everything one step's gate functions operate on.
pub(crate) struct StepContext<'a> {
    pub step: usize,
    pub config: &'a PlantConfig,
    pub battery: &'a BatteryState,
    pub electrolyzer: &'a ElectrolyzerState,
    pub thresholds: &'a Thresholds,
    pub ledger: &'a mut HydrogenLedger,
    pub prev: &'a TimestepRecord,
    pub rec: &'a mut TimestepRecord,
}

impl StepContext<'_> {
    fn deposit(&mut self, mass: TonnesHydrogen, ci: GramsPerMegajoule) -> Result<()> {
        self.ledger
            .deposit(self.step, mass, ci)
            .map_err(|source| SimulationError::Ledger { step: self.step, source })
    }

    fn withdraw(&mut self, mass: TonnesHydrogen) -> Result<GramsPerMegajoule> {
        self.ledger
            .withdraw(mass)
            .map_err(|source| SimulationError::Ledger { step: self.step, source })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        config::tests::default_config,
        series::tests::{hourly, start},
        trace::MinLoadMode,
    };

    fn run(config: &PlantConfig, factors: &[(f64, f64)]) -> OperationalSeries {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let series = ResSeries::new(hourly(start(), factors)).unwrap();
        Simulation::builder().config(config).series(&series).run().unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = default_config();
        config.synthesis.specific_energy.0 = 0.0;
        let series = ResSeries::new(hourly(start(), &[(0.5, 0.0)])).unwrap();
        let result = Simulation::builder().config(&config).series(&series).run();
        assert!(matches!(result, Err(SimulationError::Configuration { .. })));
    }

    #[test]
    fn test_nominal_load_with_full_buffers() {
        let mut config = default_config();
        config.battery.initial_soc = 0.5;
        config.hydrogen_storage.initial_soc = 0.3;

        let records = run(&config, &[(1.0, 0.5)]);
        let rec = &records[1];

        assert!(rec.trace.fired(GateOutcome::NominalFeasible));
        assert!(rec.trace.fired(GateOutcome::FloorSatisfied));
        assert_abs_diff_eq!(rec.ammonia_output.0, 7.5);
        // Direct feed: 7.5 t/h * 0.18 tH2/tNH3.
        assert_abs_diff_eq!(rec.synthesis_hydrogen_input.0, 1.35);
        assert_eq!(rec.grid_import.0, 0.0);
    }

    #[test]
    fn test_floor_recovery_caps_the_load() {
        // Empty buffers force the plant to its maximised partial load while
        // the surplus refills them.
        let records = run(&default_config(), &[(1.0, 0.5)]);
        let rec = &records[1];

        assert!(rec.trace.fired(GateOutcome::FloorDeficit));
        assert!(rec.ammonia_output.0 > 0.0);
        assert!(rec.ammonia_output.0 < 7.5);
        assert!(rec.battery_input.0 > 0.0);
        assert!(rec.storage_input.0 > 0.0);
        // Renewable hydrogen enters the ledger carbon-free.
        assert_eq!(rec.storage_input_ci, GramsPerMegajoule::ZERO);
        assert_eq!(rec.storage_avg_ci, GramsPerMegajoule::ZERO);
    }

    #[test]
    fn test_grid_assisted_minimum_respects_ci_budget() {
        let mut config = default_config();
        config.wind.nominal_power.0 = 40.0;
        config.solar.nominal_power.0 = 0.0;
        config.battery.initial_soc = 0.5;
        config.hydrogen_storage.initial_soc = 0.3;

        let records = run(&config, &[(1.0, 0.0)]);
        let rec = &records[1];

        assert!(rec.trace.fired(GateOutcome::NominalInfeasible));
        assert!(rec.trace.fired(GateOutcome::GridMinFeasible));
        // Grid import lifts 40 MWh of RES to 40 / (1 - 0.33/10.23) MWh.
        assert_abs_diff_eq!(rec.grid_import.0, 40.0 / (1.0 - 0.33 / 10.23) - 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rec.synthesis_grid_input.0, rec.grid_import.0);
        assert_abs_diff_eq!(rec.ammonia_ci.0, 7.203, epsilon = 1e-2);
        assert!(rec.ammonia_ci <= config.system.ci_budget());
    }

    #[test]
    fn test_minimum_load_runs_on_stored_hydrogen() {
        let mut config = default_config();
        config.battery.initial_soc = 1.0;
        config.hydrogen_storage.initial_soc = 0.5;

        // 0.75 MWh of RES is below even the synthesis standby draw.
        let records = run(&config, &[(0.005, 0.0)]);
        let rec = &records[1];

        assert_eq!(rec.trace.min_load_mode(), Some(MinLoadMode::DeficitHydrogenFull));
        assert_abs_diff_eq!(rec.ammonia_output.0, 3.0);
        // The whole hydrogen demand comes from storage, at the admission CI.
        assert_abs_diff_eq!(rec.storage_output.0, 0.54, epsilon = 1e-9);
        assert_abs_diff_eq!(rec.storage_output_ci.0, 5.0);
        assert_abs_diff_eq!(rec.ammonia_ci.0, 5.0 * 0.54 * 120.0 / (3.0 * 18.8), epsilon = 1e-9);
        assert_eq!(rec.electrolyzer_input.0, 0.0);
        assert_abs_diff_eq!(rec.battery_output.0, 0.99 - 0.75, epsilon = 1e-9);
    }

    #[test]
    fn test_inventory_replacement_vents_dirty_batches() {
        let mut config = default_config();
        config.battery.initial_soc = 0.5;
        config.hydrogen_storage.initial_soc = 1.0;

        let records = run(&config, &[(1.0, 0.5)]);
        let rec = &records[1];

        assert!(rec.trace.fired(GateOutcome::StorageFull));
        assert!(rec.trace.fired(GateOutcome::ReplacementTriggered));
        assert!(rec.storage_vent.0 > 0.0);
        assert_abs_diff_eq!(rec.storage_input.0, rec.storage_vent.0);
        // Replacement swaps mass one-for-one, the level stays put while the
        // inventory CI drops.
        assert_abs_diff_eq!(rec.storage_soc.0, 100.0);
        assert!(rec.storage_avg_ci < config.hydrogen_storage.ci_ceiling);
        assert_abs_diff_eq!(rec.ammonia_output.0, 7.5);
    }

    #[test]
    fn test_standby_refills_storage_up_to_electrolyzer_capacity() {
        let mut config = default_config();
        config.wind.nominal_power.0 = 100.0;
        config.solar.nominal_power.0 = 0.0;
        config.battery.capacity.0 = 0.0;
        config.battery.nominal_power.0 = 0.0;
        config.electrolyzer.capacity.0 = 10.0;
        config.electrolyzer.min_load = 0.0;
        config.synthesis.capacity.0 = 20.0;
        config.synthesis.min_load = 0.9;

        let records = run(&config, &[(1.0, 0.0)]);
        let rec = &records[1];

        assert!(rec.trace.fired(GateOutcome::MinLoadInfeasible));
        assert!(rec.trace.fired(GateOutcome::RefillElectrolyzer));
        // The refill saturates the electrolyzer.
        assert_abs_diff_eq!(rec.electrolyzer_input.0, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rec.storage_input.0, 10.0 / 55.0, epsilon = 1e-9);
        assert_eq!(rec.ammonia_output.0, 0.0);
        assert_eq!(rec.ammonia_ci, GramsPerMegajoule::ZERO);
        assert_abs_diff_eq!(rec.supply_total().0, rec.consumption_total().0, epsilon = 1e-9);
    }

    #[test]
    fn test_restart_delay_blocks_recovery() {
        let mut config = default_config();
        config.battery.capacity.0 = 0.0;
        config.battery.nominal_power.0 = 0.0;
        config.hydrogen_storage.capacity.0 = 0.0;
        config.synthesis.restart_delay = 3;

        let high = (1.0, 0.5);
        let records = run(&config, &[high, high, high, (0.0, 0.0), high, high, high, high]);

        for step in 1..=3 {
            assert_abs_diff_eq!(records[step].ammonia_output.0, 7.5);
        }
        // The outage trips the restart clock; the two following hours stay
        // blocked despite ample supply.
        assert!(records[4].trace.fired(GateOutcome::MinLoadInfeasible));
        assert!(records[4].grid_import.0 > 0.0);
        for step in 5..=6 {
            assert!(records[step].trace.fired(GateOutcome::SynthesisBlocked));
            assert_eq!(records[step].ammonia_output.0, 0.0);
        }
        assert_abs_diff_eq!(records[7].ammonia_output.0, 7.5);
        // The idle episode is attributed to the hour it began.
        assert_eq!(records[4].synthesis_downtime, 3);
        assert_eq!(records[5].synthesis_downtime, 0);
    }

    #[test]
    fn test_energy_and_mass_balance_over_a_varied_week() {
        let factors: Vec<(f64, f64)> = (0..168)
            .map(|hour| {
                let wind = 0.5 + 0.5 * f64::sin(hour as f64 / 7.0);
                let pv = if hour % 24 >= 8 && hour % 24 <= 16 { 0.6 } else { 0.0 };
                (wind.clamp(0.0, 1.0), pv)
            })
            .collect();
        let config = default_config();
        let records = run(&config, &factors);

        for (step, pair) in records.windows(2).enumerate() {
            let (prev, rec) = (&pair[0], &pair[1]);
            assert_abs_diff_eq!(
                rec.supply_total().0,
                rec.consumption_total().0,
                epsilon = 1e-6,
            );
            assert_abs_diff_eq!(
                rec.storage_soc.0,
                prev.storage_soc.0 + rec.storage_input.0
                    - rec.storage_output.0
                    - rec.storage_vent.0,
                epsilon = 1e-6,
            );
            assert_abs_diff_eq!(
                (rec.electrolyzer_output + rec.storage_output).0,
                (rec.synthesis_hydrogen_input + rec.storage_input).0,
                epsilon = 1e-6,
            );
            assert!(rec.surplus.0 >= -1e-9, "negative surplus at step {}", step + 1);
            assert!(rec.battery_soc.0 >= -1e-6);
            assert!(rec.battery_soc.0 <= rec.battery_capacity.0 + 1e-9);
            if rec.ammonia_output.0 > 0.0 {
                assert!(rec.ammonia_ci <= config.system.ci_budget());
            }
        }
    }

    #[test]
    fn test_monthly_degradation_shows_up_in_the_records() {
        let config = default_config();
        // Six weeks starting 2021-01-01; the February boundary falls mid-series.
        let factors = vec![(0.8, 0.2); 1000];
        let records = run(&config, &factors);

        let last = records.last().unwrap();
        assert_abs_diff_eq!(
            last.battery_capacity.0,
            50.0 * (1.0 - 0.01 * 31.0 / 365.0),
            epsilon = 1e-9,
        );
        assert!(last.battery_charge_efficiency < 0.97);
        assert!(last.electrolyzer_specific_energy > 55.0);
        assert_eq!(records[1].battery_capacity.0, 50.0);
    }
}
