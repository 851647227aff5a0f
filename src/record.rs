//! Per-step output of the dispatch engine. One record per hour, plus an
//! anchor record carrying the initial buffer levels.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    trace::GateTrace,
    units::{GramsPerMegajoule, MegawattHours, TonnesAmmonia, TonnesHydrogen},
};

/// Everything the engine decided and measured within one hour.
///
/// All energies are per-step totals in MWh, all masses in tonnes. The `*_ci`
/// fields carry carbon intensities in gCO2 per MJ of product energy content.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TimestepRecord {
    pub time: NaiveDateTime,

    pub wind_cf: f64,
    pub pv_cf: f64,
    pub wind_energy: MegawattHours,
    pub pv_energy: MegawattHours,
    /// Total renewable supply, before curtailment.
    pub res_energy: MegawattHours,

    /// Total grid import across all consumers.
    pub grid_import: MegawattHours,
    /// Curtailed renewable energy.
    pub surplus: MegawattHours,
    pub total_consumption: MegawattHours,

    pub electrolyzer_input: MegawattHours,
    pub electrolyzer_output: TonnesHydrogen,

    /// Electricity drawn into the battery, before charge losses.
    pub battery_input: MegawattHours,
    /// Energy actually added to the battery.
    pub battery_charge: MegawattHours,
    pub battery_soc: MegawattHours,
    /// Energy removed from the battery, including discharge losses.
    pub battery_discharge: MegawattHours,
    /// Electricity delivered by the battery.
    pub battery_output: MegawattHours,
    /// Conversion and degradation losses within this step.
    pub battery_loss: MegawattHours,

    pub compressor_input: MegawattHours,
    /// Grid share of the compressor input.
    pub compressor_grid_input: MegawattHours,

    pub storage_input: TonnesHydrogen,
    pub storage_soc: TonnesHydrogen,
    pub storage_output: TonnesHydrogen,
    /// Hydrogen vented during an inventory replacement.
    pub storage_vent: TonnesHydrogen,
    pub storage_input_ci: GramsPerMegajoule,
    pub storage_output_ci: GramsPerMegajoule,
    /// Mass-weighted carbon intensity of the inventory after this step.
    pub storage_avg_ci: GramsPerMegajoule,

    /// Electricity into the synthesis loop, standby consumption included.
    pub synthesis_input: MegawattHours,
    /// Grid share of the synthesis input.
    pub synthesis_grid_input: MegawattHours,
    pub synthesis_hydrogen_input: TonnesHydrogen,

    pub ammonia_output: TonnesAmmonia,
    pub ammonia_ci: GramsPerMegajoule,

    pub trace: GateTrace,

    /// Duration of the idle episode starting at this step, in hours.
    pub synthesis_downtime: u32,
    pub electrolyzer_downtime: u32,

    pub battery_capacity: MegawattHours,
    pub battery_charge_efficiency: f64,
    pub battery_discharge_efficiency: f64,
    pub electrolyzer_specific_energy: f64,
}

impl TimestepRecord {
    pub fn zeroed(time: NaiveDateTime) -> Self {
        Self { time, ..Self::default() }
    }

    /// Electricity entering the plant bus: consumed renewables, grid import
    /// and battery output.
    pub fn supply_total(&self) -> MegawattHours {
        self.res_energy - self.surplus + self.grid_import + self.battery_output
    }

    /// Electricity leaving the plant bus.
    pub fn consumption_total(&self) -> MegawattHours {
        self.electrolyzer_input + self.synthesis_input + self.battery_input + self.compressor_input
    }
}

/// The anchor record followed by one record per series sample.
pub type OperationalSeries = Vec<TimestepRecord>;
