//! Dispatch when renewables alone exceed the nominal-load demand.
//!
//! Buffers below their floors claim the surplus first and cap production at
//! the maximised load. Otherwise the plant runs at nominal load and the
//! remaining energy cascades through the storage fill, the battery, an
//! optional inventory replacement, and finally curtailment.

use crate::{
    prelude::*,
    simulation::StepContext,
    trace::GateOutcome,
    units::{GramsPerMegajoule, MegawattHours, TonnesHydrogen, carbon::hydrogen_ci},
};

pub(crate) fn dispatch(cx: &mut StepContext<'_>) -> Result<()> {
    let floors_met = cx.prev.storage_soc >= cx.thresholds.storage_floor
        && cx.prev.battery_soc >= cx.thresholds.battery_floor;
    if floors_met {
        cx.rec.trace.push(GateOutcome::FloorSatisfied);
        at_nominal_load(cx)
    } else {
        cx.rec.trace.push(GateOutcome::FloorDeficit);
        recover_floors(cx)
    }
}

/// Holds the plant at the maximised partial load while surplus renewables
/// refill the buffers up to their floors.
fn recover_floors(cx: &mut StepContext<'_>) -> Result<()> {
    let th = cx.thresholds;
    let config = cx.config;
    let ely = cx.electrolyzer;

    let mut surplus_pot = cx.rec.res_energy - th.demand_min;

    if cx.prev.battery_soc < th.battery_floor {
        cx.rec.battery_input = surplus_pot
            .min(config.battery.nominal_power)
            .min((th.battery_floor - cx.prev.battery_soc) / cx.battery.charge_efficiency);
        surplus_pot -= cx.rec.battery_input;
    }

    if cx.prev.storage_soc < th.storage_floor && surplus_pot > MegawattHours::ZERO {
        // Electrolyzer range left over after the minimum-load direct feed.
        let fill_headroom =
            config.electrolyzer.capacity - th.demand_min * th.electrolyzer_share;
        cx.rec.storage_input = (surplus_pot / th.spec_storage)
            .min(th.storage_floor - cx.prev.storage_soc)
            .min(fill_headroom / ely.specific_energy);
        cx.rec.compressor_input = cx.rec.storage_input * config.compressor.specific_energy;
        surplus_pot -=
            cx.rec.storage_input * ely.specific_energy + cx.rec.compressor_input;
    }

    // Maximise the load with whatever surplus the refills left over.
    let stored_energy = cx.rec.storage_input * ely.specific_energy;
    cx.rec.electrolyzer_input = ((th.demand_min + surplus_pot) * th.electrolyzer_share)
        .min(config.electrolyzer.capacity - stored_energy)
        .min(th.demand_nominal * th.electrolyzer_share)
        + stored_energy;
    cx.rec.electrolyzer_output = cx.rec.electrolyzer_input / ely.specific_energy;
    cx.rec.synthesis_hydrogen_input = cx.rec.electrolyzer_output - cx.rec.storage_input;
    cx.rec.ammonia_output =
        cx.rec.synthesis_hydrogen_input / config.synthesis.specific_hydrogen;
    cx.rec.synthesis_input = cx.rec.ammonia_output * config.synthesis.specific_energy;

    cx.deposit(cx.rec.storage_input, GramsPerMegajoule::ZERO)?;

    let consumption = cx.rec.electrolyzer_input
        + cx.rec.battery_input
        + cx.rec.compressor_input
        + cx.rec.synthesis_input;
    let mut remain = cx.rec.res_energy - consumption;
    cx.rec.surplus = remain;

    // Both floors reached and energy to spare: top the storage up to full,
    // then the battery, then curtail.
    if remain > MegawattHours::ZERO {
        let fill_headroom = config.electrolyzer.capacity - cx.rec.electrolyzer_input;
        let extra = (remain / th.spec_storage)
            .min(fill_headroom / ely.specific_energy)
            .min(
                config.hydrogen_storage.capacity
                    - (cx.prev.storage_soc + cx.rec.storage_input),
            )
            .max(TonnesHydrogen::ZERO);
        cx.deposit(extra, GramsPerMegajoule::ZERO)?;
        cx.rec.storage_input += extra;
        cx.rec.compressor_input = cx.rec.storage_input * config.compressor.specific_energy;
        cx.rec.electrolyzer_input += extra * ely.specific_energy;
        cx.rec.electrolyzer_output = cx.rec.electrolyzer_input / ely.specific_energy;
        remain -= extra * th.spec_storage;
        cx.rec.surplus = remain;

        if remain > MegawattHours::ZERO {
            let extra = remain
                .min(config.battery.nominal_power - cx.rec.battery_input)
                .min(
                    (cx.battery.capacity
                        - (cx.prev.battery_soc
                            + cx.rec.battery_input / cx.battery.charge_efficiency))
                        / cx.battery.charge_efficiency,
                )
                .max(MegawattHours::ZERO);
            cx.rec.battery_input += extra;
            cx.rec.surplus -= extra;
        }
    }
    Ok(())
}

/// Nominal load, direct hydrogen feed. The leftover renewables fill the
/// storage (grid-assisting the compressor within the admission ceiling), then
/// the battery, then replace carbon-bearing inventory.
fn at_nominal_load(cx: &mut StepContext<'_>) -> Result<()> {
    let th = cx.thresholds;
    let config = cx.config;
    let ely = cx.electrolyzer;

    cx.rec.synthesis_input = config.synthesis.capacity * config.synthesis.specific_energy;
    cx.rec.synthesis_hydrogen_input =
        config.synthesis.capacity * config.synthesis.specific_hydrogen;
    cx.rec.ammonia_output = config.synthesis.capacity;
    cx.rec.electrolyzer_output = cx.rec.synthesis_hydrogen_input;
    cx.rec.electrolyzer_input = cx.rec.electrolyzer_output * ely.specific_energy;

    let mut remain =
        cx.rec.res_energy - cx.rec.synthesis_input - cx.rec.electrolyzer_input;

    if cx.prev.storage_soc < config.hydrogen_storage.capacity {
        cx.rec.trace.push(GateOutcome::StorageHeadroom);

        // Electrolyzer energy needed to fill the storage completely.
        let fill_energy = (config.electrolyzer.capacity - cx.rec.electrolyzer_input)
            .min((config.hydrogen_storage.capacity - cx.prev.storage_soc) * ely.specific_energy);
        let grid_share = th.max_grid_share_storage;
        // RES needed for the full fill, with the grid share picked up by the
        // compressor.
        let res_for_full_fill =
            fill_energy * (th.spec_storage.0 / ely.specific_energy.0) * (1.0 - grid_share);

        if res_for_full_fill < remain {
            cx.rec.trace.push(GateOutcome::SurplusBeyondStorage);
            fill_storage(cx, fill_energy);
            remain -= res_for_full_fill;

            let extra = remain
                .min(
                    config
                        .battery
                        .nominal_power
                        .min((cx.battery.capacity - cx.prev.battery_soc) / cx.battery.charge_efficiency)
                        - cx.rec.battery_input,
                )
                .max(MegawattHours::ZERO);
            cx.rec.battery_input += extra;

            finish_grid_assisted_fill(cx)?;
        } else {
            cx.rec.trace.push(GateOutcome::SurplusWithinStorage);
            let fill_energy =
                remain * (ely.specific_energy.0 / th.spec_storage.0) / (1.0 - grid_share);
            fill_storage(cx, fill_energy);
            finish_grid_assisted_fill(cx)?;
        }
    } else {
        cx.rec.trace.push(GateOutcome::StorageFull);

        let extra = remain
            .min(
                config
                    .battery
                    .nominal_power
                    .min((cx.battery.capacity - cx.prev.battery_soc) / cx.battery.charge_efficiency)
                    - cx.rec.battery_input,
            )
            .max(MegawattHours::ZERO);
        cx.rec.battery_input += extra;
        remain -= extra;

        replace_inventory(cx, remain)?;
    }
    Ok(())
}

/// Routes `fill_energy` worth of electrolysis into the storage.
fn fill_storage(cx: &mut StepContext<'_>, fill_energy: MegawattHours) {
    let ely = cx.electrolyzer;
    cx.rec.electrolyzer_input += fill_energy;
    cx.rec.electrolyzer_output = cx.rec.electrolyzer_input / ely.specific_energy;
    cx.rec.storage_input = fill_energy / ely.specific_energy;
    cx.rec.compressor_input = cx.rec.storage_input * cx.config.compressor.specific_energy;
}

/// Settles surplus against grid import and attributes the import, which can
/// only stem from the compressor here, to the deposited batch's CI.
fn finish_grid_assisted_fill(cx: &mut StepContext<'_>) -> Result<()> {
    let consumption = cx.rec.electrolyzer_input
        + cx.rec.synthesis_input
        + cx.rec.battery_input
        + cx.rec.compressor_input;
    cx.rec.surplus = (cx.rec.res_energy - consumption).max(MegawattHours::ZERO);
    cx.rec.grid_import = (consumption - cx.rec.res_energy).max(MegawattHours::ZERO);
    cx.rec.compressor_grid_input = cx.rec.grid_import;

    cx.rec.storage_input_ci = hydrogen_ci(
        cx.rec.compressor_grid_input,
        cx.config.grid.carbon_intensity,
        cx.rec.storage_input,
        cx.config.system.hydrogen_energy_density,
    )
    .round10();
    cx.deposit(cx.rec.storage_input, cx.rec.storage_input_ci)
}

/// Vents the oldest carbon-bearing inventory the leftover renewables can
/// replace, and deposits the same mass of fresh zero-CI hydrogen.
fn replace_inventory(cx: &mut StepContext<'_>, remain: MegawattHours) -> Result<()> {
    let th = cx.thresholds;
    let ely = cx.electrolyzer;

    let from_res = remain * (ely.specific_energy.0 / th.spec_storage.0);
    let headroom = cx.config.electrolyzer.capacity - cx.rec.electrolyzer_input;
    let potential =
        (from_res.min(headroom) / ely.specific_energy).max(TonnesHydrogen::ZERO);

    let (vented, deposited) = cx
        .ledger
        .evict_and_replace(potential, potential, GramsPerMegajoule::ZERO, cx.step)
        .map_err(|source| SimulationError::Ledger { step: cx.step, source })?;

    if vented > TonnesHydrogen::ZERO {
        cx.rec.trace.push(GateOutcome::ReplacementTriggered);
        cx.rec.storage_vent = vented;
        cx.rec.storage_input = deposited;
        let stored_energy = deposited * ely.specific_energy;
        cx.rec.electrolyzer_input += stored_energy;
        cx.rec.electrolyzer_output = cx.rec.electrolyzer_input / ely.specific_energy;
        cx.rec.compressor_input =
            cx.rec.storage_input * cx.config.compressor.specific_energy;
        cx.rec.surplus = remain - stored_energy - cx.rec.compressor_input;
    } else {
        cx.rec.trace.push(GateOutcome::ReplacementSkipped);
        cx.rec.surplus = remain;
    }
    Ok(())
}
