//! Dispatch when renewables plus the capped grid share can hold the plant at
//! or above the synthesis minimum load.
//!
//! Buffers below their floors are recharged first, shrinking the operating
//! point back towards the minimum. Grid import is attributed compressor-first,
//! so the admission CI of any deposited hydrogen reflects its own grid share.

use crate::{
    prelude::*,
    simulation::StepContext,
    trace::GateOutcome,
    units::{
        MegawattHours,
        TonnesHydrogen,
        carbon::{ammonia_ci_from_grid, hydrogen_ci},
    },
};

pub(crate) fn dispatch(cx: &mut StepContext<'_>) -> Result<()> {
    let th = cx.thresholds;
    let config = cx.config;
    let ely = cx.electrolyzer;

    let grid_share = th.max_grid_share_min;
    let mut potential = cx.rec.res_energy / (1.0 - grid_share);

    let floors_met = cx.prev.storage_soc >= th.storage_floor
        && cx.prev.battery_soc >= th.battery_floor;

    if floors_met {
        cx.rec.trace.push(GateOutcome::FloorSatisfied);
    } else {
        cx.rec.trace.push(GateOutcome::FloorDeficit);

        // RES needed to hold the minimum load, with the grid covering its
        // maximum share. Anything above it can recharge the buffers.
        let res_min = th.demand_min * (1.0 - grid_share);
        let mut surplus_pot = cx.rec.res_energy - res_min;

        if cx.prev.battery_soc < th.battery_floor {
            cx.rec.battery_input = surplus_pot
                .min(config.battery.nominal_power)
                .min((th.battery_floor - cx.prev.battery_soc) / cx.battery.charge_efficiency);
            surplus_pot -= cx.rec.battery_input;
        }

        if cx.prev.storage_soc < th.storage_floor && surplus_pot > MegawattHours::ZERO {
            let storage_share = th.max_grid_share_storage;
            let fill_energy = surplus_pot / (1.0 - storage_share)
                * (ely.specific_energy.0 / th.spec_storage.0);
            cx.rec.storage_input = (fill_energy / ely.specific_energy)
                .min(th.storage_floor - cx.prev.storage_soc);
            cx.rec.compressor_input =
                cx.rec.storage_input * config.compressor.specific_energy;
            cx.rec.compressor_grid_input =
                cx.rec.storage_input * th.spec_storage * storage_share;
            surplus_pot -=
                cx.rec.storage_input * th.spec_storage * (1.0 - storage_share);
        }

        potential = (surplus_pot + res_min) / (1.0 - grid_share);
    }

    // Flexible buffer inventory could lift the output further; the allocation
    // itself does not use it yet.
    let storage_flex = (cx.prev.storage_soc
        - config.hydrogen_storage.capacity * (1.0 - config.hydrogen_storage.flex_use))
        .max(TonnesHydrogen::ZERO);
    let battery_flex = (cx.prev.battery_soc
        - cx.battery.capacity * (1.0 - config.battery.flex_use))
        .max(MegawattHours::ZERO);
    if (storage_flex > TonnesHydrogen::ZERO || battery_flex > MegawattHours::ZERO)
        && floors_met
        && potential < th.demand_nominal
    {
        cx.rec.trace.push(GateOutcome::FlexPotential);
    } else {
        cx.rec.trace.push(GateOutcome::NoFlexPotential);
    }

    let supply = th.demand_nominal.min(potential);
    let stored_energy = cx.rec.storage_input * ely.specific_energy;

    cx.rec.electrolyzer_input = supply * th.electrolyzer_share + stored_energy;
    cx.rec.electrolyzer_output = cx.rec.electrolyzer_input / ely.specific_energy;
    cx.rec.synthesis_input = supply * th.synthesis_share;
    cx.rec.synthesis_hydrogen_input = cx.rec.electrolyzer_output - cx.rec.storage_input;
    cx.rec.ammonia_output = cx.rec.synthesis_input / config.synthesis.specific_energy;

    let consumption = cx.rec.electrolyzer_input
        + cx.rec.synthesis_input
        + cx.rec.battery_input
        + cx.rec.compressor_input;
    cx.rec.grid_import = consumption - cx.rec.res_energy;
    cx.rec.compressor_grid_input = cx.rec.grid_import.min(cx.rec.compressor_grid_input);
    cx.rec.synthesis_grid_input = cx.rec.grid_import - cx.rec.compressor_grid_input;

    if cx.rec.storage_input > TonnesHydrogen::ZERO {
        cx.rec.storage_input_ci = hydrogen_ci(
            cx.rec.compressor_grid_input,
            config.grid.carbon_intensity,
            cx.rec.storage_input,
            config.system.hydrogen_energy_density,
        )
        .round10();
        cx.deposit(cx.rec.storage_input, cx.rec.storage_input_ci)?;
    }

    cx.rec.ammonia_ci = ammonia_ci_from_grid(
        cx.rec.synthesis_grid_input,
        config.grid.carbon_intensity,
        cx.rec.ammonia_output,
        config.system.ammonia_energy_density,
    );
    Ok(())
}
