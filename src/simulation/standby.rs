//! Hot standby: the synthesis loop keeps drawing its standby power while no
//! ammonia is produced. Renewables cover it when they can, then the battery,
//! then the grid; any excess refills the buffers for the restart.

use crate::{
    prelude::*,
    simulation::StepContext,
    trace::GateOutcome,
    units::{GramsPerMegajoule, MegawattHours},
};

pub(crate) fn dispatch(cx: &mut StepContext<'_>) -> Result<()> {
    let th = cx.thresholds;
    let config = cx.config;
    let ely = cx.electrolyzer;

    let standby = th.synthesis_min_demand;
    cx.rec.synthesis_input = standby;

    if cx.rec.res_energy > standby {
        cx.rec.trace.push(GateOutcome::StandbyFromRes);
        let mut remain = cx.rec.res_energy - standby;

        if cx.prev.battery_soc < th.battery_floor {
            cx.rec.trace.push(GateOutcome::BatteryBelowFloor);
            cx.rec.battery_input = remain
                .min(config.battery.nominal_power)
                .min((th.battery_floor - cx.prev.battery_soc) / cx.battery.charge_efficiency);
            remain -= cx.rec.battery_input;
        } else {
            cx.rec.trace.push(GateOutcome::BatteryAtFloor);
        }

        // Hydrogen yield of the electrolyzer at its own minimum load; the
        // refill only runs when it can operate above that.
        let refill_min = (config.electrolyzer.capacity * config.electrolyzer.min_load)
            / th.spec_storage;
        let headroom = config.hydrogen_storage.capacity - cx.prev.storage_soc;
        if remain > refill_min * ely.specific_energy && headroom > refill_min {
            cx.rec.trace.push(GateOutcome::RefillElectrolyzer);
            cx.rec.storage_input = (remain / th.spec_storage)
                .min(headroom)
                .min(config.electrolyzer.capacity / ely.specific_energy);
            cx.rec.electrolyzer_input = cx.rec.storage_input * ely.specific_energy;
            cx.rec.electrolyzer_output = cx.rec.storage_input;
            cx.rec.compressor_input =
                cx.rec.storage_input * config.compressor.specific_energy;
            cx.deposit(cx.rec.storage_input, GramsPerMegajoule::ZERO)?;
            remain -= cx.rec.electrolyzer_input + cx.rec.compressor_input;
        } else {
            cx.rec.trace.push(GateOutcome::ElectrolyzerIdle);
        }

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
        cx.rec.surplus = remain - extra;
    } else {
        cx.rec.trace.push(GateOutcome::StandbyNeedsStorage);
        let battery_pot = config
            .battery
            .nominal_power
            .min(cx.prev.battery_soc * cx.battery.discharge_efficiency);

        if cx.rec.res_energy + battery_pot > standby {
            cx.rec.trace.push(GateOutcome::StandbyResBattery);
            cx.rec.battery_output = standby - cx.rec.res_energy;
        } else {
            cx.rec.trace.push(GateOutcome::StandbyResBatteryGrid);
            cx.rec.battery_output = battery_pot;
            cx.rec.grid_import = standby - cx.rec.battery_output - cx.rec.res_energy;
            cx.rec.synthesis_grid_input = cx.rec.grid_import;
        }
    }
    Ok(())
}
