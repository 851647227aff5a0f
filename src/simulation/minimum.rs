//! Minimum-load dispatch from the onsite buffers.
//!
//! The verdict partitions the renewable supply into three regimes relative to
//! the synthesis and electrolyzer demand shares, then checks which buffer
//! combination can bridge the remaining gap. Exact boundary hits between the
//! regimes resolve to no verdict and drop the step to standby.

use crate::{
    prelude::*,
    simulation::StepContext,
    trace::MinLoadMode,
    units::{MegawattHours, TonnesHydrogen, carbon::ammonia_ci_from_hydrogen},
};

/// Picks the allocation mode, or `None` when no buffer combination reaches
/// the minimum load.
pub(crate) fn verdict(cx: &StepContext<'_>) -> Option<MinLoadMode> {
    let th = cx.thresholds;
    let res = cx.rec.res_energy;
    let dm = th.demand_min;
    let sd = th.synthesis_min_demand;
    let ed = th.electrolyzer_min_demand;
    let em = th.electrolyzer_reduced_min;

    let battery_pot = cx
        .config
        .battery
        .nominal_power
        .min(cx.prev.battery_soc * cx.battery.discharge_efficiency);
    let storage_pot = cx.prev.storage_soc * cx.electrolyzer.specific_energy;

    let mut verdict = None;

    // Supply below even the synthesis draw.
    if res < sd {
        let deficit = sd - res;
        verdict = if res + battery_pot > sd {
            if storage_pot > ed {
                Some(MinLoadMode::DeficitHydrogenFull)
            } else if storage_pot > ed - em && battery_pot - deficit > em {
                Some(MinLoadMode::DeficitHydrogenElyMin)
            } else if storage_pot.min(ed - em) + (battery_pot - deficit) > ed {
                if storage_pot.min(ed - em) > MegawattHours::ZERO {
                    Some(MinLoadMode::DeficitHydrogenPartial)
                } else {
                    Some(MinLoadMode::DeficitBatteryOnly)
                }
            } else if battery_pot - deficit > ed {
                Some(MinLoadMode::DeficitBatteryOnly)
            } else {
                None
            }
        } else {
            None
        };
    }

    // Supply between the synthesis draw and the reduced total demand.
    if res > sd && res < sd + em {
        verdict = if battery_pot > em - (res - sd) && storage_pot > ed - em {
            Some(MinLoadMode::BandHydrogenElyMin)
        } else if storage_pot > dm - sd {
            Some(MinLoadMode::BandHydrogenFullCharge)
        } else if storage_pot.min(ed - em) + battery_pot > dm - res {
            if storage_pot.min(ed - em) > MegawattHours::ZERO {
                Some(MinLoadMode::BandHydrogenPartial)
            } else {
                Some(MinLoadMode::BandBatteryOnly)
            }
        } else if battery_pot > dm - res {
            Some(MinLoadMode::BandBatteryOnly)
        } else {
            None
        };
    }

    // Supply above the reduced total demand, short of the full minimum.
    if res > sd + em {
        let deficit = dm - res;
        verdict = if storage_pot > deficit {
            Some(MinLoadMode::SurplusHydrogenOnly)
        } else if storage_pot + battery_pot > deficit {
            if cx.prev.storage_soc > TonnesHydrogen::ZERO {
                Some(MinLoadMode::SurplusHydrogenThenBattery)
            } else {
                Some(MinLoadMode::SurplusBatteryOnly)
            }
        } else {
            None
        };
    }

    if verdict.is_none() && (res == sd || res == sd + em) {
        warn!(
            step = cx.step,
            supply = %res,
            "supply sits exactly on a regime boundary, falling through to standby",
        );
    }
    verdict
}

pub(crate) fn dispatch(cx: &mut StepContext<'_>, mode: MinLoadMode) -> Result<()> {
    let th = cx.thresholds;
    let config = cx.config;
    let ely = cx.electrolyzer;
    let res = cx.rec.res_energy;
    let dm = th.demand_min;
    let sd = th.synthesis_min_demand;
    let ed = th.electrolyzer_min_demand;
    let em = th.electrolyzer_reduced_min;

    cx.rec.synthesis_input = sd;
    cx.rec.ammonia_output = sd / config.synthesis.specific_energy;
    cx.rec.synthesis_hydrogen_input =
        cx.rec.ammonia_output * config.synthesis.specific_hydrogen;

    match mode {
        MinLoadMode::DeficitHydrogenFull => {
            cx.rec.storage_output = ed / ely.specific_energy;
            cx.rec.battery_output = sd - res;
        }
        MinLoadMode::DeficitHydrogenElyMin | MinLoadMode::BandHydrogenElyMin => {
            cx.rec.storage_output = (ed - em) / ely.specific_energy;
            cx.rec.battery_output = em + (sd - res);
            cx.rec.electrolyzer_input = em;
        }
        MinLoadMode::DeficitHydrogenPartial | MinLoadMode::BandHydrogenPartial => {
            cx.rec.storage_output =
                cx.prev.storage_soc.min((ed - em) / ely.specific_energy);
            let drawn = cx.rec.storage_output * ely.specific_energy;
            cx.rec.battery_output = dm - res - drawn;
            cx.rec.electrolyzer_input = dm - sd - drawn;
        }
        MinLoadMode::DeficitBatteryOnly
        | MinLoadMode::BandBatteryOnly
        | MinLoadMode::SurplusBatteryOnly => {
            cx.rec.battery_output = dm - res;
            cx.rec.electrolyzer_input = ed;
        }
        MinLoadMode::BandHydrogenFullCharge => {
            cx.rec.storage_output = ed / ely.specific_energy;
            cx.rec.battery_input = (res - sd)
                .min(config.battery.nominal_power)
                .min((cx.battery.capacity - cx.prev.battery_soc) / cx.battery.charge_efficiency);
            cx.rec.surplus = res - sd - cx.rec.battery_input;
        }
        MinLoadMode::SurplusHydrogenOnly => {
            cx.rec.storage_output = (dm - res) / ely.specific_energy;
            cx.rec.electrolyzer_input = dm - sd - cx.rec.storage_output * ely.specific_energy;
        }
        MinLoadMode::SurplusHydrogenThenBattery => {
            cx.rec.storage_output = cx.prev.storage_soc;
            let drawn = cx.rec.storage_output * ely.specific_energy;
            cx.rec.battery_output = dm - res - drawn;
            cx.rec.electrolyzer_input = dm - sd - drawn;
        }
    }

    if cx.rec.electrolyzer_input > MegawattHours::ZERO {
        cx.rec.electrolyzer_output = cx.rec.electrolyzer_input / ely.specific_energy;
    }

    if cx.rec.storage_output > TonnesHydrogen::ZERO {
        cx.rec.storage_output_ci = cx.withdraw(cx.rec.storage_output)?;
    }

    // Stored hydrogen is the only CO2 source at minimum load.
    cx.rec.ammonia_ci = ammonia_ci_from_hydrogen(
        cx.rec.storage_output_ci,
        cx.rec.storage_output,
        config.system.hydrogen_energy_density,
        cx.rec.ammonia_output,
        config.system.ammonia_energy_density,
    );
    Ok(())
}
